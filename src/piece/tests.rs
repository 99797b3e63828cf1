use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use sha1::{Digest, Sha1};
use tokio::io::{AsyncRead, ReadBuf};

use super::*;
use crate::error::CreateError;
use crate::source::FileDescriptor;

fn sha1(data: &[u8]) -> PieceHash {
    Sha1::digest(data).into()
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

fn expected_hashes(data: &[u8], piece_length: usize) -> Vec<u8> {
    data.chunks(piece_length).flat_map(sha1).collect()
}

fn single(data: Vec<u8>) -> Vec<FileDescriptor> {
    vec![FileDescriptor::from_bytes(vec!["data.bin".into()], data)]
}

/// Sleeps longer for earlier pieces so digests complete in reverse order.
struct ReversingHasher {
    pieces: usize,
}

impl PieceHasher for ReversingHasher {
    fn hash_piece(&self, index: usize, piece: &[u8]) -> Result<PieceHash, HashError> {
        let delay = self.pieces.saturating_sub(index) as u64 * 2;
        std::thread::sleep(Duration::from_millis(delay));
        Ok(sha1(piece))
    }
}

/// Records the highest number of concurrently running digests.
#[derive(Default)]
struct CountingHasher {
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl PieceHasher for CountingHasher {
    fn hash_piece(&self, _index: usize, piece: &[u8]) -> Result<PieceHash, HashError> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(5));
        self.running.fetch_sub(1, Ordering::SeqCst);
        Ok(sha1(piece))
    }
}

struct FailingHasher {
    fail_at: usize,
}

impl PieceHasher for FailingHasher {
    fn hash_piece(&self, index: usize, piece: &[u8]) -> Result<PieceHash, HashError> {
        if index == self.fail_at {
            return Err(HashError("digest unavailable".into()));
        }
        Ok(sha1(piece))
    }
}

/// Yields `good` bytes, then fails.
struct BrokenReader {
    good: usize,
}

impl AsyncRead for BrokenReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.good == 0 {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone")));
        }
        let n = self.good.min(buf.remaining());
        buf.put_slice(&vec![7u8; n]);
        self.good -= n;
        Poll::Ready(Ok(()))
    }
}

#[test]
fn test_calc_piece_length() {
    assert_eq!(calc_piece_length(0), MIN_PIECE_LENGTH);
    assert_eq!(calc_piece_length(1), MIN_PIECE_LENGTH);
    assert_eq!(calc_piece_length(16 * 1024 * 1024), 16384);
    assert_eq!(calc_piece_length(64 * 1024 * 1024), 65536);
    // 1.5 GiB rounds to the nearer power of two (2 MiB)
    assert_eq!(calc_piece_length(1536 * 1024 * 1024), 2 * 1024 * 1024);
    assert!(calc_piece_length(123_456_789).is_power_of_two());
}

#[test]
fn test_slicer_exact_multiple() {
    let mut slicer = Slicer::new(3);
    let mut pieces = Vec::new();
    for chunk in [&b"ab"[..], &b"cdef"[..]] {
        let mut rest = chunk;
        while !rest.is_empty() {
            let window = slicer.window();
            let n = window.len().min(rest.len());
            window[..n].copy_from_slice(&rest[..n]);
            rest = &rest[n..];
            pieces.extend(slicer.advance(n));
        }
    }
    assert_eq!(pieces, vec![&b"abc"[..], &b"def"[..]]);
    assert!(slicer.finish().is_none());
}

#[test]
fn test_slicer_grows_with_content() {
    let mut slicer = Slicer::new(usize::MAX);
    assert_eq!(slicer.window().len(), MAX_WINDOW);

    slicer.window()[..3].copy_from_slice(b"abc");
    assert!(slicer.advance(3).is_none());
    assert_eq!(slicer.window().len(), MAX_WINDOW);
    assert_eq!(slicer.finish().unwrap().as_ref(), b"abc");
}

#[test]
fn test_slicer_pieces_larger_than_window() {
    let data = pattern(MAX_WINDOW * 2 + 10);
    let mut slicer = Slicer::new(MAX_WINDOW * 2);
    let mut pieces = Vec::new();

    for chunk in data.chunks(1000) {
        let mut rest = chunk;
        while !rest.is_empty() {
            let window = slicer.window();
            let n = window.len().min(rest.len());
            window[..n].copy_from_slice(&rest[..n]);
            rest = &rest[n..];
            pieces.extend(slicer.advance(n));
        }
    }
    pieces.extend(slicer.finish());

    assert_eq!(pieces.len(), 2);
    assert_eq!(pieces[0].as_ref(), &data[..MAX_WINDOW * 2]);
    assert_eq!(pieces[1].as_ref(), &data[MAX_WINDOW * 2..]);
}

#[tokio::test]
async fn test_huge_piece_length_hashes_short_content() {
    let mut files = single(b"abc".to_vec());
    let pieces = PiecePipeline::new(1 << 40).run(&mut files, 3).await.unwrap();

    assert_eq!(pieces.piece_count(), 1);
    assert_eq!(pieces.get(0).unwrap(), sha1(b"abc"));
}

#[test]
#[should_panic]
fn test_slicer_rejects_zero_length() {
    Slicer::new(0);
}

#[tokio::test]
async fn test_piece_count_and_short_last_piece() {
    let data = pattern(362_017);
    let mut files = single(data.clone());

    let pieces = PiecePipeline::new(16384).run(&mut files, 362_017).await.unwrap();

    assert_eq!(pieces.piece_count(), 23);
    assert_eq!(pieces.total_length, 362_017);
    assert_eq!(362_017 % 16384, 1569);
    assert_eq!(pieces.get(22).unwrap(), sha1(&data[22 * 16384..]));
    assert_eq!(pieces.hashes.as_ref(), expected_hashes(&data, 16384));
}

#[tokio::test]
async fn test_pieces_span_file_boundaries() {
    let mut files = vec![
        FileDescriptor::from_bytes(vec!["a".into()], b"hello ".to_vec()),
        FileDescriptor::from_bytes(vec!["b".into()], Vec::new()),
        FileDescriptor::from_bytes(vec!["c".into()], b"world".to_vec()),
    ];

    let pieces = PiecePipeline::new(4).run(&mut files, 11).await.unwrap();

    assert_eq!(pieces.piece_count(), 3);
    assert_eq!(pieces.hashes.as_ref(), expected_hashes(b"hello world", 4));
}

#[tokio::test]
async fn test_empty_content_has_no_pieces() {
    let mut files = single(Vec::new());
    let mut pipeline = PiecePipeline::new(16384);

    let pieces = pipeline.run(&mut files, 0).await.unwrap();

    assert_eq!(pieces.piece_count(), 0);
    assert!(pieces.hashes.is_empty());
    assert_eq!(pipeline.state(), PipelineState::Complete);
}

#[tokio::test]
async fn test_completion_order_does_not_change_result() {
    let data = pattern(40 * 64 + 7);
    let mut files = single(data.clone());

    let pieces = PiecePipeline::new(64)
        .hasher(Arc::new(ReversingHasher { pieces: 41 }))
        .run(&mut files, data.len() as u64)
        .await
        .unwrap();

    assert_eq!(pieces.hashes.as_ref(), expected_hashes(&data, 64));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_outstanding_hashes_are_bounded() {
    let hasher = Arc::new(CountingHasher::default());
    let mut files = single(pattern(50 * 32));

    PiecePipeline::new(32)
        .hasher(hasher.clone())
        .run(&mut files, 50 * 32)
        .await
        .unwrap();

    let peak = hasher.peak.load(Ordering::SeqCst);
    assert!(peak >= 1);
    assert!(peak <= MAX_OUTSTANDING_HASHES, "peak was {peak}");
}

#[tokio::test]
async fn test_hash_error_fails_pipeline() {
    let mut files = single(pattern(10 * 16));
    let mut pipeline = PiecePipeline::new(16).hasher(Arc::new(FailingHasher { fail_at: 3 }));

    let err = pipeline.run(&mut files, 160).await.unwrap_err();

    assert!(matches!(err, CreateError::Hash { index: 3, .. }));
    assert_eq!(pipeline.state(), PipelineState::Failed);
}

#[tokio::test]
async fn test_read_error_fails_pipeline() {
    let mut files = vec![
        FileDescriptor::from_bytes(vec!["ok".into()], pattern(100)),
        FileDescriptor::from_reader(vec!["broken".into()], BrokenReader { good: 50 }),
    ];
    let mut pipeline = PiecePipeline::new(32);

    let err = pipeline.run(&mut files, 100).await.unwrap_err();

    match err {
        CreateError::Io { path, source } => {
            assert!(path.is_none());
            assert_eq!(source.kind(), io::ErrorKind::BrokenPipe);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(pipeline.state(), PipelineState::Failed);
}

#[tokio::test]
async fn test_stream_length_reported_after_read() {
    let data = pattern(1000);
    let mut files = vec![FileDescriptor::from_reader(
        vec!["stream".into()],
        io::Cursor::new(data.clone()),
    )];
    assert_eq!(files[0].length, 0);

    let pieces = PiecePipeline::new(256).run(&mut files, 0).await.unwrap();

    assert_eq!(files[0].length, 1000);
    assert_eq!(pieces.total_length, 1000);
    assert_eq!(pieces.hashes.as_ref(), expected_hashes(&data, 256));
}

#[tokio::test]
async fn test_progress_is_monotonic() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mut files = vec![
        FileDescriptor::from_bytes(vec!["a".into()], pattern(70)),
        FileDescriptor::from_bytes(vec!["b".into()], pattern(30)),
    ];

    PiecePipeline::new(25)
        .on_progress(Arc::new(move |done, total| {
            sink.lock().unwrap().push((done, total));
        }))
        .run(&mut files, 100)
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(*seen, vec![(25, 100), (50, 100), (75, 100), (100, 100)]);
}

#[tokio::test]
async fn test_pipeline_runs_once() {
    let mut files = single(pattern(10));
    let mut pipeline = PiecePipeline::new(4);
    pipeline.run(&mut files, 10).await.unwrap();

    let err = pipeline.run(&mut files, 10).await.unwrap_err();
    assert!(matches!(err, CreateError::InvalidInput(_)));
}

#[tokio::test]
async fn test_zero_piece_length_rejected() {
    let mut files = single(pattern(10));
    let err = PiecePipeline::new(0).run(&mut files, 10).await.unwrap_err();
    assert!(matches!(err, CreateError::InvalidInput(_)));
}
