use std::fmt;
use std::io;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tokio::task::JoinSet;

use super::hasher::{HashError, PieceHash, PieceHasher, Sha1Hasher, PIECE_HASH_LEN};
use super::slicer::Slicer;
use crate::error::CreateError;
use crate::source::{ByteSource, FileDescriptor};

/// Maximum number of piece digests computed concurrently.
pub const MAX_OUTSTANDING_HASHES: usize = 5;

/// Progress callback: `(bytes consumed so far, estimated total bytes)`.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Lifecycle of a [`PiecePipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing has been read yet.
    Idle,
    /// Sources are being read and sliced.
    Streaming,
    /// All input was read; waiting for the last digests.
    Draining,
    /// Every piece has a digest.
    Complete,
    /// A read or hash failed. Terminal.
    Failed,
}

/// The ordered piece digests of a torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceList {
    /// Concatenated 20-byte digests, piece 0 first.
    pub hashes: Bytes,
    /// Number of content bytes that were hashed.
    pub total_length: u64,
}

impl PieceList {
    pub fn piece_count(&self) -> usize {
        self.hashes.len() / PIECE_HASH_LEN
    }

    /// Digest of piece `index`.
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(PIECE_HASH_LEN)?;
        self.hashes.get(start..start + PIECE_HASH_LEN)
    }
}

/// Hashes the concatenated content of a list of files.
pub struct PiecePipeline {
    piece_length: u64,
    hasher: Arc<dyn PieceHasher>,
    on_progress: Option<ProgressFn>,
    state: PipelineState,
}

impl PiecePipeline {
    /// Creates a SHA-1 pipeline for pieces of `piece_length` bytes.
    pub fn new(piece_length: u64) -> Self {
        Self {
            piece_length,
            hasher: Arc::new(Sha1Hasher),
            on_progress: None,
            state: PipelineState::Idle,
        }
    }

    /// Replaces the digest primitive.
    pub fn hasher(mut self, hasher: Arc<dyn PieceHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Sets a callback invoked after each piece has been read.
    pub fn on_progress(mut self, on_progress: ProgressFn) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Reads every file in order and returns the digests of all pieces.
    ///
    /// Each descriptor's source is taken and read to the end; streams have
    /// their `length` filled in once exhausted. `estimated_total` is only
    /// passed through to the progress callback.
    ///
    /// The first read or hash error stops the pipeline and is returned; no
    /// partial piece list is produced. A pipeline runs once.
    pub async fn run(
        &mut self,
        files: &mut [FileDescriptor],
        estimated_total: u64,
    ) -> Result<PieceList, CreateError> {
        if self.state != PipelineState::Idle {
            return Err(CreateError::invalid("piece pipeline has already run"));
        }

        let piece_length = usize::try_from(self.piece_length)
            .ok()
            .filter(|&len| len > 0)
            .ok_or_else(|| {
                CreateError::invalid(format!("invalid piece length {}", self.piece_length))
            })?;

        let mut hashing = Outstanding::new(Arc::clone(&self.hasher));

        let total_length = match self
            .stream(files, piece_length, estimated_total, &mut hashing)
            .await
        {
            Ok(total_length) => total_length,
            Err(e) => return Err(self.fail(&mut hashing, e)),
        };

        self.transition(PipelineState::Draining);
        if let Err(e) = hashing.drain().await {
            return Err(self.fail(&mut hashing, e));
        }

        let hashes = match hashing.into_hashes() {
            Ok(hashes) => hashes,
            Err(e) => {
                self.transition(PipelineState::Failed);
                return Err(e);
            }
        };
        self.transition(PipelineState::Complete);

        let pieces = PieceList {
            hashes,
            total_length,
        };
        tracing::debug!(
            pieces = pieces.piece_count(),
            total_length,
            piece_length,
            "piece hashing complete"
        );
        Ok(pieces)
    }

    /// Feeds every source through the slicer, submitting pieces as they
    /// fill up. Returns the number of bytes read.
    async fn stream(
        &mut self,
        files: &mut [FileDescriptor],
        piece_length: usize,
        estimated_total: u64,
        hashing: &mut Outstanding,
    ) -> Result<u64, CreateError> {
        let mut slicer = Slicer::new(piece_length);
        let mut consumed = 0u64;

        for file in files.iter_mut() {
            let source = file.take_source().ok_or_else(|| {
                CreateError::invalid(format!(
                    "source of {} was already consumed",
                    file.path.join("/")
                ))
            })?;
            let sized = source.is_sized();
            let origin = match &source {
                ByteSource::Path(path) => Some(path.clone()),
                _ => None,
            };

            if self.state == PipelineState::Idle {
                self.transition(PipelineState::Streaming);
            }
            let mut reader = source.open().await?;

            loop {
                let n = reader
                    .read(slicer.window())
                    .await
                    .map_err(|source| CreateError::Io {
                        path: origin.clone(),
                        source,
                    })?;
                if n == 0 {
                    break;
                }
                consumed += n as u64;

                if let Some(piece) = slicer.advance(n) {
                    self.report(consumed, estimated_total);
                    hashing.submit(piece).await?;
                }
            }

            if !sized {
                file.report_length(reader.bytes_read());
            }
            tracing::trace!(path = ?file.path, bytes = reader.bytes_read(), "source drained");
        }

        if let Some(piece) = slicer.finish() {
            self.report(consumed, estimated_total);
            hashing.submit(piece).await?;
        }

        Ok(consumed)
    }

    fn report(&self, consumed: u64, estimated_total: u64) {
        if let Some(on_progress) = &self.on_progress {
            on_progress(consumed, estimated_total);
        }
    }

    fn fail(&mut self, hashing: &mut Outstanding, error: CreateError) -> CreateError {
        self.transition(PipelineState::Failed);
        hashing.tasks.abort_all();
        tracing::debug!(%error, "piece hashing failed");
        error
    }

    fn transition(&mut self, next: PipelineState) {
        tracing::trace!(from = ?self.state, to = ?next, "piece pipeline state");
        self.state = next;
    }
}

impl fmt::Debug for PiecePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PiecePipeline")
            .field("piece_length", &self.piece_length)
            .field("state", &self.state)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Digests in flight plus the index-keyed slots they land in.
struct Outstanding {
    hasher: Arc<dyn PieceHasher>,
    tasks: JoinSet<(usize, Result<PieceHash, HashError>)>,
    slots: Vec<Option<PieceHash>>,
}

impl Outstanding {
    fn new(hasher: Arc<dyn PieceHasher>) -> Self {
        Self {
            hasher,
            tasks: JoinSet::new(),
            slots: Vec::new(),
        }
    }

    /// Queues `piece` for hashing under the next index, first waiting for a
    /// free slot if the limit is reached.
    async fn submit(&mut self, piece: Bytes) -> Result<(), CreateError> {
        while self.tasks.len() >= MAX_OUTSTANDING_HASHES {
            self.complete_one().await?;
        }

        let index = self.slots.len();
        self.slots.push(None);

        let hasher = Arc::clone(&self.hasher);
        self.tasks
            .spawn_blocking(move || (index, hasher.hash_piece(index, &piece)));
        debug_assert!(self.tasks.len() <= MAX_OUTSTANDING_HASHES);
        Ok(())
    }

    async fn complete_one(&mut self) -> Result<(), CreateError> {
        let Some(joined) = self.tasks.join_next().await else {
            return Ok(());
        };

        match joined.map_err(io::Error::other)? {
            (index, Ok(hash)) => {
                self.slots[index] = Some(hash);
                Ok(())
            }
            (index, Err(source)) => Err(CreateError::Hash { index, source }),
        }
    }

    async fn drain(&mut self) -> Result<(), CreateError> {
        while !self.tasks.is_empty() {
            self.complete_one().await?;
        }
        Ok(())
    }

    fn into_hashes(self) -> Result<Bytes, CreateError> {
        let mut out = Vec::with_capacity(self.slots.len() * PIECE_HASH_LEN);
        for (index, slot) in self.slots.into_iter().enumerate() {
            let hash = slot.ok_or_else(|| CreateError::Hash {
                index,
                source: HashError("digest missing".into()),
            })?;
            out.extend_from_slice(&hash);
        }
        Ok(Bytes::from(out))
    }
}
