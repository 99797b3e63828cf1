//! Lazy byte sources and the file descriptors that own them.
//!
//! A [`ByteSource`] describes where a file's bytes come from without
//! touching them. The hashing pipeline opens each source exactly once, in
//! order, and reads it to the end through a [`SourceReader`], which counts
//! the bytes that pass through so streams of unknown length can report
//! their size afterwards.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::io::{AsyncRead, ReadBuf};

use crate::error::CreateError;

/// A caller-supplied reader.
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Where a file's content comes from.
pub enum ByteSource {
    /// A file on disk, opened when the pipeline reaches it.
    Path(PathBuf),
    /// An in-memory buffer.
    Buffer(Bytes),
    /// An external stream of unknown length.
    Stream(BoxedReader),
}

impl ByteSource {
    /// Whether the length of this source is known before it is read.
    pub fn is_sized(&self) -> bool {
        !matches!(self, ByteSource::Stream(_))
    }

    /// Opens the source, positioned at its first byte.
    pub async fn open(self) -> Result<SourceReader, CreateError> {
        let inner: BoxedReader = match self {
            ByteSource::Path(path) => {
                let file = tokio::fs::File::open(&path)
                    .await
                    .map_err(|e| CreateError::io_at(&path, e))?;
                Box::new(file)
            }
            ByteSource::Buffer(data) => Box::new(io::Cursor::new(data)),
            ByteSource::Stream(reader) => reader,
        };
        Ok(SourceReader { inner, read: 0 })
    }
}

impl fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ByteSource::Buffer(data) => f.debug_tuple("Buffer").field(&data.len()).finish(),
            ByteSource::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// An opened source that counts the bytes read from it.
pub struct SourceReader {
    inner: BoxedReader,
    read: u64,
}

impl SourceReader {
    /// Total bytes delivered so far.
    pub fn bytes_read(&self) -> u64 {
        self.read
    }
}

impl AsyncRead for SourceReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        let poll = Pin::new(&mut self.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = poll {
            self.read += (buf.filled().len() - before) as u64;
        }
        poll
    }
}

/// One file of the torrent: where it sits in the tree, how long it is, and
/// where its bytes come from.
#[derive(Debug)]
pub struct FileDescriptor {
    /// Path components relative to the torrent root.
    pub path: Vec<String>,
    /// Length in bytes. Zero for streams until they have been read.
    pub length: u64,
    source: Option<ByteSource>,
}

impl FileDescriptor {
    pub fn new(path: Vec<String>, length: u64, source: ByteSource) -> Self {
        Self {
            path,
            length,
            source: Some(source),
        }
    }

    /// Describes an in-memory file.
    pub fn from_bytes(path: Vec<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self::new(path, data.len() as u64, ByteSource::Buffer(data))
    }

    /// Describes a stream whose length is learned while hashing.
    pub fn from_reader(path: Vec<String>, reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::new(path, 0, ByteSource::Stream(Box::new(reader)))
    }

    /// Takes the byte source out of the descriptor. Returns `None` once it
    /// has been taken.
    pub fn take_source(&mut self) -> Option<ByteSource> {
        self.source.take()
    }

    /// Records the final length of a stream once it has been fully read.
    pub(crate) fn report_length(&mut self, length: u64) {
        self.length = length;
    }
}
