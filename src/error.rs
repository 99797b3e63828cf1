use std::path::PathBuf;

use thiserror::Error;

use crate::bencode::BencodeError;
use crate::piece::HashError;

/// Errors that abort a torrent build.
///
/// Every error is fatal: a build either produces a complete metainfo file or
/// returns exactly one of these.
#[derive(Debug, Error)]
pub enum CreateError {
    /// The input or options cannot describe a torrent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The input needs a capability the current target does not have.
    #[error("not supported in this environment: {0}")]
    UnsupportedEnvironment(&'static str),

    /// Stat, directory listing or read failure.
    #[error("{}", io_message(.path, .source))]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    /// The digest primitive failed for a piece.
    #[error("failed to hash piece {index}: {source}")]
    Hash {
        index: usize,
        #[source]
        source: HashError,
    },

    #[error("bencode error: {0}")]
    Bencode(#[from] BencodeError),
}

impl CreateError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        CreateError::InvalidInput(msg.into())
    }

    pub(crate) fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CreateError::Io {
            path: Some(path.into()),
            source,
        }
    }
}

impl From<std::io::Error> for CreateError {
    fn from(source: std::io::Error) -> Self {
        CreateError::Io { path: None, source }
    }
}

fn io_message(path: &Option<PathBuf>, source: &std::io::Error) -> String {
    match path {
        Some(path) => format!("io error on {}: {}", path.display(), source),
        None => format!("io error: {}", source),
    }
}
