use sha1::{Digest, Sha1};
use thiserror::Error;

/// Length of a v1 piece digest.
pub const PIECE_HASH_LEN: usize = 20;

/// A SHA-1 piece digest.
pub type PieceHash = [u8; PIECE_HASH_LEN];

/// Failure reported by a [`PieceHasher`].
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HashError(pub String);

/// Computes the digest of one piece.
///
/// Implementations run on the blocking thread pool and may be called for
/// several pieces concurrently. `index` is the piece's position in the
/// torrent; the default implementation ignores it.
pub trait PieceHasher: Send + Sync + 'static {
    fn hash_piece(&self, index: usize, piece: &[u8]) -> Result<PieceHash, HashError>;
}

/// The standard BitTorrent v1 hasher.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha1Hasher;

impl PieceHasher for Sha1Hasher {
    fn hash_piece(&self, _index: usize, piece: &[u8]) -> Result<PieceHash, HashError> {
        let mut hasher = Sha1::new();
        hasher.update(piece);
        Ok(hasher.finalize().into())
    }
}
