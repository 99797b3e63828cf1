//! Piece hashing.
//!
//! The content of a torrent is the concatenation of all of its files, in
//! order, cut into pieces of `piece length` bytes. Only the last piece may be
//! shorter; it is never padded. Each piece is identified in the metainfo by
//! its SHA-1 digest.
//!
//! [`PiecePipeline`] streams every [`FileDescriptor`](crate::FileDescriptor)
//! through a [`Slicer`] and hashes the resulting pieces on the blocking
//! thread pool. At most [`MAX_OUTSTANDING_HASHES`] digests are in flight at
//! once; when that many are pending, reading stops until one completes.
//! Digests may finish in any order but are stored by piece index, so the
//! resulting [`PieceList`] is always in index order.
//!
//! # Examples
//!
//! ```
//! use create_torrent::piece::PiecePipeline;
//! use create_torrent::FileDescriptor;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), create_torrent::CreateError> {
//! let mut files = vec![
//!     FileDescriptor::from_bytes(vec!["a".into()], vec![1u8; 10]),
//!     FileDescriptor::from_bytes(vec!["b".into()], vec![2u8; 10]),
//! ];
//!
//! let pieces = PiecePipeline::new(16).run(&mut files, 20).await?;
//! assert_eq!(pieces.piece_count(), 2);
//! assert_eq!(pieces.total_length, 20);
//! # Ok(())
//! # }
//! ```

mod hasher;
mod pipeline;
mod slicer;

pub use hasher::{HashError, PieceHash, PieceHasher, Sha1Hasher, PIECE_HASH_LEN};
pub use pipeline::{PieceList, PiecePipeline, PipelineState, ProgressFn, MAX_OUTSTANDING_HASHES};
pub use slicer::{Slicer, MAX_WINDOW};

/// Smallest piece length chosen automatically (16 KiB).
pub const MIN_PIECE_LENGTH: u64 = 16 * 1024;

/// Picks a piece length for `total_length` bytes of content.
///
/// The result is the power of two closest to `total_length / 1024`, but at
/// least [`MIN_PIECE_LENGTH`]. That keeps the piece count around a thousand
/// for large torrents.
///
/// ```
/// use create_torrent::piece::calc_piece_length;
///
/// assert_eq!(calc_piece_length(0), 16384);
/// assert_eq!(calc_piece_length(362_017), 16384);
/// assert_eq!(calc_piece_length(1 << 30), 1 << 20);
/// ```
pub fn calc_piece_length(total_length: u64) -> u64 {
    let kib = if total_length < 1024 {
        1.0
    } else {
        total_length as f64 / 1024.0
    };
    let exponent = (kib.log2() + 0.5).floor() as u32;
    1u64.checked_shl(exponent)
        .unwrap_or(u64::MAX)
        .max(MIN_PIECE_LENGTH)
}

#[cfg(test)]
mod tests;
