//! Torrent metainfo assembly ([BEP-3]).
//!
//! [`create_torrent`] is the whole build in one call: the input is
//! normalized, every byte is hashed, and the resulting dictionary is
//! bencoded.
//!
//! ```text
//! d
//!   8:announce ...            first tracker
//!   13:announce-list ...      tracker tiers (BEP-12)
//!   13:creation date i...e
//!   8:encoding 5:UTF-8
//!   4:info d
//!     5:files l ... e         or 6:length i...e for one file
//!     4:name ...
//!     12:piece length i...e
//!     6:pieces ...            concatenated SHA-1 digests
//!   e
//! e
//! ```
//!
//! Options that are not set leave their key out entirely.
//!
//! # Examples
//!
//! ```
//! use create_torrent::{create_torrent, InputItem, TorrentOptions};
//! use create_torrent::bencode::decode;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let torrent = create_torrent(
//!     InputItem::buffer(&b"hello world"[..]).with_name("hello.txt"),
//!     TorrentOptions::new().announce("udp://tracker.example.com:80"),
//! )
//! .await?;
//!
//! let root = decode(&torrent)?;
//! let info = root.get(b"info").unwrap();
//! assert_eq!(info.get(b"name").unwrap().as_str(), Some("hello.txt"));
//! assert_eq!(info.get(b"length").unwrap().as_integer(), Some(11));
//! # Ok(())
//! # }
//! ```
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod announce;
mod assemble;
mod options;

pub use announce::{announce_tiers, env_announce, ANNOUNCE_ENV, DEFAULT_ANNOUNCE_LIST};
pub use assemble::TorrentMetadata;
pub use options::TorrentOptions;

use crate::bencode::decode;
use crate::error::CreateError;
use crate::input::{parse_input, Input};
use crate::piece::{calc_piece_length, PiecePipeline};

/// Builds a torrent and returns the bencoded metainfo file.
pub async fn create_torrent(
    input: impl Into<Input>,
    options: TorrentOptions,
) -> Result<Vec<u8>, CreateError> {
    Ok(build_metadata(input, &options).await?.to_bytes())
}

/// Builds a torrent and returns the metainfo dictionary without encoding
/// it.
pub async fn build_metadata(
    input: impl Into<Input>,
    options: &TorrentOptions,
) -> Result<TorrentMetadata, CreateError> {
    let mut parsed = parse_input(input, options).await?;
    let estimated = parsed.estimated_length();

    let piece_length = match options.piece_length {
        Some(0) => return Err(CreateError::invalid("piece length must be positive")),
        Some(length) => length,
        None => calc_piece_length(estimated),
    };
    assemble::to_integer(piece_length, "piece length")?;
    assemble::to_integer(estimated, "total length")?;

    let mut pipeline = PiecePipeline::new(piece_length);
    if let Some(hasher) = &options.hasher {
        pipeline = pipeline.hasher(hasher.clone());
    }
    if let Some(on_progress) = &options.on_progress {
        pipeline = pipeline.on_progress(on_progress.clone());
    }
    let pieces = pipeline.run(&mut parsed.files, estimated).await?;

    tracing::debug!(
        name = %parsed.name,
        piece_length,
        pieces = pieces.piece_count(),
        "assembling metainfo"
    );
    assemble::assemble(&parsed, piece_length, pieces, options)
}

impl TorrentMetadata {
    /// Parses a metainfo file.
    ///
    /// Only the outer shape is checked: the file must be a dictionary with
    /// an `info` dictionary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CreateError> {
        let root = decode(data)?;
        if root.get(b"info").and_then(|info| info.as_dict()).is_none() {
            return Err(CreateError::invalid("metainfo has no info dictionary"));
        }
        Ok(Self::from_root(root))
    }
}
