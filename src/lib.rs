//! create-torrent - build BitTorrent metainfo files
//!
//! This library turns files, directories, in-memory buffers and byte
//! streams into `.torrent` files ([BEP-3]).
//!
//! # Modules
//!
//! - [`input`] - Input normalization, directory walking, junk filtering
//! - [`source`] - Lazy byte sources behind each torrent file
//! - [`piece`] - Piece slicing and bounded concurrent SHA-1 hashing
//! - [`metainfo`] - Options, tracker tiers, metainfo assembly
//! - [`bencode`] - BEP-3 Bencode encoding/decoding
//!
//! # Example
//!
//! ```no_run
//! use create_torrent::{create_torrent, TorrentOptions};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let torrent = create_torrent(
//!     std::path::Path::new("./my-folder"),
//!     TorrentOptions::new().comment("backup"),
//! )
//! .await?;
//! tokio::fs::write("my-folder.torrent", torrent).await?;
//! # Ok(())
//! # }
//! ```
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

pub mod bencode;
pub mod error;
pub mod input;
pub mod metainfo;
pub mod piece;
pub mod source;

pub use bencode::{decode, encode, BencodeError, Value};
pub use error::CreateError;
pub use input::{parse_input, Input, InputItem, ParsedInput};
pub use metainfo::{build_metadata, create_torrent, TorrentMetadata, TorrentOptions};
pub use piece::{calc_piece_length, HashError, PieceHasher, PieceList, PiecePipeline};
pub use source::{ByteSource, FileDescriptor};
