//! Bencode serialization ([BEP-3]).
//!
//! Metainfo files are bencoded dictionaries. The encoder here always emits
//! dictionary keys in sorted byte order, which is what makes the output of
//! [`create_torrent`](crate::create_torrent) byte-for-byte reproducible: the
//! order in which the assembler inserts fields never leaks into the file.
//!
//! The decoder is the inverse and is mainly useful for inspecting a
//! generated torrent.
//!
//! # Examples
//!
//! ```
//! use create_torrent::bencode::{decode, encode, Value};
//! use bytes::Bytes;
//! use std::collections::BTreeMap;
//!
//! let mut info = BTreeMap::new();
//! info.insert(Bytes::from_static(b"name"), Value::string("hello.txt"));
//! info.insert(Bytes::from_static(b"length"), Value::Integer(5));
//!
//! let encoded = encode(&Value::Dict(info));
//! assert_eq!(encoded, b"d6:lengthi5e4:name9:hello.txte");
//!
//! let decoded = decode(&encoded).unwrap();
//! assert_eq!(decoded.get(b"length").and_then(Value::as_integer), Some(5));
//! ```
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod decode;
mod encode;
mod error;
mod value;

pub use decode::decode;
pub use encode::encode;
pub use error::BencodeError;
pub use value::Value;
