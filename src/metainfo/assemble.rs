use std::collections::BTreeMap;
use std::time::SystemTime;

use bytes::Bytes;
use sha1::{Digest, Sha1};

use super::announce::{env_announce, resolve_tiers};
use super::options::{unix_seconds_ceil, TorrentOptions};
use crate::bencode::{encode, Value};
use crate::error::CreateError;
use crate::input::ParsedInput;
use crate::piece::PieceList;
use crate::source::FileDescriptor;

/// An assembled metainfo dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentMetadata {
    root: Value,
}

impl TorrentMetadata {
    pub(crate) fn from_root(root: Value) -> Self {
        Self { root }
    }

    /// Looks up a top-level key such as `announce` or `creation date`.
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        self.root.get(key)
    }

    pub fn info(&self) -> Option<&Value> {
        self.get(b"info")
    }

    /// SHA-1 of the bencoded info dictionary.
    pub fn info_hash(&self) -> Option<[u8; 20]> {
        let info = self.info()?;
        Some(Sha1::digest(encode(info)).into())
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    /// Bencodes the dictionary.
    pub fn to_bytes(&self) -> Vec<u8> {
        encode(&self.root)
    }
}

/// Builds the metainfo dictionary from a hashed input.
pub(crate) fn assemble(
    parsed: &ParsedInput,
    piece_length: u64,
    pieces: PieceList,
    options: &TorrentOptions,
) -> Result<TorrentMetadata, CreateError> {
    let mut info = BTreeMap::new();
    info.insert(Bytes::from_static(b"name"), Value::string(&parsed.name));
    if let Some(private) = options.private {
        info.insert(
            Bytes::from_static(b"private"),
            Value::Integer(i64::from(private)),
        );
    }
    info.extend(options.info.iter().map(|(k, v)| (k.clone(), v.clone())));
    if let Some(cert) = &options.ssl_cert {
        info.insert(Bytes::from_static(b"ssl-cert"), Value::Bytes(cert.clone()));
    }
    info.insert(
        Bytes::from_static(b"piece length"),
        Value::Integer(to_integer(piece_length, "piece length")?),
    );
    info.insert(Bytes::from_static(b"pieces"), Value::Bytes(pieces.hashes));
    if parsed.single_file {
        info.insert(
            Bytes::from_static(b"length"),
            Value::Integer(to_integer(pieces.total_length, "total length")?),
        );
    } else {
        info.insert(
            Bytes::from_static(b"files"),
            Value::List(files_list(&parsed.files)?),
        );
    }

    let mut root = BTreeMap::new();
    root.insert(Bytes::from_static(b"info"), Value::Dict(info));

    let creation_date = options
        .creation_date
        .unwrap_or_else(|| unix_seconds_ceil(SystemTime::now()));
    root.insert(
        Bytes::from_static(b"creation date"),
        Value::Integer(creation_date),
    );
    root.insert(Bytes::from_static(b"encoding"), Value::string("UTF-8"));

    let tiers = resolve_tiers(
        options.announce.as_deref(),
        options.announce_list.as_deref(),
        &env_announce(),
    );
    if let Some(first) = tiers.first().and_then(|tier| tier.first()) {
        root.insert(Bytes::from_static(b"announce"), Value::string(first));
        let list = tiers.iter().map(|tier| Value::string_list(tier)).collect();
        root.insert(Bytes::from_static(b"announce-list"), Value::List(list));
    }

    if let Some(comment) = &options.comment {
        root.insert(Bytes::from_static(b"comment"), Value::string(comment));
    }
    if let Some(created_by) = &options.created_by {
        root.insert(Bytes::from_static(b"created by"), Value::string(created_by));
    }
    if let Some(urls) = &options.url_list {
        root.insert(Bytes::from_static(b"url-list"), Value::string_list(urls));
    }

    Ok(TorrentMetadata::from_root(Value::Dict(root)))
}

fn files_list(files: &[FileDescriptor]) -> Result<Vec<Value>, CreateError> {
    files
        .iter()
        .map(|file| {
            let mut entry = BTreeMap::new();
            entry.insert(
                Bytes::from_static(b"length"),
                Value::Integer(to_integer(file.length, "file length")?),
            );
            entry.insert(
                Bytes::from_static(b"path"),
                Value::string_list(&file.path),
            );
            Ok(Value::Dict(entry))
        })
        .collect()
}

/// Bencode integers are signed 64-bit.
pub(crate) fn to_integer(value: u64, what: &str) -> Result<i64, CreateError> {
    i64::try_from(value).map_err(|_| {
        CreateError::invalid(format!(
            "{} {} does not fit in a bencode integer",
            what, value
        ))
    })
}
