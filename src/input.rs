//! Input normalization.
//!
//! [`parse_input`] turns whatever the caller handed over (paths, buffers,
//! streams, in any mix) into the ordered list of
//! [`FileDescriptor`]s that make up the torrent, and decides the torrent's
//! name and whether it is a single-file torrent.
//!
//! # Naming
//!
//! Buffers and streams are placed at their full path or name. Unnamed ones
//! become `Unknown File N`, where N is their 1-based input position. When
//! every named item lives under the same first directory (say `dir/a.txt`
//! and `dir/b.txt`), that directory becomes the torrent name and is
//! stripped from the file paths.
//!
//! The torrent name is, in order of preference: the `name` option, the
//! shared directory, the name of the first path or named item, or
//! `Unnamed Torrent <millis>`.
//!
//! # Layout
//!
//! A torrent is single-file when exactly one item remains after filtering
//! and it is a buffer, a stream, or a path to a regular file. A lone
//! directory always produces a multi-file torrent.
//!
//! # Examples
//!
//! ```
//! use create_torrent::{parse_input, InputItem, TorrentOptions};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), create_torrent::CreateError> {
//! let parsed = parse_input(
//!     vec![
//!         InputItem::buffer(&b"a"[..]).with_name("dir/a.txt"),
//!         InputItem::buffer(&b"b"[..]).with_name("dir/b.txt"),
//!     ],
//!     &TorrentOptions::new(),
//! )
//! .await?;
//!
//! assert_eq!(parsed.name, "dir");
//! assert!(!parsed.single_file);
//! assert_eq!(parsed.files[0].path, ["a.txt"]);
//! # Ok(())
//! # }
//! ```

mod item;
mod junk;
mod walk;

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use futures::{stream, StreamExt, TryStreamExt};

pub use item::{Input, InputItem};
pub use junk::{is_junk, is_junk_path};
pub use walk::WALK_CONCURRENCY;

use item::ItemKind;
use crate::error::CreateError;
use crate::metainfo::TorrentOptions;
use crate::source::{ByteSource, FileDescriptor};

/// Maximum number of input items resolved concurrently.
pub const MAX_PARALLEL_ITEMS: usize = 8;

const HAS_FILESYSTEM: bool = !cfg!(target_family = "wasm");

/// The normalized input of a build.
#[derive(Debug)]
pub struct ParsedInput {
    /// Torrent name.
    pub name: String,
    /// Files in torrent order.
    pub files: Vec<FileDescriptor>,
    /// Whether the metainfo uses the single-file layout.
    pub single_file: bool,
}

impl ParsedInput {
    /// Sum of the known file lengths. Streams count as zero.
    pub fn estimated_length(&self) -> u64 {
        self.files
            .iter()
            .fold(0u64, |total, f| total.saturating_add(f.length))
    }
}

/// An input item together with its declared torrent path.
struct Pending {
    item: InputItem,
    path: Vec<String>,
    unknown_name: bool,
}

/// Normalizes `input` into an ordered file list without reading any file
/// content.
///
/// Directories are walked and files are stat'ed, but nothing is hashed.
pub async fn parse_input(
    input: impl Into<Input>,
    options: &TorrentOptions,
) -> Result<ParsedInput, CreateError> {
    let items = input.into().into_items();
    if items.is_empty() {
        return Err(CreateError::invalid("no input given"));
    }

    let mut items = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            item.ok_or_else(|| CreateError::invalid(format!("input item {} is missing", i + 1)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if !HAS_FILESYSTEM && items.iter().any(InputItem::is_path) {
        return Err(CreateError::UnsupportedEnvironment(
            "filesystem paths need a filesystem",
        ));
    }

    // A lone unnamed buffer or stream is named after the torrent.
    if let [item] = items.as_mut_slice() {
        if !item.is_path() && item.name.is_none() {
            item.name = options.name.clone();
        }
    }

    let total = items.len();
    let mut pending = Vec::with_capacity(total);
    for (i, item) in items.into_iter().enumerate() {
        pending.push(declare(item, i).await?);
    }

    let prefix = common_prefix(&pending, total);

    if options.filter_junk_files {
        pending.retain(|p| p.item.is_path() || !is_junk_path(&p.path));
    }

    if prefix.is_some() {
        for p in pending.iter_mut().filter(|p| !p.item.is_path()) {
            p.path.remove(0);
        }
    }

    let name = options
        .name
        .clone()
        .or_else(|| prefix.clone())
        .or_else(|| first_name(&pending))
        .unwrap_or_else(unnamed);
    if name.is_empty() {
        return Err(CreateError::invalid("torrent name is empty"));
    }

    let path_count = pending.iter().filter(|p| p.item.is_path()).count();
    let single_file = match pending.as_slice() {
        [only] => match &only.item.kind {
            ItemKind::Path(path) => is_regular_file(path).await?,
            _ => true,
        },
        _ => false,
    };
    let keep_root = path_count > 1 || single_file;

    let resolved: Vec<Vec<FileDescriptor>> = stream::iter(pending)
        .map(|p| resolve(p, keep_root))
        .buffered(MAX_PARALLEL_ITEMS)
        .try_collect()
        .await?;
    let files: Vec<FileDescriptor> = resolved.into_iter().flatten().collect();

    if files.is_empty() {
        return Err(CreateError::invalid("no files to include"));
    }
    for file in &files {
        validate_path(&file.path)?;
    }

    tracing::debug!(%name, files = files.len(), single_file, "parsed input");
    Ok(ParsedInput {
        name,
        files,
        single_file,
    })
}

/// Works out the declared path of an item.
///
/// Paths such as `.` have no final component of their own, so they are
/// resolved to their canonical form first.
async fn declare(mut item: InputItem, position: usize) -> Result<Pending, CreateError> {
    if let ItemKind::Path(path) = &mut item.kind {
        if path.file_name().is_none() {
            *path = tokio::fs::canonicalize(&*path)
                .await
                .map_err(|e| CreateError::io_at(&*path, e))?;
        }
        return Ok(Pending {
            item,
            path: Vec::new(),
            unknown_name: false,
        });
    }

    let declared = item
        .full_path
        .as_deref()
        .or(item.name.as_deref())
        .filter(|p| !p.is_empty())
        .map(split_declared);

    Ok(match declared {
        Some(path) => Pending {
            item,
            path,
            unknown_name: false,
        },
        None => Pending {
            item,
            path: vec![format!("Unknown File {}", position + 1)],
            unknown_name: true,
        },
    })
}

fn split_declared(path: &str) -> Vec<String> {
    let mut segments: Vec<String> = path.split('/').map(String::from).collect();
    if segments.len() > 1 && segments[0].is_empty() {
        segments.remove(0);
    }
    segments
}

/// The first directory shared by every named buffer or stream, if any.
///
/// The first item seeds the prefix; any later item with a single-segment
/// path or a different first segment clears it.
fn common_prefix(pending: &[Pending], total: usize) -> Option<String> {
    let mut prefix: Option<String> = None;
    for (i, p) in pending.iter().enumerate() {
        if p.item.is_path() {
            continue;
        }
        if p.path.len() < 2 {
            prefix = None;
        } else if i == 0 && total > 1 {
            prefix = Some(p.path[0].clone());
        } else if prefix.as_deref() != Some(p.path[0].as_str()) {
            prefix = None;
        }
    }
    prefix
}

fn first_name(pending: &[Pending]) -> Option<String> {
    pending.iter().find_map(|p| match &p.item.kind {
        ItemKind::Path(path) => Some(base_name(path)),
        _ if !p.unknown_name => p.path.last().cloned(),
        _ => None,
    })
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn unnamed() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("Unnamed Torrent {}", millis)
}

async fn is_regular_file(path: &Path) -> Result<bool, CreateError> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| CreateError::io_at(path, e))?;
    Ok(meta.is_file())
}

async fn resolve(pending: Pending, keep_root: bool) -> Result<Vec<FileDescriptor>, CreateError> {
    let Pending { item, path, .. } = pending;
    match item.kind {
        ItemKind::Path(root) => walk::walk(&root, keep_root).await,
        ItemKind::Buffer(data) => Ok(vec![FileDescriptor::from_bytes(path, data)]),
        ItemKind::Stream(reader) => Ok(vec![FileDescriptor::new(
            path,
            0,
            ByteSource::Stream(reader),
        )]),
    }
}

fn validate_path(path: &[String]) -> Result<(), CreateError> {
    if path.is_empty() {
        return Err(CreateError::invalid("file has an empty path"));
    }
    for component in path {
        if component.is_empty() || component == "." || component == ".." {
            return Err(CreateError::invalid(format!(
                "invalid path component {:?} in {}",
                component,
                path.join("/")
            )));
        }
    }
    Ok(())
}
