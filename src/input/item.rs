use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::io::AsyncRead;

use crate::source::BoxedReader;

/// One thing to put in a torrent: a filesystem path, a buffer, or a stream.
///
/// Buffers and streams have no inherent name; give them one with
/// [`with_name`](Self::with_name) or [`with_full_path`](Self::with_full_path).
/// A name containing `/` places the item in a subdirectory.
pub struct InputItem {
    pub(crate) kind: ItemKind,
    pub(crate) full_path: Option<String>,
    pub(crate) name: Option<String>,
}

pub(crate) enum ItemKind {
    Path(PathBuf),
    Buffer(Bytes),
    Stream(BoxedReader),
}

impl InputItem {
    /// A file or directory on disk. Directories are expanded recursively.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::from_kind(ItemKind::Path(path.into()))
    }

    /// In-memory content.
    pub fn buffer(data: impl Into<Bytes>) -> Self {
        Self::from_kind(ItemKind::Buffer(data.into()))
    }

    /// A stream read once, to the end, while hashing. Its length is not
    /// known until then.
    pub fn stream(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::from_kind(ItemKind::Stream(Box::new(reader)))
    }

    /// Sets the file name. Ignored for paths, which are named after the
    /// filesystem.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the full `/`-separated path, which takes precedence over the name.
    pub fn with_full_path(mut self, full_path: impl Into<String>) -> Self {
        self.full_path = Some(full_path.into());
        self
    }

    pub fn is_path(&self) -> bool {
        matches!(self.kind, ItemKind::Path(_))
    }

    fn from_kind(kind: ItemKind) -> Self {
        Self {
            kind,
            full_path: None,
            name: None,
        }
    }
}

impl fmt::Debug for InputItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("InputItem");
        match &self.kind {
            ItemKind::Path(path) => s.field("path", path),
            ItemKind::Buffer(data) => s.field("buffer_len", &data.len()),
            ItemKind::Stream(_) => s.field("stream", &true),
        };
        s.field("full_path", &self.full_path)
            .field("name", &self.name)
            .finish()
    }
}

/// The input of a build: one or more items, in the order they should
/// appear in the torrent.
///
/// A `None` entry stands for a missing item and makes the build fail before
/// any I/O happens.
#[derive(Debug, Default)]
pub struct Input {
    items: Vec<Option<InputItem>>,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item.
    pub fn push(&mut self, item: InputItem) {
        self.items.push(Some(item));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn into_items(self) -> Vec<Option<InputItem>> {
        self.items
    }
}

impl From<InputItem> for Input {
    fn from(item: InputItem) -> Self {
        Self {
            items: vec![Some(item)],
        }
    }
}

impl From<Option<InputItem>> for Input {
    fn from(item: Option<InputItem>) -> Self {
        Self { items: vec![item] }
    }
}

impl From<Vec<InputItem>> for Input {
    fn from(items: Vec<InputItem>) -> Self {
        Self {
            items: items.into_iter().map(Some).collect(),
        }
    }
}

impl From<Vec<Option<InputItem>>> for Input {
    fn from(items: Vec<Option<InputItem>>) -> Self {
        Self { items }
    }
}

impl From<PathBuf> for Input {
    fn from(path: PathBuf) -> Self {
        InputItem::path(path).into()
    }
}

impl From<&Path> for Input {
    fn from(path: &Path) -> Self {
        InputItem::path(path).into()
    }
}

impl From<Vec<PathBuf>> for Input {
    fn from(paths: Vec<PathBuf>) -> Self {
        paths.into_iter().map(InputItem::path).collect::<Vec<_>>().into()
    }
}

impl FromIterator<InputItem> for Input {
    fn from_iter<I: IntoIterator<Item = InputItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(Some).collect(),
        }
    }
}
