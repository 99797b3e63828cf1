use std::path::{Component, Path, PathBuf};

use futures::future::BoxFuture;
use futures::{stream, FutureExt, StreamExt, TryStreamExt};

use super::junk::{is_hidden, is_junk};
use crate::error::CreateError;
use crate::source::{ByteSource, FileDescriptor};

/// Maximum number of directory entries examined concurrently.
pub const WALK_CONCURRENCY: usize = 16;

/// Expands `root` into file descriptors.
///
/// A regular file yields one descriptor named after the file. A directory
/// yields every regular file below it, sorted by name at each level, with
/// hidden and junk entries skipped. With `keep_root` the directory's own
/// name is the first path segment; otherwise paths start inside it.
pub(crate) async fn walk(root: &Path, keep_root: bool) -> Result<Vec<FileDescriptor>, CreateError> {
    let entries = collect(root.to_path_buf()).await?;

    let root_is_file = matches!(entries.as_slice(), [(path, _)] if path == root);
    let base = if keep_root || root_is_file {
        root.parent().unwrap_or(root)
    } else {
        root
    };

    let files = entries
        .into_iter()
        .map(|(path, length)| {
            let segments = relative_segments(&path, base)?;
            Ok(FileDescriptor::new(segments, length, ByteSource::Path(path)))
        })
        .collect::<Result<Vec<_>, CreateError>>()?;

    tracing::debug!(root = %root.display(), files = files.len(), "walked path");
    Ok(files)
}

/// Lists `(path, length)` for every regular file at or below `path`.
fn collect(path: PathBuf) -> BoxFuture<'static, Result<Vec<(PathBuf, u64)>, CreateError>> {
    async move {
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| CreateError::io_at(&path, e))?;

        if meta.is_file() {
            return Ok(vec![(path, meta.len())]);
        }
        if !meta.is_dir() {
            tracing::trace!(path = %path.display(), "skipping special file");
            return Ok(Vec::new());
        }

        let mut dir = tokio::fs::read_dir(&path)
            .await
            .map_err(|e| CreateError::io_at(&path, e))?;
        let mut names = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| CreateError::io_at(&path, e))?
        {
            let name = entry.file_name();
            let skip = name
                .to_str()
                .is_some_and(|name| is_hidden(name) || is_junk(name));
            if !skip {
                names.push(name);
            }
        }
        names.sort();

        let nested: Vec<Vec<(PathBuf, u64)>> = stream::iter(names)
            .map(|name| collect(path.join(name)))
            .buffered(WALK_CONCURRENCY)
            .try_collect()
            .await?;

        Ok(nested.into_iter().flatten().collect())
    }
    .boxed()
}

fn relative_segments(path: &Path, base: &Path) -> Result<Vec<String>, CreateError> {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s),
            _ => None,
        })
        .map(|s| {
            s.to_str().map(String::from).ok_or_else(|| {
                CreateError::invalid(format!("path is not valid UTF-8: {}", path.display()))
            })
        })
        .collect()
}
