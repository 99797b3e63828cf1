//! Recognition of OS metadata files that should not end up in a torrent.

enum Rule {
    Exact(&'static str),
    Prefix(&'static str),
    Suffix(&'static str),
    Contains(&'static str),
}

const JUNK: &[Rule] = &[
    Rule::Exact("npm-debug.log"),
    // macOS
    Rule::Exact(".DS_Store"),
    Rule::Exact(".AppleDouble"),
    Rule::Exact(".LSOverride"),
    Rule::Exact("Icon\r"),
    Rule::Prefix("._"),
    Rule::Exact(".Spotlight-V100"),
    Rule::Contains(".Trashes"),
    Rule::Exact("__MACOSX"),
    // editors and backups
    Rule::Suffix("~"),
    // Windows
    Rule::Exact("Thumbs.db"),
    Rule::Exact("ehthumbs.db"),
    Rule::Exact("Desktop.ini"),
    Rule::Exact("desktop.ini"),
    // Synology thumbnails
    Rule::Suffix("@eaDir"),
];

/// Whether `name` is a well-known junk file name.
///
/// ```
/// use create_torrent::input::is_junk;
///
/// assert!(is_junk(".DS_Store"));
/// assert!(is_junk("Thumbs.db"));
/// assert!(is_junk(".notes.txt.swp"));
/// assert!(!is_junk("notes.txt"));
/// ```
pub fn is_junk(name: &str) -> bool {
    if is_vim_swap(name) {
        return true;
    }
    JUNK.iter().any(|rule| match rule {
        Rule::Exact(s) => name == *s,
        Rule::Prefix(s) => name.starts_with(s),
        Rule::Suffix(s) => name.ends_with(s),
        Rule::Contains(s) => name.contains(s),
    })
}

/// Whether the final segment of `path` is a hidden junk file.
///
/// Only dot-files are considered: `.DS_Store` is junk here, `Thumbs.db`
/// is not.
pub fn is_junk_path<S: AsRef<str>>(path: &[S]) -> bool {
    path.last().is_some_and(|name| {
        let name = name.as_ref();
        is_hidden(name) && is_junk(name)
    })
}

pub(crate) fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

// `.<anything>.swp`
fn is_vim_swap(name: &str) -> bool {
    name.starts_with('.') && name[1..].ends_with(".swp")
}
