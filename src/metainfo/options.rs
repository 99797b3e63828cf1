use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use crate::bencode::Value;
use crate::piece::{PieceHasher, ProgressFn};

/// Settings for one torrent build.
///
/// Everything is optional. Fields that are left unset are omitted from the
/// metainfo file, except for the tracker list, which falls back to
/// [`DEFAULT_ANNOUNCE_LIST`](super::DEFAULT_ANNOUNCE_LIST), and the creation
/// date, which defaults to now.
///
/// ```
/// use create_torrent::TorrentOptions;
///
/// let options = TorrentOptions::new()
///     .name("My Torrent")
///     .piece_length(262144)
///     .announce("udp://tracker.example.com:80")
///     .comment("Created with create-torrent")
///     .private(true);
/// assert_eq!(options.get_name(), Some("My Torrent"));
/// ```
#[derive(Clone)]
pub struct TorrentOptions {
    pub(crate) name: Option<String>,
    pub(crate) piece_length: Option<u64>,
    pub(crate) announce: Option<Vec<String>>,
    pub(crate) announce_list: Option<Vec<Vec<String>>>,
    pub(crate) comment: Option<String>,
    pub(crate) created_by: Option<String>,
    pub(crate) creation_date: Option<i64>,
    pub(crate) private: Option<bool>,
    pub(crate) info: BTreeMap<Bytes, Value>,
    pub(crate) ssl_cert: Option<Bytes>,
    pub(crate) url_list: Option<Vec<String>>,
    pub(crate) filter_junk_files: bool,
    pub(crate) on_progress: Option<ProgressFn>,
    pub(crate) hasher: Option<Arc<dyn PieceHasher>>,
}

impl Default for TorrentOptions {
    fn default() -> Self {
        Self {
            name: None,
            piece_length: None,
            announce: None,
            announce_list: None,
            comment: None,
            created_by: None,
            creation_date: None,
            private: None,
            info: BTreeMap::new(),
            ssl_cert: None,
            url_list: None,
            filter_junk_files: true,
            on_progress: None,
            hasher: None,
        }
    }
}

impl TorrentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the torrent name.
    ///
    /// For single-file torrents this is also the file name; otherwise it is
    /// the root directory.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the piece length in bytes.
    ///
    /// When unset, a length is derived from the total content size with
    /// [`calc_piece_length`](crate::piece::calc_piece_length).
    pub fn piece_length(mut self, length: u64) -> Self {
        self.piece_length = Some(length);
        self
    }

    /// Adds a tracker URL. Each URL becomes its own tier, ahead of any
    /// [`announce_list`](Self::announce_list) tiers.
    pub fn announce(mut self, url: impl Into<String>) -> Self {
        self.announce.get_or_insert_with(Vec::new).push(url.into());
        self
    }

    /// Sets the tracker tiers ([BEP-12]).
    ///
    /// An empty list disables the default trackers without adding any.
    ///
    /// [BEP-12]: http://bittorrent.org/beps/bep_0012.html
    pub fn announce_list(mut self, tiers: Vec<Vec<String>>) -> Self {
        self.announce_list = Some(tiers);
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    /// Sets the creation date as a Unix timestamp in seconds.
    pub fn creation_date(mut self, timestamp: i64) -> Self {
        self.creation_date = Some(timestamp);
        self
    }

    /// Sets the creation date from a [`SystemTime`], rounding up to the next
    /// whole second.
    pub fn creation_time(self, time: SystemTime) -> Self {
        self.creation_date(unix_seconds_ceil(time))
    }

    /// Marks the torrent private (or explicitly public) in the info
    /// dictionary ([BEP-27]).
    ///
    /// [BEP-27]: http://bittorrent.org/beps/bep_0027.html
    pub fn private(mut self, private: bool) -> Self {
        self.private = Some(private);
        self
    }

    /// Adds a raw field to the info dictionary.
    ///
    /// Extra fields change the info hash, which is how private trackers
    /// tell cross-seeded copies apart (for example a `source` field).
    pub fn info_field(mut self, key: impl Into<Bytes>, value: Value) -> Self {
        self.info.insert(key.into(), value);
        self
    }

    /// Sets the certificate for SSL torrents (`ssl-cert` in the info
    /// dictionary).
    pub fn ssl_cert(mut self, cert: impl Into<Bytes>) -> Self {
        self.ssl_cert = Some(cert.into());
        self
    }

    /// Adds a web seed URL ([BEP-19]).
    ///
    /// [BEP-19]: http://bittorrent.org/beps/bep_0019.html
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url_list.get_or_insert_with(Vec::new).push(url.into());
        self
    }

    /// Sets whether hidden junk files such as `.DS_Store` are skipped.
    /// On by default.
    pub fn filter_junk_files(mut self, filter: bool) -> Self {
        self.filter_junk_files = filter;
        self
    }

    /// Sets a callback receiving `(bytes read, estimated total)` as pieces
    /// are read.
    pub fn on_progress(mut self, on_progress: impl Fn(u64, u64) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(on_progress));
        self
    }

    /// Replaces the SHA-1 piece hasher.
    pub fn hasher(mut self, hasher: Arc<dyn PieceHasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Debug for TorrentOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TorrentOptions")
            .field("name", &self.name)
            .field("piece_length", &self.piece_length)
            .field("announce", &self.announce)
            .field("announce_list", &self.announce_list)
            .field("comment", &self.comment)
            .field("created_by", &self.created_by)
            .field("creation_date", &self.creation_date)
            .field("private", &self.private)
            .field("info", &self.info)
            .field("ssl_cert", &self.ssl_cert.as_ref().map(Bytes::len))
            .field("url_list", &self.url_list)
            .field("filter_junk_files", &self.filter_junk_files)
            .field("on_progress", &self.on_progress.is_some())
            .field("hasher", &self.hasher.is_some())
            .finish()
    }
}

pub(crate) fn unix_seconds_ceil(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64 + i64::from(d.subsec_nanos() > 0))
        .unwrap_or(0)
}
