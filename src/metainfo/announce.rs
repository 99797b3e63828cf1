/// Trackers used when neither `announce` nor `announce_list` is given.
/// Each URL is its own tier.
pub const DEFAULT_ANNOUNCE_LIST: &[&str] = &[
    "udp://tracker.leechers-paradise.org:6969",
    "udp://tracker.coppersurfer.tk:6969",
    "udp://tracker.opentrackr.org:1337",
    "udp://explodie.org:6969",
    "udp://tracker.empire-js.us:1337",
    "wss://tracker.btorrent.xyz",
    "wss://tracker.openwebtorrent.com",
];

/// Environment variable holding extra tracker URLs, separated by commas or
/// whitespace. Each URL is added as its own tier to every torrent.
pub const ANNOUNCE_ENV: &str = "WEBTORRENT_ANNOUNCE";

/// Tracker URLs from [`ANNOUNCE_ENV`], in order.
pub fn env_announce() -> Vec<String> {
    std::env::var(ANNOUNCE_ENV)
        .map(|value| parse_announce_env(&value))
        .unwrap_or_default()
}

pub(crate) fn parse_announce_env(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|url| !url.is_empty())
        .map(String::from)
        .collect()
}

/// Resolves the tracker tiers of a torrent.
///
/// With neither source given, the defaults are used. Otherwise every
/// `announce` URL becomes a tier of its own, followed by the
/// `announce_list` tiers. Blank URLs and tiers left empty are dropped.
///
/// ```
/// use create_torrent::metainfo::announce_tiers;
///
/// let announce = vec!["wss://a.example".to_string()];
/// let list = vec![vec!["wss://b.example".to_string(), "".to_string()]];
/// assert_eq!(
///     announce_tiers(Some(&announce), Some(&list)),
///     vec![vec!["wss://a.example"], vec!["wss://b.example"]],
/// );
/// ```
pub fn announce_tiers(
    announce: Option<&[String]>,
    announce_list: Option<&[Vec<String>]>,
) -> Vec<Vec<String>> {
    resolve_tiers(announce, announce_list, &[])
}

/// Like [`announce_tiers`], with `extra` URLs appended as one tier each
/// after the caller's tiers and before any defaults.
pub(crate) fn resolve_tiers(
    announce: Option<&[String]>,
    announce_list: Option<&[Vec<String>]>,
    extra: &[String],
) -> Vec<Vec<String>> {
    let use_defaults = announce.is_none() && announce_list.is_none();

    let single = announce.unwrap_or_default().iter().map(std::slice::from_ref);
    let tiers = announce_list.unwrap_or_default().iter().map(Vec::as_slice);
    let extra = extra.iter().map(std::slice::from_ref);

    let mut resolved: Vec<Vec<String>> = single
        .chain(tiers)
        .chain(extra)
        .map(|tier| {
            tier.iter()
                .map(|url| url.trim())
                .filter(|url| !url.is_empty())
                .map(String::from)
                .collect::<Vec<_>>()
        })
        .filter(|tier| !tier.is_empty())
        .collect();

    if use_defaults {
        resolved.extend(DEFAULT_ANNOUNCE_LIST.iter().map(|url| vec![url.to_string()]));
    }
    resolved
}
