use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tokio::io::AsyncWriteExt;

use create_torrent::{create_torrent, TorrentOptions};

/// Create a .torrent file from a file or directory
#[derive(Parser, Debug)]
#[command(name = "create-torrent", author, version, about, long_about = None)]
struct Args {
    /// File or directory to share
    path: Option<PathBuf>,

    /// Write the torrent to this file instead of stdout
    #[arg(short = 'o', long = "outfile", value_name = "FILE")]
    outfile: Option<PathBuf>,

    /// Torrent name (defaults to the file or directory name)
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    comment: Option<String>,

    #[arg(long)]
    created_by: Option<String>,

    /// Tracker URL, each one its own tier (repeatable)
    #[arg(short, long = "announce", value_name = "URL")]
    announce: Vec<String>,

    /// Piece length in bytes (chosen from the content size when omitted)
    #[arg(long, value_name = "BYTES")]
    piece_length: Option<u64>,

    /// Mark the torrent private
    #[arg(long)]
    private: bool,

    /// Web seed URL (repeatable)
    #[arg(long = "url-list", value_name = "URL")]
    url_list: Vec<String>,
}

impl Args {
    fn options(&self) -> TorrentOptions {
        let mut options = TorrentOptions::new();
        if let Some(name) = &self.name {
            options = options.name(name);
        }
        if let Some(comment) = &self.comment {
            options = options.comment(comment);
        }
        if let Some(created_by) = &self.created_by {
            options = options.created_by(created_by);
        }
        if let Some(length) = self.piece_length {
            options = options.piece_length(length);
        }
        if self.private {
            options = options.private(true);
        }
        for url in &self.announce {
            options = options.announce(url);
        }
        for url in &self.url_list {
            options = options.url(url);
        }
        options
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let Some(path) = args.path.clone() else {
        Args::command().print_help()?;
        return Ok(());
    };

    let torrent = create_torrent(path.clone(), args.options())
        .await
        .with_context(|| format!("failed to create torrent from {}", path.display()))?;

    match &args.outfile {
        Some(outfile) => tokio::fs::write(outfile, &torrent)
            .await
            .with_context(|| format!("failed to write {}", outfile.display()))?,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&torrent).await.context("failed to write stdout")?;
            stdout.flush().await.context("failed to write stdout")?;
        }
    }

    tracing::debug!(bytes = torrent.len(), "torrent written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use create_torrent::bencode::Value;
    use create_torrent::{build_metadata, InputItem};

    use super::*;

    async fn build(argv: &[&str]) -> create_torrent::TorrentMetadata {
        let args = Args::try_parse_from(argv).unwrap();
        let options = args.options().creation_date(1);
        build_metadata(InputItem::buffer(&b"data"[..]).with_name("f.txt"), &options)
            .await
            .unwrap()
    }

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_path_is_optional() {
        let args = Args::try_parse_from(["create-torrent"]).unwrap();
        assert!(args.path.is_none());
        assert!(args.outfile.is_none());
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(Args::try_parse_from(["create-torrent", "x", "--bogus"]).is_err());
    }

    #[tokio::test]
    async fn test_flags_map_to_options() {
        let metadata = build(&[
            "create-torrent",
            "ignored",
            "--name",
            "renamed",
            "--comment",
            "hi",
            "--created-by",
            "me",
            "-a",
            "http://a/announce",
            "--announce",
            "http://b/announce",
            "--piece-length",
            "32768",
            "--private",
            "--url-list",
            "https://seed/f.txt",
        ])
        .await;
        let info = metadata.info().unwrap();

        assert_eq!(info.get(b"name").unwrap().as_str(), Some("renamed"));
        assert_eq!(info.get(b"piece length").unwrap().as_integer(), Some(32768));
        assert_eq!(info.get(b"private").unwrap().as_integer(), Some(1));
        assert_eq!(metadata.get(b"comment").unwrap().as_str(), Some("hi"));
        assert_eq!(metadata.get(b"created by").unwrap().as_str(), Some("me"));
        assert_eq!(
            metadata.get(b"url-list").unwrap(),
            &Value::string_list(&["https://seed/f.txt"])
        );
        let tiers = metadata.get(b"announce-list").unwrap().as_list().unwrap();
        assert_eq!(tiers[0], Value::string_list(&["http://a/announce"]));
        assert_eq!(tiers[1], Value::string_list(&["http://b/announce"]));
    }

    #[tokio::test]
    async fn test_no_flags_leave_options_unset() {
        let metadata = build(&["create-torrent", "ignored"]).await;

        assert!(metadata.get(b"comment").is_none());
        assert!(metadata.get(b"url-list").is_none());
        assert!(metadata.info().unwrap().get(b"private").is_none());
    }
}
