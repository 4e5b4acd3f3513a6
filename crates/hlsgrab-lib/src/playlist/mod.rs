//! Playlist resolution: turning a playlist URL into the ordered list of
//! segment URLs it describes.

mod http;
mod parse;

pub use http::HttpPlaylistResolver;
pub use parse::{ParsedPlaylist, parse_playlist};

use futures::future::BoxFuture;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaylistError {
    #[error("Invalid playlist URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to fetch playlist {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Playlist {url} returned HTTP status {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to parse playlist: {reason}")]
    Parse { reason: String },

    #[error("Master playlist {url} has no playable variants")]
    NoVariants { url: String },

    #[error("Variant playlist {url} is itself a master playlist")]
    NestedMaster { url: String },
}

pub trait PlaylistResolver: Send + Sync {
    /// Returns the absolute segment URLs in playback order.
    fn resolve<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<String>, PlaylistError>>;
}
