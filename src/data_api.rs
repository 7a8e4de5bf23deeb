use std::fmt;

use thiserror::Error;

use crate::models::Video;

/// Platform capabilities the service exposes routes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Search,
    PlaylistTranscripts,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Search => f.write_str("Search"),
            Capability::PlaylistTranscripts => f.write_str("Playlist transcript"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DataApiError {
    #[error("{0} endpoint not yet implemented.")]
    NotImplemented(Capability),
}

/// Client for the platform's metadata API (search, playlists).
#[derive(Clone)]
pub struct YouTubeDataClient {
    api_key: String,
}

impl YouTubeDataClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub async fn search(&self, query: &str, max_results: u32) -> Result<Vec<Video>, DataApiError> {
        tracing::debug!(query, max_results, "search requested");
        Err(DataApiError::NotImplemented(Capability::Search))
    }

    pub async fn playlist_items(&self, playlist_id: &str) -> Result<Vec<Video>, DataApiError> {
        tracing::debug!(playlist_id, "playlist items requested");
        Err(DataApiError::NotImplemented(Capability::PlaylistTranscripts))
    }
}
