use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Segment, Variant};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SourceError {
    #[error("transcripts are disabled for this video")]
    TranscriptsDisabled,
    #[error("video is unavailable")]
    VideoUnavailable,
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        SourceError::Other(e.to_string())
    }
}

/// Where transcripts come from.
///
/// `list_variants` returns variants in the source's preference order; the
/// handle of each variant is only meaningful to the same source instance.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn list_variants(&self, video_id: &str) -> Result<Vec<Variant>, SourceError>;

    async fn fetch(&self, variant: &Variant) -> Result<Vec<Segment>, SourceError>;
}
