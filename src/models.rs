use serde::{Deserialize, Serialize};

/// One timed unit of transcript text. Times are in seconds.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum VariantOrigin {
    ManuallyCreated,
    AutoGenerated,
}

/// One transcript available for a video, as reported by the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub language: String,
    pub language_code: String,
    pub origin: VariantOrigin,
    /// Source-specific reference used to fetch this variant's segments.
    pub handle: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptFormat {
    #[default]
    Json,
    Text,
}

impl TranscriptFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptFormat::Json => "json",
            TranscriptFormat::Text => "text",
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct TranscriptQuery {
    #[serde(default)]
    pub format: TranscriptFormat,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TranscriptResponse {
    pub video_id: String,
    pub segments: Vec<Segment>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "format", content = "body", rename_all = "lowercase")]
pub enum RenderedTranscript {
    Json(TranscriptResponse),
    Text(String),
}

#[derive(Deserialize, Debug)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_max_results() -> u32 {
    25
}

/// Minimal video metadata from the platform data API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Video {
    #[serde(alias = "id")]
    pub video_id: String,
    pub title: String,
    pub description: Option<String>,
    pub published_at: Option<String>,
}
