//! YouTube-backed [`TranscriptSource`].
//!
//! Caption tracks are discovered through the innertube player endpoint and
//! downloaded as timedtext XML.

use std::time::Duration;

use async_trait::async_trait;
use html_escape::decode_html_entities;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::ACCEPT_LANGUAGE;
use serde::Deserialize;
use serde_json::json;

use crate::models::{Segment, Variant, VariantOrigin};
use crate::source::{SourceError, TranscriptSource};

lazy_static! {
    static ref API_KEY_RE: Regex =
        Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).unwrap();
    static ref MARKUP_RE: Regex = Regex::new(r"<[^>]*>").unwrap();
}

const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

pub struct YouTubeTranscriptSource {
    client: reqwest::Client,
    base_url: String,
}

impl YouTubeTranscriptSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn fetch_api_key(&self, video_id: &str) -> Result<String, SourceError> {
        let html = self
            .client
            .get(format!("{}/watch", self.base_url))
            .query(&[("v", video_id)])
            .header(ACCEPT_LANGUAGE, "en-US")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        if html.contains("class=\"g-recaptcha\"") {
            return Err(SourceError::Other(
                "too many requests: the platform is asking for a captcha".to_string(),
            ));
        }

        API_KEY_RE
            .captures(&html)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| SourceError::Other("could not find innertube api key".to_string()))
    }

    async fn fetch_player(&self, video_id: &str, api_key: &str) -> Result<PlayerResponse, SourceError> {
        let body = json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video_id,
        });

        let player = self
            .client
            .post(format!("{}/youtubei/v1/player", self.base_url))
            .query(&[("key", api_key)])
            .header(ACCEPT_LANGUAGE, "en-US")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(player)
    }
}

#[async_trait]
impl TranscriptSource for YouTubeTranscriptSource {
    async fn list_variants(&self, video_id: &str) -> Result<Vec<Variant>, SourceError> {
        let api_key = self.fetch_api_key(video_id).await?;
        let player = self.fetch_player(video_id, &api_key).await?;
        variants_from_player(player)
    }

    async fn fetch(&self, variant: &Variant) -> Result<Vec<Segment>, SourceError> {
        let xml = self
            .client
            .get(&variant.handle)
            .header(ACCEPT_LANGUAGE, "en-US")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_timedtext(&xml)
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<Captions>,
}

#[derive(Deserialize, Debug)]
struct PlayabilityStatus {
    status: String,
    reason: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    name: Option<TrackName>,
    kind: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TrackName {
    simple_text: Option<String>,
    #[serde(default)]
    runs: Vec<TextRun>,
}

#[derive(Deserialize, Debug)]
struct TextRun {
    text: String,
}

fn variants_from_player(player: PlayerResponse) -> Result<Vec<Variant>, SourceError> {
    if let Some(playability) = player.playability_status {
        match playability.status.as_str() {
            "OK" => {}
            "ERROR" => return Err(SourceError::VideoUnavailable),
            other => {
                return Err(SourceError::Other(format!(
                    "video is not playable ({}): {}",
                    other,
                    playability.reason.unwrap_or_default()
                )))
            }
        }
    }

    let tracks = player
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .map(|r| r.caption_tracks)
        .unwrap_or_default();
    if tracks.is_empty() {
        return Err(SourceError::TranscriptsDisabled);
    }

    Ok(tracks
        .into_iter()
        .map(|track| {
            let language = track
                .name
                .and_then(|n| n.simple_text.or_else(|| n.runs.into_iter().next().map(|r| r.text)))
                .unwrap_or_else(|| track.language_code.clone());
            let origin = if track.kind.as_deref() == Some("asr") {
                VariantOrigin::AutoGenerated
            } else {
                VariantOrigin::ManuallyCreated
            };
            Variant {
                language,
                language_code: track.language_code,
                origin,
                handle: track.base_url.replace("&fmt=srv3", ""),
            }
        })
        .collect())
}

fn parse_timedtext(xml: &str) -> Result<Vec<Segment>, SourceError> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| SourceError::Other(format!("invalid timedtext xml: {}", e)))?;
    let mut segments = Vec::new();

    for element in doc.descendants().filter(|n| n.has_tag_name("text")) {
        let start = element
            .attribute("start")
            .ok_or_else(|| SourceError::Other("timedtext element without start".to_string()))
            .and_then(|v| parse_seconds("start", v))?;
        let duration = match element.attribute("dur") {
            Some(v) => parse_seconds("dur", v)?,
            None => 0.0,
        };

        // Captions may carry escaped markup inside the element text.
        let raw: String = element
            .descendants()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect();
        if raw.is_empty() {
            continue;
        }
        let stripped = MARKUP_RE.replace_all(&raw, "");
        let text = decode_html_entities(&stripped).into_owned();

        segments.push(Segment {
            text,
            start,
            duration,
        });
    }

    Ok(segments)
}

fn parse_seconds(name: &str, value: &str) -> Result<f64, SourceError> {
    value
        .parse()
        .map_err(|_| SourceError::Other(format!("invalid timedtext {} value: {:?}", name, value)))
}
