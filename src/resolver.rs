use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{ResolveError, Stage};
use crate::models::{
    RenderedTranscript, Segment, TranscriptFormat, TranscriptResponse, Variant, VariantOrigin,
};
use crate::source::{SourceError, TranscriptSource};

/// Picks a variant out of a listing, or passes.
pub type Strategy = fn(&[Variant]) -> Option<&Variant>;

/// Candidate strategies, tried in order until one matches.
pub const SELECTION_ORDER: &[(&str, Strategy)] = &[
    ("manually_created", manually_created),
    ("auto_generated", auto_generated),
];

pub fn manually_created(variants: &[Variant]) -> Option<&Variant> {
    first_with_origin(variants, VariantOrigin::ManuallyCreated)
}

pub fn auto_generated(variants: &[Variant]) -> Option<&Variant> {
    first_with_origin(variants, VariantOrigin::AutoGenerated)
}

fn first_with_origin(variants: &[Variant], origin: VariantOrigin) -> Option<&Variant> {
    variants.iter().find(|v| v.origin == origin)
}

pub fn select_variant(variants: &[Variant]) -> Option<&Variant> {
    SELECTION_ORDER.iter().find_map(|(name, strategy)| {
        let found = strategy(variants);
        if found.is_none() {
            info!(strategy = name, "no matching transcript variant");
        }
        found
    })
}

/// Plain text is one line per segment, in order, with no trailing newline.
pub fn render(video_id: &str, segments: Vec<Segment>, format: TranscriptFormat) -> RenderedTranscript {
    match format {
        TranscriptFormat::Json => RenderedTranscript::Json(TranscriptResponse {
            video_id: video_id.to_string(),
            segments,
        }),
        TranscriptFormat::Text => RenderedTranscript::Text(
            segments
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        ),
    }
}

/// Decides which transcript to serve for a video and renders it.
#[derive(Clone)]
pub struct TranscriptResolver {
    source: Arc<dyn TranscriptSource>,
    timeout: Duration,
}

impl TranscriptResolver {
    pub fn new(source: Arc<dyn TranscriptSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    pub async fn resolve(
        &self,
        video_id: &str,
        format: TranscriptFormat,
    ) -> Result<RenderedTranscript, ResolveError> {
        let variants = match self.bounded(self.source.list_variants(video_id)).await {
            Ok(variants) => variants,
            Err(StageFailure::Source(SourceError::TranscriptsDisabled)) => {
                warn!(video_id, "transcripts disabled");
                return Err(ResolveError::TranscriptsDisabled);
            }
            Err(StageFailure::Source(SourceError::VideoUnavailable)) => {
                warn!(video_id, "video unavailable");
                return Err(ResolveError::NoTranscriptAvailable);
            }
            Err(failure) => return Err(self.internal(video_id, Stage::ListVariants, failure)),
        };

        let Some(variant) = select_variant(&variants) else {
            warn!(video_id, "no transcript found (manual or generated)");
            return Err(ResolveError::NoTranscriptAvailable);
        };
        info!(
            video_id,
            origin = ?variant.origin,
            language = %variant.language_code,
            "transcript variant selected"
        );

        let segments = self
            .bounded(self.source.fetch(variant))
            .await
            .map_err(|failure| self.internal(video_id, Stage::FetchSegments, failure))?;

        Ok(render(video_id, segments, format))
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, SourceError>>,
    ) -> Result<T, StageFailure> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(StageFailure::Source),
            Err(_) => Err(StageFailure::TimedOut(self.timeout)),
        }
    }

    fn internal(&self, video_id: &str, stage: Stage, failure: StageFailure) -> ResolveError {
        let cause = match failure {
            StageFailure::Source(e) => e.to_string(),
            StageFailure::TimedOut(after) => format!("{} timed out after {:?}", stage, after),
        };
        tracing::error!(video_id, %stage, error = %cause, "transcript resolution failed");
        ResolveError::Internal { stage, cause }
    }
}

enum StageFailure {
    Source(SourceError),
    TimedOut(Duration),
}
