use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::info;

use crate::{
    cache::TranscriptCache,
    data_api::YouTubeDataClient,
    error::ApiError,
    models::{RenderedTranscript, SearchQuery, TranscriptQuery, Video},
    resolver::TranscriptResolver,
};

#[derive(Clone)]
pub struct AppState {
    pub resolver: TranscriptResolver,
    pub cache: Arc<TranscriptCache>,
    pub data: YouTubeDataClient,
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/transcripts/:video_id", get(get_transcript))
        .route("/search", get(search_videos))
        .route("/playlists/:playlist_id/transcripts", get(playlist_transcripts))
        .with_state(state)
}

impl IntoResponse for RenderedTranscript {
    fn into_response(self) -> Response {
        match self {
            RenderedTranscript::Json(body) => Json(body).into_response(),
            // text/plain; charset=utf-8
            RenderedTranscript::Text(text) => text.into_response(),
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn get_transcript(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    query: Result<Query<TranscriptQuery>, QueryRejection>,
) -> Result<RenderedTranscript, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::InvalidQuery(e.body_text()))?;
    let format = query.format;
    info!(video_id = %video_id, format = format.as_str(), "transcript requested");

    let cache_key = format!("transcript:{}:{}", format.as_str(), video_id);
    if let Some(hit) = state.cache.get_json::<RenderedTranscript>(&cache_key).await {
        return Ok(hit);
    }

    let rendered = state.resolver.resolve(&video_id, format).await?;
    state.cache.set_json(&cache_key, &rendered).await;
    Ok(rendered)
}

async fn search_videos(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Video>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::InvalidQuery(e.body_text()))?;
    let videos = state.data.search(&query.q, query.max_results).await?;
    Ok(Json(videos))
}

async fn playlist_transcripts(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> Result<Json<Vec<Video>>, ApiError> {
    let videos = state.data.playlist_items(&playlist_id).await?;
    Ok(Json(videos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::models::VariantOrigin;
    use crate::source::{
        testing::{variant, FakeSource},
        SourceError,
    };

    fn app_with(source: Arc<FakeSource>, cache_ttl: Duration) -> (Router, Arc<TranscriptCache>) {
        let cache = Arc::new(TranscriptCache::new(cache_ttl, 16));
        let state = AppState {
            resolver: TranscriptResolver::new(source, Duration::from_secs(5)),
            cache: cache.clone(),
            data: YouTubeDataClient::new(""),
        };
        (create_routes(state), cache)
    }

    fn manual_source() -> Arc<FakeSource> {
        Arc::new(FakeSource::new(Ok(vec![variant("en", VariantOrigin::ManuallyCreated)])))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, content_type, body.to_vec())
    }

    fn json(body: &[u8]) -> serde_json::Value {
        serde_json::from_slice(body).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app_with(manual_source(), Duration::ZERO);
        let (status, _, body) = get(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body), serde_json::json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_get_transcript_json_success() {
        let source = manual_source();
        let (app, _) = app_with(source.clone(), Duration::ZERO);

        let (status, content_type, body) = get(app, "/transcripts/mockedSuccessVideo?format=json").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/json");
        assert_eq!(
            json(&body),
            serde_json::json!({
                "video_id": "mockedSuccessVideo",
                "segments": [
                    {"text": "Hello world", "start": 0.5, "duration": 1.5},
                    {"text": "This is a test", "start": 2.0, "duration": 2.5},
                ]
            })
        );
        assert_eq!(*source.listed.lock().unwrap(), vec!["mockedSuccessVideo".to_string()]);
        assert_eq!(source.fetched.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_transcript_text_success() {
        let (app, _) = app_with(manual_source(), Duration::ZERO);

        let (status, content_type, body) = get(app, "/transcripts/mockedSuccessVideo?format=text").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "text/plain; charset=utf-8");
        let text = String::from_utf8(body).unwrap();
        let hello = text.find("Hello world").unwrap();
        let test = text.find("This is a test").unwrap();
        assert!(hello < test);
    }

    #[tokio::test]
    async fn test_default_format_is_json() {
        let (app, _) = app_with(manual_source(), Duration::ZERO);

        let (status, content_type, body) = get(app, "/transcripts/mockedSuccessVideo").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/json");
        assert_eq!(json(&body)["video_id"], "mockedSuccessVideo");
    }

    #[tokio::test]
    async fn test_invalid_format_is_rejected_before_resolving() {
        let source = manual_source();
        let (app, _) = app_with(source.clone(), Duration::ZERO);

        let (status, _, body) = get(app, "/transcripts/any_video_id?format=invalid_format").await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json(&body)["detail"].as_str().unwrap().contains("invalid_format"));
        assert!(source.listed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transcripts_disabled_is_404() {
        let source = Arc::new(FakeSource::new(Err(SourceError::TranscriptsDisabled)));
        let (app, _) = app_with(source, Duration::ZERO);

        let (status, _, body) = get(app, "/transcripts/disabledVideo?format=json").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            json(&body),
            serde_json::json!({ "detail": "Transcripts are disabled for this video." })
        );
    }

    #[tokio::test]
    async fn test_no_transcript_is_404() {
        let source = Arc::new(FakeSource::new(Ok(Vec::new())));
        let (app, _) = app_with(source.clone(), Duration::ZERO);

        let (status, _, body) = get(app, "/transcripts/noTranscriptVideo").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            json(&body),
            serde_json::json!({ "detail": "No transcript found for this video." })
        );
        assert!(source.fetched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generated_only_is_served() {
        let source = Arc::new(FakeSource::new(Ok(vec![variant("en", VariantOrigin::AutoGenerated)])));
        let (app, _) = app_with(source.clone(), Duration::ZERO);

        let (status, _, body) = get(app, "/transcripts/generatedOnlyVideo?format=json").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["segments"].as_array().unwrap().len(), 2);
        assert_eq!(source.fetched.lock().unwrap()[0].origin, VariantOrigin::AutoGenerated);
    }

    #[tokio::test]
    async fn test_listing_error_is_500_with_cause() {
        let source = Arc::new(FakeSource::new(Err(SourceError::Other(
            "Some internal list_transcripts error".to_string(),
        ))));
        let (app, _) = app_with(source, Duration::ZERO);

        let (status, _, body) = get(app, "/transcripts/unexpectedListErrorVideo").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json(&body)["detail"]
            .as_str()
            .unwrap()
            .contains("An unexpected error occurred: Some internal list_transcripts error"));
    }

    #[tokio::test]
    async fn test_fetch_error_is_500_with_cause() {
        let source = Arc::new(
            FakeSource::new(Ok(vec![variant("en", VariantOrigin::ManuallyCreated)]))
                .with_segments(Err(SourceError::Other("Unexpected fetch error".to_string()))),
        );
        let (app, _) = app_with(source, Duration::ZERO);

        let (status, _, body) = get(app, "/transcripts/fetchErrorVideo").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json(&body)["detail"]
            .as_str()
            .unwrap()
            .contains("An unexpected error occurred: Unexpected fetch error"));
    }

    #[tokio::test]
    async fn test_cached_transcript_skips_source() {
        let source = manual_source();
        let (app, cache) = app_with(source.clone(), Duration::from_secs(60));
        cache.connect().await;

        let (first, _, first_body) = get(app.clone(), "/transcripts/cachedVideo").await;
        let (second, _, second_body) = get(app, "/transcripts/cachedVideo").await;

        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::OK);
        assert_eq!(first_body, second_body);
        assert_eq!(source.listed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let (app, _) = app_with(manual_source(), Duration::ZERO);
        let (status, _, _) = get(app, "/search").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_search_not_implemented() {
        let (app, _) = app_with(manual_source(), Duration::ZERO);
        let (status, _, body) = get(app, "/search?q=rust").await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(
            json(&body),
            serde_json::json!({ "detail": "Search endpoint not yet implemented." })
        );
    }

    #[tokio::test]
    async fn test_playlist_transcripts_not_implemented() {
        let (app, _) = app_with(manual_source(), Duration::ZERO);
        let (status, _, body) = get(app, "/playlists/PL123/transcripts").await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(
            json(&body),
            serde_json::json!({ "detail": "Playlist transcript endpoint not yet implemented." })
        );
    }
}
