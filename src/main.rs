mod cache;
mod config;
mod data_api;
mod error;
mod models;
mod resolver;
mod routes;
mod source;
mod youtube;

use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use cache::TranscriptCache;
use config::Settings;
use data_api::YouTubeDataClient;
use resolver::TranscriptResolver;
use routes::{create_routes, AppState};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use youtube::YouTubeTranscriptSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("loading settings")?;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
    tracing::info!(environment = %settings.environment, "starting transcript service");

    let source = YouTubeTranscriptSource::new(&settings.youtube_base_url, settings.upstream_timeout)
        .context("building transcript http client")?;
    let resolver = TranscriptResolver::new(Arc::new(source), settings.upstream_timeout);

    let cache = Arc::new(TranscriptCache::new(settings.cache_ttl, settings.cache_capacity));
    cache.connect().await;

    let data = YouTubeDataClient::new(settings.youtube_api_key.clone());
    if !data.has_api_key() {
        tracing::warn!("YOUTUBE_API_KEY is not set; search and playlist routes stay unavailable");
    }

    let state = AppState {
        resolver,
        cache: cache.clone(),
        data,
    };
    let app = create_routes(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&settings.allowed_origins)),
    );

    tracing::info!("Listening on {}", settings.bind_addr);
    axum::Server::bind(&settings.bind_addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")?;

    cache.disconnect().await;
    tracing::info!("shut down cleanly");
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET])
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
