pub mod handlers;
pub mod state;

use crate::config::Config;
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    response::Response,
    routing::{get, post},
};
use state::AppState;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Header carrying the crate version on every response
pub const VERSION_HEADER: &str = "x-livereplay-version";

/// How often idle clip sessions and stale playlist bodies are swept
const CLEANUP_INTERVAL: Duration = Duration::from_secs(30);

async fn add_version_header(mut response: Response) -> Response {
    response.headers_mut().insert(
        VERSION_HEADER,
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );
    response
}

/// Periodically drop expired clip sessions (stopping their monitors) and cache entries
fn spawn_cleanup(state: AppState) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            ticker.tick().await;
            state.clips.cleanup_expired();
            state.playlist_cache.purge_expired();
        }
    });
}

/// Build the application router with all routes and middleware
///
/// # Errors
/// Fails when the shared application state cannot be created.
pub async fn build_router(config: Config) -> Result<Router, Box<dyn std::error::Error>> {
    let state = AppState::new(config)?;
    spawn_cleanup(state.clone());

    let app = Router::new()
        .route("/", get(handlers::health::health_check))
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::serve_metrics))
        .route("/api/replay", get(handlers::replay::resolve_replay))
        .route(
            "/api/streams/{stream}/playlist",
            get(handlers::streams::stream_playlist),
        )
        .route(
            "/api/streams/{stream}/links",
            get(handlers::streams::stream_links),
        )
        .route(
            "/api/streams/{stream}/cutout",
            get(handlers::streams::stream_cutout),
        )
        .route("/api/clips", post(handlers::clips::create_clip))
        .route(
            "/api/clips/{id}",
            get(handlers::clips::get_clip).delete(handlers::clips::delete_clip),
        )
        .route("/api/clips/{id}/cue-in", post(handlers::clips::set_cue_in))
        .route("/api/clips/{id}/cue-out", post(handlers::clips::set_cue_out))
        .route("/api/clips/{id}/share", post(handlers::clips::share_clip))
        .route("/api/clips/{id}/seek", post(handlers::clips::seek_clip))
        .route("/api/clips/{id}/status", get(handlers::clips::clip_status))
        .route("/demo/vod/{file}", get(handlers::demo::serve_demo_playlist))
        .layer(middleware::map_response(add_version_header))
        .layer(CorsLayer::permissive())
        .with_state(state);

    Ok(app)
}

/// Start the Axum HTTP server
pub async fn start(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("0.0.0.0:{}", config.port);

    let app = build_router(config).await?;

    // Bind TCP listener
    let listener = match tokio::net::TcpListener::bind(addr.as_str()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    info!("Server listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
