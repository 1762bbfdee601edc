use crate::{
    cache::PlaylistCache,
    clips::ClipManager,
    config::Config,
    error::{ReplayError, Result},
    hls::{HttpPlaylistSource, PlaylistSource},
    replay::{ReplayLocations, Resolver},
};
use metrics_exporter_prometheus::PrometheusHandle;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Shared HTTP client for connection pooling
    pub http_client: Client,
    /// Playlist fetcher used by the resolver and the status monitors
    pub playlists: Arc<dyn PlaylistSource>,
    /// Body cache behind `playlists`, purged by the cleanup task
    pub playlist_cache: PlaylistCache,
    /// Bucket and page locations derived from the configuration
    pub locations: Arc<ReplayLocations>,
    /// Clip sessions with their status monitors
    pub clips: ClipManager,
    pub started_at: Instant,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new AppState with the given configuration
    ///
    /// # Errors
    /// [`ReplayError::Internal`] when the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let http_client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| ReplayError::Internal(format!("failed to create HTTP client: {e}")))?;

        let cache = PlaylistCache::new(Duration::from_millis(config.playlist_cache_ttl_ms));
        let playlists: Arc<dyn PlaylistSource> = Arc::new(HttpPlaylistSource::new(
            http_client.clone(),
            cache.clone(),
            config.fetch_timeout(),
        ));

        let clips = ClipManager::new(Duration::from_secs(config.clip_ttl_secs));
        let locations = Arc::new(ReplayLocations::from(&config));

        Ok(Self {
            config: Arc::new(config),
            http_client,
            playlists,
            playlist_cache: cache,
            locations,
            clips,
            started_at: Instant::now(),
            metrics: crate::metrics::install(),
        })
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self.playlists.as_ref(), self.locations.as_ref())
    }
}
