//! Playlist fetching.
//!
//! [`PlaylistSource`] is the seam between the resolver and the network:
//! the HTTP implementation fetches once per call (no retries), with a
//! cache-busting query parameter and a per-request timeout.

use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::cache::PlaylistCache;
use crate::error::{ReplayError, Result};
use crate::metrics;

/// Name of the cache-busting query parameter
pub const CACHE_BUST_PARAM: &str = "_";

/// Source of playlist text
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    /// Fetch the playlist body at `url`.
    ///
    /// # Errors
    /// [`ReplayError::PlaylistFetch`] on network failure,
    /// [`ReplayError::PlaylistUnavailable`] on a non-2xx response.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Playlist source backed by the shared reqwest client
#[derive(Clone, Debug)]
pub struct HttpPlaylistSource {
    client: Client,
    cache: PlaylistCache,
    timeout: Duration,
}

impl HttpPlaylistSource {
    pub fn new(client: Client, cache: PlaylistCache, timeout: Duration) -> Self {
        Self {
            client,
            cache,
            timeout,
        }
    }
}

/// Append `_=<epoch ms>` so intermediaries never serve a stale live playlist
pub fn cache_busted(url: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{CACHE_BUST_PARAM}={now}")
}

#[async_trait]
impl PlaylistSource for HttpPlaylistSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        if let Some(body) = self.cache.get(url) {
            return Ok(body);
        }

        let response = self
            .client
            .get(cache_busted(url))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                warn!("Playlist fetch failed for {}: {}", url, e);
                metrics::record_playlist_fetch_error();
                ReplayError::PlaylistFetch(e)
            })?;

        if !response.status().is_success() {
            warn!("Playlist fetch returned {} for {}", response.status(), url);
            metrics::record_playlist_fetch_error();
            return Err(ReplayError::PlaylistUnavailable(url.to_string()));
        }

        let body = response.text().await.map_err(|e| {
            metrics::record_playlist_fetch_error();
            ReplayError::PlaylistFetch(e)
        })?;
        debug!("Received playlist from {} ({} bytes)", url, body.len());

        self.cache.insert(url, body.clone());
        Ok(body)
    }
}
