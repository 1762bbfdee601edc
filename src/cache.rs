//! Short-TTL playlist body cache.
//!
//! Live playlists are re-read by every resolver call and every status
//! monitor tick. A TTL of a couple of seconds collapses bursts of identical
//! fetches while staying close to the live edge.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Clone, Debug)]
struct CachedPlaylist {
    body: String,
    fetched_at: Instant,
}

/// Thread-safe playlist cache keyed by URL (without cache-busting parameters)
#[derive(Clone, Debug)]
pub struct PlaylistCache {
    entries: Arc<DashMap<String, CachedPlaylist>>,
    ttl: Duration,
}

impl PlaylistCache {
    /// A zero TTL disables caching.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Fresh body for `url`, evicting it if stale
    pub fn get(&self, url: &str) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }
        if let Some(entry) = self.entries.get(url) {
            if entry.fetched_at.elapsed() < self.ttl {
                debug!("Playlist cache HIT for {}", url);
                return Some(entry.body.clone());
            }
            drop(entry);
            self.entries.remove(url);
        }
        debug!("Playlist cache MISS for {}", url);
        None
    }

    pub fn insert(&self, url: &str, body: String) {
        if !self.is_enabled() {
            return;
        }
        self.entries.insert(
            url.to_string(),
            CachedPlaylist {
                body,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drop every stale entry
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.fetched_at.elapsed() < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
