use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::debug;

use super::monitor::{LiveStatus, MonitorHandle};
use super::session::ClipSession;
use crate::error::{ReplayError, Result};

struct ClipEntry {
    clip: ClipSession,
    monitor: Option<MonitorHandle>,
}

/// In-memory registry of clip sessions and their status monitors
#[derive(Clone)]
pub struct ClipManager {
    clips: Arc<DashMap<String, ClipEntry>>,
    ttl: Duration,
}

impl ClipManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            clips: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Register a clip, replacing (and stopping) any clip with the same id
    pub fn insert(&self, clip: ClipSession, monitor: Option<MonitorHandle>) -> ClipSession {
        let snapshot = clip.clone();
        self.clips
            .insert(clip.id.clone(), ClipEntry { clip, monitor });
        crate::metrics::set_active_clips(self.clips.len());
        snapshot
    }

    /// Get a clip by ID, refreshing its last access time
    pub fn get(&self, id: &str) -> Option<ClipSession> {
        self.clips.get_mut(id).map(|mut entry| {
            entry.clip.last_accessed = SystemTime::now();
            entry.clip.clone()
        })
    }

    pub fn touch(&self, id: &str) {
        if let Some(mut entry) = self.clips.get_mut(id) {
            entry.clip.last_accessed = SystemTime::now();
        }
    }

    /// Apply `edit` to a clip and return its result with the updated clip
    ///
    /// # Errors
    /// [`ReplayError::ClipNotFound`] for an unknown id, otherwise whatever
    /// `edit` returns. A failed edit leaves the clip unchanged.
    pub fn update<F>(&self, id: &str, edit: F) -> Result<ClipSession>
    where
        F: FnOnce(&mut ClipSession) -> Result<()>,
    {
        let mut entry = self
            .clips
            .get_mut(id)
            .ok_or_else(|| ReplayError::ClipNotFound(id.to_string()))?;

        let mut draft = entry.clip.clone();
        edit(&mut draft)?;
        draft.last_accessed = SystemTime::now();
        entry.clip = draft.clone();
        Ok(draft)
    }

    /// Latest published status of a clip's monitor.
    ///
    /// `None` for an unknown clip; `Some(None)` while no refresh succeeded yet.
    pub fn live_status(&self, id: &str) -> Option<Option<LiveStatus>> {
        self.clips.get(id).map(|entry| {
            entry
                .monitor
                .as_ref()
                .and_then(MonitorHandle::latest)
        })
    }

    /// Remove a clip and stop its monitor
    pub fn remove(&self, id: &str) -> Option<ClipSession> {
        let removed = self.clips.remove(id).map(|(_, entry)| {
            if let Some(monitor) = &entry.monitor {
                monitor.cancel();
            }
            entry.clip
        });
        crate::metrics::set_active_clips(self.clips.len());
        removed
    }

    /// Remove clips idle for longer than the TTL; returns how many were dropped
    pub fn cleanup_expired(&self) -> usize {
        let now = SystemTime::now();
        let before = self.clips.len();
        self.clips.retain(|_, entry| {
            if let Ok(elapsed) = now.duration_since(entry.clip.last_accessed) {
                elapsed < self.ttl
            } else {
                true
            }
        });
        let removed = before.saturating_sub(self.clips.len());
        if removed > 0 {
            debug!("Expired {} idle clip sessions", removed);
        }
        crate::metrics::set_active_clips(self.clips.len());
        removed
    }

    pub fn count(&self) -> usize {
        self.clips.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clips::session::CueEdit;
    use crate::replay::stream::StreamIdentity;

    fn clip(id: &str) -> ClipSession {
        ClipSession::new(
            id.to_string(),
            StreamIdentity::parse("abc").unwrap(),
            Some(1_700_000_000_000),
            "https://cdn.example.com/abc-1700000000000.m3u8".to_string(),
        )
    }

    #[test]
    fn insert_and_get() {
        let manager = ClipManager::new(Duration::from_secs(300));
        manager.insert(clip("one"), None);

        assert_eq!(manager.count(), 1);
        assert_eq!(manager.get("one").unwrap().id, "one");
        assert!(manager.get("two").is_none());
    }

    #[test]
    fn touch_refreshes_access_time() {
        let manager = ClipManager::new(Duration::from_secs(300));
        let initial = manager.insert(clip("one"), None).last_accessed;
        std::thread::sleep(Duration::from_millis(10));
        manager.touch("one");

        assert!(manager.get("one").unwrap().last_accessed > initial);
    }

    #[test]
    fn update_applies_edit() {
        let manager = ClipManager::new(Duration::from_secs(300));
        manager.insert(clip("one"), None);

        let updated = manager
            .update("one", |c| {
                c.set_cue_in(CueEdit::At(5.0));
                Ok(())
            })
            .unwrap();
        assert_eq!(updated.cue_in, Some(5.0));
        assert_eq!(manager.get("one").unwrap().cue_in, Some(5.0));
    }

    #[test]
    fn failed_update_leaves_clip_unchanged() {
        let manager = ClipManager::new(Duration::from_secs(300));
        manager.insert(clip("one"), None);

        let result = manager.update("one", |c| {
            c.set_cue_in(CueEdit::At(10.0));
            c.set_cue_out(CueEdit::At(11.0))
        });
        assert!(matches!(result, Err(ReplayError::InvalidCue(_))));
        assert_eq!(manager.get("one").unwrap().cue_in, None);
    }

    #[test]
    fn update_unknown_clip() {
        let manager = ClipManager::new(Duration::from_secs(300));
        let result = manager.update("missing", |_| Ok(()));
        assert!(matches!(result, Err(ReplayError::ClipNotFound(_))));
    }

    #[test]
    fn remove_and_status() {
        let manager = ClipManager::new(Duration::from_secs(300));
        manager.insert(clip("one"), None);

        assert_eq!(manager.live_status("one"), Some(None));
        assert!(manager.remove("one").is_some());
        assert!(manager.remove("one").is_none());
        assert_eq!(manager.live_status("one"), None);
        assert_eq!(manager.count(), 0);
    }

    #[tokio::test]
    async fn cleanup_expired_removes_idle_clips() {
        let manager = ClipManager::new(Duration::from_millis(1));
        manager.insert(clip("stale"), None);

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(manager.cleanup_expired(), 1);
        assert_eq!(manager.count(), 0);
    }
}
