//! Periodic playlist status refresh for clip sessions.
//!
//! Each monitor re-reads one playlist on a fixed interval and publishes the
//! newest [`LiveStatus`] through a watch channel. Readers only ever see the
//! latest value; a failed refresh leaves the previous one in place.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::hls::PlaylistSource;
use crate::replay::cutout::total_duration;
use crate::replay::links::ReplayLocations;
use crate::replay::resolver::Resolver;
use crate::replay::timefmt::format_duration;

/// Latest view of a playlist's timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveStatus {
    /// End of the known timeline, seconds from the session start
    pub live_edge_seconds: f64,
    pub segment_count: usize,
    pub refreshed_at: String,
}

/// Handle to a running monitor task; cancels the task when dropped
#[derive(Debug)]
pub struct MonitorHandle {
    status: watch::Receiver<Option<LiveStatus>>,
    token: CancellationToken,
}

impl MonitorHandle {
    /// Most recently published status
    pub fn latest(&self) -> Option<LiveStatus> {
        self.status.borrow().clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until a status newer than the last observed one is published
    pub async fn changed(&mut self) -> bool {
        self.status.changed().await.is_ok()
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Spawn a monitor refreshing `url` every `interval`
pub fn spawn_monitor(
    source: Arc<dyn PlaylistSource>,
    locations: Arc<ReplayLocations>,
    url: String,
    interval: Duration,
) -> MonitorHandle {
    let (tx, rx) = watch::channel(None);
    let token = CancellationToken::new();
    let task_token = token.clone();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = task_token.cancelled() => {
                    debug!("Status monitor for {} stopped", url);
                    break;
                }
                _ = ticker.tick() => {
                    let resolver = Resolver::new(source.as_ref(), locations.as_ref());
                    match resolver.segments(&url).await {
                        Ok(segments) => {
                            tx.send_replace(Some(LiveStatus {
                                live_edge_seconds: total_duration(&segments),
                                segment_count: segments.len(),
                                refreshed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                            }));
                        }
                        Err(e) => warn!("Status refresh for {} failed: {}", url, e),
                    }
                }
            }
        }
    });

    MonitorHandle { status: rx, token }
}

/// Delay of the playhead behind the live edge, with its display label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveOffset {
    pub delay_from_live: Option<f64>,
    pub label: String,
}

/// "m:ss from Live" while behind the edge, "Edge of Buffer" at or past it
pub fn live_offset(status: Option<&LiveStatus>, position: f64) -> LiveOffset {
    let Some(status) = status else {
        return LiveOffset {
            delay_from_live: None,
            label: String::new(),
        };
    };

    let delay = status.live_edge_seconds - position;
    let label = if delay > 0.0 {
        format!("{} from Live", format_duration(delay))
    } else {
        "Edge of Buffer".to_string()
    };

    LiveOffset {
        delay_from_live: Some(delay),
        label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hls::testing::StaticPlaylistSource;

    const URL: &str = "https://cdn.example.com/abc-1.m3u8";

    fn locations() -> Arc<ReplayLocations> {
        Arc::new(ReplayLocations {
            bucket_url: "https://cdn.example.com".to_string(),
            page_root: "https://replay.example.com".to_string(),
            page_path: "replayer".to_string(),
            embed_path: "replayer".to_string(),
            use_orga: false,
        })
    }

    fn playlist(segments: usize) -> String {
        let mut body = String::from("#EXTM3U\n#EXT-X-TARGETDURATION:10\n");
        for i in 0..segments {
            body.push_str(&format!("#EXTINF:10.0,\ns{i}.ts\n"));
        }
        body
    }

    #[tokio::test]
    async fn publishes_latest_status() {
        let source = Arc::new(StaticPlaylistSource::with(&[(URL, &playlist(3))]));
        let mut handle = spawn_monitor(
            source.clone(),
            locations(),
            URL.to_string(),
            Duration::from_millis(10),
        );

        assert!(handle.changed().await);
        let status = handle.latest().unwrap();
        assert_eq!(status.segment_count, 3);
        assert_eq!(status.live_edge_seconds, 30.0);

        // Playlist grows; the newer status replaces the old one
        source.set(URL, &playlist(5));
        let mut seen = 0;
        while seen != 5 {
            assert!(handle.changed().await);
            seen = handle.latest().unwrap().segment_count;
        }
        assert_eq!(handle.latest().unwrap().live_edge_seconds, 50.0);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_no_status() {
        let source = Arc::new(StaticPlaylistSource::default());
        let handle = spawn_monitor(
            source.clone(),
            locations(),
            URL.to_string(),
            Duration::from_millis(5),
        );

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(handle.latest(), None);
        assert!(!source.requested().is_empty());
    }

    #[tokio::test]
    async fn dropping_handle_stops_task() {
        let source = Arc::new(StaticPlaylistSource::with(&[(URL, &playlist(1))]));
        let handle = spawn_monitor(
            source.clone(),
            locations(),
            URL.to_string(),
            Duration::from_millis(5),
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(handle);
        tokio::time::sleep(Duration::from_millis(20)).await;

        let after_drop = source.requested().len();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(source.requested().len(), after_drop);
    }

    #[test]
    fn live_offset_labels() {
        let status = LiveStatus {
            live_edge_seconds: 100.0,
            segment_count: 10,
            refreshed_at: String::new(),
        };
        let behind = live_offset(Some(&status), 25.0);
        assert_eq!(behind.delay_from_live, Some(75.0));
        assert_eq!(behind.label, "1:15 from Live");

        let edge = live_offset(Some(&status), 100.0);
        assert_eq!(edge.label, "Edge of Buffer");

        let unknown = live_offset(None, 0.0);
        assert_eq!(unknown.delay_from_live, None);
        assert_eq!(unknown.label, "");
    }
}
