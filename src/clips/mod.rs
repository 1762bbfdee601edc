//! Per-viewer clipping state: cue points, playhead, share links and a
//! live status feed.

pub mod manager;
pub mod monitor;
pub mod session;

pub use manager::ClipManager;
pub use monitor::{LiveStatus, MonitorHandle, live_offset, spawn_monitor};
pub use session::{ClipSession, CueEdit};

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::hls::parser::session_from_filename;
use crate::replay::resolver::Resolver;
use crate::replay::stream::StreamIdentity;

/// Build a clip session for `streamname`.
///
/// `session` may be epoch-ms digits or a timestamped playlist file name.
/// Without one, the session is read from the live playlist's marker; a
/// failed lookup leaves the clip on the live playlist.
///
/// # Errors
/// Stream name validation errors.
pub async fn open_clip(
    resolver: &Resolver<'_>,
    streamname: &str,
    session: Option<&str>,
) -> Result<ClipSession> {
    let stream = StreamIdentity::parse(streamname)?;

    let session = match session.and_then(session_from_filename) {
        Some(session) => Some(session),
        None => match resolver.load(&stream, None).await {
            Ok(info) => info.session,
            Err(e) => {
                warn!("No session for {}: {}", stream.provided, e);
                None
            }
        },
    };

    let hls_url = resolver.locations().hls_url(&stream, session);
    let clip = ClipSession::new(Uuid::new_v4().to_string(), stream, session, hls_url);
    info!(
        "Opened clip {} on {} (session {:?})",
        clip.id, clip.hls_url, clip.session
    );
    Ok(clip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hls::testing::StaticPlaylistSource;
    use crate::replay::links::ReplayLocations;

    fn locations() -> ReplayLocations {
        ReplayLocations {
            bucket_url: "https://cdn.example.com".to_string(),
            page_root: "https://replay.example.com".to_string(),
            page_path: "replayer".to_string(),
            embed_path: "replayer".to_string(),
            use_orga: false,
        }
    }

    #[tokio::test]
    async fn session_from_parameter() {
        let source = StaticPlaylistSource::default();
        let locations = locations();
        let resolver = Resolver::new(&source, &locations);

        let clip = open_clip(&resolver, "abc", Some("abc-1700000000000.m3u8"))
            .await
            .unwrap();
        assert_eq!(clip.session, Some(1_700_000_000_000));
        assert_eq!(clip.hls_url, "https://cdn.example.com/abc-1700000000000.m3u8");
        assert!(source.requested().is_empty());
    }

    #[tokio::test]
    async fn session_from_live_marker() {
        let source = StaticPlaylistSource::with(&[(
            "https://cdn.example.com/abc.m3u8",
            "#EXTM3U\n#EXT-X-NANO-PLAYLIST abc-1700000000000.m3u8\n",
        )]);
        let locations = locations();
        let resolver = Resolver::new(&source, &locations);

        let clip = open_clip(&resolver, "abc", None).await.unwrap();
        assert_eq!(clip.session, Some(1_700_000_000_000));
    }

    #[tokio::test]
    async fn unreachable_live_playlist_keeps_live_url() {
        let source = StaticPlaylistSource::default();
        let locations = locations();
        let resolver = Resolver::new(&source, &locations);

        let clip = open_clip(&resolver, "abc", None).await.unwrap();
        assert_eq!(clip.session, None);
        assert_eq!(clip.hls_url, "https://cdn.example.com/abc.m3u8");
    }

    #[tokio::test]
    async fn invalid_stream_name() {
        let source = StaticPlaylistSource::default();
        let locations = locations();
        let resolver = Resolver::new(&source, &locations);

        assert!(open_clip(&resolver, "", None).await.is_err());
        assert!(open_clip(&resolver, "bad name", None).await.is_err());
    }
}
