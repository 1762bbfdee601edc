use crate::hls::parser::{SESSION_TAG, session_from_filename};
use crate::replay::stream::ABR_SUFFIX;
use axum::{
    extract::Path,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::fmt::Write;
use tracing::info;

/// Session timestamp of every demo recording (2023-11-14T22:13:20Z)
pub const DEMO_SESSION: u64 = 1_700_000_000_000;
/// Duration of each segment in seconds
const SEGMENT_DURATION: f32 = 10.0;
/// Number of segments in a demo recording
const SEGMENT_COUNT: u32 = 12;

/// Build a demo media playlist for `stem`.
///
/// The live playlist (no session in the name) carries the session marker
/// naming the timestamped recording; the recording itself is a finished VOD.
fn build_demo_playlist(stem: &str, session: Option<u64>) -> String {
    let mut playlist = String::with_capacity(1024);

    let _ = writeln!(playlist, "#EXTM3U");
    let _ = writeln!(playlist, "#EXT-X-VERSION:3");
    let _ = writeln!(playlist, "#EXT-X-TARGETDURATION:10");
    let _ = writeln!(playlist, "#EXT-X-MEDIA-SEQUENCE:0");
    if session.is_none() {
        let _ = writeln!(playlist, "{} {}-{}.m3u8", SESSION_TAG, stem, DEMO_SESSION);
    }

    for index in 0..SEGMENT_COUNT {
        let _ = writeln!(playlist, "#EXTINF:{:.1},", SEGMENT_DURATION);
        let _ = writeln!(playlist, "{}-{}-{}.ts", stem, DEMO_SESSION, index);
    }

    if session.is_some() {
        let _ = writeln!(playlist, "#EXT-X-ENDLIST");
    }
    playlist
}

/// Synthetic replay bucket
///
/// # Usage
/// ```text
/// GET /demo/vod/abc.m3u8                → live playlist with session marker
/// GET /demo/vod/abc-1700000000000.m3u8  → recorded session (VOD)
/// GET /demo/vod/abc-abr.m3u8            → 404 (no ABR renditions)
/// ```
pub async fn serve_demo_playlist(Path(file): Path<String>) -> Response {
    let Some(name) = file.strip_suffix(".m3u8") else {
        return (StatusCode::NOT_FOUND, "Not found\n").into_response();
    };
    if name.is_empty() {
        return (StatusCode::NOT_FOUND, "Not found\n").into_response();
    }

    let (stem, session) = match name.rsplit_once('-') {
        Some((stem, suffix)) if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) => {
            (stem, session_from_filename(&file))
        }
        _ => (name, None),
    };
    if stem.ends_with(ABR_SUFFIX) || session.is_some_and(|s| s != DEMO_SESSION) {
        return (StatusCode::NOT_FOUND, "Not found\n").into_response();
    }

    info!("Serving demo playlist {} (session {:?})", file, session);

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/vnd.apple.mpegurl")],
        build_demo_playlist(stem, session),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hls::parser::{Timeline, parse_session_marker, parse_timeline};

    #[test]
    fn live_playlist_names_the_recording() {
        let playlist = build_demo_playlist("abc", None);
        let marker = parse_session_marker(&playlist).unwrap();
        assert_eq!(marker.file, "abc-1700000000000.m3u8");
        assert_eq!(marker.session, DEMO_SESSION);
        assert!(!playlist.contains("#EXT-X-ENDLIST"));
    }

    #[tokio::test]
    async fn abr_playlists_are_missing() {
        for file in ["abc-abr.m3u8", "abc-abr-1700000000000.m3u8"] {
            let resp = serve_demo_playlist(Path(file.to_string())).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "file: {file}");
        }
    }

    #[tokio::test]
    async fn names_containing_abr_are_served() {
        for file in ["team-abrupt.m3u8", "team-abrupt-1700000000000.m3u8"] {
            let resp = serve_demo_playlist(Path(file.to_string())).await;
            assert_eq!(resp.status(), StatusCode::OK, "file: {file}");
        }
    }

    #[test]
    fn recording_is_a_finished_timeline() {
        let playlist = build_demo_playlist("abc", Some(DEMO_SESSION));
        assert!(playlist.contains("#EXT-X-ENDLIST"));
        match parse_timeline(&playlist).unwrap() {
            Timeline::Media(segments) => {
                assert_eq!(segments.len(), SEGMENT_COUNT as usize);
                assert!(segments.iter().all(|s| s.duration_seconds == 10.0));
            }
            Timeline::Master(_) => panic!("expected media playlist"),
        }
    }
}
