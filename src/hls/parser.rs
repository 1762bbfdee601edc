use crate::error::{ReplayError, Result};
use crate::replay::cutout::Segment;
use crate::replay::share_token::parse_session;
use m3u8_rs::{Playlist, parse_playlist_res};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::debug;

/// Custom tag naming the timestamped playlist a live playlist belongs to
pub const SESSION_TAG: &str = "#EXT-X-NANO-PLAYLIST";

static SESSION_TAG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#EXT-X-NANO-PLAYLIST\s+(\S+)").expect("valid session tag regex")
});

static SESSION_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.m3u8").expect("valid session digits regex"));

/// Timestamped playlist file named by the session tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionMarker {
    pub file: String,
    /// Recording start in epoch milliseconds
    pub session: u64,
}

/// Find the session marker in raw playlist text
pub fn parse_session_marker(content: &str) -> Option<SessionMarker> {
    let file = SESSION_TAG_LINE.captures(content)?.get(1)?.as_str();
    debug!("Detected {} file: {}", SESSION_TAG, file);

    let digits = SESSION_DIGITS.captures(file)?.get(1)?.as_str();
    let session = digits.parse::<u64>().ok().filter(|s| *s > 0)?;
    debug!("Extracted session timestamp: {}", session);

    Some(SessionMarker {
        file: file.to_string(),
        session,
    })
}

/// Session timestamp from either a bare timestamp or a timestamped playlist filename
pub fn session_from_filename(value: &str) -> Option<u64> {
    let value = value.trim();
    if value.ends_with(".m3u8") {
        SESSION_DIGITS
            .captures(value)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .filter(|s| *s > 0)
    } else {
        parse_session(value)
    }
}

/// Whether a response body looks like an HLS playlist
pub fn is_playlist_content(body: &str) -> bool {
    body.contains("#EXTM3U")
}

/// Parse HLS playlist from string content
pub fn parse_hls_playlist(content: &str) -> Result<Playlist> {
    parse_playlist_res(content.as_bytes())
        .map_err(|e| ReplayError::PlaylistParse(format!("{:?}", e)))
}

/// Segment timeline of a playlist, or the variant to follow for a master playlist
#[derive(Debug, Clone, PartialEq)]
pub enum Timeline {
    Media(Vec<Segment>),
    /// URI of the lowest-bandwidth variant, possibly relative
    Master(String),
}

/// Extract the segment timeline from playlist text
pub fn parse_timeline(content: &str) -> Result<Timeline> {
    match parse_hls_playlist(content)? {
        Playlist::MediaPlaylist(media) => Ok(Timeline::Media(
            media
                .segments
                .iter()
                .map(|s| Segment::new(f64::from(s.duration)))
                .collect(),
        )),
        Playlist::MasterPlaylist(master) => master
            .variants
            .iter()
            .filter(|v| !v.is_i_frame)
            .min_by_key(|v| v.bandwidth)
            .map(|v| Timeline::Master(v.uri.clone()))
            .ok_or_else(|| ReplayError::PlaylistParse("master playlist has no variants".into())),
    }
}
