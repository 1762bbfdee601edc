//! Playlist, share, embed and ffmpeg link builders.
//!
//! Builders gated by a cue window return an empty string when the window is
//! not usable yet; callers treat emptiness as "no link available".

use serde::Serialize;

use super::share_token;
use super::stream::{PlaylistVariant, StreamIdentity};
use super::timefmt::{format_duration, iso_instant};
use crate::config::Config;

/// Output file of the generated ffmpeg command
pub const FFMPEG_OUTPUT_FILE: &str = "shared.mp4";

/// Where playlists live and where the replayer pages are served
#[derive(Debug, Clone)]
pub struct ReplayLocations {
    pub bucket_url: String,
    pub page_root: String,
    pub page_path: String,
    pub embed_path: String,
    pub use_orga: bool,
}

impl From<&Config> for ReplayLocations {
    fn from(config: &Config) -> Self {
        Self {
            bucket_url: config.bucket_url.clone(),
            page_root: config.page_root.clone(),
            page_path: config.page_path.clone(),
            embed_path: config.embed_path.clone(),
            use_orga: config.use_orga,
        }
    }
}

impl ReplayLocations {
    fn base_url(&self, stream: &StreamIdentity, relative: &str) -> String {
        if self.use_orga {
            format!("{}/{}/{}", self.bucket_url, stream.organization(), relative)
        } else {
            format!("{}/{}", self.bucket_url, relative)
        }
    }

    /// Playlist URL for a naming variant, optionally pinned to a session
    pub fn playlist_url(
        &self,
        stream: &StreamIdentity,
        variant: PlaylistVariant,
        session: Option<u64>,
    ) -> String {
        let stem = stream.playlist_stem(variant);
        let file = match session {
            Some(session) => format!("{stem}-{session}.m3u8"),
            None => format!("{stem}.m3u8"),
        };
        self.base_url(stream, &file)
    }

    /// Playlist URL using the stream's own naming convention
    pub fn hls_url(&self, stream: &StreamIdentity, session: Option<u64>) -> String {
        self.playlist_url(stream, stream.native_variant(), session)
    }

    /// Replayer link carrying a share token
    pub fn share_url(
        &self,
        stream: &StreamIdentity,
        cue_in: f64,
        cue_out: f64,
        session: Option<u64>,
    ) -> String {
        if !(cue_in >= 0.0 && cue_out > 0.0 && cue_out > cue_in) {
            return String::new();
        }
        let token = share_token::encode(&stream.provided, cue_in, cue_out, session);
        format!("{}/{}?share={}", self.page_root, self.page_path, token)
    }

    /// Embeddable replayer link with absolute `from`/`to` instants
    pub fn embed_url(
        &self,
        stream: &StreamIdentity,
        cue_in: f64,
        cue_out: f64,
        session: Option<u64>,
    ) -> String {
        if cue_in == 0.0 && cue_out == 0.0 {
            return String::new();
        }
        let Some(session) = session else {
            return String::new();
        };
        if !(cue_in >= 0.0 && cue_out >= 0.0 && cue_out > cue_in) {
            return String::new();
        }
        let (Some(from), Some(to)) = (iso_instant(cue_in, session), iso_instant(cue_out, session))
        else {
            return String::new();
        };

        format!(
            "{}/{}?streamname={}&from={}&to={}&session={}",
            self.page_root, self.embed_path, stream.provided, from, to, session
        )
    }

    /// Shell command extracting the cued interval into a local file
    pub fn ffmpeg_command_line(
        &self,
        stream: &StreamIdentity,
        cue_in: f64,
        cue_out: f64,
        session: Option<u64>,
    ) -> String {
        if !(cue_in >= 0.0 && cue_out > 0.0 && cue_out > cue_in) {
            return String::new();
        }
        format!(
            "ffmpeg -ss {:.3} -to {:.3} -i {} -c copy -y {}",
            cue_in,
            cue_out,
            self.hls_url(stream, session),
            FFMPEG_OUTPUT_FILE
        )
    }

    /// All links for a (possibly incomplete) cue window
    pub fn links(
        &self,
        stream: &StreamIdentity,
        cue_in: Option<f64>,
        cue_out: Option<f64>,
        session: Option<u64>,
    ) -> ReplayLinks {
        let hls_url = self.hls_url(stream, session);
        let (Some(cue_in), Some(cue_out)) = (cue_in, cue_out) else {
            return ReplayLinks {
                hls_url,
                ..Default::default()
            };
        };

        let ffmpeg = self.ffmpeg_command_line(stream, cue_in, cue_out, session);
        let total = if ffmpeg.is_empty() {
            String::new()
        } else {
            format_duration(cue_out - cue_in)
        };

        ReplayLinks {
            hls_url,
            share_url: self.share_url(stream, cue_in, cue_out, session),
            embed_url: self.embed_url(stream, cue_in, cue_out, session),
            ffmpeg,
            total,
        }
    }
}

/// Rendered links; empty strings mean "not available yet"
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplayLinks {
    pub hls_url: String,
    pub share_url: String,
    pub embed_url: String,
    pub ffmpeg: String,
    /// Formatted clip length, present together with `ffmpeg`
    pub total: String,
}
