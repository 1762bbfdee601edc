//! Session and cue-window resolution.
//!
//! Turns the replayer's request parameters (a share token, or a stream name
//! with optional session and wall-clock bounds) into a playlist URL and a
//! cue window relative to the session start. Only a missing stream name or
//! an unshareable token are errors; every network problem degrades to a
//! fallback URL or the open window.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use super::cutout::{Segment, SegmentCutout, segment_cutout, total_duration};
use super::links::ReplayLocations;
use super::share_token;
use super::stream::{PlaylistVariant, StreamIdentity};
use super::timefmt::session_offset;
use crate::error::{ReplayError, Result};
use crate::hls::PlaylistSource;
use crate::hls::parser::{
    Timeline, is_playlist_content, parse_session_marker, parse_timeline, session_from_filename,
};
use crate::metrics;

/// Open lower bound of a cue window
pub const MIN_CUE_IN: f64 = 0.0;

/// Open upper bound of a cue window
pub const MAX_CUE_OUT: f64 = 1e12;

/// Shortest window the resolver hands out, in seconds
pub const MIN_RESOLVED_WINDOW: f64 = 1.0;

/// Replayer request parameters, as found in its query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolveRequest {
    pub streamname: Option<String>,
    pub share: Option<String>,
    pub session: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Playable window of a replay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CueWindow {
    pub url: String,
    pub stream: String,
    pub session: Option<u64>,
    pub cue_in: f64,
    pub cue_out: f64,
}

/// A loaded playlist and the session it belongs to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistInfo {
    pub stream_name: String,
    pub url: String,
    #[serde(skip_serializing)]
    pub body: String,
    pub file: Option<String>,
    pub session: Option<u64>,
}

/// Result of the ABR-then-plain playlist probe
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub url: String,
    pub variant: PlaylistVariant,
    /// Playlist text when the probe fetched it
    pub body: Option<String>,
}

/// Segment cutout of a cue window, with the timeline it was computed on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutoutReport {
    pub url: String,
    pub segment_count: usize,
    pub total_duration: f64,
    pub cutout: Option<SegmentCutout>,
}

/// Resolves playlists and cue windows against a playlist source
pub struct Resolver<'a> {
    source: &'a dyn PlaylistSource,
    locations: &'a ReplayLocations,
}

impl<'a> Resolver<'a> {
    pub fn new(source: &'a dyn PlaylistSource, locations: &'a ReplayLocations) -> Self {
        Self { source, locations }
    }

    pub fn locations(&self) -> &'a ReplayLocations {
        self.locations
    }

    /// Load a stream's playlist (live when `session` is `None`) and read its session marker.
    ///
    /// # Errors
    /// Propagates the playlist source error.
    pub async fn load(&self, stream: &StreamIdentity, session: Option<u64>) -> Result<PlaylistInfo> {
        let url = self.locations.hls_url(stream, session);
        let body = self.source.fetch(&url).await?;
        let marker = parse_session_marker(&body);

        Ok(PlaylistInfo {
            stream_name: stream.provided.clone(),
            url,
            file: marker.as_ref().map(|m| m.file.clone()),
            session: marker.map(|m| m.session).or(session),
            body,
        })
    }

    /// Prefer the ABR playlist, fall back to the plain one.
    ///
    /// The ABR playlist counts only if it is fetched successfully and its
    /// body is playlist text. The fallback is not fetched here.
    pub async fn find_best_hls_url(
        &self,
        stream: &StreamIdentity,
        session: Option<u64>,
    ) -> ProbeOutcome {
        let abr_url = self
            .locations
            .playlist_url(stream, PlaylistVariant::Abr, session);

        match self.source.fetch(&abr_url).await {
            Ok(body) if is_playlist_content(&body) => {
                info!("Using ABR playlist {}", abr_url);
                return ProbeOutcome {
                    url: abr_url,
                    variant: PlaylistVariant::Abr,
                    body: Some(body),
                };
            }
            Ok(_) => warn!("ABR probe at {} returned no playlist content", abr_url),
            Err(e) => warn!("ABR probe at {} failed: {}", abr_url, e),
        }

        metrics::record_abr_fallback();
        ProbeOutcome {
            url: self
                .locations
                .playlist_url(stream, PlaylistVariant::Plain, session),
            variant: PlaylistVariant::Plain,
            body: None,
        }
    }

    /// Resolve the replayer's request into a playable cue window.
    ///
    /// # Errors
    /// [`ReplayError::MissingParameter`] when neither a valid share token
    /// nor a stream name is given, [`ReplayError::InvalidStreamName`] for a
    /// malformed name, [`ReplayError::UnshareableContent`] for a token
    /// without session.
    pub async fn resolve(&self, request: &ResolveRequest) -> Result<CueWindow> {
        let token = request.share.as_deref().and_then(share_token::decode);

        let provided = match &token {
            Some(token) => token.stream_name.as_str(),
            None => request.streamname.as_deref().unwrap_or_default(),
        };
        if provided.trim().is_empty() {
            return Err(ReplayError::MissingParameter(
                "share or streamname".to_string(),
            ));
        }
        let stream = StreamIdentity::parse(provided)?;

        if let Some(token) = token {
            let session = token.session.ok_or(ReplayError::UnshareableContent)?;
            let window = clamp_window(CueWindow {
                url: self.locations.hls_url(&stream, Some(session)),
                stream: stream.provided,
                session: Some(session),
                cue_in: token.cue_in,
                cue_out: token.cue_out,
            });
            info!(
                "Resolved shared window {:.3}..{:.3} on {}",
                window.cue_in, window.cue_out, window.url
            );
            return Ok(window);
        }

        let requested = request.session.as_deref().and_then(session_from_filename);

        let probe = match requested {
            Some(session) if stream.is_abr_variant => {
                self.find_best_hls_url(&stream, Some(session)).await
            }
            Some(session) => {
                warn!("Cannot auto-find ABR playlist from a transcode session timestamp");
                ProbeOutcome {
                    url: self
                        .locations
                        .playlist_url(&stream, PlaylistVariant::Plain, Some(session)),
                    variant: PlaylistVariant::Plain,
                    body: None,
                }
            }
            None => self.find_best_hls_url(&stream, None).await,
        };

        let session = match requested {
            Some(session) => Some(session),
            None => self.session_from_probe(&probe).await,
        };
        if session.is_none() {
            warn!("Cannot find session information for {}", stream.provided);
        }

        let cue_in = wall_clock_bound(request.from.as_deref(), session).unwrap_or(MIN_CUE_IN);
        let cue_out = wall_clock_bound(request.to.as_deref(), session).unwrap_or(MAX_CUE_OUT);

        let window = clamp_window(CueWindow {
            url: probe.url,
            stream: stream.provided,
            session,
            cue_in,
            cue_out,
        });
        info!(
            "Resolved window {:.3}..{:.3} on {} (session {:?})",
            window.cue_in, window.cue_out, window.url, window.session
        );
        Ok(window)
    }

    async fn session_from_probe(&self, probe: &ProbeOutcome) -> Option<u64> {
        if let Some(body) = &probe.body {
            return parse_session_marker(body).map(|m| m.session);
        }
        match self.source.fetch(&probe.url).await {
            Ok(body) => parse_session_marker(&body).map(|m| m.session),
            Err(e) => {
                warn!("Session lookup at {} failed: {}", probe.url, e);
                None
            }
        }
    }

    /// Segment timeline of the playlist at `url`.
    ///
    /// Master playlists are followed to their lowest-bandwidth variant.
    ///
    /// # Errors
    /// Playlist fetch and parse errors.
    pub async fn segments(&self, url: &str) -> Result<Vec<Segment>> {
        let body = self.source.fetch(url).await?;
        match parse_timeline(&body)? {
            Timeline::Media(segments) => Ok(segments),
            Timeline::Master(variant) => {
                let variant_url = Url::parse(url)
                    .and_then(|base| base.join(&variant))
                    .map_err(|e| ReplayError::PlaylistParse(format!("bad variant URI: {e}")))?;
                let body = self.source.fetch(variant_url.as_str()).await?;
                match parse_timeline(&body)? {
                    Timeline::Media(segments) => Ok(segments),
                    Timeline::Master(_) => Err(ReplayError::PlaylistParse(
                        "variant is itself a master playlist".to_string(),
                    )),
                }
            }
        }
    }

    /// Map a cue window onto a stream's playlist.
    ///
    /// # Errors
    /// Playlist fetch and parse errors. A window outside the timeline is
    /// not an error; it yields `cutout: None`.
    pub async fn cutout(
        &self,
        stream: &StreamIdentity,
        cue_in: f64,
        cue_out: f64,
        session: Option<u64>,
    ) -> Result<CutoutReport> {
        let url = self.locations.hls_url(stream, session);
        let segments = self.segments(&url).await?;
        let cutout = segment_cutout(cue_in, cue_out, &segments);
        if cutout.is_none() {
            info!(
                "No cutout for {:.3}..{:.3} in {} segments of {}",
                cue_in,
                cue_out,
                segments.len(),
                url
            );
        }

        Ok(CutoutReport {
            url,
            segment_count: segments.len(),
            total_duration: total_duration(&segments),
            cutout,
        })
    }
}

/// Relative seconds of a wall-clock bound, when both it and the session are usable
fn wall_clock_bound(raw: Option<&str>, session: Option<u64>) -> Option<f64> {
    let session = session?;
    session_offset(raw?, session)
}

/// `cue_in >= 0` and `cue_out >= cue_in + 1`
pub fn clamp_window(mut window: CueWindow) -> CueWindow {
    window.cue_in = window.cue_in.max(MIN_CUE_IN);
    window.cue_out = window.cue_out.max(window.cue_in + MIN_RESOLVED_WINDOW);
    window
}
