use crate::{
    error::{ReplayError, Result},
    hls::parser::session_from_filename,
    metrics,
    replay::{
        ReplayLinks, StreamIdentity,
        resolver::{CutoutReport, MIN_CUE_IN, PlaylistInfo},
    },
    server::state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    /// Epoch-ms digits or a timestamped playlist file name
    pub session: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub cue_in: Option<f64>,
    pub cue_out: Option<f64>,
    pub session: Option<String>,
}

impl WindowQuery {
    fn session(&self) -> Option<u64> {
        self.session.as_deref().and_then(session_from_filename)
    }
}

/// Load a stream's playlist and report the session it belongs to
pub async fn stream_playlist(
    Path(stream): Path<String>,
    Query(query): Query<SessionQuery>,
    State(state): State<AppState>,
) -> Result<Json<PlaylistInfo>> {
    let start = Instant::now();
    let stream = StreamIdentity::parse(&stream)?;
    let session = query.session.as_deref().and_then(session_from_filename);

    let info = state.resolver().load(&stream, session).await?;
    info!("Loaded playlist {} (session {:?})", info.url, info.session);

    metrics::record_request("stream_playlist", 200);
    metrics::record_duration("stream_playlist", start);
    Ok(Json(info))
}

/// Share, embed and ffmpeg links for a cue window
///
/// Links are empty strings until both cues and the session are known.
pub async fn stream_links(
    Path(stream): Path<String>,
    Query(query): Query<WindowQuery>,
    State(state): State<AppState>,
) -> Result<Json<ReplayLinks>> {
    let stream = StreamIdentity::parse(&stream)?;
    let links = state
        .locations
        .links(&stream, query.cue_in, query.cue_out, query.session());

    metrics::record_request("stream_links", 200);
    Ok(Json(links))
}

/// Segments covering a cue window; `cutout` is `null` when the window
/// lies outside the playlist timeline
pub async fn stream_cutout(
    Path(stream): Path<String>,
    Query(query): Query<WindowQuery>,
    State(state): State<AppState>,
) -> Result<Json<CutoutReport>> {
    let start = Instant::now();
    let stream = StreamIdentity::parse(&stream)?;
    let cue_out = query
        .cue_out
        .ok_or_else(|| ReplayError::MissingParameter("cue_out".to_string()))?;
    let cue_in = query.cue_in.unwrap_or(MIN_CUE_IN);
    if !(cue_in.is_finite() && cue_out.is_finite() && cue_in >= MIN_CUE_IN && cue_out > cue_in) {
        return Err(ReplayError::InvalidCue(format!(
            "cutout window must satisfy 0 <= cue_in < cue_out, got {cue_in}..{cue_out}"
        )));
    }

    let report = state
        .resolver()
        .cutout(&stream, cue_in, cue_out, query.session())
        .await?;

    metrics::record_request("stream_cutout", 200);
    metrics::record_duration("stream_cutout", start);
    Ok(Json(report))
}
