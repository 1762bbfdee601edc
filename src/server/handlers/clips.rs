use crate::{
    clips::{
        ClipSession, CueEdit, LiveStatus, live_offset, open_clip, session::SKIP_SECONDS,
        spawn_monitor,
    },
    error::{ReplayError, Result},
    metrics,
    replay::ReplayLinks,
    server::state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct CreateClipRequest {
    pub streamname: String,
    /// Epoch-ms digits or a timestamped playlist file name
    pub session: Option<String>,
}

/// Cue edit: `{"clear": true}`, `{"time": 12.5}`, `{"wallclock": "22:14:20"}`
/// or `{}` for the playhead
#[derive(Debug, Default, Deserialize)]
pub struct CueRequest {
    pub time: Option<f64>,
    #[serde(default)]
    pub clear: bool,
    pub wallclock: Option<String>,
}

impl CueRequest {
    fn edit(&self, clip: &ClipSession) -> Result<CueEdit> {
        if self.clear {
            return Ok(CueEdit::Clear);
        }
        if let Some(text) = &self.wallclock {
            return clip
                .wallclock_to_offset(text)
                .map(CueEdit::At)
                .ok_or_else(|| {
                    ReplayError::InvalidCue(format!("Invalid time format: '{text}'. Use HH:MM:SS"))
                });
        }
        Ok(self.time.map_or(CueEdit::Current, CueEdit::At))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ShareRequest {
    pub cue_in: Option<f64>,
    pub cue_out: Option<f64>,
    /// Share the first N seconds of the session
    pub first: Option<f64>,
    /// Share the N seconds leading up to the playhead
    pub last: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeekRequest {
    pub position: Option<f64>,
    /// Relative move; `rewind` / `forward` use `-30` / `30`
    pub delta: Option<f64>,
    pub rewind: Option<bool>,
    pub forward: Option<bool>,
}

/// A clip together with its current links
#[derive(Debug, Serialize)]
pub struct ClipView {
    #[serde(flatten)]
    pub clip: ClipSession,
    pub links: ReplayLinks,
}

#[derive(Debug, Serialize)]
pub struct ClipStatus {
    pub id: String,
    pub position: f64,
    pub live: Option<LiveStatus>,
    pub delay_from_live: Option<f64>,
    pub label: String,
}

fn view(state: &AppState, clip: ClipSession) -> Json<ClipView> {
    let links = clip.links(&state.locations);
    Json(ClipView { clip, links })
}

/// Open a clip session and start its status monitor
pub async fn create_clip(
    State(state): State<AppState>,
    Json(request): Json<CreateClipRequest>,
) -> Result<Response> {
    let start = Instant::now();
    let clip = open_clip(
        &state.resolver(),
        &request.streamname,
        request.session.as_deref(),
    )
    .await?;

    let monitor = spawn_monitor(
        state.playlists.clone(),
        state.locations.clone(),
        clip.hls_url.clone(),
        state.config.status_interval(),
    );
    let clip = state.clips.insert(clip, Some(monitor));

    metrics::record_request("clip_create", 201);
    metrics::record_duration("clip_create", start);
    Ok((StatusCode::CREATED, view(&state, clip)).into_response())
}

pub async fn get_clip(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ClipView>> {
    let clip = state
        .clips
        .get(&id)
        .ok_or_else(|| ReplayError::ClipNotFound(id.clone()))?;

    metrics::record_request("clip_get", 200);
    Ok(view(&state, clip))
}

pub async fn delete_clip(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    state
        .clips
        .remove(&id)
        .ok_or_else(|| ReplayError::ClipNotFound(id.clone()))?;
    info!("Closed clip {}", id);

    metrics::record_request("clip_delete", 204);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_cue_in(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<CueRequest>,
) -> Result<Json<ClipView>> {
    let clip = state.clips.update(&id, |clip| {
        let edit = request.edit(clip)?;
        clip.set_cue_in(edit);
        Ok(())
    })?;

    metrics::record_request("clip_cue", 200);
    Ok(view(&state, clip))
}

pub async fn set_cue_out(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<CueRequest>,
) -> Result<Json<ClipView>> {
    let clip = state.clips.update(&id, |clip| {
        let edit = request.edit(clip)?;
        clip.set_cue_out(edit)
    })?;

    metrics::record_request("clip_cue", 200);
    Ok(view(&state, clip))
}

pub async fn share_clip(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<ShareRequest>,
) -> Result<Json<ClipView>> {
    let clip = state.clips.update(&id, |clip| match (request.first, request.last) {
        (Some(seconds), _) => clip.share_first(seconds),
        (None, Some(seconds)) => clip.share_last(seconds),
        (None, None) => clip.share(request.cue_in, request.cue_out),
    })?;
    info!(
        "Shared clip {} [{:?}, {:?}]",
        clip.id, clip.cue_in, clip.cue_out
    );

    metrics::record_request("clip_share", 200);
    Ok(view(&state, clip))
}

/// Move the playhead; relative moves stop at the monitored live edge
pub async fn seek_clip(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<SeekRequest>,
) -> Result<Json<ClipView>> {
    let live_edge = state
        .clips
        .live_status(&id)
        .flatten()
        .map(|status| status.live_edge_seconds);

    let delta = match (request.delta, request.rewind, request.forward) {
        (Some(delta), _, _) => Some(delta),
        (None, Some(true), _) => Some(-SKIP_SECONDS),
        (None, _, Some(true)) => Some(SKIP_SECONDS),
        _ => None,
    };

    let clip = state.clips.update(&id, |clip| {
        match (request.position, delta) {
            (Some(position), _) => clip.seek(position),
            (None, Some(delta)) => clip.step(delta, live_edge),
            (None, None) => {
                return Err(ReplayError::MissingParameter("position".to_string()));
            }
        }
        Ok(())
    })?;

    metrics::record_request("clip_seek", 200);
    Ok(view(&state, clip))
}

/// Latest live status of a clip and the playhead's distance from the live edge
pub async fn clip_status(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ClipStatus>> {
    let clip = state
        .clips
        .get(&id)
        .ok_or_else(|| ReplayError::ClipNotFound(id.clone()))?;
    let live = state.clips.live_status(&id).flatten();
    let offset = live_offset(live.as_ref(), clip.position);

    metrics::record_request("clip_status", 200);
    Ok(Json(ClipStatus {
        id: clip.id,
        position: clip.position,
        live,
        delay_from_live: offset.delay_from_live,
        label: offset.label,
    }))
}
