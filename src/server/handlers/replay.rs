use crate::{
    error::Result,
    metrics,
    replay::{CueWindow, ResolveRequest},
    server::state::AppState,
};
use axum::{
    Json,
    extract::{Query, State},
};
use std::time::Instant;
use tracing::info;

/// Resolve the replayer's query parameters into a playlist and cue window
///
/// ```text
/// GET /api/replay?share=<token>
/// GET /api/replay?streamname=abc&session=1700000000000&from=...&to=...
/// ```
pub async fn resolve_replay(
    Query(request): Query<ResolveRequest>,
    State(state): State<AppState>,
) -> Result<Json<CueWindow>> {
    let start = Instant::now();

    let window = state.resolver().resolve(&request).await?;
    info!(
        "Resolved replay of {} to {} [{:.3}, {:.3}]",
        window.stream, window.url, window.cue_in, window.cue_out
    );

    metrics::record_request("replay", 200);
    metrics::record_duration("replay", start);
    Ok(Json(window))
}
