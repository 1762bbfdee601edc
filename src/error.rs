use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::metrics;

/// Errors surfaced by the replay service
#[derive(Debug, Error)]
pub enum ReplayError {
    /// A required request parameter was not supplied
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid stream name: {0}")]
    InvalidStreamName(String),

    /// A share token was decoded but carries no session timestamp
    #[error("Cannot share this video")]
    UnshareableContent,

    /// Never leaves the codec: callers see a missing token instead
    #[error("Malformed share token")]
    MalformedShareToken,

    #[error("Failed to fetch playlist: {0}")]
    PlaylistFetch(#[from] reqwest::Error),

    #[error("Playlist not available at {0}")]
    PlaylistUnavailable(String),

    #[error("Failed to parse playlist: {0}")]
    PlaylistParse(String),

    #[error("Invalid cue: {0}")]
    InvalidCue(String),

    #[error("Clip session not found: {0}")]
    ClipNotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ReplayError>;

impl ReplayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReplayError::MissingParameter(_)
            | ReplayError::InvalidStreamName(_)
            | ReplayError::MalformedShareToken => StatusCode::BAD_REQUEST,
            ReplayError::UnshareableContent | ReplayError::InvalidCue(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ReplayError::PlaylistFetch(_)
            | ReplayError::PlaylistUnavailable(_)
            | ReplayError::PlaylistParse(_) => StatusCode::BAD_GATEWAY,
            ReplayError::ClipNotFound(_) => StatusCode::NOT_FOUND,
            ReplayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ReplayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }
        metrics::record_error(status.as_u16());

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            ReplayError::MissingParameter("streamname".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ReplayError::UnshareableContent.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ReplayError::PlaylistUnavailable("https://cdn.example.com/a.m3u8".into())
                .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ReplayError::ClipNotFound("abc".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn unshareable_message_is_viewer_facing() {
        assert_eq!(
            ReplayError::UnshareableContent.to_string(),
            "Cannot share this video"
        );
    }
}
