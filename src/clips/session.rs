use serde::Serialize;
use std::time::SystemTime;

use crate::error::{ReplayError, Result};
use crate::replay::links::{ReplayLinks, ReplayLocations};
use crate::replay::stream::StreamIdentity;
use crate::replay::timefmt::parse_wallclock_edit;

/// Shortest clip a viewer may mark, in seconds
pub const MIN_CLIP_LENGTH: f64 = 2.0;

/// Step of the rewind / forward controls, in seconds
pub const SKIP_SECONDS: f64 = 30.0;

/// A viewer's clipping state for one stream session
#[derive(Debug, Clone, Serialize)]
pub struct ClipSession {
    pub id: String,
    pub stream: StreamIdentity,
    /// Recording start in epoch milliseconds, when known
    pub session: Option<u64>,
    pub hls_url: String,
    pub cue_in: Option<f64>,
    pub cue_out: Option<f64>,
    /// Playhead in seconds from the session start
    pub position: f64,
    #[serde(serialize_with = "epoch_secs::serialize")]
    pub created_at: SystemTime,
    #[serde(serialize_with = "epoch_secs::serialize")]
    pub last_accessed: SystemTime,
}

/// Serialize SystemTime as u64 epoch seconds
mod epoch_secs {
    use serde::Serializer;
    use std::time::{SystemTime, UNIX_EPOCH};

    pub fn serialize<S: Serializer>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
        let secs = time
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        serializer.serialize_u64(secs)
    }
}

/// How a cue point is being edited
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CueEdit {
    Clear,
    /// A time in seconds; negative values mean "at the playhead"
    At(f64),
    Current,
}

impl ClipSession {
    pub fn new(id: String, stream: StreamIdentity, session: Option<u64>, hls_url: String) -> Self {
        let now = SystemTime::now();
        Self {
            id,
            stream,
            session,
            hls_url,
            cue_in: None,
            cue_out: None,
            position: 0.0,
            created_at: now,
            last_accessed: now,
        }
    }

    fn edit_time(&self, edit: CueEdit) -> Option<f64> {
        match edit {
            CueEdit::Clear => None,
            CueEdit::At(time) if time >= 0.0 => Some(time),
            CueEdit::At(_) | CueEdit::Current => Some(self.position),
        }
    }

    pub fn set_cue_in(&mut self, edit: CueEdit) {
        self.cue_in = self.edit_time(edit);
    }

    /// # Errors
    /// [`ReplayError::InvalidCue`] when the cue out would end less than
    /// [`MIN_CLIP_LENGTH`] seconds after the cue in.
    pub fn set_cue_out(&mut self, edit: CueEdit) -> Result<()> {
        let time = self.edit_time(edit);
        if let (Some(time), Some(cue_in)) = (time, self.cue_in) {
            if time <= cue_in + MIN_CLIP_LENGTH {
                return Err(ReplayError::InvalidCue(format!(
                    "Cue Out time must be after Cue In time. Minimum length is {MIN_CLIP_LENGTH} seconds."
                )));
            }
        }
        self.cue_out = time;
        Ok(())
    }

    /// Turn an edited `HH:MM:SS` time of day into a cue offset.
    ///
    /// `None` without a session, for malformed text, or before the session start.
    pub fn wallclock_to_offset(&self, text: &str) -> Option<f64> {
        parse_wallclock_edit(text, self.session?)
    }

    /// Mark both cues at once for sharing.
    ///
    /// A `cue_out` earlier than the (new) cue in is ignored.
    ///
    /// # Errors
    /// [`ReplayError::InvalidCue`] for a negative cue in (the playhead has
    /// not advanced far enough) or when either cue is still unset.
    pub fn share(&mut self, cue_in: Option<f64>, cue_out: Option<f64>) -> Result<()> {
        if let Some(cue_in) = cue_in {
            if cue_in < 0.0 {
                return Err(ReplayError::InvalidCue(
                    "Video has not been playing enough time to share the selected interval"
                        .to_string(),
                ));
            }
            self.cue_in = Some(cue_in);
        }
        if let Some(cue_out) = cue_out {
            if cue_out >= self.cue_in.unwrap_or(0.0) {
                self.cue_out = Some(cue_out);
            }
        }

        if self.cue_in.is_none() || self.cue_out.is_none() {
            return Err(ReplayError::InvalidCue(
                "Please set both Cue In and Cue Out times before sharing.".to_string(),
            ));
        }
        Ok(())
    }

    /// Share the first `seconds` of the session
    ///
    /// # Errors
    /// See [`ClipSession::share`].
    pub fn share_first(&mut self, seconds: f64) -> Result<()> {
        self.share(Some(0.0), Some(seconds))
    }

    /// Share the `seconds` leading up to the playhead
    ///
    /// # Errors
    /// See [`ClipSession::share`].
    pub fn share_last(&mut self, seconds: f64) -> Result<()> {
        self.share(Some(self.position - seconds), Some(self.position))
    }

    pub fn seek(&mut self, position: f64) {
        self.position = position.max(0.0);
    }

    /// Move the playhead by `delta`, never below 0 nor past `limit`
    pub fn step(&mut self, delta: f64, limit: Option<f64>) {
        let target = (self.position + delta).max(0.0);
        self.position = match limit {
            Some(limit) => target.min(limit.max(0.0)),
            None => target,
        };
    }

    pub fn links(&self, locations: &ReplayLocations) -> ReplayLinks {
        locations.links(&self.stream, self.cue_in, self.cue_out, self.session)
    }
}
