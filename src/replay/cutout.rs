//! Mapping cue windows onto a playlist's segment timeline.
//!
//! Segments are contiguous, so a single forward pass accumulating elapsed
//! time is enough. Boundary comparisons are deliberate: the start segment is
//! the first one whose end lies strictly after `cue_in`, the end segment the
//! first whose end reaches `cue_out`.

use serde::Serialize;

/// One media segment on the replay timeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub duration_seconds: f64,
}

impl Segment {
    pub fn new(duration_seconds: f64) -> Self {
        Self { duration_seconds }
    }
}

/// Segment range and offsets bounding a cue window
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentCutout {
    pub start_segment_index: usize,
    pub end_segment_index: usize,
    /// Offset of `cue_in` inside the start segment
    pub start_offset_seconds: f64,
    /// `start_offset_seconds + (cue_out - cue_in)`, relative to the start segment
    pub end_time_seconds: f64,
}

/// Find the segments bounding `[cue_in, cue_out]`.
///
/// Returns `None` when either bound lies beyond the known segments, which
/// is normal for live content still being recorded.
pub fn segment_cutout(cue_in: f64, cue_out: f64, segments: &[Segment]) -> Option<SegmentCutout> {
    let mut elapsed = 0.0;
    let mut start: Option<(usize, f64)> = None;
    let mut end: Option<usize> = None;

    for (index, segment) in segments.iter().enumerate() {
        let segment_end = elapsed + segment.duration_seconds;

        if start.is_none() && segment_end > cue_in {
            start = Some((index, cue_in - elapsed));
        }

        if end.is_none() && segment_end >= cue_out {
            end = Some(index);
            break;
        }

        elapsed = segment_end;
    }

    let (start_segment_index, start_offset_seconds) = start?;
    let end_segment_index = end?;

    Some(SegmentCutout {
        start_segment_index,
        end_segment_index,
        start_offset_seconds,
        end_time_seconds: start_offset_seconds + (cue_out - cue_in),
    })
}

/// Index of the segment containing `time`
pub fn segment_for_time(time: f64, segments: &[Segment]) -> Option<usize> {
    let mut elapsed = 0.0;
    for (index, segment) in segments.iter().enumerate() {
        if elapsed <= time && time < elapsed + segment.duration_seconds {
            return Some(index);
        }
        elapsed += segment.duration_seconds;
    }
    None
}

/// Total duration of the timeline
pub fn total_duration(segments: &[Segment]) -> f64 {
    segments.iter().map(|s| s.duration_seconds).sum()
}
