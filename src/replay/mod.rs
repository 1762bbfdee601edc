//! Replay window computation: share tokens, cue resolution, segment
//! cutouts and link building.

pub mod cutout;
pub mod links;
pub mod resolver;
pub mod share_token;
pub mod stream;
pub mod timefmt;

pub use cutout::{Segment, SegmentCutout, segment_cutout};
pub use links::{ReplayLinks, ReplayLocations};
pub use resolver::{CueWindow, ResolveRequest, Resolver};
pub use share_token::ShareToken;
pub use stream::{PlaylistVariant, StreamIdentity};
