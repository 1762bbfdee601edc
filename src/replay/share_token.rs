//! Share token codec.
//!
//! A share token packs `stream|cueIn|cueOut|session` into Base64 with the
//! trailing padding removed, so it can travel as a single query parameter.
//! Decoding fails closed: anything malformed yields no token at all.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::stream::MAX_STREAM_NAME_LEN;
use crate::error::ReplayError;

/// Field delimiter inside the decoded token
pub const DELIMITER: char = '|';

/// Shortest window a decoded token may describe, in seconds
pub const MIN_SHARED_WINDOW: f64 = 5.0;

/// Standard alphabet; emits no padding and accepts input with or without it
const CODEC: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

static FLOAT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid float regex")
});

static INT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+").expect("valid integer regex"));

/// Decoded contents of a share token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareToken {
    pub stream_name: String,
    pub cue_in: f64,
    pub cue_out: f64,
    /// Recording start in epoch milliseconds
    pub session: Option<u64>,
}

/// Encode a share token. `None` sessions encode as an empty field.
pub fn encode(stream_name: &str, cue_in: f64, cue_out: f64, session: Option<u64>) -> String {
    let session = session.map(|s| s.to_string()).unwrap_or_default();
    let raw = format!("{stream_name}{DELIMITER}{cue_in}{DELIMITER}{cue_out}{DELIMITER}{session}");
    CODEC.encode(raw.as_bytes())
}

/// Decode a share token, returning `None` for anything malformed.
pub fn decode(token: &str) -> Option<ShareToken> {
    parse(token).ok()
}

/// Fallible form of [`decode`].
///
/// Widens `cue_out` to `cue_in + 5` when the encoded window is shorter.
///
/// # Errors
/// [`ReplayError::MalformedShareToken`] on invalid Base64 or UTF-8, missing
/// fields, an over-long stream name, or non-numeric cue values.
pub fn parse(token: &str) -> Result<ShareToken, ReplayError> {
    // Form-decoded query strings turn '+' into ' '
    let token = token.trim().replace(' ', "+");
    if token.is_empty() {
        return Err(ReplayError::MalformedShareToken);
    }

    let bytes = CODEC
        .decode(token.as_bytes())
        .map_err(|_| ReplayError::MalformedShareToken)?;
    let text = String::from_utf8(bytes).map_err(|_| ReplayError::MalformedShareToken)?;

    let mut fields = text.split(DELIMITER);
    let stream_name = fields.next().ok_or(ReplayError::MalformedShareToken)?;
    let cue_in = fields.next().ok_or(ReplayError::MalformedShareToken)?;
    let cue_out = fields.next().ok_or(ReplayError::MalformedShareToken)?;
    let session = fields.next();

    if stream_name.is_empty() || stream_name.len() > MAX_STREAM_NAME_LEN {
        return Err(ReplayError::MalformedShareToken);
    }

    let cue_in = parse_float_prefix(cue_in).ok_or(ReplayError::MalformedShareToken)?;
    let mut cue_out = parse_float_prefix(cue_out).ok_or(ReplayError::MalformedShareToken)?;
    if cue_out < cue_in + MIN_SHARED_WINDOW {
        cue_out = cue_in + MIN_SHARED_WINDOW;
    }

    Ok(ShareToken {
        stream_name: stream_name.to_string(),
        cue_in,
        cue_out,
        session: session.and_then(parse_session),
    })
}

/// Lenient float parse: the longest numeric prefix, ignoring leading whitespace
pub(crate) fn parse_float_prefix(raw: &str) -> Option<f64> {
    let m = FLOAT_PREFIX.find(raw.trim_start())?;
    m.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Positive integer prefix; zero and negatives count as no session
pub(crate) fn parse_session(raw: &str) -> Option<u64> {
    let m = INT_PREFIX.find(raw.trim_start())?;
    m.as_str()
        .trim_start_matches('+')
        .parse::<u64>()
        .ok()
        .filter(|s| *s > 0)
}
