use crate::error::{ReplayError, Result};
use serde::Serialize;

/// Suffix marking a natively transcoded (ABR) stream
pub const ABR_SUFFIX: &str = "-abr";

/// Longest stream name accepted from share tokens and requests
pub const MAX_STREAM_NAME_LEN: usize = 128;

/// A stream name as supplied by the viewer, plus its ABR classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamIdentity {
    /// Name exactly as provided (may carry the `-abr` suffix)
    pub provided: String,
    /// Name with the `-abr` suffix removed
    pub base: String,
    pub is_abr_variant: bool,
}

impl StreamIdentity {
    /// Validate and classify a stream name.
    ///
    /// # Errors
    /// [`ReplayError::MissingParameter`] for an empty name,
    /// [`ReplayError::InvalidStreamName`] for names that are too long or
    /// contain characters outside `[A-Za-z0-9_-]`.
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ReplayError::MissingParameter("streamname".to_string()));
        }
        if name.len() > MAX_STREAM_NAME_LEN {
            return Err(ReplayError::InvalidStreamName(format!(
                "longer than {MAX_STREAM_NAME_LEN} characters"
            )));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ReplayError::InvalidStreamName(name.to_string()));
        }

        let (base, is_abr_variant) = match name.strip_suffix(ABR_SUFFIX) {
            Some(base) if !base.is_empty() => (base.to_string(), true),
            _ => (name.to_string(), false),
        };

        Ok(Self {
            provided: name.to_string(),
            base,
            is_abr_variant,
        })
    }

    /// Organization prefix: everything before the first `-`
    pub fn organization(&self) -> &str {
        self.provided
            .split('-')
            .next()
            .unwrap_or(self.provided.as_str())
    }

    /// Playlist file stem for the given variant, without session or extension
    pub fn playlist_stem(&self, variant: PlaylistVariant) -> String {
        match variant {
            PlaylistVariant::Abr => format!("{}{}", self.base, ABR_SUFFIX),
            PlaylistVariant::Plain => self.base.clone(),
        }
    }

    /// Variant whose naming the stream itself implies
    pub fn native_variant(&self) -> PlaylistVariant {
        if self.is_abr_variant {
            PlaylistVariant::Abr
        } else {
            PlaylistVariant::Plain
        }
    }
}

/// Playlist naming convention in the replay bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistVariant {
    /// `<stream>-abr[-<session>].m3u8`
    Abr,
    /// `<stream>[-<session>].m3u8`
    Plain,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_stream() {
        let id = StreamIdentity::parse("2Ej6z-abcde").unwrap();
        assert_eq!(id.base, "2Ej6z-abcde");
        assert!(!id.is_abr_variant);
        assert_eq!(id.native_variant(), PlaylistVariant::Plain);
        assert_eq!(id.organization(), "2Ej6z");
    }

    #[test]
    fn abr_suffix_detected_and_stripped() {
        let id = StreamIdentity::parse("2Ej6z-abcde-abr").unwrap();
        assert_eq!(id.provided, "2Ej6z-abcde-abr");
        assert_eq!(id.base, "2Ej6z-abcde");
        assert!(id.is_abr_variant);
        assert_eq!(id.playlist_stem(PlaylistVariant::Abr), "2Ej6z-abcde-abr");
        assert_eq!(id.playlist_stem(PlaylistVariant::Plain), "2Ej6z-abcde");
    }

    #[test]
    fn bare_suffix_is_not_abr() {
        let id = StreamIdentity::parse("-abr").unwrap();
        assert!(!id.is_abr_variant);
        assert_eq!(id.base, "-abr");
    }

    #[test]
    fn empty_name_is_missing_parameter() {
        assert!(matches!(
            StreamIdentity::parse("  "),
            Err(ReplayError::MissingParameter(_))
        ));
    }

    #[test]
    fn rejects_path_characters() {
        assert!(StreamIdentity::parse("../secret").is_err());
        assert!(StreamIdentity::parse("a/b").is_err());
        assert!(StreamIdentity::parse("a?b=c").is_err());
    }

    #[test]
    fn rejects_overlong_name() {
        let name = "a".repeat(MAX_STREAM_NAME_LEN + 1);
        assert!(matches!(
            StreamIdentity::parse(&name),
            Err(ReplayError::InvalidStreamName(_))
        ));
        assert!(StreamIdentity::parse(&"a".repeat(MAX_STREAM_NAME_LEN)).is_ok());
    }
}
