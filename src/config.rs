use std::env;
use std::time::Duration;
use url::Url;

/// Default replay bucket serving the timestamped playlists
pub const DEFAULT_BUCKET_URL: &str = "https://bintu-vod.nanocosmos.de/vod/replay";

/// Default path of the replayer page, relative to the page root
pub const DEFAULT_PAGE_PATH: &str = "live-replay/replayer";

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    /// Root used when building share and embed links, without trailing slash
    pub page_root: String,
    /// Base URL of the replay bucket, without trailing slash
    pub bucket_url: String,
    /// Path of the replayer page that decodes share tokens
    pub page_path: String,
    /// Path of the embeddable replayer page
    pub embed_path: String,
    /// Insert the organization (stream name prefix) as a bucket directory
    pub use_orga: bool,
    pub is_dev: bool,
    /// Per-request timeout for playlist fetches in milliseconds
    pub fetch_timeout_ms: u64,
    /// TTL of the playlist body cache in milliseconds (0 disables caching)
    pub playlist_cache_ttl_ms: u64,
    /// Idle TTL of clip sessions in seconds
    pub clip_ttl_secs: u64,
    /// Interval of the clip status monitor in milliseconds
    pub status_interval_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    /// In DEV mode, provides sensible defaults. In PROD mode, PORT and PAGE_ROOT are required.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let is_dev = env::var("DEV_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        let port = if is_dev {
            env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?
        } else {
            env::var("PORT")
                .map_err(|_| "PORT is required in production")?
                .parse()?
        };

        let page_root = if is_dev {
            env::var("PAGE_ROOT").unwrap_or_else(|_| "http://localhost:3000".to_string())
        } else {
            env::var("PAGE_ROOT").map_err(|_| "PAGE_ROOT is required in production")?
        };
        let page_root = normalize_base(&page_root, "PAGE_ROOT")?;

        let bucket_url = env::var("BUCKET_URL").unwrap_or_else(|_| DEFAULT_BUCKET_URL.to_string());
        let bucket_url = normalize_base(&bucket_url, "BUCKET_URL")?;

        let page_path = env::var("PAGE_PATH").unwrap_or_else(|_| DEFAULT_PAGE_PATH.to_string());
        let embed_path = env::var("EMBED_PATH").unwrap_or_else(|_| DEFAULT_PAGE_PATH.to_string());

        let use_orga = env::var("USE_ORGA")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        let fetch_timeout_ms = parse_or("FETCH_TIMEOUT_MS", 5000);
        let playlist_cache_ttl_ms = parse_or("PLAYLIST_CACHE_TTL_MS", 2000);
        let clip_ttl_secs = parse_or("CLIP_TTL_SECS", 300);
        let status_interval_ms = parse_or("STATUS_INTERVAL_MS", 1000).max(50);

        Ok(Config {
            port,
            page_root,
            bucket_url,
            page_path: page_path.trim_matches('/').to_string(),
            embed_path: embed_path.trim_matches('/').to_string(),
            use_orga,
            is_dev,
            fetch_timeout_ms,
            playlist_cache_ttl_ms,
            clip_ttl_secs,
            status_interval_ms,
        })
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }
}

fn parse_or(var: &str, default: u64) -> u64 {
    env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Validate an http(s) base URL and strip trailing slashes
fn normalize_base(raw: &str, var: &str) -> Result<String, Box<dyn std::error::Error>> {
    let parsed = Url::parse(raw).map_err(|e| format!("{var} is not a valid URL: {e}"))?;
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(format!("{var} must be http(s), got '{scheme}'").into()),
    }
    Ok(raw.trim_end_matches('/').to_string())
}
