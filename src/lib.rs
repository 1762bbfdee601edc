pub mod cache;
pub mod clips;
pub mod config;
pub mod error;
pub mod hls;
pub mod metrics;
pub mod replay;
pub mod server;
