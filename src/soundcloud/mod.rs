//! SoundCloud api-v2 access: search, track metadata and stream resolution.

pub mod api;
pub mod models;

pub use api::SoundcloudClient;
pub use models::Track;

use async_trait::async_trait;

/// Everything the HTTP layer needs from SoundCloud.
#[async_trait]
pub trait TrackSource: Send + Sync {
    async fn search(&self, query: &str, limit: u32) -> anyhow::Result<Vec<Track>>;

    /// `Ok(None)` when SoundCloud has no track with this id.
    async fn track(&self, id: u64) -> anyhow::Result<Option<Track>>;

    /// Direct media url, progressive preferred over HLS.
    async fn stream_url(&self, id: u64) -> anyhow::Result<Option<String>>;
}
