//! Ordered provider fallback.

use super::providers::{
    LrclibProvider, LyricsProvider, MusixmatchProvider, NeteaseProvider, QqMusicProvider,
};
use super::{LyricsError, LyricsResult, TrackQuery};
use crate::config::LyricsConfig;
use std::time::Duration;

/// Providers in priority order; the first non-empty result wins.
pub struct LyricsPipeline {
    providers: Vec<Box<dyn LyricsProvider>>,
}

impl LyricsPipeline {
    /// LRCLIB, NetEase, QQ Music, then Musixmatch.
    pub fn from_config(cfg: &LyricsConfig) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(cfg.timeout_secs.max(1));
        Ok(Self::new(vec![
            Box::new(LrclibProvider::new(&cfg.lrclib_base_url, timeout)?),
            Box::new(NeteaseProvider::new(&cfg.netease_base_url, timeout)?),
            Box::new(QqMusicProvider::new(&cfg.qq_base_url, timeout)?),
            Box::new(MusixmatchProvider::from_config(&cfg.musixmatch, timeout)?),
        ]))
    }

    pub fn new(providers: Vec<Box<dyn LyricsProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn resolve(&self, query: &TrackQuery) -> Result<LyricsResult, LyricsError> {
        for provider in &self.providers {
            tracing::debug!(provider = provider.name(), title = %query.title, artist = %query.artist, "trying provider");
            if let Some(result) = provider.resolve(query).await {
                tracing::info!(
                    provider = provider.name(),
                    lines = result.lines.len(),
                    sync = ?result.sync_type,
                    "lyrics resolved"
                );
                return Ok(result);
            }
        }

        Err(LyricsError::NotFound {
            title: query.title.clone(),
            artist: query.artist.clone(),
        })
    }
}
