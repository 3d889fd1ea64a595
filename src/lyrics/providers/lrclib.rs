//! LRCLIB API client
//!
//! LRCLIB is a free lyrics API that provides synchronized (LRC format) lyrics.
//! API Documentation: https://lrclib.net/docs

use super::{LyricsProvider, get_text, http_client, parse_json};
use crate::lyrics::{LyricsError, LyricsResult, TrackQuery, UNKNOWN_LANGUAGE, parser};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const NAME: &str = "LRCLIB";

/// One LRCLIB search hit
#[derive(Debug, Deserialize, Clone)]
pub struct LrclibHit {
    #[serde(rename = "plainLyrics")]
    pub plain_lyrics: Option<String>,
    #[serde(rename = "syncedLyrics")]
    pub synced_lyrics: Option<String>,
}

impl LrclibHit {
    /// Synced lyrics when present, plain lyrics otherwise.
    fn best_text(&self) -> Option<&str> {
        fn non_empty(s: &Option<String>) -> Option<&str> {
            s.as_deref().filter(|t| !t.trim().is_empty())
        }
        non_empty(&self.synced_lyrics).or_else(|| non_empty(&self.plain_lyrics))
    }
}

/// LRCLIB API client
#[derive(Debug, Clone)]
pub struct LrclibProvider {
    client: reqwest::Client,
    base_url: String,
}

impl LrclibProvider {
    const USER_AGENT: &'static str = concat!("scproxy/", env!("CARGO_PKG_VERSION"));

    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(Self::USER_AGENT, timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Search by track and artist name
    async fn search(&self, query: &TrackQuery) -> Result<Vec<LrclibHit>, LyricsError> {
        let url = format!(
            "{}/search?track_name={}&artist_name={}",
            self.base_url,
            urlencoding::encode(&query.title),
            urlencoding::encode(&query.artist)
        );
        let body = get_text(self.client.get(&url), NAME).await?;
        parse_json(NAME, &body)
    }
}

#[async_trait]
impl LyricsProvider for LrclibProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch(&self, query: &TrackQuery) -> Result<Option<LyricsResult>, LyricsError> {
        let hits = self.search(query).await?;
        let Some(text) = hits.first().and_then(LrclibHit::best_text) else {
            return Ok(None);
        };
        Ok(Some(LyricsResult::new(parser::parse(text), UNKNOWN_LANGUAGE, NAME)))
    }
}
