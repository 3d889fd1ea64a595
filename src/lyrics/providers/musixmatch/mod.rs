//! Musixmatch, reached three ways: the official API (needs a key), the
//! desktop app API, and finally the public website.

pub mod api;
pub mod scrape;

pub use api::MusixmatchApi;
pub use scrape::MusixmatchScraper;

use super::LyricsProvider;
use crate::config::MusixmatchConfig;
use crate::lyrics::{LyricsError, LyricsResult, TrackQuery};
use async_trait::async_trait;
use std::time::Duration;

/// Source name reported for every Musixmatch path.
pub const SOURCE: &str = "Musixmatch";

/// Tries official (when a key is configured), desktop, then web scrape.
pub struct MusixmatchProvider {
    paths: Vec<Box<dyn LyricsProvider>>,
}

impl MusixmatchProvider {
    pub fn from_config(cfg: &MusixmatchConfig, timeout: Duration) -> anyhow::Result<Self> {
        let mut paths: Vec<Box<dyn LyricsProvider>> = Vec::new();
        if let Some(key) = cfg.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            paths.push(Box::new(MusixmatchApi::official(&cfg.official_base_url, key, timeout)?));
        }
        paths.push(Box::new(MusixmatchApi::desktop(&cfg.desktop_base_url, timeout)?));
        paths.push(Box::new(MusixmatchScraper::new(&cfg.web_base_url, timeout)?));
        let provider = Self { paths };
        tracing::debug!(paths = ?provider.path_names(), "musixmatch paths");
        Ok(provider)
    }

    #[cfg(test)]
    pub fn with_paths(paths: Vec<Box<dyn LyricsProvider>>) -> Self {
        Self { paths }
    }

    pub fn path_names(&self) -> Vec<&'static str> {
        self.paths.iter().map(|p| p.name()).collect()
    }
}

#[async_trait]
impl LyricsProvider for MusixmatchProvider {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn fetch(&self, query: &TrackQuery) -> Result<Option<LyricsResult>, LyricsError> {
        for path in &self.paths {
            if let Some(result) = path.resolve(query).await {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::LyricLine;
    use crate::lyrics::providers::testutil::Scripted;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn stops_at_first_successful_path() {
        let hit = LyricsResult::new(vec![LyricLine::new("desktop words", 0)], "en", SOURCE);
        let (official, official_calls) = Scripted::new("official", None);
        let (desktop, desktop_calls) = Scripted::new("desktop", Some(hit));
        let (web, web_calls) = Scripted::new("web", None);

        let provider = MusixmatchProvider::with_paths(vec![
            Box::new(official),
            Box::new(desktop),
            Box::new(web),
        ]);
        let query = TrackQuery {
            title: "t".into(),
            artist: "a".into(),
        };

        let result = provider.fetch(&query).await.unwrap().unwrap();
        assert_eq!(result.lines[0].text, "desktop words");
        assert_eq!(official_calls.load(Ordering::SeqCst), 1);
        assert_eq!(desktop_calls.load(Ordering::SeqCst), 1);
        assert_eq!(web_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn official_path_only_with_key() {
        let mut cfg = MusixmatchConfig::default();
        let timeout = Duration::from_secs(1);

        let without = MusixmatchProvider::from_config(&cfg, timeout).unwrap();
        assert_eq!(without.path_names(), vec!["Musixmatch (desktop)", "Musixmatch (web)"]);

        cfg.api_key = Some("key".into());
        let with = MusixmatchProvider::from_config(&cfg, timeout).unwrap();
        assert_eq!(
            with.path_names(),
            vec!["Musixmatch (official)", "Musixmatch (desktop)", "Musixmatch (web)"]
        );
    }
}
