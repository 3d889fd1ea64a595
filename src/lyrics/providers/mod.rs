//! External lyrics providers.
//!
//! Every adapter implements [`LyricsProvider::fetch`] and lets the provided
//! [`LyricsProvider::resolve`] absorb its failures, so a broken provider only
//! ever means "try the next one".

pub mod lrclib;
pub mod musixmatch;
pub mod netease;
pub mod qqmusic;

pub use lrclib::LrclibProvider;
pub use musixmatch::MusixmatchProvider;
pub use netease::NeteaseProvider;
pub use qqmusic::QqMusicProvider;

use super::{LyricsError, LyricsResult, TrackQuery};
use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Human-readable provider name, reported as the result source.
    fn name(&self) -> &'static str;

    /// One search + fetch round against the provider.
    async fn fetch(&self, query: &TrackQuery) -> Result<Option<LyricsResult>, LyricsError>;

    /// `fetch` with every failure and every empty result turned into `None`.
    async fn resolve(&self, query: &TrackQuery) -> Option<LyricsResult> {
        match self.fetch(query).await {
            Ok(Some(result)) if !result.is_empty() => Some(result),
            Ok(_) => {
                tracing::debug!(provider = self.name(), title = %query.title, "no lyrics");
                None
            }
            Err(e) => {
                tracing::warn!(provider = self.name(), title = %query.title, error = %e, "provider skipped");
                None
            }
        }
    }
}

pub(crate) fn http_client(user_agent: &str, timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .context("build reqwest client")
}

/// GET `url` and return the body of a 2xx response.
pub(crate) async fn get_text(
    request: reqwest::RequestBuilder,
    provider: &'static str,
) -> Result<String, LyricsError> {
    let response = request
        .send()
        .await
        .map_err(|e| LyricsError::unavailable(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(LyricsError::unavailable(provider, format!("http status {status}")));
    }

    response
        .text()
        .await
        .map_err(|e| LyricsError::unavailable(provider, e))
}

pub(crate) fn parse_json<T: DeserializeOwned>(provider: &'static str, body: &str) -> Result<T, LyricsError> {
    serde_json::from_str(body).map_err(|e| LyricsError::parse(provider, e))
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use axum::Router;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider returning a canned answer and counting its invocations.
    pub struct Scripted {
        pub name: &'static str,
        pub answer: Option<LyricsResult>,
        pub calls: Arc<AtomicUsize>,
    }

    impl Scripted {
        pub fn new(name: &'static str, answer: Option<LyricsResult>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let provider = Self {
                name,
                answer,
                calls: calls.clone(),
            };
            (provider, calls)
        }
    }

    #[async_trait]
    impl LyricsProvider for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch(&self, _query: &TrackQuery) -> Result<Option<LyricsResult>, LyricsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.answer {
                Some(r) => Ok(Some(r.clone())),
                None => Err(LyricsError::unavailable(self.name, "scripted failure")),
            }
        }
    }

    /// Serve `router` on an ephemeral local port and return its base url.
    pub async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }
}
