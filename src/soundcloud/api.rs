use crate::config::SoundcloudConfig;
use crate::soundcloud::TrackSource;
use crate::soundcloud::models::{ApiTrack, Collection, Track};
use anyhow::Context;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, REFERER, USER_AGENT};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

static SCRIPT_SRC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<script[^>]+src="([^"]+\.js)""#).expect("script src regex"));
static CLIENT_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"client_id\s*[:=]\s*"([A-Za-z0-9]{16,})""#).expect("client id regex")
});

#[derive(Debug)]
struct Inner {
    http: reqwest::Client,
    base_url: String,
    web_url: String,
    client_id: OnceCell<String>,
}

/// api-v2 client. Without a configured client id, one is scraped from the
/// web app's script bundles on first use and kept for the process lifetime.
#[derive(Debug, Clone)]
pub struct SoundcloudClient {
    inner: Arc<Inner>,
}

#[derive(Debug, Deserialize)]
struct StreamLocation {
    url: String,
}

impl SoundcloudClient {
    pub fn new(cfg: &SoundcloudConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(crate::lyrics::providers::BROWSER_USER_AGENT),
        );
        headers.insert(ORIGIN, HeaderValue::from_static("https://soundcloud.com"));
        headers.insert(REFERER, HeaderValue::from_static("https://soundcloud.com/"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .context("build reqwest client")?;

        let client_id = cfg
            .client_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: cfg.base_url.trim_end_matches('/').to_string(),
                web_url: cfg.web_url.trim_end_matches('/').to_string(),
                client_id: OnceCell::new_with(client_id),
            }),
        })
    }

    async fn client_id(&self) -> anyhow::Result<String> {
        self.inner
            .client_id
            .get_or_try_init(|| async {
                let html = self.get_text(&self.inner.web_url).await.context("fetch soundcloud web app")?;

                // The id lives in one of the later bundles; scan from the end.
                let scripts: Vec<&str> = SCRIPT_SRC_RE
                    .captures_iter(&html)
                    .filter_map(|c| c.get(1).map(|m| m.as_str()))
                    .collect();
                for src in scripts.into_iter().rev() {
                    let url = if src.starts_with("http") {
                        src.to_string()
                    } else {
                        format!("{}/{}", self.inner.web_url, src.trim_start_matches('/'))
                    };
                    let js = match self.get_text(&url).await {
                        Ok(js) => js,
                        Err(e) => {
                            tracing::debug!(%url, error = %e, "skip script bundle");
                            continue;
                        }
                    };
                    if let Some(id) = parse_client_id(&js) {
                        tracing::info!("soundcloud client id discovered");
                        return Ok(id);
                    }
                }
                anyhow::bail!("no client_id found in soundcloud script bundles")
            })
            .await
            .cloned()
    }

    async fn get_text(&self, url: &str) -> anyhow::Result<String> {
        self.inner
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url} http status"))?
            .text()
            .await
            .with_context(|| format!("read body of {url}"))
    }

    async fn fetch_api_track(&self, id: u64) -> anyhow::Result<Option<ApiTrack>> {
        let client_id = self.client_id().await?;
        let url = format!(
            "{}/tracks/{id}?client_id={}",
            self.inner.base_url,
            urlencoding::encode(&client_id)
        );
        let response = self
            .inner
            .http
            .get(&url)
            .send()
            .await
            .context("send track request")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let track = response
            .error_for_status()
            .context("track http status")?
            .json::<ApiTrack>()
            .await
            .context("parse track json")?;
        Ok(Some(track))
    }
}

#[async_trait]
impl TrackSource for SoundcloudClient {
    async fn search(&self, query: &str, limit: u32) -> anyhow::Result<Vec<Track>> {
        let client_id = self.client_id().await?;
        let url = format!(
            "{}/search/tracks?q={}&limit={limit}&client_id={}",
            self.inner.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&client_id)
        );
        let page: Collection<serde_json::Value> = self
            .inner
            .http
            .get(&url)
            .send()
            .await
            .context("send search request")?
            .error_for_status()
            .context("search http status")?
            .json()
            .await
            .context("parse search json")?;

        // Playlists and users can show up in the collection; keep tracks only.
        Ok(page
            .collection
            .into_iter()
            .filter_map(|item| serde_json::from_value::<ApiTrack>(item).ok())
            .map(Track::from)
            .collect())
    }

    async fn track(&self, id: u64) -> anyhow::Result<Option<Track>> {
        Ok(self.fetch_api_track(id).await?.map(Track::from))
    }

    async fn stream_url(&self, id: u64) -> anyhow::Result<Option<String>> {
        let Some(track) = self.fetch_api_track(id).await? else {
            return Ok(None);
        };
        let Some(transcoding) = track.stream_transcoding() else {
            tracing::debug!(id, "track has no playable transcoding");
            return Ok(None);
        };

        let client_id = self.client_id().await?;
        let sep = if transcoding.url.contains('?') { '&' } else { '?' };
        let mut url = format!(
            "{}{sep}client_id={}",
            transcoding.url,
            urlencoding::encode(&client_id)
        );
        if let Some(auth) = &track.track_authorization {
            url.push_str(&format!("&track_authorization={}", urlencoding::encode(auth)));
        }

        let location: StreamLocation = self
            .inner
            .http
            .get(&url)
            .send()
            .await
            .context("send stream lookup")?
            .error_for_status()
            .context("stream lookup http status")?
            .json()
            .await
            .context("parse stream lookup json")?;
        Ok(Some(location.url))
    }
}

fn parse_client_id(js: &str) -> Option<String> {
    CLIENT_ID_RE
        .captures(js)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::providers::testutil;
    use axum::{
        Json, Router,
        extract::{Path, Query, State},
        http::StatusCode as AxumStatus,
        response::{Html, IntoResponse},
        routing::get,
    };
    use serde_json::json;
    use std::collections::HashMap;

    const CLIENT_ID: &str = "abcdefghijklmnop1234";

    fn config(api: &str, web: &str, client_id: Option<&str>) -> SoundcloudConfig {
        SoundcloudConfig {
            client_id: client_id.map(str::to_string),
            base_url: api.to_string(),
            web_url: web.to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn finds_client_id_in_bundle() {
        let js = r#"var a=1;n={client_id:"abcdefghijklmnop1234",env:"production"}"#;
        assert_eq!(parse_client_id(js).as_deref(), Some(CLIENT_ID));
        assert_eq!(parse_client_id(r#"client_id:"short""#), None);
    }

    async fn api_server() -> String {
        async fn track(
            State(base): State<String>,
            Path(id): Path<u64>,
            Query(q): Query<HashMap<String, String>>,
        ) -> axum::response::Response {
            assert_eq!(q.get("client_id").map(String::as_str), Some(CLIENT_ID));
            if id != 42 {
                return AxumStatus::NOT_FOUND.into_response();
            }
            Json(json!({
                "id": 42,
                "title": "Eminem - Lose Yourself",
                "duration": 326000,
                "user": { "username": "uploader" },
                "track_authorization": "auth-token",
                "media": { "transcodings": [
                    { "url": format!("{base}/media/42/hls"), "format": { "protocol": "hls" } },
                    { "url": format!("{base}/media/42/progressive"), "format": { "protocol": "progressive" } }
                ]}
            }))
            .into_response()
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let router = Router::new()
            .route("/tracks/:id", get(track))
            .route(
                "/media/42/progressive",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    assert_eq!(q.get("track_authorization").map(String::as_str), Some("auth-token"));
                    Json(json!({ "url": "https://cdn.example/42.mp3" }))
                }),
            )
            .route(
                "/search/tracks",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    assert_eq!(q.get("q").map(String::as_str), Some("lose yourself"));
                    assert_eq!(q.get("limit").map(String::as_str), Some("5"));
                    Json(json!({ "collection": [
                        { "id": 1, "title": "Lose Yourself", "duration": 1000,
                          "user": { "username": "u" }, "publisher_metadata": { "artist": "Eminem" } },
                        { "kind": "playlist", "title": "not a track" }
                    ]}))
                }),
            )
            .with_state(base.clone());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        base
    }

    #[tokio::test]
    async fn search_keeps_tracks_only() {
        let api = api_server().await;
        let client = SoundcloudClient::new(&config(&api, &api, Some(CLIENT_ID))).unwrap();

        let tracks = client.search("lose yourself", 5).await.unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].artist, "Eminem");
    }

    #[tokio::test]
    async fn track_lookup_and_missing_track() {
        let api = api_server().await;
        let client = SoundcloudClient::new(&config(&api, &api, Some(CLIENT_ID))).unwrap();

        let track = client.track(42).await.unwrap().unwrap();
        assert_eq!(track.title, "Eminem - Lose Yourself");
        assert_eq!(track.artist, "uploader");
        assert!(client.track(7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stream_url_uses_progressive_transcoding() {
        let api = api_server().await;
        let client = SoundcloudClient::new(&config(&api, &api, Some(CLIENT_ID))).unwrap();

        let url = client.stream_url(42).await.unwrap();
        assert_eq!(url.as_deref(), Some("https://cdn.example/42.mp3"));
        assert_eq!(client.stream_url(7).await.unwrap(), None);
    }

    #[tokio::test]
    async fn client_id_is_scraped_when_unset() {
        let web = testutil::serve(
            Router::new()
                .route(
                    "/",
                    get(|| async {
                        Html(r#"<html><script crossorigin src="/assets/vendor.js"></script><script crossorigin src="/assets/app.js"></script></html>"#)
                    }),
                )
                .route("/assets/vendor.js", get(|| async { "var nothing=1;" }))
                .route(
                    "/assets/app.js",
                    get(|| async { r#"o.push({client_id:"abcdefghijklmnop1234"})"# }),
                ),
        )
        .await;
        let api = api_server().await;
        let client = SoundcloudClient::new(&config(&api, &web, None)).unwrap();

        assert!(client.track(42).await.unwrap().is_some());
    }
}
