//! Musixmatch ws/1.1 API, shared by the official (API key) and desktop
//! (anonymous user token) endpoints.

use crate::lyrics::providers::{BROWSER_USER_AGENT, LyricsProvider, get_text, http_client, parse_json};
use crate::lyrics::{LyricsError, LyricsResult, TrackQuery, UNKNOWN_LANGUAGE, parser};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::SOURCE;

const DESKTOP_APP_ID: &str = "web-desktop-app-v1.0";
const DISCLAIMER_TEXT: &str = "This Lyrics is NOT for Commercial use";

#[derive(Debug, Clone)]
pub enum Auth {
    /// Official developer API key.
    ApiKey(String),
    /// Desktop app endpoint; a fresh anonymous token is requested per lookup.
    DesktopToken,
}

#[derive(Debug, Clone)]
pub struct MusixmatchApi {
    client: reqwest::Client,
    base_url: String,
    auth: Auth,
}

impl MusixmatchApi {
    pub fn official(base_url: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        Self::new(base_url, Auth::ApiKey(api_key.to_string()), timeout)
    }

    pub fn desktop(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Self::new(base_url, Auth::DesktopToken, timeout)
    }

    fn new(base_url: &str, auth: Auth, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(BROWSER_USER_AGENT, timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    fn label(&self) -> &'static str {
        match self.auth {
            Auth::ApiKey(_) => "Musixmatch (official)",
            Auth::DesktopToken => "Musixmatch (desktop)",
        }
    }

    /// Query-string fragment that authenticates a call.
    async fn auth_params(&self) -> Result<String, LyricsError> {
        match &self.auth {
            Auth::ApiKey(key) => Ok(format!("apikey={}", urlencoding::encode(key))),
            Auth::DesktopToken => {
                let token = self.user_token().await?;
                Ok(format!(
                    "app_id={DESKTOP_APP_ID}&usertoken={}",
                    urlencoding::encode(&token)
                ))
            }
        }
    }

    async fn user_token(&self) -> Result<String, LyricsError> {
        let url = format!("{}/token.get?app_id={DESKTOP_APP_ID}&format=json", self.base_url);
        let v = self.call(&url).await?;
        v.pointer("/message/body/user_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty() && !t.starts_with("UpgradeOnly"))
            .map(str::to_string)
            .ok_or_else(|| LyricsError::unavailable(self.label(), "no user token issued"))
    }

    async fn call(&self, url: &str) -> Result<Value, LyricsError> {
        let mut request = self.client.get(url);
        if matches!(self.auth, Auth::DesktopToken) {
            request = request.header(reqwest::header::COOKIE, "AWSELBCORS=0; AWSELB=0");
        }
        let body = get_text(request, self.label()).await?;
        parse_json(self.label(), &body)
    }

    /// Call `method` and return `message.body` when the envelope reports 200.
    async fn method(&self, method: &str, params: &str, auth: &str) -> Result<Option<Value>, LyricsError> {
        let url = format!("{}/{method}?format=json&{params}&{auth}", self.base_url);
        let mut v = self.call(&url).await?;
        let status = v
            .pointer("/message/header/status_code")
            .and_then(Value::as_i64)
            .unwrap_or_default();
        if status != 200 {
            tracing::debug!(provider = self.label(), method, status, "musixmatch non-200 envelope");
            return Ok(None);
        }
        Ok(v.pointer_mut("/message/body").map(Value::take))
    }

    async fn search_track_id(&self, query: &TrackQuery, auth: &str) -> Result<Option<i64>, LyricsError> {
        let params = format!(
            "q_track={}&q_artist={}&f_has_lyrics=1&page_size=1&s_track_rating=desc",
            urlencoding::encode(&query.title),
            urlencoding::encode(&query.artist)
        );
        let body = self.method("track.search", &params, auth).await?;
        Ok(body
            .as_ref()
            .and_then(|b| b.pointer("/track_list/0/track/track_id"))
            .and_then(Value::as_i64))
    }

    async fn subtitle(&self, track_id: i64, auth: &str) -> Result<Option<LyricsResult>, LyricsError> {
        let params = format!("track_id={track_id}&subtitle_format=lrc");
        let Some(body) = self.method("track.subtitle.get", &params, auth).await? else {
            return Ok(None);
        };
        let Some(text) = body.pointer("/subtitle/subtitle_body").and_then(Value::as_str) else {
            return Ok(None);
        };
        let language = body
            .pointer("/subtitle/subtitle_language")
            .and_then(Value::as_str)
            .filter(|l| !l.is_empty())
            .unwrap_or(UNKNOWN_LANGUAGE);
        Ok(Some(LyricsResult::new(parser::parse(text), language, SOURCE)))
    }

    async fn plain_lyrics(&self, track_id: i64, auth: &str) -> Result<Option<LyricsResult>, LyricsError> {
        let params = format!("track_id={track_id}");
        let Some(body) = self.method("track.lyrics.get", &params, auth).await? else {
            return Ok(None);
        };
        let Some(text) = body.pointer("/lyrics/lyrics_body").and_then(Value::as_str) else {
            return Ok(None);
        };
        let language = body
            .pointer("/lyrics/lyrics_language")
            .and_then(Value::as_str)
            .filter(|l| !l.is_empty())
            .unwrap_or(UNKNOWN_LANGUAGE);
        let lines = parser::parse_untimed(strip_disclaimer(text));
        Ok(Some(LyricsResult::new(lines, language, SOURCE)))
    }
}

/// Drop the "NOT for Commercial use" trailer the API appends to plain lyrics.
pub fn strip_disclaimer(body: &str) -> &str {
    let Some(idx) = body.find(DISCLAIMER_TEXT) else {
        return body.trim_end();
    };
    body[..idx].trim_end().trim_end_matches('*').trim_end()
}

#[async_trait]
impl LyricsProvider for MusixmatchApi {
    fn name(&self) -> &'static str {
        self.label()
    }

    async fn fetch(&self, query: &TrackQuery) -> Result<Option<LyricsResult>, LyricsError> {
        let auth = self.auth_params().await?;
        let Some(track_id) = self.search_track_id(query, &auth).await? else {
            return Ok(None);
        };
        tracing::debug!(provider = self.label(), track_id, "musixmatch match");

        match self.subtitle(track_id, &auth).await {
            Ok(Some(result)) if !result.is_empty() => return Ok(Some(result)),
            Ok(_) => {}
            Err(e) => tracing::debug!(provider = self.label(), error = %e, "subtitle fetch failed"),
        }
        self.plain_lyrics(track_id, &auth).await
    }
}
