//! QQ Music: song search, then a JSONP lyric endpoint carrying base64 LRC.

use super::{BROWSER_USER_AGENT, LyricsProvider, get_text, http_client, parse_json};
use crate::lyrics::{LyricsError, LyricsResult, TrackQuery, parser};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::Deserialize;
use std::time::Duration;

const NAME: &str = "QQ Music";
const LANGUAGE: &str = "zh";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Option<SearchData>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    song: SongList,
}

#[derive(Debug, Deserialize)]
struct SongList {
    #[serde(default)]
    list: Vec<Song>,
}

#[derive(Debug, Deserialize)]
struct Song {
    songmid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LyricResponse {
    #[serde(default)]
    lyric: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QqMusicProvider {
    client: reqwest::Client,
    base_url: String,
}

impl QqMusicProvider {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(BROWSER_USER_AGENT, timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header(reqwest::header::REFERER, "https://y.qq.com/")
    }

    async fn search_songmid(&self, query: &TrackQuery) -> Result<Option<String>, LyricsError> {
        let keywords = format!("{} {}", query.title, query.artist);
        let url = format!(
            "{}/soso/fcgi-bin/client_search_cp?w={}&format=json&p=1&n=5&cr=1&t=0",
            self.base_url,
            urlencoding::encode(&keywords)
        );
        let body = get_text(self.get(&url), NAME).await?;
        let response: SearchResponse = parse_json(NAME, strip_jsonp(&body))?;
        Ok(response
            .data
            .into_iter()
            .flat_map(|d| d.song.list)
            .find_map(|s| s.songmid.filter(|m| !m.is_empty())))
    }

    async fn lyric_text(&self, songmid: &str) -> Result<Option<String>, LyricsError> {
        let url = format!(
            "{}/lyric/fcgi-bin/fcg_query_lyric_new.fcg?songmid={}&format=json&g_tk=5381",
            self.base_url,
            urlencoding::encode(songmid)
        );
        let body = get_text(self.get(&url), NAME).await?;
        let response: LyricResponse = parse_json(NAME, strip_jsonp(&body))?;
        match response.lyric.filter(|l| !l.trim().is_empty()) {
            Some(encoded) => decode_lyric(&encoded).map(Some),
            None => Ok(None),
        }
    }
}

/// Unwrap `callbackName({...});` to `{...}`. Plain JSON passes through.
pub fn strip_jsonp(body: &str) -> &str {
    let trimmed = body.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }

    let Some(open) = trimmed.find('(') else {
        return trimmed;
    };
    let callback = &trimmed[..open];
    if callback.is_empty() || !callback.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '$') {
        return trimmed;
    }

    let inner = trimmed.trim_end_matches(';').trim_end();
    match inner.rfind(')') {
        Some(close) if close > open => inner[open + 1..close].trim(),
        _ => trimmed,
    }
}

fn decode_lyric(encoded: &str) -> Result<String, LyricsError> {
    let bytes = BASE64_STANDARD
        .decode(encoded.trim())
        .map_err(|e| LyricsError::parse(NAME, format!("base64: {e}")))?;
    String::from_utf8(bytes).map_err(|e| LyricsError::parse(NAME, format!("utf-8: {e}")))
}

#[async_trait]
impl LyricsProvider for QqMusicProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch(&self, query: &TrackQuery) -> Result<Option<LyricsResult>, LyricsError> {
        let Some(songmid) = self.search_songmid(query).await? else {
            return Ok(None);
        };
        tracing::debug!(%songmid, "qq music match");

        let Some(text) = self.lyric_text(&songmid).await? else {
            return Ok(None);
        };
        Ok(Some(LyricsResult::new(parser::parse(&text), LANGUAGE, NAME)))
    }
}
