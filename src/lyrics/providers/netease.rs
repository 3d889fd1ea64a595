//! NetEase Cloud Music: song search, then lyric lookup by song id.

use super::{BROWSER_USER_AGENT, LyricsProvider, get_text, http_client, parse_json};
use crate::lyrics::{LyricsError, LyricsResult, TrackQuery, parser};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const NAME: &str = "NetEase";
const LANGUAGE: &str = "zh";

#[derive(Debug, Deserialize, Default)]
struct SearchResponse {
    #[serde(default)]
    result: Option<SearchResult>,
}

#[derive(Debug, Deserialize, Default)]
struct SearchResult {
    #[serde(default)]
    songs: Vec<Song>,
}

#[derive(Debug, Deserialize)]
struct Song {
    id: u64,
    #[serde(default)]
    artists: Vec<Artist>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct LyricResponse {
    #[serde(default)]
    lrc: Option<LyricBody>,
}

#[derive(Debug, Deserialize)]
struct LyricBody {
    #[serde(default)]
    lyric: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NeteaseProvider {
    client: reqwest::Client,
    base_url: String,
}

impl NeteaseProvider {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(BROWSER_USER_AGENT, timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header(reqwest::header::REFERER, "https://music.163.com/")
    }

    async fn search_song_id(&self, query: &TrackQuery) -> Result<Option<u64>, LyricsError> {
        let keywords = format!("{} {}", query.title, query.artist);
        let url = format!(
            "{}/api/search/get/web?s={}&type=1&limit=5&offset=0",
            self.base_url,
            urlencoding::encode(&keywords)
        );
        let body = get_text(self.get(&url), NAME).await?;
        let response: SearchResponse = parse_json(NAME, &body)?;
        let songs = response.result.unwrap_or_default().songs;
        Ok(best_match(&songs, &query.artist))
    }

    async fn lyric_text(&self, song_id: u64) -> Result<Option<String>, LyricsError> {
        let url = format!("{}/api/song/lyric?id={song_id}&lv=1&kv=1&tv=-1", self.base_url);
        let body = get_text(self.get(&url), NAME).await?;
        let response: LyricResponse = parse_json(NAME, &body)?;
        Ok(response
            .lrc
            .and_then(|l| l.lyric)
            .filter(|l| !l.trim().is_empty()))
    }
}

/// First song credited to `artist`, or the first song at all.
fn best_match(songs: &[Song], artist: &str) -> Option<u64> {
    let wanted = artist.to_lowercase();
    songs
        .iter()
        .find(|s| s.artists.iter().any(|a| a.name.to_lowercase() == wanted))
        .or_else(|| songs.first())
        .map(|s| s.id)
}

#[async_trait]
impl LyricsProvider for NeteaseProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch(&self, query: &TrackQuery) -> Result<Option<LyricsResult>, LyricsError> {
        let Some(song_id) = self.search_song_id(query).await? else {
            return Ok(None);
        };
        tracing::debug!(song_id, "netease match");

        let Some(text) = self.lyric_text(song_id).await? else {
            return Ok(None);
        };
        Ok(Some(LyricsResult::new(parser::parse(&text), LANGUAGE, NAME)))
    }
}
