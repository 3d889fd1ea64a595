//! Last-resort Musixmatch lookup through the public website.

use crate::lyrics::providers::{BROWSER_USER_AGENT, LyricsProvider, get_text, http_client};
use crate::lyrics::{LyricsError, LyricsResult, TrackQuery, UNKNOWN_LANGUAGE, parser};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::time::Duration;

use super::SOURCE;

const NAME: &str = "Musixmatch (web)";

/// Extracted text must be longer than this to count.
const MIN_LYRICS_CHARS: usize = 50;

static LYRICS_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href="(/lyrics/[^"?#]+)[^"]*""#).expect("lyrics link regex"));
static NEXT_DATA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<script[^>]*id="__NEXT_DATA__"[^>]*>(.*?)</script>"#).expect("next data regex")
});
static CONTAINER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)<(p|span|div)[^>]*class="[^"]*(?:lyrics__content__ok|lyrics__content__warning|mxm-lyrics__content|lyrics-body)[^"]*"[^>]*>(.*?)</(?:p|span|div)>"#,
    )
    .expect("container regex")
});
static BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("br regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag regex"));
static NUMERIC_ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("entity regex"));

/// A way of pulling lyrics text out of a lyrics page.
pub type Strategy = fn(&str) -> Option<String>;

/// Tried in order; the first one yielding enough text wins.
pub const STRATEGIES: [(&str, Strategy); 2] = [
    ("next-data", from_next_data),
    ("css-containers", from_css_containers),
];

#[derive(Debug, Clone)]
pub struct MusixmatchScraper {
    client: reqwest::Client,
    base_url: String,
}

impl MusixmatchScraper {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(BROWSER_USER_AGENT, timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn lyrics_page_path(&self, query: &TrackQuery) -> Result<Option<String>, LyricsError> {
        let terms = format!("{} {}", query.artist, query.title);
        let url = format!("{}/search?query={}", self.base_url, urlencoding::encode(&terms));
        let html = get_text(self.client.get(&url), NAME).await?;
        Ok(first_lyrics_link(&html))
    }
}

pub fn first_lyrics_link(html: &str) -> Option<String> {
    LYRICS_LINK_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Run every strategy in order and keep the first long enough result.
pub fn extract_lyrics(html: &str) -> Option<String> {
    STRATEGIES.iter().find_map(|(name, strategy)| {
        let text = strategy(html)?;
        if text.chars().count() > MIN_LYRICS_CHARS {
            tracing::debug!(strategy = name, "musixmatch page extracted");
            Some(text)
        } else {
            None
        }
    })
}

/// Lyrics body from the page's embedded `__NEXT_DATA__` state.
pub fn from_next_data(html: &str) -> Option<String> {
    let raw = NEXT_DATA_RE.captures(html)?.get(1)?.as_str();
    let state: Value = serde_json::from_str(raw.trim()).ok()?;
    find_lyrics_body(&state).map(|s| s.trim().to_string())
}

fn find_lyrics_body(v: &Value) -> Option<&str> {
    match v {
        Value::Object(map) => {
            if let Some(body) = map
                .get("lyrics")
                .and_then(|l| l.get("body"))
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
            {
                return Some(body);
            }
            if let Some(body) = map
                .get("lyrics_body")
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
            {
                return Some(body);
            }
            map.values().find_map(find_lyrics_body)
        }
        Value::Array(items) => items.iter().find_map(find_lyrics_body),
        _ => None,
    }
}

/// Text of every known lyrics container, joined by newlines.
pub fn from_css_containers(html: &str) -> Option<String> {
    let parts: Vec<String> = CONTAINER_RE
        .captures_iter(html)
        .filter_map(|c| c.get(2))
        .map(|m| html_to_text(m.as_str()))
        .filter(|t| !t.is_empty())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("\n"))
}

fn html_to_text(fragment: &str) -> String {
    let with_breaks = BREAK_RE.replace_all(fragment, "\n");
    let stripped = TAG_RE.replace_all(&with_breaks, "");
    unescape_entities(&stripped).trim().to_string()
}

fn unescape_entities(text: &str) -> String {
    let numeric = NUMERIC_ENTITY_RE.replace_all(text, |caps: &regex::Captures| {
        let code = &caps[1];
        let parsed = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse().ok(),
        };
        parsed
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    [
        ("&quot;", "\""),
        ("&apos;", "'"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&nbsp;", " "),
        ("&amp;", "&"),
    ]
    .iter()
    .fold(numeric.into_owned(), |acc, (entity, plain)| acc.replace(entity, plain))
}

#[async_trait]
impl LyricsProvider for MusixmatchScraper {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch(&self, query: &TrackQuery) -> Result<Option<LyricsResult>, LyricsError> {
        let Some(path) = self.lyrics_page_path(query).await? else {
            return Ok(None);
        };
        tracing::debug!(%path, "musixmatch lyrics page");

        let html = get_text(self.client.get(format!("{}{path}", self.base_url)), NAME).await?;
        let Some(text) = extract_lyrics(&html) else {
            return Ok(None);
        };
        Ok(Some(LyricsResult::new(
            parser::parse_untimed(&text),
            UNKNOWN_LANGUAGE,
            SOURCE,
        )))
    }
}
