//! Lyrics module: multi-provider lyrics resolution
//!
//! This module provides:
//! - LRC format parser and serializer
//! - Title/artist normalization for combined "artist - title" strings
//! - One adapter per external lyrics provider
//! - The pipeline that tries providers in a fixed order

pub mod error;
pub mod lrc;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod providers;

pub use error::LyricsError;
pub use normalize::TrackQuery;
pub use parser::LyricLine;
pub use pipeline::LyricsPipeline;

use serde::Serialize;

/// Language tag used when a provider does not report one.
pub const UNKNOWN_LANGUAGE: &str = "und";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncType {
    LineSynced,
    Unsynced,
}

/// Lyrics produced by a single provider.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsResult {
    pub lines: Vec<LyricLine>,
    pub sync_type: SyncType,
    pub language: String,
    pub source: String,
}

impl LyricsResult {
    /// `sync_type` is derived: synced iff some line has a non-zero offset.
    pub fn new(lines: Vec<LyricLine>, language: impl Into<String>, source: impl Into<String>) -> Self {
        let sync_type = if lines.iter().any(|l| l.offset_ms > 0) {
            SyncType::LineSynced
        } else {
            SyncType::Unsynced
        };
        Self {
            lines,
            sync_type,
            language: language.into(),
            source: source.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn to_lrc(&self) -> String {
        lrc::to_lrc(self)
    }
}
