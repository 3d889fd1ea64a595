//! Serialize a resolved result back to LRC text.

use super::{LyricLine, LyricsResult, SyncType};

/// Render lines as LRC, one per line, joined by `\n`.
///
/// Untimed lines of an unsynced result are emitted as bare text; everything
/// else gets a `[mm:ss.cc]` tag.
pub fn to_lrc(result: &LyricsResult) -> String {
    result
        .lines
        .iter()
        .map(|line| render_line(line, result.sync_type))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_line(line: &LyricLine, sync_type: SyncType) -> String {
    if sync_type == SyncType::Unsynced && line.offset_ms == 0 {
        return line.text.clone();
    }
    format!("[{}]{}", format_timestamp(line.offset_ms), line.text)
}

/// `mm:ss.cc`, zero padded. Minutes are not capped at 99.
pub fn format_timestamp(offset_ms: u64) -> String {
    let minutes = offset_ms / 60_000;
    let seconds = (offset_ms % 60_000) / 1000;
    let centis = (offset_ms % 1000) / 10;
    format!("{minutes:02}:{seconds:02}.{centis:02}")
}
