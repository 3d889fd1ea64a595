//! LRC format parser
//!
//! Parses synchronized lyrics in LRC format:
//! [mm:ss.xx] Lyrics line here
//!
//! Example:
//! [00:12.34] Hello world
//! [00:15.00] Another line
//!
//! Text without any time tag is accepted as well; every line then becomes
//! an untimed line at offset zero.

use serde::Serialize;

/// Tags that describe the song rather than a lyric line.
const METADATA_PREFIXES: [&str; 5] = ["[ar:", "[ti:", "[al:", "[by:", "[offset:"];

/// A single line of lyrics with its playback offset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LyricLine {
    /// The lyrics text, never empty
    pub text: String,
    /// Offset in milliseconds from the start of the track
    pub offset_ms: u64,
}

impl LyricLine {
    pub fn new(text: impl Into<String>, offset_ms: u64) -> Self {
        Self {
            text: text.into(),
            offset_ms,
        }
    }
}

/// Parse raw LRC text into lines sorted by offset.
///
/// Timestamped lines win: as soon as one line carries a time tag, lines
/// without one are ignored. Ties keep their original order.
pub fn parse(content: &str) -> Vec<LyricLine> {
    let mut timed = Vec::new();
    let mut saw_timestamp = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some((stamps, text)) = split_timed_line(line) {
            saw_timestamp = true;
            if text.is_empty() {
                continue;
            }
            timed.extend(stamps.into_iter().map(|ms| LyricLine::new(text, ms)));
        }
    }

    if !saw_timestamp {
        return parse_untimed(content);
    }

    timed.sort_by_key(|l| l.offset_ms);
    timed
}

/// Every non-empty, non-metadata line at offset zero, in source order.
pub fn parse_untimed(content: &str) -> Vec<LyricLine> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !is_metadata(l))
        .map(|l| LyricLine::new(l, 0))
        .collect()
}

fn is_metadata(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    METADATA_PREFIXES.iter().any(|p| lower.starts_with(p))
}

/// Split `[00:12.34][00:15.00]Lyrics` into its timestamps and trimmed text.
fn split_timed_line(line: &str) -> Option<(Vec<u64>, &str)> {
    let mut timestamps = Vec::new();
    let mut pos = 0;

    while line[pos..].starts_with('[') {
        let Some(end) = line[pos..].find(']') else {
            break;
        };
        match parse_timestamp(&line[pos + 1..pos + end]) {
            Some(ms) => {
                timestamps.push(ms);
                pos += end + 1;
            }
            None => break,
        }
    }

    if timestamps.is_empty() {
        return None;
    }

    Some((timestamps, line[pos..].trim()))
}

/// Parse timestamp string like "00:12.34" or "00:12:34" to milliseconds
fn parse_timestamp(s: &str) -> Option<u64> {
    let parts: Vec<&str> = s.split([':', '.']).collect();
    if parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }

    let min: u64 = parts[0].parse().ok()?;
    let sec: u64 = parts.get(1)?.parse().ok()?;
    if parts[1].len() != 2 {
        return None;
    }

    let frac = match parts.len() {
        2 => 0,
        3 => {
            let f = parts[2];
            // "34" is centiseconds, "340" is milliseconds
            match f.len() {
                1 => f.parse::<u64>().ok()? * 100,
                2 => f.parse::<u64>().ok()? * 10,
                3 => f.parse().ok()?,
                _ => return None,
            }
        }
        _ => return None,
    };

    min.checked_mul(60_000)?
        .checked_add(sec.checked_mul(1000)?)?
        .checked_add(frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("00:12"), Some(12000));
        assert_eq!(parse_timestamp("01:30"), Some(90000));
        assert_eq!(parse_timestamp("00:12.34"), Some(12340));
        assert_eq!(parse_timestamp("00:12.340"), Some(12340));
        assert_eq!(parse_timestamp("00:12.345"), Some(12345));
        assert_eq!(parse_timestamp("00:12:34"), Some(12340));
        assert_eq!(parse_timestamp("ar:Someone"), None);
        assert_eq!(parse_timestamp("00:1x.00"), None);
    }

    #[test]
    fn test_huge_minutes_rejected() {
        assert_eq!(parse_timestamp("999999999999999999:00"), None);
        let lines = parse("[999999999999999999:00]boom\n[00:01.00]ok");
        assert_eq!(lines, vec![LyricLine::new("ok", 1000)]);
    }

    #[test]
    fn test_parse_lrc() {
        let lrc = r#"
[ti:Test Song]
[ar:Test Artist]
[00:12.34]First line
[00:15.00]Second line
"#;
        let lines = parse(lrc);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].offset_ms, 12340);
        assert_eq!(lines[0].text, "First line");
        assert_eq!(lines[1].offset_ms, 15000);
    }

    #[test]
    fn test_offsets_match_tag_values() {
        let lrc = "[01:02.03]a\n[00:59.999]b\n[10:00]c";
        let lines = parse(lrc);
        let offsets: Vec<u64> = lines.iter().map(|l| l.offset_ms).collect();
        assert_eq!(offsets, vec![59_999, 62_030, 600_000]);
        assert_eq!(lines[0].text, "b");
    }

    #[test]
    fn test_sorts_out_of_order_lines_stably() {
        let lrc = "[00:05.00]late\n[00:01.00]first\n[00:01.00]second";
        let texts: Vec<String> = parse(lrc).into_iter().map(|l| l.text).collect();
        assert_eq!(texts, vec!["first", "second", "late"]);
    }

    #[test]
    fn test_repeated_tags_expand() {
        let lines = parse("[00:01.00][00:30.00]Chorus");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].offset_ms, 30_000);
        assert!(lines.iter().all(|l| l.text == "Chorus"));
    }

    #[test]
    fn test_empty_tagged_lines_dropped() {
        let lines = parse("[00:01.00]\n[00:02.00]   \n[00:03.00]Words");
        assert_eq!(lines, vec![LyricLine::new("Words", 3000)]);
    }

    #[test]
    fn test_untimed_fallback_keeps_order() {
        let text = "[ar:Someone]\n[ti:Song]\nZebra line\n\nApple line\n[by:editor]";
        let lines = parse(text);
        assert_eq!(
            lines,
            vec![LyricLine::new("Zebra line", 0), LyricLine::new("Apple line", 0)]
        );
    }

    #[test]
    fn test_untimed_ignored_when_timestamps_present() {
        let lines = parse("Intro words\n[00:04.00]Timed");
        assert_eq!(lines, vec![LyricLine::new("Timed", 4000)]);
    }
}
