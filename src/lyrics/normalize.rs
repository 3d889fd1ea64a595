//! Title/artist normalization.
//!
//! Uploads on SoundCloud frequently carry the real artist inside the title
//! ("Eminem - Lose Yourself") while the artist field holds the uploader's
//! user name. A dash split of the title therefore wins over the given artist.

use super::LyricsError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

const MAX_ARTIST_CHARS: usize = 100;
const MAX_TITLE_CHARS: usize = 200;

static DASH_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)\s*-\s*(.+)$").expect("dash split regex"));

/// The title/artist pair handed to every lyrics provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackQuery {
    pub title: String,
    pub artist: String,
}

impl TrackQuery {
    /// Build a query from caller-supplied fields.
    ///
    /// A title that splits on a dash overrides `artist`; otherwise both
    /// fields must be present after trimming.
    pub fn from_parts(title: &str, artist: Option<&str>) -> Result<Self, LyricsError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(LyricsError::InputInvalid("title is required".into()));
        }

        if let Some(split) = split_artist_title(title) {
            return Ok(split);
        }

        match artist.map(str::trim).filter(|a| !a.is_empty()) {
            Some(artist) => Ok(Self {
                title: title.to_string(),
                artist: artist.to_string(),
            }),
            None => Err(LyricsError::InputInvalid(format!(
                "no artist given and none found in title {title:?}"
            ))),
        }
    }
}

/// Split "artist - title" on the first hyphen, en dash or em dash.
///
/// Returns `None` when there is no dash, a side is empty, or the artist is
/// 100 characters or longer / the title 200 or longer.
pub fn split_artist_title(combined: &str) -> Option<TrackQuery> {
    let normalized = combined.replace(['\u{2013}', '\u{2014}'], "-");
    let caps = DASH_SPLIT_RE.captures(normalized.trim())?;

    let artist = caps.get(1)?.as_str().trim();
    let title = caps.get(2)?.as_str().trim();

    if artist.is_empty() || title.is_empty() {
        return None;
    }
    if artist.chars().count() >= MAX_ARTIST_CHARS || title.chars().count() >= MAX_TITLE_CHARS {
        return None;
    }

    Some(TrackQuery {
        title: title.to_string(),
        artist: artist.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(artist: &str, title: &str) -> TrackQuery {
        TrackQuery {
            title: title.into(),
            artist: artist.into(),
        }
    }

    #[test]
    fn splits_on_plain_hyphen() {
        assert_eq!(split_artist_title("Daft Punk - One More Time"), Some(q("Daft Punk", "One More Time")));
    }

    #[test]
    fn splits_on_en_and_em_dash() {
        assert_eq!(split_artist_title("Björk – Army of Me"), Some(q("Björk", "Army of Me")));
        assert_eq!(split_artist_title("Björk—Army of Me"), Some(q("Björk", "Army of Me")));
    }

    #[test]
    fn later_hyphens_stay_in_title() {
        assert_eq!(
            split_artist_title("Artist - Song - Live Version"),
            Some(q("Artist", "Song - Live Version"))
        );
    }

    #[test]
    fn no_hyphen_means_no_split() {
        assert_eq!(split_artist_title("Lose Yourself"), None);
    }

    #[test]
    fn rejects_overlong_segments() {
        let long_artist = "a".repeat(100);
        assert_eq!(split_artist_title(&format!("{long_artist} - Song")), None);
        let ok_artist = "a".repeat(99);
        assert!(split_artist_title(&format!("{ok_artist} - Song")).is_some());

        let long_title = "t".repeat(200);
        assert_eq!(split_artist_title(&format!("Artist - {long_title}")), None);
    }

    #[test]
    fn rejects_empty_side() {
        assert_eq!(split_artist_title(" - Song"), None);
        assert_eq!(split_artist_title("Artist -   "), None);
    }

    #[test]
    fn split_overrides_supplied_artist() {
        let query = TrackQuery::from_parts("Eminem - Lose Yourself", Some("someuser123")).unwrap();
        assert_eq!(query, q("Eminem", "Lose Yourself"));
    }

    #[test]
    fn unsplit_title_keeps_caller_fields() {
        let query = TrackQuery::from_parts("Lose Yourself", Some(" Eminem ")).unwrap();
        assert_eq!(query, q("Eminem", "Lose Yourself"));
    }

    #[test]
    fn missing_artist_without_split_is_invalid() {
        assert!(matches!(
            TrackQuery::from_parts("Lose Yourself", None),
            Err(LyricsError::InputInvalid(_))
        ));
        assert!(matches!(
            TrackQuery::from_parts("   ", Some("Eminem")),
            Err(LyricsError::InputInvalid(_))
        ));
    }
}
