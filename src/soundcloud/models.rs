use serde::{Deserialize, Serialize};

/// Track as returned to clients of this proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: u64,
    pub title: String,
    pub artist: String,
    pub duration_ms: u64,
    pub artwork_url: Option<String>,
    pub permalink_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTrack {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub duration: u64,
    pub artwork_url: Option<String>,
    pub permalink_url: Option<String>,
    pub user: Option<ApiUser>,
    pub publisher_metadata: Option<PublisherMetadata>,
    pub media: Option<Media>,
    pub track_authorization: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublisherMetadata {
    pub artist: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub transcodings: Vec<Transcoding>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Transcoding {
    pub url: String,
    pub format: TranscodingFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscodingFormat {
    pub protocol: String,
}

#[derive(Debug, Deserialize)]
pub struct Collection<T> {
    #[serde(default = "Vec::new")]
    pub collection: Vec<T>,
}

impl ApiTrack {
    /// Publisher artist when present, uploader name otherwise.
    pub fn artist(&self) -> String {
        self.publisher_metadata
            .as_ref()
            .and_then(|m| m.artist.as_deref())
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .or_else(|| self.user.as_ref().map(|u| u.username.trim()))
            .unwrap_or_default()
            .to_string()
    }

    /// Progressive transcoding url when available, HLS otherwise.
    pub fn stream_transcoding(&self) -> Option<&Transcoding> {
        let transcodings = &self.media.as_ref()?.transcodings;
        transcodings
            .iter()
            .find(|t| t.format.protocol == "progressive")
            .or_else(|| transcodings.iter().find(|t| t.format.protocol == "hls"))
    }
}

impl From<ApiTrack> for Track {
    fn from(t: ApiTrack) -> Self {
        Self {
            artist: t.artist(),
            id: t.id,
            title: t.title,
            duration_ms: t.duration,
            artwork_url: t.artwork_url,
            permalink_url: t.permalink_url,
        }
    }
}
