use super::{ApiError, AppState};
use crate::lyrics::{SyncType, TrackQuery};
use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsParams {
    track_id: Option<String>,
    title: Option<String>,
    artist: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsResponse {
    lrc: String,
    sync_type: SyncType,
    source: String,
    language: String,
}

/// GET /lyrics?trackId&title&artist
pub async fn get_lyrics(
    State(state): State<AppState>,
    Query(params): Query<LyricsParams>,
) -> Result<Json<LyricsResponse>, ApiError> {
    let query = build_query(&state, &params).await?;
    tracing::debug!(title = %query.title, artist = %query.artist, "lyrics lookup");

    let result = state.lyrics.resolve(&query).await?;
    Ok(Json(LyricsResponse {
        lrc: result.to_lrc(),
        sync_type: result.sync_type,
        source: result.source,
        language: result.language,
    }))
}

/// An explicit title wins; otherwise the SoundCloud track is looked up.
async fn build_query(state: &AppState, params: &LyricsParams) -> Result<TrackQuery, ApiError> {
    if let Some(title) = params.title.as_deref().filter(|t| !t.trim().is_empty()) {
        return Ok(TrackQuery::from_parts(title, params.artist.as_deref())?);
    }

    let Some(raw_id) = params.track_id.as_deref().filter(|id| !id.trim().is_empty()) else {
        return Err(ApiError::BadRequest("title or trackId is required".into()));
    };
    let id: u64 = raw_id
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid trackId {raw_id:?}")))?;

    let track = match state.tracks.track(id).await {
        Ok(Some(track)) => track,
        Ok(None) => {
            return Err(ApiError::BadRequest(format!("track {id} could not be resolved")));
        }
        Err(e) => {
            tracing::warn!(id, error = %e, "track lookup failed");
            return Err(ApiError::BadRequest(format!("track {id} could not be resolved")));
        }
    };

    let artist = params
        .artist
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .unwrap_or(&track.artist);
    Ok(TrackQuery::from_parts(&track.title, Some(artist))?)
}

#[cfg(test)]
mod tests {
    use super::super::build_router;
    use super::super::testutil::{FakeSoundcloud, call, state, track};
    use crate::lyrics::providers::LyricsProvider;
    use crate::lyrics::providers::testutil::Scripted;
    use crate::lyrics::{LyricLine, LyricsResult};
    use axum::http::StatusCode;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    fn synced() -> LyricsResult {
        LyricsResult::new(
            vec![LyricLine::new("Look", 1_500), LyricLine::new("If you had", 3_000)],
            "en",
            "LRCLIB",
        )
    }

    #[tokio::test]
    async fn title_and_artist_resolve_to_lrc() {
        let dir = tempfile::tempdir().unwrap();
        let (lrclib, _) = Scripted::new("LRCLIB", Some(synced()));
        let router = build_router(state(&dir, Vec::new(), vec![Box::new(lrclib)]));

        let (status, body) = call(&router, "GET", "/lyrics?title=Lose%20Yourself&artist=Eminem", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["lrc"], "[00:01.50]Look\n[00:03.00]If you had");
        assert_eq!(body["syncType"], "LINE_SYNCED");
        assert_eq!(body["source"], "LRCLIB");
        assert_eq!(body["language"], "en");
    }

    #[tokio::test]
    async fn track_id_uses_dash_split_over_uploader() {
        let dir = tempfile::tempdir().unwrap();
        let (lrclib, _) = Scripted::new("LRCLIB", None);
        let router = build_router(state(
            &dir,
            vec![track(42, "Eminem - Lose Yourself", "some-uploader")],
            vec![Box::new(lrclib)],
        ));

        let (status, body) = call(&router, "GET", "/lyrics?trackId=42", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["title"], "Lose Yourself");
        assert_eq!(body["artist"], "Eminem");
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn missing_inputs_are_bad_requests() {
        let dir = tempfile::tempdir().unwrap();
        let (lrclib, calls) = Scripted::new("LRCLIB", Some(synced()));
        let providers: Vec<Box<dyn LyricsProvider>> = vec![Box::new(lrclib)];
        let router = build_router(state(&dir, Vec::new(), providers));

        for uri in [
            "/lyrics",
            "/lyrics?title=Lose%20Yourself",
            "/lyrics?trackId=abc",
            "/lyrics?trackId=999",
        ] {
            let (status, body) = call(&router, "GET", uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(body["error"].is_string(), "{uri}");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn soundcloud_failure_is_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = state(&dir, Vec::new(), Vec::new());
        app.tracks = Arc::new(FakeSoundcloud {
            tracks: vec![track(1, "A - B", "u")],
            fail: true,
        });
        let router = build_router(app);

        let (status, _) = call(&router, "GET", "/lyrics?trackId=1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unsynced_lyrics_have_no_tags() {
        let dir = tempfile::tempdir().unwrap();
        let plain = LyricsResult::new(
            vec![LyricLine::new("first", 0), LyricLine::new("second", 0)],
            "und",
            "Musixmatch",
        );
        let (mxm, _) = Scripted::new("Musixmatch", Some(plain));
        let router = build_router(state(&dir, Vec::new(), vec![Box::new(mxm)]));

        let (status, body) = call(&router, "GET", "/lyrics?title=Eminem%20-%20Lose%20Yourself", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["syncType"], "UNSYNCED");
        assert_eq!(body["lrc"], "first\nsecond");
    }
}
