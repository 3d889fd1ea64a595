//! Per-user routes. Every handler answers 404 for an unknown user code.

use super::{ApiError, AppState};
use crate::config::defaults;
use crate::storage::{
    self, HistoryEntry, LikedTrack, Playlist, PlaylistSummary, SearchEntry, TrackRef, User,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    limit: Option<u32>,
}

impl LimitParams {
    fn limit(&self) -> u32 {
        self.limit.unwrap_or(defaults::HISTORY_LIMIT).max(1)
    }
}

#[derive(Debug, Deserialize)]
pub struct NewSearch {
    query: String,
}

#[derive(Debug, Deserialize)]
pub struct NewPlaylist {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LikeBody {
    #[serde(default)]
    title: String,
    #[serde(default)]
    artist: String,
}

fn user_missing() -> ApiError {
    ApiError::NotFound("user")
}

/// POST /users
pub async fn create_user(State(state): State<AppState>) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state
        .storage
        .run(|s| s.create_user(storage::now_unix()))
        .await?;
    tracing::info!(code = %user.code, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users/:code
pub async fn get_user(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<User>, ApiError> {
    state
        .storage
        .run(move |s| s.user(&code))
        .await?
        .map(Json)
        .ok_or_else(user_missing)
}

/// GET /users/:code/history?limit
pub async fn history(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let limit = params.limit();
    state
        .storage
        .for_user(&code, move |s, code| s.history(code, limit))
        .await?
        .map(Json)
        .ok_or_else(user_missing)
}

/// POST /users/:code/history
pub async fn add_history(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(track): Json<TrackRef>,
) -> Result<StatusCode, ApiError> {
    state
        .storage
        .for_user(&code, move |s, code| s.add_history(code, &track, storage::now_unix()))
        .await?
        .ok_or_else(user_missing)?;
    Ok(StatusCode::CREATED)
}

/// DELETE /users/:code/history
pub async fn clear_history(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .storage
        .for_user(&code, |s, code| s.clear_history(code))
        .await?
        .ok_or_else(user_missing)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/:code/searches?limit
pub async fn searches(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<SearchEntry>>, ApiError> {
    let limit = params.limit();
    state
        .storage
        .for_user(&code, move |s, code| s.searches(code, limit))
        .await?
        .map(Json)
        .ok_or_else(user_missing)
}

/// POST /users/:code/searches
pub async fn add_search(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(body): Json<NewSearch>,
) -> Result<StatusCode, ApiError> {
    if body.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query is required".into()));
    }
    state
        .storage
        .for_user(&code, move |s, code| s.add_search(code, &body.query, storage::now_unix()))
        .await?
        .ok_or_else(user_missing)?;
    Ok(StatusCode::CREATED)
}

/// DELETE /users/:code/searches
pub async fn clear_searches(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .storage
        .for_user(&code, |s, code| s.clear_searches(code))
        .await?
        .ok_or_else(user_missing)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/:code/playlists
pub async fn playlists(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<PlaylistSummary>>, ApiError> {
    state
        .storage
        .for_user(&code, |s, code| s.playlists(code))
        .await?
        .map(Json)
        .ok_or_else(user_missing)
}

/// POST /users/:code/playlists
pub async fn create_playlist(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(body): Json<NewPlaylist>,
) -> Result<(StatusCode, Json<PlaylistSummary>), ApiError> {
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("playlist name is required".into()));
    }
    let playlist = state
        .storage
        .for_user(&code, move |s, code| s.create_playlist(code, &name, storage::now_unix()))
        .await?
        .ok_or_else(user_missing)?;
    Ok((StatusCode::CREATED, Json(playlist)))
}

/// GET /users/:code/playlists/:id
pub async fn playlist(
    State(state): State<AppState>,
    Path((code, id)): Path<(String, i64)>,
) -> Result<Json<Playlist>, ApiError> {
    state
        .storage
        .for_user(&code, move |s, code| s.playlist(code, id))
        .await?
        .ok_or_else(user_missing)?
        .map(Json)
        .ok_or(ApiError::NotFound("playlist"))
}

/// DELETE /users/:code/playlists/:id
pub async fn delete_playlist(
    State(state): State<AppState>,
    Path((code, id)): Path<(String, i64)>,
) -> Result<StatusCode, ApiError> {
    let removed = state
        .storage
        .for_user(&code, move |s, code| s.delete_playlist(code, id))
        .await?
        .ok_or_else(user_missing)?;
    if !removed {
        return Err(ApiError::NotFound("playlist"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /users/:code/playlists/:id/tracks
pub async fn add_playlist_track(
    State(state): State<AppState>,
    Path((code, id)): Path<(String, i64)>,
    Json(track): Json<TrackRef>,
) -> Result<Json<Playlist>, ApiError> {
    state
        .storage
        .for_user(&code, move |s, code| {
            if !s.add_playlist_track(code, id, &track, storage::now_unix())? {
                return Ok(None);
            }
            s.playlist(code, id)
        })
        .await?
        .ok_or_else(user_missing)?
        .map(Json)
        .ok_or(ApiError::NotFound("playlist"))
}

/// DELETE /users/:code/playlists/:id/tracks/:track_id
pub async fn remove_playlist_track(
    State(state): State<AppState>,
    Path((code, id, track_id)): Path<(String, i64, u64)>,
) -> Result<StatusCode, ApiError> {
    let removed = state
        .storage
        .for_user(&code, move |s, code| s.remove_playlist_track(code, id, track_id))
        .await?
        .ok_or_else(user_missing)?;
    if !removed {
        return Err(ApiError::NotFound("playlist track"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/:code/likes
pub async fn likes(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<LikedTrack>>, ApiError> {
    state
        .storage
        .for_user(&code, |s, code| s.likes(code))
        .await?
        .map(Json)
        .ok_or_else(user_missing)
}

/// PUT /users/:code/likes/:track_id, body optional.
pub async fn like(
    State(state): State<AppState>,
    Path((code, track_id)): Path<(String, u64)>,
    body: Option<Json<LikeBody>>,
) -> Result<StatusCode, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let track = TrackRef {
        track_id,
        title: body.title,
        artist: body.artist,
    };
    state
        .storage
        .for_user(&code, move |s, code| s.like(code, &track, storage::now_unix()))
        .await?
        .ok_or_else(user_missing)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /users/:code/likes/:track_id
pub async fn unlike(
    State(state): State<AppState>,
    Path((code, track_id)): Path<(String, u64)>,
) -> Result<StatusCode, ApiError> {
    let removed = state
        .storage
        .for_user(&code, move |s, code| s.unlike(code, track_id))
        .await?
        .ok_or_else(user_missing)?;
    if !removed {
        return Err(ApiError::NotFound("like"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::super::build_router;
    use super::super::testutil::{call, state};
    use axum::Router;
    use axum::http::StatusCode;
    use serde_json::json;

    async fn new_user(router: &Router) -> String {
        let (status, body) = call(router, "POST", "/users", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["code"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn unknown_user_is_not_found_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        let router = build_router(state(&dir, Vec::new(), Vec::new()));

        for (method, uri) in [
            ("GET", "/users/NOBODY00"),
            ("GET", "/users/NOBODY00/history"),
            ("DELETE", "/users/NOBODY00/history"),
            ("GET", "/users/NOBODY00/searches"),
            ("GET", "/users/NOBODY00/playlists"),
            ("GET", "/users/NOBODY00/playlists/1"),
            ("GET", "/users/NOBODY00/likes"),
            ("PUT", "/users/NOBODY00/likes/5"),
        ] {
            let (status, body) = call(&router, method, uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
            assert!(body["error"].is_string(), "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn history_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let router = build_router(state(&dir, Vec::new(), Vec::new()));
        let code = new_user(&router).await;

        let (_, user) = call(&router, "GET", &format!("/users/{code}"), None).await;
        assert_eq!(user["code"], code.as_str());

        for id in [1, 2, 3] {
            let (status, _) = call(
                &router,
                "POST",
                &format!("/users/{code}/history"),
                Some(json!({ "trackId": id, "title": format!("t{id}"), "artist": "a" })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, entries) = call(&router, "GET", &format!("/users/{code}/history?limit=2"), None).await;
        let entries = entries.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["trackId"], 3);

        let (status, _) = call(&router, "DELETE", &format!("/users/{code}/history"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, entries) = call(&router, "GET", &format!("/users/{code}/history"), None).await;
        assert!(entries.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn searches_reject_blank_queries() {
        let dir = tempfile::tempdir().unwrap();
        let router = build_router(state(&dir, Vec::new(), Vec::new()));
        let code = new_user(&router).await;
        let uri = format!("/users/{code}/searches");

        let (status, _) = call(&router, "POST", &uri, Some(json!({ "query": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        call(&router, "POST", &uri, Some(json!({ "query": "a" }))).await;
        call(&router, "POST", &uri, Some(json!({ "query": "b" }))).await;
        call(&router, "POST", &uri, Some(json!({ "query": "a" }))).await;
        let (_, list) = call(&router, "GET", &uri, None).await;
        let queries: Vec<&str> = list
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["query"].as_str().unwrap())
            .collect();
        assert_eq!(queries, vec!["a", "b"]);

        let (status, _) = call(&router, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn playlist_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let router = build_router(state(&dir, Vec::new(), Vec::new()));
        let code = new_user(&router).await;
        let other = new_user(&router).await;

        let (status, created) = call(
            &router,
            "POST",
            &format!("/users/{code}/playlists"),
            Some(json!({ "name": "Gym" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_i64().unwrap();

        let (status, playlist) = call(
            &router,
            "POST",
            &format!("/users/{code}/playlists/{id}/tracks"),
            Some(json!({ "trackId": 7, "title": "Till I Collapse", "artist": "Eminem" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(playlist["tracks"][0]["trackId"], 7);

        let (status, _) = call(&router, "GET", &format!("/users/{other}/playlists/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(
            &router,
            "DELETE",
            &format!("/users/{code}/playlists/{id}/tracks/7"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = call(&router, "DELETE", &format!("/users/{code}/playlists/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&router, "GET", &format!("/users/{code}/playlists/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(
            &router,
            "POST",
            &format!("/users/{code}/playlists"),
            Some(json!({ "name": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn likes_with_and_without_body() {
        let dir = tempfile::tempdir().unwrap();
        let router = build_router(state(&dir, Vec::new(), Vec::new()));
        let code = new_user(&router).await;

        let (status, _) = call(&router, "PUT", &format!("/users/{code}/likes/10"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(
            &router,
            "PUT",
            &format!("/users/{code}/likes/11"),
            Some(json!({ "title": "Yellow", "artist": "Coldplay" })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, likes) = call(&router, "GET", &format!("/users/{code}/likes"), None).await;
        assert_eq!(likes.as_array().unwrap().len(), 2);
        assert_eq!(likes[0]["title"], "Yellow");

        let (status, _) = call(&router, "DELETE", &format!("/users/{code}/likes/10"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&router, "DELETE", &format!("/users/{code}/likes/10"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
