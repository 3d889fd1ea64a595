use super::{ApiError, AppState};
use crate::config::defaults;
use crate::soundcloud::Track;
use crate::storage;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;

const MAX_SEARCH_LIMIT: u32 = 200;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    limit: Option<u32>,
    /// User code whose search history records this query.
    user: Option<String>,
}

/// GET /search?q&limit&user
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Track>>, ApiError> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(ApiError::BadRequest("q is required".into()));
    }
    let limit = params
        .limit
        .unwrap_or(defaults::SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);

    let tracks = state
        .tracks
        .search(query, limit)
        .await
        .map_err(ApiError::upstream)?;

    if let Some(code) = params.user.as_deref().filter(|c| !c.is_empty()) {
        let q = query.to_string();
        state
            .storage
            .for_user(code, move |s, code| s.add_search(code, &q, storage::now_unix()))
            .await?
            .ok_or(ApiError::NotFound("user"))?;
    }

    Ok(Json(tracks))
}

/// GET /tracks/:id
pub async fn track(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Track>, ApiError> {
    state
        .tracks
        .track(id)
        .await
        .map_err(ApiError::upstream)?
        .map(Json)
        .ok_or(ApiError::NotFound("track"))
}

/// GET /stream/:id, redirecting to the media url.
pub async fn stream(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Redirect, ApiError> {
    let url = state
        .tracks
        .stream_url(id)
        .await
        .map_err(ApiError::upstream)?
        .ok_or(ApiError::NotFound("stream"))?;
    Ok(Redirect::temporary(&url))
}
