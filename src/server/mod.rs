//! HTTP surface: lyrics lookup, SoundCloud pass-through and per-user data.

pub mod error;
mod lyrics;
mod soundcloud;
mod users;

pub use error::ApiError;

use crate::lyrics::LyricsPipeline;
use crate::soundcloud::TrackSource;
use crate::storage::StorageHandle;
use anyhow::Context;
use axum::{
    Json, Router,
    routing::{delete, get, post, put},
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub tracks: Arc<dyn TrackSource>,
    pub lyrics: Arc<LyricsPipeline>,
    pub storage: StorageHandle,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/lyrics", get(lyrics::get_lyrics))
        .route("/search", get(soundcloud::search))
        .route("/tracks/:id", get(soundcloud::track))
        .route("/stream/:id", get(soundcloud::stream))
        .route("/users", post(users::create_user))
        .route("/users/:code", get(users::get_user))
        .route(
            "/users/:code/history",
            get(users::history).post(users::add_history).delete(users::clear_history),
        )
        .route(
            "/users/:code/searches",
            get(users::searches).post(users::add_search).delete(users::clear_searches),
        )
        .route(
            "/users/:code/playlists",
            get(users::playlists).post(users::create_playlist),
        )
        .route(
            "/users/:code/playlists/:id",
            get(users::playlist).delete(users::delete_playlist),
        )
        .route("/users/:code/playlists/:id/tracks", post(users::add_playlist_track))
        .route(
            "/users/:code/playlists/:id/tracks/:track_id",
            delete(users::remove_playlist_track),
        )
        .route("/users/:code/likes", get(users::likes))
        .route(
            "/users/:code/likes/:track_id",
            put(users::like).delete(users::unlike),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

pub async fn serve(state: AppState, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    tracing::info!(addr = %listener.local_addr().context("local addr")?, "listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
