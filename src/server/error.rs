use crate::lyrics::LyricsError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("no lyrics found for {artist} - {title}")]
    LyricsNotFound { title: String, artist: String },

    #[error("soundcloud request failed: {0:#}")]
    Upstream(anyhow::Error),

    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn upstream(e: anyhow::Error) -> Self {
        Self::Upstream(e)
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) | Self::LyricsNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LyricsError> for ApiError {
    fn from(e: LyricsError) -> Self {
        match e {
            LyricsError::InputInvalid(msg) => Self::BadRequest(msg),
            LyricsError::NotFound { title, artist } => Self::LyricsNotFound { title, artist },
            // Provider failures are absorbed inside the pipeline; reaching
            // here means an adapter leaked one.
            other => Self::Internal(anyhow::Error::new(other)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = match &self {
            Self::LyricsNotFound { title, artist } => json!({
                "error": "Lyrics not found",
                "title": title,
                "artist": artist,
            }),
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
