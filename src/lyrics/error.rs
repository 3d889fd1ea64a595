use thiserror::Error;

/// Failure modes of the lyrics subsystem.
///
/// `ProviderUnavailable` and `ParseFailure` never leave a provider adapter:
/// they are logged and turned into "absent" so the pipeline moves on.
#[derive(Debug, Error)]
pub enum LyricsError {
    #[error("{provider} unavailable: {reason}")]
    ProviderUnavailable {
        provider: &'static str,
        reason: String,
    },

    #[error("{provider} returned an unparseable body: {reason}")]
    ParseFailure {
        provider: &'static str,
        reason: String,
    },

    #[error("invalid lyrics query: {0}")]
    InputInvalid(String),

    #[error("no lyrics found for {artist} - {title}")]
    NotFound { title: String, artist: String },
}

impl LyricsError {
    pub fn unavailable(provider: &'static str, reason: impl ToString) -> Self {
        Self::ProviderUnavailable {
            provider,
            reason: reason.to_string(),
        }
    }

    pub fn parse(provider: &'static str, reason: impl ToString) -> Self {
        Self::ParseFailure {
            provider,
            reason: reason.to_string(),
        }
    }
}
