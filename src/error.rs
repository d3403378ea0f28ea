use thiserror::Error;

/// Everything that can go wrong during a run.
#[derive(Debug, Error)]
pub enum PosterError {
    /// Transport failure, non-2xx status, or an unreadable comic service body.
    #[error("request to {url} failed: {reason}")]
    RemoteService { url: String, reason: String },
    /// Error reported by the platform inside an otherwise successful response.
    #[error("platform error {code}: {message}")]
    PlatformApi { code: i64, message: String },
    #[error("unexpected response shape: {0}")]
    DataShape(String),
    #[error("scratch file error: {0}")]
    LocalIo(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(String),
}

impl PosterError {
    pub fn remote(url: impl Into<String>, reason: impl ToString) -> Self {
        PosterError::RemoteService {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PosterError>;
