use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request-shape errors reported back to the caller verbatim.
    #[error("{0}")]
    Command(String),

    #[error("preset '{0}' not found")]
    PresetNotFound(String),

    #[error("invalid attachment content: {0}")]
    InvalidAttachment(String),

    /// Provider-side rejection; the message is surfaced as-is.
    #[error("{0}")]
    Provider(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EmailError>;
