use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Replay error: {0}")]
    Replay(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

pub type OverlayResult<T> = Result<T, OverlayError>;
