use thiserror::Error;

pub type LinkPulseResult<T> = Result<T, LinkPulseError>;

#[derive(Error, Debug)]
pub enum LinkPulseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
