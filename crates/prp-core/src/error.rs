use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrpError {
    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error("no conversation transcript found under {0}")]
    TranscriptNotFound(String),

    #[error("invalid hook input: {0}")]
    InvalidInput(String),

    #[error("PRP file not found: {0}")]
    PrpNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PrpError>;
