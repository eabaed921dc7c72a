use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeikoError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid card key: {0}")]
    InvalidKey(String),

    #[error("Inconsistent session transport: {0}")]
    Transport(String),

    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Failed to load file: {0}")]
    FailedToLoadFile(String),
}

impl From<std::io::Error> for KeikoError {
    fn from(error: std::io::Error) -> Self {
        KeikoError::Io(Box::new(error))
    }
}
