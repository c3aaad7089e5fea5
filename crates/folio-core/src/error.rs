use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Rejected input. Raised before anything on disk is touched.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Classifier or renamer failure. Callers treat this as non-fatal.
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }
}
