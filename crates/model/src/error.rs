use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read analysis document {path}: {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed analysis document: {0}")]
    ParseDocument(#[from] serde_json::Error),

    #[error("Invalid legacy analysis: {0}")]
    InvalidAnalysis(String),
}
