use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Project root does not exist: {0}")]
    MissingRoot(String),

    #[error("Extraction unit subtree does not exist: {0}")]
    MissingUnit(String),
}
