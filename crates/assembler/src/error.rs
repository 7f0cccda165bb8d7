use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Fatal pipeline conditions. Everything else in a run degrades into
/// diagnostics instead of surfacing here.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Scan(#[from] carve_scanner::ScanError),
}
