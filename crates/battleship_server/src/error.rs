use thiserror::Error;

/// Coordination-layer errors, extending `battleship_core::Error` with the
/// failure modes of the lobby matchmaker, resume-token registry and
/// connection tracker. Both derive `thiserror::Error`; mapping either to an
/// HTTP status is the caller's job.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] battleship_core::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

pub type Result<T> = std::result::Result<T, Error>;
