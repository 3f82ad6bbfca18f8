use thiserror::Error;

use crate::ids::PlayerId;

/// Error kinds from the spec's error handling design. Each maps to a single
/// HTTP status at the (external) HTTP boundary; the mapping itself is not
/// this crate's job.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("illegal state: {0}")]
    IllegalState(String),

    #[error("out of turn, current player is {current:?}")]
    OutOfTurn { current: Option<PlayerId> },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
