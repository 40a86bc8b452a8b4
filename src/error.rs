//! Error taxonomy shared by every table operation.

use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum Error {
    /// Bad configuration or an index that does not name an occupied slot.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("key already present")]
    KeyExists,
    #[error("key not found")]
    KeyNotFound,
    /// No empty or tombstoned slot was reachable within `size` probes.
    #[error("no free slot reachable within the probe sequence")]
    NoSpace,
    #[error("slot table allocation failed")]
    MemoryError,
    /// Unsupported probing method, or bookkeeping that no longer matches the
    /// slot array. The table should not be trusted after the latter.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

pub type Result<T> = core::result::Result<T, Error>;

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::MemoryError
    }
}
