//! Error types for non-blocking primitive operations

use thiserror::Error;

/// Why a non-blocking operation could not complete.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    #[error("resource unavailable")]
    Unavailable,
    #[error("count would exceed its maximum of {max}")]
    Overflow { max: u32 },
}

pub type SyncResult<T> = Result<T, SyncError>;
