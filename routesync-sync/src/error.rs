//! Error types for routesync-sync.

use thiserror::Error;

use routesync_core::{IndexError, RouteId, TimestampError};

/// Fatal errors: any of these aborts the pass before the index is saved.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote API could not be reached or the body could not be read.
    #[error("transport error requesting {url}: {message}")]
    Transport { url: String, message: String },

    /// The remote answered, but not with a usable route listing.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A remote `updated_at` value without a usable offset.
    #[error("remote listing: {0}")]
    MalformedTimestamp(#[from] TimestampError),

    /// Loading or saving the local index failed.
    #[error("index error: {0}")]
    Index(#[from] IndexError),
}

/// Content download failure for a single route. Recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to fetch route {route}: {message}")]
pub struct FetchError {
    pub route: RouteId,
    pub message: String,
}

/// Content removal failure for a single route. Recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to delete route {route}: {message}")]
pub struct DeleteError {
    pub route: RouteId,
    pub message: String,
}
