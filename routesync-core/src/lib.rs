//! routesync core library — route index model, reconciliation, persistence.
//!
//! - [`types`] — newtypes, timestamps, index, snapshot, plan
//! - [`reconcile`] — the pure index/remote diff
//! - [`index_store`] — load / save of the plain-text index
//! - [`config`] — [`SyncConfig`] and its YAML overlay
//! - [`error`] — [`IndexError`], [`TimestampError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod index_store;
pub mod reconcile;
pub mod types;

pub use config::SyncConfig;
pub use error::{ConfigError, IndexError, TimestampError};
pub use reconcile::diff;
pub use types::{
    format_timestamp, parse_timestamp, Credentials, Index, ReconciliationPlan, RemoteSnapshot,
    RouteId, RouteRecord, Timestamp, UserId,
};
