//! # routesync-sync
//!
//! Remote listing, per-route content operations, and the sync driver.
//!
//! Build a [`Driver`] (or [`Driver::from_config`] for the HTTP-backed one) and
//! call [`Driver::run_sync`] once per pass.

pub mod content;
pub mod error;
pub mod pipeline;
pub mod remote;

pub use content::{ContentSync, SimulatedContentSync};
pub use error::{DeleteError, FetchError, SyncError};
pub use pipeline::{settle_index, Driver, Summary};
pub use remote::{list_all, HttpPageSource, PageSource, RemoteRoute, RoutePage};
