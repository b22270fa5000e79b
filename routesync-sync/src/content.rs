//! Per-route content operations.
//!
//! The driver only decides *what* to fetch or delete; a [`ContentSync`]
//! implementation does it. Every call concerns exactly one route, so its
//! outcome can be attributed back to that route's index entry.

use std::time::Duration;

use routesync_core::{Credentials, RouteId};

use crate::error::{DeleteError, FetchError};

/// Fetches and deletes the stored content of individual routes.
pub trait ContentSync {
    /// Download (or re-download) the content of `route`.
    fn fetch(&mut self, route: RouteId, credentials: &Credentials) -> Result<(), FetchError>;

    /// Remove the local content of `route`.
    fn delete(&mut self, route: RouteId) -> Result<(), DeleteError>;
}

impl<T: ContentSync + ?Sized> ContentSync for &mut T {
    fn fetch(&mut self, route: RouteId, credentials: &Credentials) -> Result<(), FetchError> {
        (**self).fetch(route, credentials)
    }

    fn delete(&mut self, route: RouteId) -> Result<(), DeleteError> {
        (**self).delete(route)
    }
}

/// Stand-in content backend: logs each operation and pauses `delay` per fetch
/// to mimic a download. Never fails.
#[derive(Debug, Clone)]
pub struct SimulatedContentSync {
    delay: Duration,
}

impl SimulatedContentSync {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl ContentSync for SimulatedContentSync {
    fn fetch(&mut self, route: RouteId, _credentials: &Credentials) -> Result<(), FetchError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        tracing::debug!(%route, "simulated route download");
        Ok(())
    }

    fn delete(&mut self, route: RouteId) -> Result<(), DeleteError> {
        tracing::debug!(%route, "simulated route delete");
        Ok(())
    }
}
