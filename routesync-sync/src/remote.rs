//! Remote route listing.
//!
//! The listing endpoint is paginated by `offset`/`limit`:
//!
//! ```text
//! GET {base_url}/users/{user}/routes.json?offset=&limit=&apikey=&auth_token=
//! → {"results": [{"id": 1, "updated_at": "2023-01-01T00:00:00Z", ...}], "results_count": 1}
//! ```
//!
//! [`list_all`] walks pages until the accumulated count reaches the latest
//! announced `results_count`. A shrinking total or an empty page ends the walk
//! early; the remote is being mutated and what we have is the snapshot.

use std::time::Duration;

use serde::Deserialize;

use routesync_core::{
    parse_timestamp, Credentials, RemoteSnapshot, RouteId, RouteRecord, SyncConfig, UserId,
};

use crate::error::SyncError;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// One route entry as served by the API. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteRoute {
    pub id: RouteId,
    pub updated_at: String,
}

/// One page of the listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoutePage {
    pub results: Vec<RemoteRoute>,
    pub results_count: usize,
}

impl RoutePage {
    /// Decode a listing page body. Shape problems are [`SyncError::Protocol`].
    pub fn from_json(body: &str) -> Result<Self, SyncError> {
        serde_json::from_str(body)
            .map_err(|e| SyncError::Protocol(format!("unexpected route listing body: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Page source
// ---------------------------------------------------------------------------

/// Fetches a single listing page. The seam between pagination and transport.
pub trait PageSource {
    fn fetch_page(
        &mut self,
        user: UserId,
        offset: usize,
        limit: usize,
        credentials: &Credentials,
    ) -> Result<RoutePage, SyncError>;
}

impl<T: PageSource + ?Sized> PageSource for &mut T {
    fn fetch_page(
        &mut self,
        user: UserId,
        offset: usize,
        limit: usize,
        credentials: &Credentials,
    ) -> Result<RoutePage, SyncError> {
        (**self).fetch_page(user, offset, limit, credentials)
    }
}

/// [`PageSource`] backed by blocking HTTP.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpPageSource {
    pub fn new(config: &SyncConfig) -> Self {
        Self::with_timeout(&config.base_url, config.request_timeout)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Listing URL without query parameters (safe to log).
    pub fn routes_url(&self, user: UserId) -> String {
        format!("{}/users/{user}/routes.json", self.base_url)
    }
}

impl PageSource for HttpPageSource {
    fn fetch_page(
        &mut self,
        user: UserId,
        offset: usize,
        limit: usize,
        credentials: &Credentials,
    ) -> Result<RoutePage, SyncError> {
        let url = self.routes_url(user);
        let response = self
            .agent
            .get(&url)
            .query("offset", &offset.to_string())
            .query("limit", &limit.to_string())
            .query("apikey", &credentials.api_key)
            .query("auth_token", &credentials.auth_token)
            .call();

        let response = match response {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                return Err(SyncError::Protocol(format!(
                    "unexpected HTTP status {code} from {url}"
                )));
            }
            // The transport's own Display includes the full URL, credentials included.
            Err(ureq::Error::Transport(transport)) => {
                let message = match transport.message() {
                    Some(detail) => format!("{}: {detail}", transport.kind()),
                    None => transport.kind().to_string(),
                };
                return Err(SyncError::Transport { url, message });
            }
        };

        let body = response.into_string().map_err(|e| SyncError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;
        RoutePage::from_json(&body)
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Collect every route of `user` into a [`RemoteSnapshot`].
///
/// Requests `page_size` routes at offsets 0, `page_size`, 2×`page_size`, …
/// Every `updated_at` is normalised to an offset-aware timestamp; a value
/// that cannot be, fails the whole listing.
pub fn list_all<S: PageSource + ?Sized>(
    source: &mut S,
    user: UserId,
    credentials: &Credentials,
    page_size: usize,
) -> Result<RemoteSnapshot, SyncError> {
    let page_size = page_size.max(1);
    let mut records = Vec::new();
    let mut offset = 0;

    loop {
        let page = source.fetch_page(user, offset, page_size, credentials)?;
        let served = page.results.len();
        let total = page.results_count;

        for route in page.results {
            let updated_at = parse_timestamp(&route.updated_at)?;
            records.push(RouteRecord::new(route.id, updated_at));
        }
        tracing::debug!(%user, offset, served, total, "fetched route page");

        if records.len() >= total {
            break;
        }
        if served == 0 {
            tracing::warn!(
                %user,
                offset,
                accumulated = records.len(),
                total,
                "empty page before announced total; treating as end of listing"
            );
            break;
        }
        offset += page_size;
    }

    Ok(RemoteSnapshot::new(records))
}
