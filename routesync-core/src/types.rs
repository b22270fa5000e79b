//! Domain types for route reconciliation.
//!
//! Timestamps are always offset-aware ([`Timestamp`]); a naive timestamp
//! cannot be represented, so it is rejected by [`parse_timestamp`] at the
//! boundary where text enters the system.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::TimestampError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque numeric identifier of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteId(pub u64);

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for RouteId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for RouteId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Numeric identifier of the user whose routes are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// API key + auth token pair forwarded to the remote API and to content fetches.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub auth_token: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            auth_token: auth_token.into(),
        }
    }
}

// Secrets never end up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Offset-aware point in time. Ordering and equality compare instants.
pub type Timestamp = DateTime<FixedOffset>;

/// Parse an RFC 3339 / ISO-8601 timestamp carrying an explicit offset.
///
/// Accepts both the `Z` suffix used by the remote API and the `+00:00` form
/// written to the index file. A timestamp without an offset is rejected.
pub fn parse_timestamp(value: &str) -> Result<Timestamp, TimestampError> {
    let trimmed = value.trim();
    DateTime::parse_from_rfc3339(trimmed).map_err(|err| {
        let reason = if is_naive(trimmed) {
            "missing timezone offset".to_string()
        } else {
            err.to_string()
        };
        TimestampError::Malformed {
            value: value.to_string(),
            reason,
        }
    })
}

/// Render a timestamp the way the index file stores it.
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339()
}

fn is_naive(value: &str) -> bool {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(value, fmt).is_ok())
}

// ---------------------------------------------------------------------------
// Records, index, snapshot, plan
// ---------------------------------------------------------------------------

/// Last known modification time of a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRecord {
    pub id: RouteId,
    pub updated_at: Timestamp,
}

impl RouteRecord {
    pub fn new(id: impl Into<RouteId>, updated_at: Timestamp) -> Self {
        Self {
            id: id.into(),
            updated_at,
        }
    }
}

/// Local reconciliation ledger: route ID → last-synced update time.
///
/// Keys are kept sorted so the persisted form is deterministic.
pub type Index = BTreeMap<RouteId, Timestamp>;

/// Point-in-time listing of a user's routes, in the order the remote served them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSnapshot {
    records: Vec<RouteRecord>,
}

impl RemoteSnapshot {
    pub fn new(records: Vec<RouteRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[RouteRecord] {
        &self.records
    }

    /// Number of records served, duplicates included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<RouteRecord> for RemoteSnapshot {
    fn from_iter<I: IntoIterator<Item = RouteRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Output of [`crate::reconcile::diff`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    /// Routes that are new or whose remote timestamp is strictly newer.
    pub to_fetch: BTreeSet<RouteId>,
    /// Routes present locally but gone from the remote listing.
    pub to_purge: BTreeSet<RouteId>,
    /// Index mirroring the remote snapshot exactly.
    pub next_index: Index,
}

impl ReconciliationPlan {
    pub fn is_up_to_date(&self) -> bool {
        self.to_fetch.is_empty() && self.to_purge.is_empty()
    }
}
