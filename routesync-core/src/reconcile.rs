//! Index/remote diff.
//!
//! Given the prior local [`Index`] and a fresh [`RemoteSnapshot`], decide
//! which routes must be fetched, which must be purged, and what the index
//! mirroring the remote looks like. Pure: no I/O, deterministic.
//!
//! Rules:
//! 1. `next_index` holds every snapshot id; a later duplicate overrides an earlier one.
//! 2. An id is fetched when it is unknown locally or the local timestamp is
//!    strictly older. Equal instants are up to date.
//! 3. An id is purged when it is known locally and missing from the snapshot.

use crate::types::{Index, ReconciliationPlan, RemoteSnapshot};

/// Compute the reconciliation plan for one pass.
pub fn diff(prior: &Index, remote: &RemoteSnapshot) -> ReconciliationPlan {
    let mut next_index = Index::new();
    for record in remote.records() {
        next_index.insert(record.id, record.updated_at);
    }

    let to_fetch = next_index
        .iter()
        .filter(|(id, remote_ts)| match prior.get(*id) {
            None => true,
            Some(local_ts) => local_ts < *remote_ts,
        })
        .map(|(id, _)| *id)
        .collect();

    let to_purge = prior
        .keys()
        .filter(|id| !next_index.contains_key(*id))
        .copied()
        .collect();

    ReconciliationPlan {
        to_fetch,
        to_purge,
        next_index,
    }
}
