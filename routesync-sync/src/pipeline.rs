//! One sync pass: load index → list remote → diff → apply → save.
//!
//! Failure policy:
//! - index load, listing, and index save failures are fatal and leave the
//!   persisted index as it was;
//! - a single route's fetch or delete failure is logged, counted, and
//!   excluded from the index update so the next pass retries it.

use routesync_core::{
    index_store, reconcile, Credentials, Index, ReconciliationPlan, RemoteSnapshot, RouteId,
    SyncConfig, UserId,
};
use serde::Serialize;

use crate::content::{ContentSync, SimulatedContentSync};
use crate::error::SyncError;
use crate::remote::{list_all, HttpPageSource, PageSource};

/// Outcome of one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Records in the remote listing, duplicates included.
    pub total_remote: usize,
    /// Routes fetched successfully (planned, in a dry run).
    pub fetched_count: usize,
    /// Routes purged successfully (planned, in a dry run).
    pub purged_count: usize,
    pub failed_fetches: Vec<RouteId>,
    pub failed_purges: Vec<RouteId>,
    pub dry_run: bool,
}

impl Summary {
    pub fn is_up_to_date(&self) -> bool {
        self.fetched_count == 0
            && self.purged_count == 0
            && self.failed_fetches.is_empty()
            && self.failed_purges.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed_fetches.is_empty() || !self.failed_purges.is_empty()
    }
}

/// Orchestrates sync passes for one configuration.
///
/// Holds no state between passes besides its collaborators; the index is
/// re-read from `config.index_path` every time.
#[derive(Debug)]
pub struct Driver<P, C> {
    config: SyncConfig,
    pages: P,
    content: C,
}

impl Driver<HttpPageSource, SimulatedContentSync> {
    /// Driver talking HTTP to `config.base_url` with simulated content operations.
    pub fn from_config(config: SyncConfig) -> Self {
        let pages = HttpPageSource::new(&config);
        let content = SimulatedContentSync::new(config.download_delay);
        Self::new(config, pages, content)
    }
}

impl<P: PageSource, C: ContentSync> Driver<P, C> {
    pub fn new(config: SyncConfig, pages: P, content: C) -> Self {
        Self {
            config,
            pages,
            content,
        }
    }

    /// Load the prior index and the remote listing, and diff them.
    ///
    /// The index is loaded first so a corrupt index aborts before any request.
    pub fn plan(
        &mut self,
        user: UserId,
        credentials: &Credentials,
    ) -> Result<(Index, RemoteSnapshot, ReconciliationPlan), SyncError> {
        let prior = index_store::load_at(&self.config.index_path)?;
        tracing::debug!(
            routes = prior.len(),
            path = %self.config.index_path.display(),
            "loaded index"
        );

        let snapshot = list_all(&mut self.pages, user, credentials, self.config.page_size)?;
        tracing::info!("found {} routes", snapshot.len());

        let plan = reconcile::diff(&prior, &snapshot);
        Ok((prior, snapshot, plan))
    }

    /// Report what a pass would do without touching content or the index.
    pub fn dry_run(
        &mut self,
        user: UserId,
        credentials: &Credentials,
    ) -> Result<Summary, SyncError> {
        let (_, snapshot, plan) = self.plan(user, credentials)?;
        Ok(Summary {
            total_remote: snapshot.len(),
            fetched_count: plan.to_fetch.len(),
            purged_count: plan.to_purge.len(),
            dry_run: true,
            ..Summary::default()
        })
    }

    /// Run a full pass and persist the resulting index.
    pub fn run_sync(
        &mut self,
        user: UserId,
        credentials: &Credentials,
    ) -> Result<Summary, SyncError> {
        let (prior, snapshot, plan) = self.plan(user, credentials)?;
        let mut summary = Summary {
            total_remote: snapshot.len(),
            ..Summary::default()
        };

        self.fetch_outdated(&plan, credentials, &mut summary);
        self.purge_orphans(&plan, &mut summary);

        if summary.is_up_to_date() {
            tracing::info!("up-to-date!");
        }

        let next = settle_index(&prior, &plan, &summary.failed_fetches, &summary.failed_purges);
        index_store::save_at(&self.config.index_path, &next)?;
        tracing::debug!(
            routes = next.len(),
            path = %self.config.index_path.display(),
            "saved index"
        );
        Ok(summary)
    }

    fn fetch_outdated(
        &mut self,
        plan: &ReconciliationPlan,
        credentials: &Credentials,
        summary: &mut Summary,
    ) {
        let total = plan.to_fetch.len();
        if total == 0 {
            return;
        }
        tracing::info!("updating {total} routes");
        for (i, route) in plan.to_fetch.iter().enumerate() {
            tracing::info!("{} / {total}: {route}", i + 1);
            match self.content.fetch(*route, credentials) {
                Ok(()) => summary.fetched_count += 1,
                Err(err) => {
                    tracing::warn!(%route, error = %err, "route fetch failed; retrying next pass");
                    summary.failed_fetches.push(*route);
                }
            }
        }
    }

    fn purge_orphans(&mut self, plan: &ReconciliationPlan, summary: &mut Summary) {
        if plan.to_purge.is_empty() {
            return;
        }
        tracing::info!("purging {} orphan routes", plan.to_purge.len());
        for route in &plan.to_purge {
            match self.content.delete(*route) {
                Ok(()) => summary.purged_count += 1,
                Err(err) => {
                    tracing::warn!(%route, error = %err, "route delete failed; retrying next pass");
                    summary.failed_purges.push(*route);
                }
            }
        }
    }
}

/// Index to persist after applying `plan`, given which routes failed.
///
/// - failed fetch, route known before: keep the prior timestamp;
/// - failed fetch, new route: leave it out;
/// - failed purge: keep the prior entry, so the route is purged again next pass.
pub fn settle_index(
    prior: &Index,
    plan: &ReconciliationPlan,
    failed_fetches: &[RouteId],
    failed_purges: &[RouteId],
) -> Index {
    let mut next = plan.next_index.clone();
    for route in failed_fetches {
        match prior.get(route) {
            Some(ts) => {
                next.insert(*route, *ts);
            }
            None => {
                next.remove(route);
            }
        }
    }
    for route in failed_purges {
        if let Some(ts) = prior.get(route) {
            next.insert(*route, *ts);
        }
    }
    next
}
