//! `routesync` — one reconciliation pass for a user's routes.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use routesync_core::{config, Credentials, RouteId, UserId};
use routesync_sync::{Driver, Summary};

/// Arguments for a sync pass.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// API key for the remote route service.
    #[arg(short = 'k', long)]
    pub api_key: String,

    /// Auth token of the user.
    #[arg(short = 't', long)]
    pub auth_token: String,

    /// Numeric ID of the user whose routes are synced.
    #[arg(short = 'u', long)]
    pub user_id: u64,

    /// YAML config file (default: ~/.routesync/config.yaml when present).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Route index file; overrides the config file.
    #[arg(long, value_name = "PATH")]
    pub index_file: Option<PathBuf>,

    /// Remote API root; overrides the config file.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Show what would be fetched and purged without doing it.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the pass summary as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let mut config =
            config::load(self.config.as_deref()).context("failed to load configuration")?;
        if let Some(path) = self.index_file {
            config = config.with_index_path(path);
        }
        if let Some(url) = self.base_url {
            config = config.with_base_url(url);
        }
        config.validate().context("invalid configuration")?;
        tracing::debug!(
            base_url = %config.base_url,
            index = %config.index_path.display(),
            page_size = config.page_size,
            "effective configuration"
        );

        let user = UserId(self.user_id);
        let credentials = Credentials::new(self.api_key, self.auth_token);
        let mut driver = Driver::from_config(config);

        let summary = if self.dry_run {
            driver.dry_run(user, &credentials)
        } else {
            driver.run_sync(user, &credentials)
        }
        .with_context(|| format!("sync failed for user {user}"))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("failed to serialize summary")?
            );
        } else {
            print_summary(&summary);
        }
        Ok(())
    }
}

fn print_summary(summary: &Summary) {
    if summary.dry_run {
        println!("[dry-run] found {} routes", summary.total_remote);
        if summary.fetched_count > 0 {
            println!("[dry-run] would update {} routes", summary.fetched_count);
        }
        if summary.purged_count > 0 {
            println!("[dry-run] would purge {} orphan routes", summary.purged_count);
        }
        if summary.is_up_to_date() {
            println!("[dry-run] up-to-date!");
        }
        return;
    }

    println!("found {} routes", summary.total_remote);
    if summary.fetched_count > 0 {
        println!("updated {} routes", summary.fetched_count);
    }
    if summary.purged_count > 0 {
        println!("purged {} orphan routes", summary.purged_count);
    }
    if !summary.failed_fetches.is_empty() {
        let line = format!(
            "{} routes failed to update, retrying next run: {}",
            summary.failed_fetches.len(),
            preview_routes(&summary.failed_fetches)
        );
        println!("{}", line.yellow());
    }
    if !summary.failed_purges.is_empty() {
        let line = format!(
            "{} routes failed to purge, retrying next run: {}",
            summary.failed_purges.len(),
            preview_routes(&summary.failed_purges)
        );
        println!("{}", line.yellow());
    }
    if summary.is_up_to_date() {
        println!("{}", "up-to-date!".green());
    }
}

fn preview_routes(routes: &[RouteId]) -> String {
    let mut shown: Vec<String> = routes.iter().take(5).map(RouteId::to_string).collect();
    if routes.len() > shown.len() {
        shown.push(format!("+{} more", routes.len() - shown.len()));
    }
    shown.join(", ")
}
