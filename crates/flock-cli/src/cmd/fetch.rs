//! `flock fetch` — pull timeline pages into the local store.


use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::api::ApiClient;
use crate::config::Config;
use crate::db::Store;
use crate::output::{OutputMode, render};
use flock_core::fetch::Fetcher;
use flock_core::model::StatusId;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Number of pages to fetch (the first from the top, the rest older).
    #[arg(long, default_value_t = 1)]
    pub pages: u32,
}

#[derive(Debug, Serialize)]
struct FetchReport {
    fetched: usize,
    pages: u32,
    /// Anchor id of a detected discontinuity, if the latest page did not
    /// connect to previously stored content.
    gap_anchor: Option<String>,
}

pub fn run_fetch(args: &FetchArgs, mode: OutputMode, config: &Config) -> Result<()> {
    let client = ApiClient::new(config);
    let store = Store::open(&config.db_path())?;

    let page = client
        .fetch_latest()
        .map_err(|err| super::fetch_failure(mode, &err))?;
    let mut fetched = page.statuses.len();
    let mut pages_done = 1;
    let mut cursor = oldest_id(&page.statuses);
    let mut has_more = page.has_more;

    let gap_anchor = store
        .insert_latest_page(&page)
        .context("persisting fetched page")?;
    if let Some(ref anchor) = gap_anchor {
        info!(%anchor, "latest page did not connect to stored content");
    }

    while pages_done < args.pages && has_more {
        let Some(before) = cursor.take() else { break };
        let page = client
            .fetch_older(&before)
            .map_err(|err| super::fetch_failure(mode, &err))?;
        store.insert_statuses(&page.statuses)?;
        fetched += page.statuses.len();
        pages_done += 1;
        cursor = oldest_id(&page.statuses);
        has_more = page.has_more;
    }

    let report = FetchReport {
        fetched,
        pages: pages_done,
        gap_anchor: gap_anchor.map(|id| id.as_str().to_string()),
    };
    render(mode, &report, |r, w| {
        writeln!(w, "fetched {} statuses across {} page(s)", r.fetched, r.pages)?;
        if let Some(ref anchor) = r.gap_anchor {
            writeln!(w, "gap detected below status {anchor} (fill it from the TUI)")?;
        }
        Ok(())
    })
}

fn oldest_id(statuses: &[flock_core::model::Status]) -> Option<StatusId> {
    statuses
        .iter()
        .min_by(|a, b| a.created_at.cmp(&b.created_at))
        .map(|s| s.id.clone())
}
