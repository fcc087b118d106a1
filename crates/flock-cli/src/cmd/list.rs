//! `flock list` — print the stored timeline.


use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use crate::config::Config;
use crate::db::Store;
use crate::output::{OutputMode, render};
use flock_core::model::Status;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Maximum number of statuses to print.
    #[arg(long, default_value_t = 20)]
    pub limit: u32,
}

#[derive(Debug, Serialize)]
struct ListRow {
    id: String,
    created_at: DateTime<Utc>,
    account: String,
    content: String,
    replies_count: u32,
    sensitive: bool,
}

impl From<Status> for ListRow {
    fn from(status: Status) -> Self {
        Self {
            id: status.id.as_str().to_string(),
            created_at: status.created_at,
            account: status.account,
            // Sensitive bodies stay concealed outside the TUI.
            content: if status.sensitive {
                format!("[CW: {}]", status.spoiler_text)
            } else {
                status.content
            },
            replies_count: status.replies_count,
            sensitive: status.sensitive,
        }
    }
}

pub fn run_list(args: &ListArgs, mode: OutputMode, config: &Config) -> Result<()> {
    let store = Store::open(&config.db_path())?;
    let rows: Vec<ListRow> = store
        .recent(args.limit)?
        .into_iter()
        .map(ListRow::from)
        .collect();

    render(mode, &rows, |rows, w| {
        for row in rows {
            let first_line = row.content.lines().next().unwrap_or("");
            writeln!(
                w,
                "{}  {}  {}  {}",
                row.created_at.format("%Y-%m-%d %H:%M"),
                row.id,
                row.account,
                first_line
            )?;
        }
        Ok(())
    })
}
