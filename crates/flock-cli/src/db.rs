//! Local status store, a rusqlite projection of fetched pages.
//!
//! The engine consumes only the ordered identity sequence
//! ([`Store::ordered_ids`] via the `StoreQuery` trait); everything else
//! here serves the CLI surfaces — inserting fetched pages, reading rows
//! for display, and integrity checks for `flock doctor`.
//!
//! Timeline order is reverse-chronological with the status id as a
//! tiebreak, matching what the server would return.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use flock_core::error::StoreReadError;
use flock_core::fetch::Page;
use flock_core::model::{Status, StatusId};
use flock_core::store::StoreQuery;
use rusqlite::{Connection, params};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS statuses (
    id            TEXT PRIMARY KEY,
    created_at    TEXT NOT NULL,
    in_reply_to   TEXT,
    replies_count INTEGER NOT NULL DEFAULT 0,
    account       TEXT NOT NULL,
    content       TEXT NOT NULL,
    sensitive     INTEGER NOT NULL DEFAULT 0,
    spoiler_text  TEXT NOT NULL DEFAULT ''
);
CREATE INDEX IF NOT EXISTS idx_statuses_created_at
    ON statuses (created_at DESC, id DESC);
";

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("opening status db {}", path.display()))?;
        conn.execute_batch(SCHEMA).context("applying schema")?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// The full timeline identity sequence, newest first.
    pub fn ordered_ids(&self) -> Result<Vec<StatusId>, StoreReadError> {
        let run = || -> rusqlite::Result<Vec<StatusId>> {
            let mut stmt = self
                .conn
                .prepare_cached("SELECT id FROM statuses ORDER BY created_at DESC, id DESC")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.map(|row| row.map(StatusId::new)).collect()
        };
        run().map_err(|err| StoreReadError(err.to_string()))
    }

    /// Upsert the statuses of a fetched page.
    pub fn insert_statuses(&self, statuses: &[Status]) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT OR REPLACE INTO statuses
                 (id, created_at, in_reply_to, replies_count, account, content, sensitive, spoiler_text)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for status in statuses {
            stmt.execute(params![
                status.id.as_str(),
                status.created_at.to_rfc3339(),
                status.in_reply_to.as_ref().map(StatusId::as_str),
                status.replies_count,
                status.account,
                status.content,
                status.sensitive,
                status.spoiler_text,
            ])
            .context("inserting status")?;
        }
        Ok(statuses.len())
    }

    /// Insert a fetched-latest page and detect a discontinuity.
    ///
    /// When the page does not overlap what the store already held (none
    /// of its ids were present, more data remains on the server, and the
    /// previous top is older than everything fetched), intermediate
    /// statuses are missing: the oldest fetched status anchors a gap.
    pub fn insert_latest_page(&self, page: &Page) -> Result<Option<StatusId>> {
        if page.statuses.is_empty() {
            return Ok(None);
        }
        let previous_top: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT id, created_at FROM statuses ORDER BY created_at DESC, id DESC LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map(Some)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        let overlaps = previous_top.as_ref().is_some_and(|(top_id, _)| {
            page.statuses.iter().any(|s| s.id.as_str() == top_id)
        });
        self.insert_statuses(&page.statuses)?;

        let Some((_, top_created_at)) = previous_top else {
            return Ok(None);
        };
        if overlaps || !page.has_more {
            return Ok(None);
        }
        let oldest_fetched = page
            .statuses
            .iter()
            .min_by(|a, b| a.created_at.cmp(&b.created_at))
            .filter(|s| s.created_at.to_rfc3339() > top_created_at);
        Ok(oldest_fetched.map(|s| s.id.clone()))
    }

    /// Read one status row, for display.
    pub fn get(&self, id: &StatusId) -> Result<Option<Status>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, created_at, in_reply_to, replies_count, account, content, sensitive, spoiler_text
             FROM statuses WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map([id.as_str()], row_to_status)?;
        rows.next().transpose().context("reading status row")
    }

    /// The newest `limit` statuses, for `flock list`.
    pub fn recent(&self, limit: u32) -> Result<Vec<Status>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, created_at, in_reply_to, replies_count, account, content, sensitive, spoiler_text
             FROM statuses ORDER BY created_at DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit], row_to_status)?;
        rows.collect::<rusqlite::Result<_>>().context("reading statuses")
    }

    pub fn count(&self) -> Result<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM statuses", [], |row| row.get(0))
            .context("counting statuses")
    }

    /// Run SQLite's integrity check, for `flock doctor`.
    pub fn integrity_check(&self) -> Result<String> {
        self.conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))
            .context("running integrity check")
    }
}

fn row_to_status(row: &rusqlite::Row<'_>) -> rusqlite::Result<Status> {
    let created_at: String = row.get(1)?;
    let created_at = created_at
        .parse::<DateTime<Utc>>()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(err)))?;
    Ok(Status {
        id: StatusId::new(row.get::<_, String>(0)?),
        created_at,
        in_reply_to: row.get::<_, Option<String>>(2)?.map(StatusId::new),
        replies_count: row.get(3)?,
        account: row.get(4)?,
        content: row.get(5)?,
        sensitive: row.get(6)?,
        spoiler_text: row.get(7)?,
    })
}

// The engine queries through a shared handle; the TUI keeps the other
// clone for inserts.
impl StoreQuery for Store {
    fn ordered_ids(&self) -> Result<Vec<StatusId>, StoreReadError> {
        Store::ordered_ids(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn status(id: &str, minute: u32) -> Status {
        let created_at = Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, 0).unwrap();
        Status {
            account: "ada@example.social".into(),
            content: format!("post {id}"),
            ..Status::stub(id, created_at)
        }
    }

    #[test]
    fn ordered_ids_are_reverse_chronological() {
        let store = Store::open_in_memory().unwrap();
        store
            .insert_statuses(&[status("a", 1), status("c", 3), status("b", 2)])
            .unwrap();

        let ids = store.ordered_ids().unwrap();
        let raw: Vec<&str> = ids.iter().map(StatusId::as_str).collect();
        assert_eq!(raw, ["c", "b", "a"]);
    }

    #[test]
    fn equal_timestamps_break_ties_by_id_descending() {
        let store = Store::open_in_memory().unwrap();
        store
            .insert_statuses(&[status("10", 5), status("11", 5)])
            .unwrap();

        let ids = store.ordered_ids().unwrap();
        assert_eq!(ids[0].as_str(), "11");
    }

    #[test]
    fn insert_is_idempotent_by_id() {
        let store = Store::open_in_memory().unwrap();
        store.insert_statuses(&[status("a", 1)]).unwrap();
        let mut updated = status("a", 1);
        updated.replies_count = 9;
        store.insert_statuses(&[updated]).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        let row = store.get(&StatusId::new("a")).unwrap().unwrap();
        assert_eq!(row.replies_count, 9);
    }

    #[test]
    fn round_trips_status_fields() {
        let store = Store::open_in_memory().unwrap();
        let mut original = status("a", 1).replying_to("parent");
        original.sensitive = true;
        original.spoiler_text = "cw".into();
        store.insert_statuses(std::slice::from_ref(&original)).unwrap();

        let row = store.get(&StatusId::new("a")).unwrap().unwrap();
        assert_eq!(row, original);
    }

    // -----------------------------------------------------------------------
    // Gap detection
    // -----------------------------------------------------------------------

    #[test]
    fn disconnected_latest_page_yields_gap_anchor() {
        let store = Store::open_in_memory().unwrap();
        store.insert_statuses(&[status("a", 1), status("b", 2)]).unwrap();

        // A refresh lands statuses well above the old top, with more
        // remaining on the server in between.
        let page = Page {
            statuses: vec![status("f", 20), status("e", 19)],
            has_more: true,
        };
        let anchor = store.insert_latest_page(&page).unwrap();
        assert_eq!(anchor, Some(StatusId::new("e")));
        assert_eq!(store.count().unwrap(), 4);
    }

    #[test]
    fn overlapping_latest_page_yields_no_anchor() {
        let store = Store::open_in_memory().unwrap();
        store.insert_statuses(&[status("b", 2), status("a", 1)]).unwrap();

        // The page reaches back to the known top: contiguous.
        let page = Page {
            statuses: vec![status("c", 3), status("b", 2)],
            has_more: true,
        };
        assert_eq!(store.insert_latest_page(&page).unwrap(), None);
    }

    #[test]
    fn short_latest_page_yields_no_anchor() {
        let store = Store::open_in_memory().unwrap();
        store.insert_statuses(&[status("a", 1)]).unwrap();

        // has_more = false: the server had nothing between this page and
        // whatever came before it.
        let page = Page {
            statuses: vec![status("c", 3)],
            has_more: false,
        };
        assert_eq!(store.insert_latest_page(&page).unwrap(), None);
    }

    #[test]
    fn first_page_into_empty_store_yields_no_anchor() {
        let store = Store::open_in_memory().unwrap();
        let page = Page {
            statuses: vec![status("a", 1)],
            has_more: true,
        };
        assert_eq!(store.insert_latest_page(&page).unwrap(), None);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn integrity_check_reports_ok() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.integrity_check().unwrap(), "ok");
    }
}
