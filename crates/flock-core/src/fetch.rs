//! The asynchronous fetch boundary.
//!
//! The engine itself never performs I/O. State-machine triggers emit
//! [`FetchCommand`] values; the host executes them against its [`Fetcher`]
//! on a worker context, persists the returned page into the local store,
//! and delivers a [`FetchOutcome`] back on the UI-owning thread. That
//! handoff is the engine's only suspension point.
//!
//! There is no cancellation: a late outcome for a torn-down list is simply
//! dropped along with the machines that would have consumed it.

use crate::error::FetchError;
use crate::model::id::StatusId;
use crate::model::status::Status;

/// One fetched timeline page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub statuses: Vec<Status>,
    /// Whether the server indicated further older data exists.
    pub has_more: bool,
}

/// The digest of a page that the state machines consume. The host keeps
/// the statuses themselves; the machines only care about emptiness and
/// whether older data remains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSummary {
    pub is_empty: bool,
    pub has_more: bool,
}

impl From<&Page> for PageSummary {
    fn from(page: &Page) -> Self {
        Self {
            is_empty: page.statuses.is_empty(),
            has_more: page.has_more,
        }
    }
}

/// Network client interface consumed by the engine's host.
///
/// Implemented by the CLI's REST client and by in-memory test doubles.
/// A timeout is surfaced as an ordinary [`FetchError`].
pub trait Fetcher {
    /// Fetch the newest page of the timeline.
    fn fetch_latest(&self) -> Result<Page, FetchError>;

    /// Fetch the page of items older than `before`.
    fn fetch_older(&self, before: &StatusId) -> Result<Page, FetchError>;

    /// Fetch the span between `anchor` and the next known item below it
    /// (`until`, when the list has one).
    fn fetch_gap(&self, anchor: &StatusId, until: Option<&StatusId>) -> Result<Page, FetchError>;
}

// ---------------------------------------------------------------------------
// Commands and outcomes
// ---------------------------------------------------------------------------

/// A fetch the engine has decided to issue. Executed by the host on a
/// worker context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchCommand {
    Latest,
    Older { before: StatusId },
    Gap { anchor: StatusId, until: Option<StatusId> },
}

impl FetchCommand {
    /// Run this command against a fetcher. Convenience for hosts and
    /// tests; the engine never calls it.
    pub fn execute(&self, fetcher: &dyn Fetcher) -> Result<Page, FetchError> {
        match self {
            Self::Latest => fetcher.fetch_latest(),
            Self::Older { before } => fetcher.fetch_older(before),
            Self::Gap { anchor, until } => fetcher.fetch_gap(anchor, until.as_ref()),
        }
    }
}

/// A completed fetch, delivered back to the engine on the owning thread
/// after the host has persisted any returned statuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Latest(Result<PageSummary, FetchError>),
    Older(Result<PageSummary, FetchError>),
    Gap {
        anchor: StatusId,
        result: Result<PageSummary, FetchError>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn page_summary_digests_page() {
        let empty = Page { statuses: vec![], has_more: true };
        let summary = PageSummary::from(&empty);
        assert!(summary.is_empty);
        assert!(summary.has_more);

        let full = Page {
            statuses: vec![Status::stub("1", Utc::now())],
            has_more: false,
        };
        let summary = PageSummary::from(&full);
        assert!(!summary.is_empty);
        assert!(!summary.has_more);
    }
}
