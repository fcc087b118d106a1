//! Pagination state machine — one per list.
//!
//! Drives the load-latest / load-older lifecycle for a single timeline.
//! The legal moves live in one pure transition table
//! ([`can_transition`]), testable in isolation from any view; the machine
//! applies transitions and rejects everything else as a warn-logged no-op.
//!
//! ```text
//! Initial ──▶ LoadingLatest ──ok──▶ Idle ◀──ok-with-more── LoadingOlder
//!                  │  ▲              │ ▲                    │      │
//!                 err │ refresh      │ └──── load older ────┘     err
//!                  ▼  │              ▼                             ▼
//!                Failed ◀────────────┘        NoMore ◀──empty──  Failed
//! ```
//!
//! `NoMore` is terminal for load-older only: refresh stays permitted.
//! Entering a loading state issues at most one concurrent fetch — a
//! second trigger while loading is a guarded no-op, not a cancellation.

use crate::error::{FetchError, IllegalTransition};
use crate::fetch::PageSummary;
use std::fmt;

// ---------------------------------------------------------------------------
// PaginationState
// ---------------------------------------------------------------------------

/// Lifecycle state of a list's pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaginationState {
    /// Created, not yet activated.
    Initial,
    /// A fetch-latest (refresh) is in flight.
    LoadingLatest,
    /// A fetch-older page request is in flight.
    LoadingOlder,
    /// At rest with more older data presumed available.
    Idle,
    /// The most recent fetch failed; waiting for an explicit retry.
    Failed,
    /// The server signalled the end of older data.
    NoMore,
}

impl PaginationState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::LoadingLatest => "loading-latest",
            Self::LoadingOlder => "loading-older",
            Self::Idle => "idle",
            Self::Failed => "failed",
            Self::NoMore => "no-more",
        }
    }

    /// True while a fetch is in flight.
    #[must_use]
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::LoadingLatest | Self::LoadingOlder)
    }

    /// All states, for exhaustive table tests.
    pub const ALL: [Self; 6] = [
        Self::Initial,
        Self::LoadingLatest,
        Self::LoadingOlder,
        Self::Idle,
        Self::Failed,
        Self::NoMore,
    ];
}

impl fmt::Display for PaginationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaginationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(Self::Initial),
            "loading-latest" => Ok(Self::LoadingLatest),
            "loading-older" => Ok(Self::LoadingOlder),
            "idle" => Ok(Self::Idle),
            "failed" => Ok(Self::Failed),
            "no-more" => Ok(Self::NoMore),
            _ => Err(format!("unknown pagination state: {s}")),
        }
    }
}

/// The sole authority on legal pagination moves.
#[must_use]
pub const fn can_transition(from: PaginationState, to: PaginationState) -> bool {
    use PaginationState::{Failed, Idle, Initial, LoadingLatest, LoadingOlder, NoMore};
    matches!(
        (from, to),
        (Initial, LoadingLatest)
            | (LoadingLatest, Idle | Failed)
            | (LoadingOlder, Idle | NoMore | Failed)
            | (Idle, LoadingLatest | LoadingOlder)
            | (Failed, LoadingLatest | LoadingOlder)
            | (NoMore, LoadingLatest)
    )
}

// ---------------------------------------------------------------------------
// PaginationMachine
// ---------------------------------------------------------------------------

/// Which load operation a trigger resolved to. The controller turns this
/// into a concrete [`crate::fetch::FetchCommand`] (it knows the current
/// tail id for `Older`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    Latest,
    Older,
}

/// Per-list pagination machine.
///
/// Triggers return `Some(LoadOp)` when a fetch must be issued and `None`
/// when the trigger was a guarded no-op. Completions apply the fetch
/// result; a completion that does not match the current loading state is
/// rejected (late delivery after teardown or a programming error).
#[derive(Debug)]
pub struct PaginationMachine {
    state: PaginationState,
    /// The error that put us in `Failed`, retained for display.
    last_error: Option<FetchError>,
    /// Which operation failed, so retry can mirror it.
    failed_op: Option<LoadOp>,
}

impl PaginationMachine {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: PaginationState::Initial,
            last_error: None,
            failed_op: None,
        }
    }

    /// Readable current-state signal.
    #[must_use]
    pub const fn state(&self) -> PaginationState {
        self.state
    }

    /// The error behind a `Failed` state, for the retry affordance.
    #[must_use]
    pub const fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    /// Which operation put us in `Failed`, `None` outside it.
    #[must_use]
    pub const fn failed_op(&self) -> Option<LoadOp> {
        self.failed_op
    }

    /// First activation: `Initial → LoadingLatest`, automatic on screen
    /// appearance. No-op from any other state.
    pub fn activate(&mut self) -> Option<LoadOp> {
        (self.state == PaginationState::Initial)
            .then(|| self.begin(PaginationState::LoadingLatest, LoadOp::Latest))
            .flatten()
    }

    /// Explicit refresh trigger (pull-to-refresh, `r` key).
    pub fn trigger_refresh(&mut self) -> Option<LoadOp> {
        self.begin(PaginationState::LoadingLatest, LoadOp::Latest)
    }

    /// Explicit load-more trigger (view nearing the end of the list).
    pub fn trigger_load_older(&mut self) -> Option<LoadOp> {
        self.begin(PaginationState::LoadingOlder, LoadOp::Older)
    }

    /// Retry whichever operation put us in `Failed`. No-op elsewhere.
    pub fn trigger_retry(&mut self) -> Option<LoadOp> {
        if self.state != PaginationState::Failed {
            return None;
        }
        match self.failed_op {
            Some(LoadOp::Older) => self.begin(PaginationState::LoadingOlder, LoadOp::Older),
            // A machine can only be Failed after a load; mirror Latest if
            // the op was somehow not recorded.
            _ => self.begin(PaginationState::LoadingLatest, LoadOp::Latest),
        }
    }

    /// Apply the result of a fetch-latest.
    pub fn complete_latest(&mut self, result: Result<PageSummary, FetchError>) {
        if self.state != PaginationState::LoadingLatest {
            self.reject_completion("latest");
            return;
        }
        match result {
            Ok(_) => self.settle(PaginationState::Idle),
            Err(err) => self.fail(err, LoadOp::Latest),
        }
    }

    /// Apply the result of a fetch-older. An empty page, or a page the
    /// server marked as the last one, ends older pagination.
    pub fn complete_older(&mut self, result: Result<PageSummary, FetchError>) {
        if self.state != PaginationState::LoadingOlder {
            self.reject_completion("older");
            return;
        }
        match result {
            Ok(summary) if summary.is_empty || !summary.has_more => {
                self.settle(PaginationState::NoMore);
            }
            Ok(_) => self.settle(PaginationState::Idle),
            Err(err) => self.fail(err, LoadOp::Older),
        }
    }

    // -- internals ----------------------------------------------------------

    /// Enter a loading state if the table permits, reporting the fetch to
    /// issue. A trigger while already loading hits the table's guard and
    /// resolves to a no-op — in-flight work is never cancelled.
    fn begin(&mut self, to: PaginationState, op: LoadOp) -> Option<LoadOp> {
        match self.apply(to) {
            Ok(()) => Some(op),
            Err(rejected) => {
                tracing::debug!(%rejected, "pagination trigger ignored");
                None
            }
        }
    }

    fn settle(&mut self, to: PaginationState) {
        self.last_error = None;
        self.failed_op = None;
        // Completion targets are always legal from a loading state.
        let _ = self.apply(to);
    }

    fn fail(&mut self, err: FetchError, op: LoadOp) {
        tracing::warn!(error = %err, ?op, "pagination fetch failed");
        self.last_error = Some(err);
        self.failed_op = Some(op);
        let _ = self.apply(PaginationState::Failed);
    }

    fn apply(&mut self, to: PaginationState) -> Result<(), IllegalTransition> {
        if can_transition(self.state, to) {
            tracing::trace!(from = %self.state, to = %to, "pagination transition");
            self.state = to;
            Ok(())
        } else {
            Err(IllegalTransition {
                from: self.state.as_str(),
                to: to.as_str(),
            })
        }
    }

    fn reject_completion(&self, kind: &str) {
        tracing::warn!(
            state = %self.state,
            kind,
            "dropping fetch completion that does not match current state"
        );
    }
}

impl Default for PaginationMachine {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
