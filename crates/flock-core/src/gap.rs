//! Gap-fill registry.
//!
//! A gap is a known discontinuity between two adjacent stored items:
//! intermediate statuses exist on the server but were never persisted
//! locally (e.g. the app was closed while newer pages piled up). Each gap
//! is keyed by its anchor — the item immediately above the missing span —
//! and owns a small independent state machine:
//!
//! ```text
//! Pending ──▶ Fetching ──▶ Resolved
//!    ▲           │
//!    retry      err/empty
//!    └─────── Failed
//! ```
//!
//! Machines are created lazily on first render of a gap marker and live
//! for the screen's lifetime — the registry never prunes implicitly,
//! because a `Resolved` machine's terminal state may still be inspected
//! by an in-flight render. Their lifecycle is deliberately uncoupled from
//! the list's pagination machine.

use std::collections::HashMap;
use std::fmt;

use crate::error::{FetchError, IllegalTransition};
use crate::fetch::PageSummary;
use crate::model::id::StatusId;

// ---------------------------------------------------------------------------
// GapState
// ---------------------------------------------------------------------------

/// State of one gap-fill machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GapState {
    /// Marker rendered, no fetch attempted yet.
    Pending,
    /// The span fetch is in flight.
    Fetching,
    /// The span was fetched and persisted; the marker disappears on the
    /// next reconciliation pass.
    Resolved,
    /// The fetch failed or came back empty; retry available.
    Failed,
}

impl GapState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Resolved => "resolved",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for GapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Legal gap-machine moves.
#[must_use]
pub const fn can_transition(from: GapState, to: GapState) -> bool {
    use GapState::{Failed, Fetching, Pending, Resolved};
    matches!(
        (from, to),
        (Pending | Failed, Fetching) | (Fetching, Resolved | Failed)
    )
}

// ---------------------------------------------------------------------------
// GapMachine
// ---------------------------------------------------------------------------

/// One per-anchor machine. Owned by the registry; machines never
/// reference each other.
#[derive(Debug)]
pub struct GapMachine {
    state: GapState,
    last_error: Option<FetchError>,
}

impl GapMachine {
    const fn new() -> Self {
        Self {
            state: GapState::Pending,
            last_error: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> GapState {
        self.state
    }

    /// The error behind a `Failed` state, for the marker's retry row.
    #[must_use]
    pub const fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    fn apply(&mut self, to: GapState) -> Result<(), IllegalTransition> {
        if can_transition(self.state, to) {
            self.state = to;
            Ok(())
        } else {
            Err(IllegalTransition {
                from: self.state.as_str(),
                to: to.as_str(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// GapRegistry
// ---------------------------------------------------------------------------

/// Owning map from anchor identity to its gap machine.
///
/// Single-owner, single-thread, like the attribute store. Entries are
/// pruned only by dropping the registry with its screen.
#[derive(Debug, Default)]
pub struct GapRegistry {
    machines: HashMap<StatusId, GapMachine>,
}

impl GapRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the machine for `anchor`, creating one in `Pending` on
    /// first call. Idempotent: a second call never replaces the machine.
    pub fn ensure_machine(&mut self, anchor: &StatusId) -> &GapMachine {
        self.machines
            .entry(anchor.clone())
            .or_insert_with(GapMachine::new)
    }

    /// Current state for `anchor`, if registered.
    #[must_use]
    pub fn state(&self, anchor: &StatusId) -> Option<GapState> {
        self.machines.get(anchor).map(GapMachine::state)
    }

    /// Machine lookup for UI affordances (retry row error text).
    #[must_use]
    pub fn machine(&self, anchor: &StatusId) -> Option<&GapMachine> {
        self.machines.get(anchor)
    }

    /// True when `id` is a registered anchor whose span has not been
    /// resolved — exactly the condition under which the reconciler keeps
    /// a gap marker after it.
    #[must_use]
    pub fn is_unresolved(&self, id: &StatusId) -> bool {
        self.machines
            .get(id)
            .is_some_and(|machine| machine.state != GapState::Resolved)
    }

    /// Begin the span fetch for `anchor`. Returns true when a fetch must
    /// be issued; `Fetching` and `Resolved` machines reject the trigger
    /// as a no-op, and an unknown anchor is ignored.
    pub fn trigger_fetch(&mut self, anchor: &StatusId) -> bool {
        let Some(machine) = self.machines.get_mut(anchor) else {
            tracing::warn!(%anchor, "gap fetch triggered for unregistered anchor");
            return false;
        };
        match machine.apply(GapState::Fetching) {
            Ok(()) => true,
            Err(rejected) => {
                tracing::debug!(%anchor, %rejected, "gap trigger ignored");
                false
            }
        }
    }

    /// Apply a span-fetch result. A non-empty page resolves the gap (the
    /// persisted items close the discontinuity on the next pass); an
    /// empty page or an error leaves it retryable.
    pub fn complete(&mut self, anchor: &StatusId, result: Result<PageSummary, FetchError>) {
        let Some(machine) = self.machines.get_mut(anchor) else {
            tracing::warn!(%anchor, "dropping gap completion for unregistered anchor");
            return;
        };
        let target = match result {
            Ok(summary) if !summary.is_empty => {
                machine.last_error = None;
                GapState::Resolved
            }
            Ok(_) => {
                tracing::debug!(%anchor, "gap fetch returned an empty span");
                GapState::Failed
            }
            Err(err) => {
                tracing::warn!(%anchor, error = %err, "gap fetch failed");
                machine.last_error = Some(err);
                GapState::Failed
            }
        };
        if let Err(rejected) = machine.apply(target) {
            tracing::warn!(%anchor, %rejected, "dropping mismatched gap completion");
        }
    }

    /// Number of registered machines, resolved or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.machines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
