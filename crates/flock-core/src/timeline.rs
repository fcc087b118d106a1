//! Per-list controller tying the engine together.
//!
//! One `TimelineController` owns exactly one list's pagination machine,
//! gap registry, attribute store, and current render output. All methods
//! take `&mut self` on the UI-owning thread, so at most one
//! reconciliation pass is ever in flight per list by construction.
//!
//! The controller's triggers are the only legal way to cause a state
//! transition from outside the engine. Triggers that must fetch return a
//! [`FetchCommand`]; the host runs it on a worker context, persists the
//! page, delivers the [`FetchOutcome`] via [`TimelineController::apply_outcome`],
//! and signals [`TimelineController::on_store_changed`] when the store
//! notifies. Thread-view expansion lives on
//! [`crate::conversation::ConversationTree`], not here.

use crate::error::FetchError;
use crate::fetch::{FetchCommand, FetchOutcome};
use crate::gap::{GapRegistry, GapState};
use crate::model::attribute::{Attribute, AttributeStore};
use crate::model::id::StatusId;
use crate::model::item::{EmptyReason, RenderItem};
use crate::pagination::{LoadOp, PaginationMachine, PaginationState};
use crate::reconcile::reconcile;
use crate::store::StoreQuery;

/// Timeline engine for one list screen.
pub struct TimelineController<S: StoreQuery> {
    store: S,
    pagination: PaginationMachine,
    gaps: GapRegistry,
    attributes: AttributeStore,
    suppression: Option<EmptyReason>,
    /// Ordered ids from the last successful store read. A failed read
    /// keeps the previous snapshot (and render) in place.
    sequence: Vec<StatusId>,
    items: Vec<RenderItem>,
}

impl<S: StoreQuery> TimelineController<S> {
    pub fn new(store: S) -> Self {
        let mut controller = Self {
            store,
            pagination: PaginationMachine::new(),
            gaps: GapRegistry::new(),
            attributes: AttributeStore::new(),
            suppression: None,
            sequence: Vec::new(),
            items: Vec::new(),
        };
        controller.rebuild();
        controller
    }

    // -- read signals -------------------------------------------------------

    /// The current renderable sequence, for the render sink to diff.
    #[must_use]
    pub fn items(&self) -> &[RenderItem] {
        &self.items
    }

    #[must_use]
    pub const fn pagination_state(&self) -> PaginationState {
        self.pagination.state()
    }

    /// The retained error behind a `Failed` pagination state.
    #[must_use]
    pub const fn last_error(&self) -> Option<&FetchError> {
        self.pagination.last_error()
    }

    /// Per-anchor gap state, for spinner/retry affordances.
    #[must_use]
    pub fn gap_state(&self, anchor: &StatusId) -> Option<GapState> {
        self.gaps.state(anchor)
    }

    // -- user-interaction hooks ---------------------------------------------

    /// First activation on screen appearance: load whatever the store
    /// already holds, then begin the initial fetch.
    pub fn activate(&mut self) -> Option<FetchCommand> {
        self.refresh_sequence();
        let op = self.pagination.activate();
        self.finish_trigger(op)
    }

    /// Explicit refresh. No-op while a fetch is already in flight.
    pub fn trigger_refresh(&mut self) -> Option<FetchCommand> {
        let op = self.pagination.trigger_refresh();
        self.finish_trigger(op)
    }

    /// Explicit load-older. No-op while loading, after `NoMore`, or on an
    /// empty list (an empty list loads via refresh).
    pub fn trigger_load_older(&mut self) -> Option<FetchCommand> {
        if self.sequence.is_empty() {
            tracing::debug!("load-older ignored on empty list");
            return None;
        }
        let op = self.pagination.trigger_load_older();
        self.finish_trigger(op)
    }

    /// Retry whichever pagination fetch failed.
    pub fn trigger_retry(&mut self) -> Option<FetchCommand> {
        if self.sequence.is_empty() && self.pagination.failed_op() == Some(LoadOp::Older) {
            // Nothing left to anchor an older fetch on; the retry row
            // should not strand the machine in LoadingOlder.
            return None;
        }
        let op = self.pagination.trigger_retry();
        self.finish_trigger(op)
    }

    /// Register a discontinuity detected by the store collaborator. The
    /// marker appears after `anchor` on the next pass.
    pub fn note_gap_anchor(&mut self, anchor: &StatusId) {
        self.gaps.ensure_machine(anchor);
        self.rebuild();
    }

    /// Begin filling the gap below `anchor`.
    pub fn trigger_gap_fetch(&mut self, anchor: &StatusId) -> Option<FetchCommand> {
        if !self.gaps.trigger_fetch(anchor) {
            return None;
        }
        self.rebuild();
        Some(FetchCommand::Gap {
            anchor: anchor.clone(),
            until: self.id_below(anchor),
        })
    }

    /// Mutate the attribute record for `id` (selection, reveal,
    /// expansion). Returns false for an identity this list never
    /// rendered.
    pub fn set_attribute(&mut self, id: &StatusId, mutate: impl FnOnce(&mut Attribute)) -> bool {
        let Some(record) = self.attributes.get(id) else {
            return false;
        };
        mutate(&mut record.borrow_mut());
        self.rebuild();
        true
    }

    /// Install or clear the precomputed suppression reason.
    pub fn set_suppression(&mut self, reason: Option<EmptyReason>) {
        self.suppression = reason;
        self.rebuild();
    }

    // -- collaborator callbacks ---------------------------------------------

    /// The store's set or order changed: re-query and reconcile.
    pub fn on_store_changed(&mut self) {
        self.refresh_sequence();
    }

    /// Deliver a completed fetch. The host persists the page before
    /// calling this; a store notification follows separately.
    pub fn apply_outcome(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Latest(result) => self.pagination.complete_latest(result),
            FetchOutcome::Older(result) => self.pagination.complete_older(result),
            FetchOutcome::Gap { anchor, result } => self.gaps.complete(&anchor, result),
        }
        self.rebuild();
    }

    // -- internals ----------------------------------------------------------

    fn finish_trigger(&mut self, op: Option<LoadOp>) -> Option<FetchCommand> {
        let command = match op? {
            LoadOp::Latest => FetchCommand::Latest,
            LoadOp::Older => FetchCommand::Older {
                // Guarded non-empty by the triggers above.
                before: self.sequence.last()?.clone(),
            },
        };
        self.rebuild();
        Some(command)
    }

    /// The next known id below `anchor`, bounding a gap fetch.
    fn id_below(&self, anchor: &StatusId) -> Option<StatusId> {
        let pos = self.sequence.iter().position(|id| id == anchor)?;
        self.sequence.get(pos + 1).cloned()
    }

    fn refresh_sequence(&mut self) {
        match self.store.ordered_ids() {
            Ok(ids) => {
                self.sequence = ids;
                self.rebuild();
            }
            Err(err) => {
                // Abort this pass only; the previous render stays up.
                tracing::error!(error = %err, "store read failed, keeping previous render");
            }
        }
    }

    fn rebuild(&mut self) {
        self.items = reconcile(
            &self.sequence,
            &mut self.attributes,
            self.pagination.state(),
            &self.gaps,
            self.suppression.as_ref(),
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
