//! Reference-shared per-item UI attribute records.
//!
//! Every identity appearing in a reconciled list owns exactly one
//! [`Attribute`] record for the life of the screen. Render items are
//! rebuilt wholesale on every reconciliation pass, but they all point at
//! the same record for a given identity, so in-flight UI state (selection,
//! content-warning reveal, expansion, cached layout height) survives list
//! membership and order changes.
//!
//! The engine runs on the single UI-owning thread, so records are shared
//! via `Rc<RefCell<_>>` — no locking. The reconciler only looks up or
//! creates records; mutation happens through user-interaction handlers.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::model::id::StatusId;

/// Content-warning reveal state for a status body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealState {
    /// Behind the content warning (the default for sensitive statuses).
    #[default]
    Concealed,
    /// Viewer has revealed the content.
    Revealed,
}

impl RevealState {
    /// The opposite state, for toggle handlers.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Concealed => Self::Revealed,
            Self::Revealed => Self::Concealed,
        }
    }
}

/// Long-content fold state for a status cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpansionState {
    #[default]
    Collapsed,
    Expanded,
}

/// Mutable per-item UI state, keyed by [`StatusId`] in the
/// [`AttributeStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attribute {
    /// Whether the cell is currently selected in the list view.
    pub is_selected: bool,
    /// Content-warning reveal state.
    pub reveal: RevealState,
    /// Long-content fold state.
    pub expansion: ExpansionState,
    /// Last measured cell height in rows, used to keep scroll position
    /// stable across re-renders. `None` until first measured.
    pub last_known_height: Option<u16>,
}

/// Shared handle to an [`Attribute`] record.
pub type SharedAttribute = Rc<RefCell<Attribute>>;

// ---------------------------------------------------------------------------
// AttributeStore
// ---------------------------------------------------------------------------

/// Owning map from identity to its single shared attribute record.
///
/// Invariant: exactly one record exists per live identity within one
/// store. Lookups during reconciliation must go through
/// [`AttributeStore::get_or_create`] — allocating a second record for a
/// known identity would silently drop in-flight UI state.
#[derive(Debug, Default)]
pub struct AttributeStore {
    records: HashMap<StatusId, SharedAttribute>,
}

impl AttributeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the record for `id`, creating a default-valued one on first
    /// appearance. The returned handle is pointer-identical across calls.
    pub fn get_or_create(&mut self, id: &StatusId) -> SharedAttribute {
        if let Some(existing) = self.records.get(id) {
            return Rc::clone(existing);
        }
        let fresh: SharedAttribute = Rc::new(RefCell::new(Attribute::default()));
        self.records.insert(id.clone(), Rc::clone(&fresh));
        fresh
    }

    /// Look up without creating.
    #[must_use]
    pub fn get(&self, id: &StatusId) -> Option<SharedAttribute> {
        self.records.get(id).map(Rc::clone)
    }

    /// Number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_returns_same_record() {
        let mut store = AttributeStore::new();
        let id = StatusId::new("1");

        let first = store.get_or_create(&id);
        first.borrow_mut().is_selected = true;

        let second = store.get_or_create(&id);
        assert!(Rc::ptr_eq(&first, &second));
        assert!(second.borrow().is_selected);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn distinct_ids_get_distinct_records() {
        let mut store = AttributeStore::new();
        let a = store.get_or_create(&StatusId::new("a"));
        let b = store.get_or_create(&StatusId::new("b"));
        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn get_does_not_create() {
        let store = AttributeStore::new();
        assert!(store.get(&StatusId::new("missing")).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn reveal_toggles_both_ways() {
        assert_eq!(RevealState::Concealed.toggled(), RevealState::Revealed);
        assert_eq!(RevealState::Revealed.toggled(), RevealState::Concealed);
    }

    #[test]
    fn default_attribute_is_collapsed_concealed() {
        let attr = Attribute::default();
        assert!(!attr.is_selected);
        assert_eq!(attr.reveal, RevealState::Concealed);
        assert_eq!(attr.expansion, ExpansionState::Collapsed);
        assert_eq!(attr.last_known_height, None);
    }
}
