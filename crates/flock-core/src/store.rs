//! The persisted-store boundary.
//!
//! Collaborators own the storage engine (the CLI keeps a rusqlite
//! projection). The engine consumes only an ordered identity sequence and
//! a change signal: whenever the underlying set or order changes, the
//! host calls back into the controller, which re-queries and reconciles.

use crate::error::StoreReadError;
use crate::model::id::StatusId;

/// Read side of the local status store, scoped to one list's filter.
///
/// The returned order is authoritative (reverse-chronological for
/// timelines); the engine preserves it exactly and never re-sorts.
pub trait StoreQuery {
    /// The current ordered identity sequence for this list.
    fn ordered_ids(&self) -> Result<Vec<StatusId>, StoreReadError>;
}

impl<F> StoreQuery for F
where
    F: Fn() -> Result<Vec<StatusId>, StoreReadError>,
{
    fn ordered_ids(&self) -> Result<Vec<StatusId>, StoreReadError> {
        self()
    }
}

impl<S: StoreQuery> StoreQuery for std::rc::Rc<S> {
    fn ordered_ids(&self) -> Result<Vec<StatusId>, StoreReadError> {
        S::ordered_ids(self)
    }
}
