//! Snapshot reconciler: the diff-preserving merge at the center of every
//! list screen.
//!
//! Input: the store's current ordered identity sequence, the list's
//! attribute store, the pagination state, the gap registry, and an
//! optional suppression reason. Output: the fresh ordered `RenderItem`
//! sequence for the render sink to diff against what it last applied.
//!
//! Attribute records are carried forward by identity — looked up or
//! created in the [`AttributeStore`], never re-allocated — so per-item UI
//! state survives even though every `RenderItem` is rebuilt. Store order
//! is authoritative and preserved exactly; the reconciler has no
//! comparator of its own.
//!
//! Reconciliation is idempotent over a stable snapshot: re-running it
//! with the same inputs yields an equal sequence with pointer-identical
//! attributes. Bursts of store notifications are the notifier's problem,
//! not ours.

use std::collections::HashSet;

use crate::gap::GapRegistry;
use crate::model::attribute::AttributeStore;
use crate::model::id::StatusId;
use crate::model::item::{EmptyReason, RenderItem};
use crate::pagination::PaginationState;

/// Produce the renderable sequence for one list.
///
/// - A suppressed empty list renders the empty-state header alone.
/// - A refresh over existing content gets a leading top loader.
/// - Each identity appears once (first occurrence wins — duplicates in
///   the source sequence should not happen and are defensively dropped).
/// - A registered, unresolved gap anchor is followed by its gap marker.
/// - Exactly one trailing sentinel communicates the pagination state.
#[must_use]
pub fn reconcile(
    ids: &[StatusId],
    attributes: &mut AttributeStore,
    pagination: PaginationState,
    gaps: &GapRegistry,
    suppression: Option<&EmptyReason>,
) -> Vec<RenderItem> {
    if ids.is_empty() {
        if let Some(reason) = suppression {
            return vec![RenderItem::EmptyState(reason.clone())];
        }
    }

    let mut items = Vec::with_capacity(ids.len() + 2);

    if pagination == PaginationState::LoadingLatest && !ids.is_empty() {
        items.push(RenderItem::TopLoader);
    }

    let mut seen: HashSet<&StatusId> = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id) {
            tracing::warn!(%id, "duplicate identity in store sequence, keeping first");
            continue;
        }
        let attribute = attributes.get_or_create(id);
        items.push(RenderItem::Content { id: id.clone(), attribute });

        if gaps.is_unresolved(id) {
            items.push(RenderItem::GapMarker { after: id.clone() });
        }
    }

    items.push(trailing_sentinel(pagination));
    items
}

/// The trailing sentinel for a pagination state.
const fn trailing_sentinel(state: PaginationState) -> RenderItem {
    match state {
        PaginationState::NoMore => RenderItem::NoMoreMarker,
        _ => RenderItem::BottomLoader(state),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::PageSummary;
    use proptest::prelude::*;
    use std::rc::Rc;

    fn ids(raw: &[&str]) -> Vec<StatusId> {
        raw.iter().map(|s| StatusId::new(*s)).collect()
    }

    fn content_ids(items: &[RenderItem]) -> Vec<String> {
        items
            .iter()
            .filter(|item| item.is_content())
            .filter_map(|item| item.id().map(ToString::to_string))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Ordering and sentinels
    // -----------------------------------------------------------------------

    #[test]
    fn store_order_is_preserved_with_idle_sentinel() {
        let mut attrs = AttributeStore::new();
        let gaps = GapRegistry::new();
        let items = reconcile(
            &ids(&["a", "b", "c"]),
            &mut attrs,
            PaginationState::Idle,
            &gaps,
            None,
        );

        assert_eq!(content_ids(&items), ["a", "b", "c"]);
        assert_eq!(items.len(), 4);
        assert_eq!(items[3], RenderItem::BottomLoader(PaginationState::Idle));
    }

    #[test]
    fn every_state_yields_exactly_one_trailing_sentinel() {
        for state in PaginationState::ALL {
            let mut attrs = AttributeStore::new();
            let gaps = GapRegistry::new();
            let items = reconcile(&ids(&["a", "b"]), &mut attrs, state, &gaps, None);

            let sentinels = items
                .iter()
                .filter(|item| item.is_trailing_sentinel())
                .count();
            assert_eq!(sentinels, 1, "state {state}");

            // The sentinel is last: no content after it.
            assert!(items.last().is_some_and(RenderItem::is_trailing_sentinel));
            match state {
                PaginationState::NoMore => assert_eq!(items.last(), Some(&RenderItem::NoMoreMarker)),
                other => assert_eq!(items.last(), Some(&RenderItem::BottomLoader(other))),
            }
        }
    }

    #[test]
    fn refresh_over_content_shows_top_loader() {
        let mut attrs = AttributeStore::new();
        let gaps = GapRegistry::new();
        let items = reconcile(
            &ids(&["a"]),
            &mut attrs,
            PaginationState::LoadingLatest,
            &gaps,
            None,
        );
        assert_eq!(items[0], RenderItem::TopLoader);

        // But not over an empty list (first load draws the bottom loader
        // only).
        let items = reconcile(&[], &mut attrs, PaginationState::LoadingLatest, &gaps, None);
        assert_eq!(
            items,
            [RenderItem::BottomLoader(PaginationState::LoadingLatest)]
        );
    }

    // -----------------------------------------------------------------------
    // Attribute carry-forward
    // -----------------------------------------------------------------------

    #[test]
    fn attributes_are_pointer_stable_across_passes() {
        let mut attrs = AttributeStore::new();
        let gaps = GapRegistry::new();

        let first = reconcile(
            &ids(&["a", "b", "c"]),
            &mut attrs,
            PaginationState::Idle,
            &gaps,
            None,
        );
        // Order change + new member: survivors keep their records.
        let second = reconcile(
            &ids(&["c", "a", "d"]),
            &mut attrs,
            PaginationState::Idle,
            &gaps,
            None,
        );

        let find = |items: &[RenderItem], wanted: &str| {
            items.iter().find_map(|item| match item {
                RenderItem::Content { id, attribute } if id.as_str() == wanted => {
                    Some(Rc::clone(attribute))
                }
                _ => None,
            })
        };

        for survivor in ["a", "c"] {
            let before = find(&first, survivor).unwrap();
            let after = find(&second, survivor).unwrap();
            assert!(Rc::ptr_eq(&before, &after), "attribute for {survivor} was rebuilt");
        }
        assert!(find(&second, "d").is_some());
    }

    #[test]
    fn example_scenario_older_page_then_no_more() {
        let mut attrs = AttributeStore::new();
        let gaps = GapRegistry::new();

        let first = reconcile(
            &ids(&["A", "B", "C"]),
            &mut attrs,
            PaginationState::Idle,
            &gaps,
            None,
        );
        assert_eq!(content_ids(&first), ["A", "B", "C"]);
        assert_eq!(first.last(), Some(&RenderItem::BottomLoader(PaginationState::Idle)));

        let second = reconcile(
            &ids(&["A", "B", "C", "D"]),
            &mut attrs,
            PaginationState::NoMore,
            &gaps,
            None,
        );
        assert_eq!(content_ids(&second), ["A", "B", "C", "D"]);
        assert_eq!(second.last(), Some(&RenderItem::NoMoreMarker));

        // A, B, C keep the identical records.
        for (a, b) in first.iter().zip(second.iter()).take(3) {
            let (RenderItem::Content { attribute: before, .. },
                 RenderItem::Content { attribute: after, .. }) = (a, b)
            else {
                panic!("expected content items");
            };
            assert!(Rc::ptr_eq(before, after));
        }
    }

    // -----------------------------------------------------------------------
    // Gaps
    // -----------------------------------------------------------------------

    #[test]
    fn unresolved_anchor_gets_marker_after_it() {
        let mut attrs = AttributeStore::new();
        let mut gaps = GapRegistry::new();
        gaps.ensure_machine(&StatusId::new("b"));

        let items = reconcile(
            &ids(&["a", "b", "c"]),
            &mut attrs,
            PaginationState::Idle,
            &gaps,
            None,
        );
        assert_eq!(items[2], RenderItem::GapMarker { after: StatusId::new("b") });
        assert_eq!(content_ids(&items), ["a", "b", "c"]);
    }

    #[test]
    fn resolved_anchor_renders_no_marker() {
        let mut attrs = AttributeStore::new();
        let mut gaps = GapRegistry::new();
        let anchor = StatusId::new("b");
        gaps.ensure_machine(&anchor);
        gaps.trigger_fetch(&anchor);
        gaps.complete(&anchor, Ok(PageSummary { is_empty: false, has_more: true }));

        let items = reconcile(
            &ids(&["a", "b", "c"]),
            &mut attrs,
            PaginationState::Idle,
            &gaps,
            None,
        );
        assert!(!items.iter().any(|item| matches!(item, RenderItem::GapMarker { .. })));
    }

    // -----------------------------------------------------------------------
    // Suppression and duplicates
    // -----------------------------------------------------------------------

    #[test]
    fn suppressed_empty_list_renders_header_alone() {
        let mut attrs = AttributeStore::new();
        let gaps = GapRegistry::new();
        let reason = EmptyReason::Blocked { name: Some("eve".into()) };

        let items = reconcile(&[], &mut attrs, PaginationState::Idle, &gaps, Some(&reason));
        assert_eq!(items, [RenderItem::EmptyState(reason)]);
    }

    #[test]
    fn suppression_is_ignored_when_content_exists() {
        // The relationship flags can only suppress an empty list; stored
        // content keeps rendering until the store drops it.
        let mut attrs = AttributeStore::new();
        let gaps = GapRegistry::new();
        let reason = EmptyReason::Blocking { name: None };

        let items = reconcile(
            &ids(&["a"]),
            &mut attrs,
            PaginationState::Idle,
            &gaps,
            Some(&reason),
        );
        assert_eq!(content_ids(&items), ["a"]);
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let mut attrs = AttributeStore::new();
        let gaps = GapRegistry::new();
        let items = reconcile(
            &ids(&["a", "b", "a", "c", "b"]),
            &mut attrs,
            PaginationState::Idle,
            &gaps,
            None,
        );
        assert_eq!(content_ids(&items), ["a", "b", "c"]);
        assert_eq!(attrs.len(), 3);
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    proptest! {
        /// Re-running reconciliation over the same snapshot is idempotent
        /// and never grows the attribute store.
        #[test]
        fn reconcile_is_idempotent(raw in proptest::collection::vec("[a-f]{1,3}", 0..20)) {
            let sequence: Vec<StatusId> = raw.iter().map(StatusId::new).collect();
            let mut attrs = AttributeStore::new();
            let gaps = GapRegistry::new();

            let first = reconcile(&sequence, &mut attrs, PaginationState::Idle, &gaps, None);
            let len_after_first = attrs.len();
            let second = reconcile(&sequence, &mut attrs, PaginationState::Idle, &gaps, None);

            prop_assert_eq!(&first, &second);
            prop_assert_eq!(attrs.len(), len_after_first);

            // Content count equals distinct id count.
            let distinct: HashSet<&StatusId> = sequence.iter().collect();
            let contents = first.iter().filter(|item| item.is_content()).count();
            prop_assert_eq!(contents, distinct.len());
        }
    }
}
