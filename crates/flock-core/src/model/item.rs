//! Renderable list items.
//!
//! A reconciliation pass produces a fresh ordered `Vec<RenderItem>`; the
//! values are immutable once built. The render sink diffs the new sequence
//! against the one it last applied, so `PartialEq` here defines visual
//! equality: content items compare by identity plus the attribute
//! sub-fields that affect drawing, markers compare by kind and payload.

use std::fmt;

use crate::model::attribute::SharedAttribute;
use crate::model::id::StatusId;
use crate::pagination::PaginationState;

/// Reason a timeline renders an empty-state header instead of content.
///
/// Precomputed by the relationship collaborator (the profile scene knows
/// whether the viewer blocks, is blocked by, or is looking at a suspended
/// account); the engine only renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyReason {
    /// The viewer blocks the list owner.
    Blocking { name: Option<String> },
    /// The list owner blocks the viewer.
    Blocked { name: Option<String> },
    /// The list owner's account is suspended.
    Suspended { name: Option<String> },
}

impl EmptyReason {
    /// User-facing message for the empty-state header.
    #[must_use]
    pub fn message(&self) -> String {
        let fallback = "this user";
        match self {
            Self::Blocking { name } => {
                format!("You blocked {}", name.as_deref().unwrap_or(fallback))
            }
            Self::Blocked { name } => format!(
                "{} blocked you",
                name.as_deref().unwrap_or("This user")
            ),
            Self::Suspended { name } => format!(
                "{} is suspended",
                name.as_deref().unwrap_or("This account")
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// RenderItem
// ---------------------------------------------------------------------------

/// One entry in the renderable sequence.
#[derive(Debug, Clone)]
pub enum RenderItem {
    /// A status cell. The attribute record is shared with the
    /// `AttributeStore`, not copied.
    Content {
        id: StatusId,
        attribute: SharedAttribute,
    },
    /// Discontinuity marker rendered immediately after its anchor.
    GapMarker { after: StatusId },
    /// Leading spinner while a refresh is in flight over existing content.
    TopLoader,
    /// Trailing sentinel carrying the pagination state it was derived
    /// from, so the sink can draw a spinner, retry affordance, or idle
    /// hint.
    BottomLoader(PaginationState),
    /// Trailing sentinel once the server signalled no more older data.
    NoMoreMarker,
    /// Replaces the content run when the list is suppressed.
    EmptyState(EmptyReason),
}

impl RenderItem {
    /// The identity this item renders, for content and gap markers.
    #[must_use]
    pub const fn id(&self) -> Option<&StatusId> {
        match self {
            Self::Content { id, .. } => Some(id),
            Self::GapMarker { after } => Some(after),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_content(&self) -> bool {
        matches!(self, Self::Content { .. })
    }

    /// True for the trailing sentinels that communicate list-level
    /// status: bottom loader, no-more marker, empty state.
    #[must_use]
    pub const fn is_trailing_sentinel(&self) -> bool {
        matches!(
            self,
            Self::BottomLoader(_) | Self::NoMoreMarker | Self::EmptyState(_)
        )
    }
}

impl PartialEq for RenderItem {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Content { id: a, attribute: attr_a },
                Self::Content { id: b, attribute: attr_b },
            ) => {
                if a != b {
                    return false;
                }
                // Layout-height caching is invisible; only draw-relevant
                // sub-fields participate in diff equality.
                let (attr_a, attr_b) = (attr_a.borrow(), attr_b.borrow());
                attr_a.is_selected == attr_b.is_selected
                    && attr_a.reveal == attr_b.reveal
                    && attr_a.expansion == attr_b.expansion
            }
            (Self::GapMarker { after: a }, Self::GapMarker { after: b }) => a == b,
            (Self::TopLoader, Self::TopLoader) | (Self::NoMoreMarker, Self::NoMoreMarker) => true,
            (Self::BottomLoader(a), Self::BottomLoader(b)) => a == b,
            (Self::EmptyState(a), Self::EmptyState(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for RenderItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content { id, .. } => write!(f, "content({id})"),
            Self::GapMarker { after } => write!(f, "gap(after {after})"),
            Self::TopLoader => f.write_str("top-loader"),
            Self::BottomLoader(state) => write!(f, "bottom-loader({state})"),
            Self::NoMoreMarker => f.write_str("no-more"),
            Self::EmptyState(reason) => write!(f, "empty({})", reason.message()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
