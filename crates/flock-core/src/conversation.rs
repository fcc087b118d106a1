//! Conversation tree builder for the thread view.
//!
//! The context endpoint returns a flat batch of related statuses. From it
//! and a focal status we rebuild two structures:
//!
//! - the **ancestor chain**, walked upward through `in_reply_to`
//!   references and emitted root-first. The walk truncates silently at
//!   the first reference the batch cannot resolve — not an error, the
//!   ancestor beyond that point simply was not fetched;
//! - the **descendant tree**, every batch item replying to the focal
//!   status and, recursively, to each node. Children are ordered newest
//!   first and each node carries its server-reported reply count.
//!
//! Rendering is deliberately narrow: a collapsed node with children shows
//! a single "show replies" marker; an expanded node descends into its
//! first child only. One visible branch per level keeps a wide reply tree
//! from exploding the list.
//!
//! Every new batch triggers a wholesale rebuild. Expansion flags are the
//! only carried-forward state, looked up by identity against the previous
//! tree — the same discipline the attribute store uses for list screens.

use std::collections::{HashMap, HashSet};

use crate::model::attribute::{AttributeStore, SharedAttribute};
use crate::model::id::StatusId;
use crate::model::status::Status;

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// One link of the upward chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorNode {
    pub id: StatusId,
    /// The next reference upward, unresolved or not.
    pub parent: Option<StatusId>,
}

/// One node of the downward reply tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescendantNode {
    pub id: StatusId,
    /// Server-reported reply count (may exceed `children.len()` when the
    /// batch is partial).
    pub replies_count: u32,
    /// Direct replies, newest first.
    pub children: Vec<DescendantNode>,
    /// Collapsed by default; toggled by the viewer and carried forward
    /// across rebuilds.
    pub is_expanded: bool,
}

/// One row of the rendered thread.
#[derive(Debug, Clone, PartialEq)]
pub enum ThreadItem {
    Ancestor { id: StatusId, attribute: SharedAttribute },
    Focal { id: StatusId, attribute: SharedAttribute },
    Reply { id: StatusId, attribute: SharedAttribute },
    /// Expansion affordance standing in for a collapsed node's replies.
    ShowReplies { parent: StatusId },
}

// ---------------------------------------------------------------------------
// ConversationTree
// ---------------------------------------------------------------------------

/// The rebuilt-per-fetch thread structure for one focal status.
#[derive(Debug)]
pub struct ConversationTree {
    focal: StatusId,
    ancestors: Vec<AncestorNode>,
    descendants: Vec<DescendantNode>,
}

impl ConversationTree {
    /// Rebuild both structures from a fresh batch, carrying expansion
    /// flags forward from `previous` by identity.
    #[must_use]
    pub fn build(focal: &Status, batch: &[Status], previous: Option<&Self>) -> Self {
        let expanded = previous.map_or_else(HashSet::new, Self::expanded_ids);
        let mut tree = Self {
            focal: focal.id.clone(),
            ancestors: ancestor_chain(focal, batch),
            descendants: descendant_tree(&focal.id, batch),
        };
        if !expanded.is_empty() {
            for node in &mut tree.descendants {
                restore_expansion(node, &expanded);
            }
        }
        tree
    }

    #[must_use]
    pub const fn focal(&self) -> &StatusId {
        &self.focal
    }

    /// Upward chain, root-first.
    #[must_use]
    pub fn ancestors(&self) -> &[AncestorNode] {
        &self.ancestors
    }

    /// First-tier replies, newest first.
    #[must_use]
    pub fn descendants(&self) -> &[DescendantNode] {
        &self.descendants
    }

    /// Flip the expansion flag on the node with `id`. Returns false when
    /// no such node exists in the current tree.
    pub fn toggle_expansion(&mut self, id: &StatusId) -> bool {
        fn toggle(nodes: &mut [DescendantNode], id: &StatusId) -> bool {
            for node in nodes {
                if &node.id == id {
                    node.is_expanded = !node.is_expanded;
                    return true;
                }
                if toggle(&mut node.children, id) {
                    return true;
                }
            }
            false
        }
        toggle(&mut self.descendants, id)
    }

    /// Render the whole thread: ancestors root-first, the focal status,
    /// then the descendant rows under the single-branch policy.
    pub fn render(&self, attributes: &mut AttributeStore) -> Vec<ThreadItem> {
        let mut items = Vec::new();
        for ancestor in &self.ancestors {
            items.push(ThreadItem::Ancestor {
                id: ancestor.id.clone(),
                attribute: attributes.get_or_create(&ancestor.id),
            });
        }
        items.push(ThreadItem::Focal {
            id: self.focal.clone(),
            attribute: attributes.get_or_create(&self.focal),
        });
        for node in &self.descendants {
            render_branch(node, attributes, &mut items);
        }
        items
    }

    /// Identities of every expanded node, for carry-forward.
    fn expanded_ids(&self) -> HashSet<StatusId> {
        fn collect(nodes: &[DescendantNode], out: &mut HashSet<StatusId>) {
            for node in nodes {
                if node.is_expanded {
                    out.insert(node.id.clone());
                }
                collect(&node.children, out);
            }
        }
        let mut out = HashSet::new();
        collect(&self.descendants, &mut out);
        out
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Walk the `in_reply_to` chain upward from `focal` through the batch,
/// truncating at the first unresolvable reference. Root-first output.
fn ancestor_chain(focal: &Status, batch: &[Status]) -> Vec<AncestorNode> {
    let by_id: HashMap<&StatusId, &Status> = batch.iter().map(|s| (&s.id, s)).collect();

    let mut nodes = Vec::new();
    let mut next = focal.in_reply_to.as_ref();
    while let Some(id) = next {
        let Some(status) = by_id.get(id) else {
            break;
        };
        nodes.push(AncestorNode {
            id: status.id.clone(),
            parent: status.in_reply_to.clone(),
        });
        next = status.in_reply_to.as_ref();
        // Malformed data could loop the chain back onto itself.
        if nodes.len() > batch.len() {
            tracing::warn!(focal = %focal.id, "reply chain cycle detected, truncating");
            break;
        }
    }
    nodes.reverse();
    nodes
}

/// Build the descendant tree under `focal_id` from the flat batch.
fn descendant_tree(focal_id: &StatusId, batch: &[Status]) -> Vec<DescendantNode> {
    let mut children_of: HashMap<&StatusId, Vec<&Status>> = HashMap::new();
    for status in batch {
        if let Some(parent) = &status.in_reply_to {
            children_of.entry(parent).or_default().push(status);
        }
    }
    // Newest reply first at every level; id breaks created_at ties so
    // rebuilds are deterministic.
    for replies in children_of.values_mut() {
        replies.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
    }

    let mut visited = HashSet::new();
    visited.insert(focal_id.clone());
    build_nodes(focal_id, &children_of, &mut visited)
}

fn build_nodes(
    parent: &StatusId,
    children_of: &HashMap<&StatusId, Vec<&Status>>,
    visited: &mut HashSet<StatusId>,
) -> Vec<DescendantNode> {
    let Some(replies) = children_of.get(parent) else {
        return Vec::new();
    };
    let mut nodes = Vec::with_capacity(replies.len());
    for reply in replies {
        // Skip malformed cycles rather than recursing forever.
        if !visited.insert(reply.id.clone()) {
            tracing::warn!(id = %reply.id, "reply cycle detected, skipping");
            continue;
        }
        nodes.push(DescendantNode {
            id: reply.id.clone(),
            replies_count: reply.replies_count,
            children: build_nodes(&reply.id, children_of, visited),
            is_expanded: false,
        });
    }
    nodes
}

fn restore_expansion(node: &mut DescendantNode, expanded: &HashSet<StatusId>) {
    if expanded.contains(&node.id) {
        node.is_expanded = true;
    }
    for child in &mut node.children {
        restore_expansion(child, expanded);
    }
}

/// Render one top-level branch: the node itself, then either its first
/// child (expanded) or a show-replies marker (collapsed). Never more than
/// one child per level.
fn render_branch(node: &DescendantNode, attributes: &mut AttributeStore, out: &mut Vec<ThreadItem>) {
    out.push(ThreadItem::Reply {
        id: node.id.clone(),
        attribute: attributes.get_or_create(&node.id),
    });
    if let Some(first_child) = node.children.first() {
        if node.is_expanded {
            render_branch(first_child, attributes, out);
        } else {
            out.push(ThreadItem::ShowReplies { parent: node.id.clone() });
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
