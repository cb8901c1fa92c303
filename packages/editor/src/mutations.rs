//! # Page Mutations
//!
//! Structural operations on the page tree.
//!
//! ## Design Principles
//!
//! 1. **All or nothing**: a mutation is validated against the whole page
//!    before anything is touched
//! 2. **Shape preserving**: a grouping only ever receives the node kind its
//!    row variant allows
//! 3. **Identity preserving**: moves, renames and collapses keep node ids
//!
//! ## Mutation Semantics
//!
//! ### InsertNode
//! - Appends at the end of the grouping, or right after `after`
//! - Fails if any id of the inserted subtree already exists
//!
//! ### MoveNode
//! - `index` is the position in the destination once the node has left its
//!   source grouping; out of range indices append
//! - Fails if the destination lives inside the moved subtree
//!
//! ### RemoveNode
//! - Removes the node and all descendants, never its parent
//!
//! Every successful mutation leaves each grouping's `initial_add` flag in sync
//! with its emptiness.

use npb_tree::rebuild::NodeSettings;
use npb_tree::{
    default_label, subtree_ids, GroupingId, Node, NodeContent, NodeId, NodeKind, Page, RowLayout,
    Variant,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Insert an adopted node with the settings that came with its fragment
    InsertNode {
        grouping: GroupingId,
        after: Option<NodeId>,
        node: Node,
        #[serde(default)]
        settings: NodeSettings,
    },

    /// Remove a node and its subtree
    RemoveNode { node_id: NodeId },

    /// Move a node to `index` of a grouping
    MoveNode {
        node_id: NodeId,
        grouping: GroupingId,
        index: usize,
    },

    /// Set the friendly name. Blank labels commit the kind default.
    RenameNode { node_id: NodeId, label: String },

    /// Expand or collapse a node's headband
    SetExpanded { node_id: NodeId, expanded: bool },

    /// Drop node-keyed settings entries
    ClearSettings { node_ids: Vec<NodeId> },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Grouping not found: {0}")]
    GroupingNotFound(GroupingId),

    #[error("Node id already in use: {0}")]
    DuplicateId(NodeId),

    #[error("{grouping} does not accept a {kind}")]
    KindMismatch { kind: NodeKind, grouping: GroupingId },

    #[error("{anchor} is not a child of {grouping}")]
    AnchorNotInGrouping { anchor: NodeId, grouping: GroupingId },

    #[error("Fullscreen-only block {node} cannot go into {grouping}")]
    FullscreenOutsideFullRow { node: NodeId, grouping: GroupingId },

    #[error("Special row slot {0} conflicts with its non-empty sibling slot")]
    SpecialSlotsConflict(GroupingId),

    #[error("{0} has a grouping shape that does not match its kind")]
    LayoutMismatch(NodeId),

    #[error("Would create cycle")]
    CycleDetected,
}

impl Mutation {
    /// Node the mutation is about, if any
    pub fn node_id(&self) -> Option<&NodeId> {
        match self {
            Mutation::InsertNode { node, .. } => Some(&node.id),
            Mutation::RemoveNode { node_id }
            | Mutation::MoveNode { node_id, .. }
            | Mutation::RenameNode { node_id, .. }
            | Mutation::SetExpanded { node_id, .. } => Some(node_id),
            Mutation::ClearSettings { .. } => None,
        }
    }

    /// Apply mutation to the page with validation
    pub fn apply(&self, page: &mut Page) -> Result<(), MutationError> {
        self.validate(page)?;

        match self {
            Mutation::InsertNode {
                grouping,
                after,
                node,
                settings,
            } => {
                let target = grouping_mut(page, grouping)?;
                let index = match after {
                    Some(anchor) => target.position(anchor).map(|i| i + 1).unwrap_or(target.len()),
                    None => target.len(),
                };
                target.entities.insert(index, node.clone());
                page.entities_settings
                    .by_node
                    .extend(settings.iter().map(|(k, v)| (k.clone(), v.clone())));
            }

            Mutation::RemoveNode { node_id } => {
                take_node(page, node_id)?;
            }

            Mutation::MoveNode {
                node_id,
                grouping,
                index,
            } => {
                let mut node = take_node(page, node_id)?;
                if let Some(row) = page.row_of_grouping(grouping) {
                    let family = match row.variant {
                        Variant::Special => Variant::Special,
                        _ => Variant::Standard,
                    };
                    settle_family(&mut node, family);
                }
                let target = grouping_mut(page, grouping)?;
                let index = (*index).min(target.len());
                target.entities.insert(index, node);
            }

            Mutation::RenameNode { node_id, label } => {
                let node = page
                    .find_mut(node_id)
                    .ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;
                node.label = if label.trim().is_empty() {
                    default_label(node.kind, &node.pattern_id)
                } else {
                    label.clone()
                };
            }

            Mutation::SetExpanded { node_id, expanded } => {
                let node = page
                    .find_mut(node_id)
                    .ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;
                node.expanded = *expanded;
            }

            Mutation::ClearSettings { node_ids } => {
                for id in node_ids {
                    page.entities_settings.by_node.remove(id);
                }
            }
        }

        page.refresh_affordances();
        Ok(())
    }

    /// Validate without applying
    pub fn validate(&self, page: &Page) -> Result<(), MutationError> {
        match self {
            Mutation::InsertNode {
                grouping,
                after,
                node,
                ..
            } => {
                let target = page
                    .grouping(grouping)
                    .ok_or_else(|| MutationError::GroupingNotFound(grouping.clone()))?;

                if node.kind != grouping.accepts() {
                    return Err(MutationError::KindMismatch {
                        kind: node.kind,
                        grouping: grouping.clone(),
                    });
                }

                if let Some(anchor) = after {
                    if target.position(anchor).is_none() {
                        return Err(MutationError::AnchorNotInGrouping {
                            anchor: anchor.clone(),
                            grouping: grouping.clone(),
                        });
                    }
                }

                let ids = subtree_ids(node);
                for (i, id) in ids.iter().enumerate() {
                    if page.contains(id) || ids[..i].contains(id) {
                        return Err(MutationError::DuplicateId(id.clone()));
                    }
                }

                check_shape(node)?;
                check_placement(page, grouping, node)
            }

            Mutation::MoveNode {
                node_id, grouping, ..
            } => {
                let node = page
                    .find_by_identifier(node_id)
                    .ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;

                page.grouping(grouping)
                    .ok_or_else(|| MutationError::GroupingNotFound(grouping.clone()))?;

                if node.kind != grouping.accepts() {
                    return Err(MutationError::KindMismatch {
                        kind: node.kind,
                        grouping: grouping.clone(),
                    });
                }

                if let Some(owner) = grouping.owner() {
                    if subtree_ids(node).contains(owner) {
                        return Err(MutationError::CycleDetected);
                    }
                }

                check_placement(page, grouping, node)
            }

            Mutation::RemoveNode { node_id }
            | Mutation::RenameNode { node_id, .. }
            | Mutation::SetExpanded { node_id, .. } => {
                page.find_by_identifier(node_id)
                    .ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;
                Ok(())
            }

            Mutation::ClearSettings { .. } => Ok(()),
        }
    }
}

/// Placement rules that depend on where the node lands: fullscreen-only
/// blocks stay in full rows and a special row never fills both slots.
pub fn check_placement(page: &Page, grouping: &GroupingId, node: &Node) -> Result<(), MutationError> {
    let row_variant = if node.kind == NodeKind::Row {
        Some(node.variant)
    } else {
        page.row_of_grouping(grouping).map(|row| row.variant)
    };

    if row_variant != Some(Variant::Full) {
        if let Some(block) = first_fullscreen_block(node) {
            return Err(MutationError::FullscreenOutsideFullRow {
                node: block.id.clone(),
                grouping: grouping.clone(),
            });
        }
    }

    let sibling_slot = match grouping {
        GroupingId::SpecialBlocks { row } => Some(GroupingId::special_sections(row.clone())),
        GroupingId::SpecialSections { row } => Some(GroupingId::special_blocks(row.clone())),
        _ => None,
    };
    if let Some(sibling) = sibling_slot.and_then(|id| page.grouping(&id)) {
        if sibling.entities.iter().any(|n| n.id != node.id) {
            return Err(MutationError::SpecialSlotsConflict(grouping.clone()));
        }
    }

    Ok(())
}

fn first_fullscreen_block(node: &Node) -> Option<&Node> {
    if node.is_fullscreen_only() {
        return Some(node);
    }
    if node.kind == NodeKind::Row {
        // Rows are checked against their own variant by the caller
        return None;
    }
    node.groupings()
        .into_iter()
        .flat_map(|(_, g)| g.entities.iter())
        .find_map(first_fullscreen_block)
}

/// A freshly adopted node must already satisfy the grouping shape rules
fn check_shape(node: &Node) -> Result<(), MutationError> {
    let ok = match &node.content {
        NodeContent::Row(layout) => {
            node.kind == NodeKind::Row
                && layout.variant() == node.variant
                && match layout {
                    RowLayout::Special(slots) => slots.is_exclusive(),
                    _ => true,
                }
        }
        NodeContent::Section { wrappers } => node.kind == NodeKind::Section && !wrappers.is_empty(),
        NodeContent::Block => node.kind == NodeKind::Block,
    };
    if !ok {
        return Err(MutationError::LayoutMismatch(node.id.clone()));
    }

    for (grouping, child) in node.groupings() {
        for entity in &child.entities {
            if entity.kind != grouping.accepts() {
                return Err(MutationError::KindMismatch {
                    kind: entity.kind,
                    grouping: grouping.clone(),
                });
            }
            check_shape(entity)?;
        }
    }
    Ok(())
}

fn grouping_mut<'a>(
    page: &'a mut Page,
    id: &GroupingId,
) -> Result<&'a mut npb_tree::Grouping, MutationError> {
    page.grouping_mut(id)
        .ok_or_else(|| MutationError::GroupingNotFound(id.clone()))
}

/// Give a moved section or block subtree the family of its new row.
/// Fullscreen-only blocks keep `Full`.
fn settle_family(node: &mut Node, family: Variant) {
    if node.kind == NodeKind::Row || node.variant == Variant::Full {
        return;
    }
    node.variant = family;
    for (_, grouping) in node.groupings_mut() {
        for child in &mut grouping.entities {
            settle_family(child, family);
        }
    }
}

/// Detach a node from its parent grouping and return it
fn take_node(page: &mut Page, node_id: &NodeId) -> Result<Node, MutationError> {
    let location = page
        .locate(node_id)
        .ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;
    let parent = grouping_mut(page, &location.grouping)?;
    Ok(parent.entities.remove(location.index))
}
