//! # View reconciliation
//!
//! Keyed diff of two page snapshots into [`ViewPatch`] messages, the only
//! channel through which the model talks to the rendered view.
//!
//! Patch order: removals, then inserts and moves grouping by grouping in
//! document order, then label/expanded updates, then affordance toggles.
//! Inside a grouping, anchors always name a sibling that a previous patch
//! already put in place.

use npb_tree::render::node_to_markup;
use npb_tree::visitor::ParentIndex;
use npb_tree::{GroupingId, NodeId, Page, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Where a node goes inside its grouping container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Start,
    After(NodeId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum ViewPatch {
    InsertFragment {
        grouping: GroupingId,
        anchor: Anchor,
        node_id: NodeId,
        html: String,
    },
    RemoveNode {
        node_id: NodeId,
    },
    MoveNode {
        node_id: NodeId,
        grouping: GroupingId,
        anchor: Anchor,
    },
    SetLabel {
        node_id: NodeId,
        label: String,
    },
    SetExpanded {
        node_id: NodeId,
        expanded: bool,
    },
    /// Show or hide the initial-add affordance of a grouping
    SetInitialAdd {
        grouping: GroupingId,
        visible: bool,
    },
    /// Put a dragged node back where the gesture started
    RestorePosition {
        node_id: NodeId,
        grouping: GroupingId,
        index: usize,
    },
}

// Diff two pages and generate patches. Inserted nodes are rendered back from
// the model.
pub fn diff_pages(old: &Page, new: &Page) -> Vec<ViewPatch> {
    diff_pages_with(old, new, &BTreeMap::new())
}

/// Like [`diff_pages`], using renderer markup for inserted nodes when known
pub fn diff_pages_with(old: &Page, new: &Page, fragments: &BTreeMap<NodeId, String>) -> Vec<ViewPatch> {
    let old_parents = parent_map(old);
    let new_parents = parent_map(new);
    let mut patches = Vec::new();

    // Removals, top-most only
    for (id, grouping) in ordered_parents(old) {
        if new_parents.contains_key(&id) {
            continue;
        }
        let owner_survives = grouping
            .owner()
            .map(|owner| new_parents.contains_key(owner))
            .unwrap_or(true);
        if owner_survives {
            patches.push(ViewPatch::RemoveNode { node_id: id });
        }
    }

    // Inserts and moves
    for grouping_id in new.groupings() {
        if let Some(owner) = grouping_id.owner() {
            if !old_parents.contains_key(owner) {
                // Rendered as part of the owner's fragment
                continue;
            }
        }
        let Some(grouping) = new.grouping(&grouping_id) else {
            continue;
        };

        let stable = stable_children(old, &grouping_id, grouping.entities.iter().map(|n| &n.id));
        let mut anchor = Anchor::Start;

        for node in &grouping.entities {
            match old_parents.get(&node.id) {
                None => patches.push(ViewPatch::InsertFragment {
                    grouping: grouping_id.clone(),
                    anchor: anchor.clone(),
                    node_id: node.id.clone(),
                    html: fragments
                        .get(&node.id)
                        .cloned()
                        .unwrap_or_else(|| node_to_markup(new, node).to_html()),
                }),
                Some(_) if !stable.contains(&node.id) => patches.push(ViewPatch::MoveNode {
                    node_id: node.id.clone(),
                    grouping: grouping_id.clone(),
                    anchor: anchor.clone(),
                }),
                Some(_) => {}
            }
            anchor = Anchor::After(node.id.clone());
        }
    }

    // Attribute updates on surviving nodes
    for (id, _) in ordered_parents(new) {
        let (Some(before), Some(after)) = (old.find_by_identifier(&id), new.find_by_identifier(&id)) else {
            continue;
        };
        if before.label != after.label {
            patches.push(ViewPatch::SetLabel {
                node_id: id.clone(),
                label: after.label.clone(),
            });
        }
        if before.expanded != after.expanded {
            patches.push(ViewPatch::SetExpanded {
                node_id: id,
                expanded: after.expanded,
            });
        }
    }

    // Affordances
    for grouping_id in new.groupings() {
        let (Some(before), Some(after)) = (old.grouping(&grouping_id), new.grouping(&grouping_id)) else {
            continue;
        };
        if before.initial_add != after.initial_add {
            patches.push(ViewPatch::SetInitialAdd {
                grouping: grouping_id,
                visible: after.initial_add,
            });
        }
    }

    patches
}

fn ordered_parents(page: &Page) -> Vec<(NodeId, GroupingId)> {
    page.parent_pairs()
}

fn parent_map(page: &Page) -> HashMap<NodeId, (GroupingId, usize)> {
    let mut index = ParentIndex::default();
    index.visit_page(page);
    index
        .entries
        .into_iter()
        .map(|(id, grouping, i)| (id, (grouping, i)))
        .collect()
}

/// Children that were already in this grouping and keep their relative
/// order: the longest increasing run of their old positions.
fn stable_children<'a>(
    old: &Page,
    grouping: &GroupingId,
    new_order: impl Iterator<Item = &'a NodeId>,
) -> HashSet<NodeId> {
    let Some(before) = old.grouping(grouping) else {
        return HashSet::new();
    };

    let kept: Vec<(&NodeId, usize)> = new_order
        .filter_map(|id| before.position(id).map(|i| (id, i)))
        .collect();
    let positions: Vec<usize> = kept.iter().map(|(_, i)| *i).collect();

    longest_increasing(&positions)
        .into_iter()
        .map(|k| kept[k].0.clone())
        .collect()
}

/// Indices of one longest strictly increasing subsequence
fn longest_increasing(seq: &[usize]) -> Vec<usize> {
    // tails[l] = index in seq of the smallest tail of an increasing run of length l + 1
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; seq.len()];

    for (i, value) in seq.iter().enumerate() {
        let len = tails.partition_point(|&t| seq[t] < *value);
        if len > 0 {
            prev[i] = Some(tails[len - 1]);
        }
        if len == tails.len() {
            tails.push(i);
        } else {
            tails[len] = i;
        }
    }

    let mut out = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        out.push(i);
        cursor = prev[i];
    }
    out.reverse();
    out
}
