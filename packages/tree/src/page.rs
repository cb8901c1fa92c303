//! # Page
//!
//! Root of the tree: ordered rows plus the entity settings side map.
//! Lookups are linear scans; pages hold tens of nodes.

use crate::ids::{GroupingId, NodeId};
use crate::node::{Grouping, Node, NodeContent, NodeKind, RowLayout, Variant};
use crate::visitor::{GroupingCollector, NodeCounter, ParentIndex, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Configuration payloads fetched from the backend, keyed by node id or by
/// pattern id. Node keys win.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitiesSettings {
    #[serde(default)]
    pub by_node: BTreeMap<NodeId, Value>,
    #[serde(default)]
    pub by_pattern: BTreeMap<String, Value>,
}

impl EntitiesSettings {
    pub fn lookup(&self, id: &NodeId, pattern_id: &str) -> Option<&Value> {
        self.by_node
            .get(id)
            .or_else(|| self.by_pattern.get(pattern_id))
    }

    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty() && self.by_pattern.is_empty()
    }
}

/// Position of a node inside its parent grouping
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub grouping: GroupingId,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub rows: Grouping,
    #[serde(default)]
    pub entities_settings: EntitiesSettings,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Node>) -> Self {
        let mut page = Self {
            rows: Grouping::with_entities(rows),
            entities_settings: EntitiesSettings::default(),
        };
        page.refresh_affordances();
        page
    }

    pub fn rows(&self) -> &[Node] {
        &self.rows.entities
    }

    pub fn find_by_identifier(&self, id: &NodeId) -> Option<&Node> {
        find_in(&self.rows, id)
    }

    pub fn find_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        find_in_mut(&mut self.rows, id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.find_by_identifier(id).is_some()
    }

    /// Parent grouping and index of a node
    pub fn locate(&self, id: &NodeId) -> Option<Location> {
        let mut index = ParentIndex::default();
        index.visit_page(self);
        index
            .entries
            .into_iter()
            .find(|(node_id, _, _)| node_id == id)
            .map(|(_, grouping, index)| Location { grouping, index })
    }

    pub fn grouping(&self, id: &GroupingId) -> Option<&Grouping> {
        match id.owner() {
            None => Some(&self.rows),
            Some(owner) => self.find_by_identifier(owner)?.own_grouping(id),
        }
    }

    pub fn grouping_mut(&mut self, id: &GroupingId) -> Option<&mut Grouping> {
        match id.owner().cloned() {
            None => Some(&mut self.rows),
            Some(owner) => self.find_mut(&owner)?.own_grouping_mut(id),
        }
    }

    /// Row a node belongs to (itself for rows)
    pub fn row_of(&self, id: &NodeId) -> Option<&Node> {
        let node = self.find_by_identifier(id)?;
        if node.kind == NodeKind::Row {
            return Some(node);
        }
        let location = self.locate(id)?;
        let owner = location.grouping.owner()?;
        self.row_of(owner)
    }

    /// Row owning a grouping, `None` for the rows container
    pub fn row_of_grouping(&self, id: &GroupingId) -> Option<&Node> {
        self.row_of(id.owner()?)
    }

    /// Every grouping in document order, rows container first
    pub fn groupings(&self) -> Vec<GroupingId> {
        let mut collector = GroupingCollector::default();
        collector.visit_page(self);
        collector.groupings
    }

    pub fn counts(&self) -> NodeCounter {
        let mut counter = NodeCounter::default();
        counter.visit_page(self);
        counter
    }

    pub fn node_count(&self) -> usize {
        self.counts().total()
    }

    /// `(node, parent grouping)` pairs, the parent-of relation of the tree
    pub fn parent_pairs(&self) -> Vec<(NodeId, GroupingId)> {
        let mut index = ParentIndex::default();
        index.visit_page(self);
        index
            .entries
            .into_iter()
            .map(|(id, grouping, _)| (id, grouping))
            .collect()
    }

    /// Recompute every grouping's affordance flag. Returns the groupings
    /// whose flag flipped, with the new visibility.
    pub fn refresh_affordances(&mut self) -> Vec<(GroupingId, bool)> {
        let mut flipped = Vec::new();
        if self.rows.refresh_initial_add() {
            flipped.push((GroupingId::Rows, self.rows.initial_add));
        }
        for row in &mut self.rows.entities {
            refresh_node(row, &mut flipped);
        }
        flipped
    }

    pub fn settings_for(&self, node: &Node) -> Option<&Value> {
        self.entities_settings.lookup(&node.id, &node.pattern_id)
    }

    /// Check every structural invariant of the tree
    pub fn validate(&self) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();

        let mut seen = HashSet::new();
        for (id, _) in self.parent_pairs() {
            if !seen.insert(id.clone()) {
                violations.push(InvariantViolation::DuplicateId(id));
            }
        }

        for grouping_id in self.groupings() {
            let Some(grouping) = self.grouping(&grouping_id) else {
                continue;
            };
            if grouping.initial_add != grouping.is_empty() {
                violations.push(InvariantViolation::StaleAffordance(grouping_id.clone()));
            }
            let row_variant = self.row_of_grouping(&grouping_id).map(|r| r.variant);
            for node in &grouping.entities {
                if node.kind != grouping_id.accepts() {
                    violations.push(InvariantViolation::MisplacedKind {
                        node: node.id.clone(),
                        grouping: grouping_id.clone(),
                    });
                }
                if node.is_fullscreen_only() && row_variant != Some(Variant::Full) {
                    violations.push(InvariantViolation::FullscreenOutsideFullRow(node.id.clone()));
                }
                validate_node(node, &mut violations);
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

pub fn find_by_identifier<'a>(page: &'a Page, id: &NodeId) -> Option<&'a Node> {
    page.find_by_identifier(id)
}

fn find_in<'a>(grouping: &'a Grouping, id: &NodeId) -> Option<&'a Node> {
    for node in &grouping.entities {
        if &node.id == id {
            return Some(node);
        }
        for (_, child) in node.groupings() {
            if let Some(found) = find_in(child, id) {
                return Some(found);
            }
        }
    }
    None
}

fn find_in_mut<'a>(grouping: &'a mut Grouping, id: &NodeId) -> Option<&'a mut Node> {
    for node in grouping.entities.iter_mut() {
        if &node.id == id {
            return Some(node);
        }
        for (_, child) in node.groupings_mut() {
            if let Some(found) = find_in_mut(child, id) {
                return Some(found);
            }
        }
    }
    None
}

fn refresh_node(node: &mut Node, flipped: &mut Vec<(GroupingId, bool)>) {
    for (id, grouping) in node.groupings_mut() {
        if grouping.refresh_initial_add() {
            flipped.push((id, grouping.initial_add));
        }
        for child in &mut grouping.entities {
            refresh_node(child, flipped);
        }
    }
}

fn validate_node(node: &Node, violations: &mut Vec<InvariantViolation>) {
    match &node.content {
        NodeContent::Row(layout) => {
            if node.kind != NodeKind::Row || layout.variant() != node.variant {
                violations.push(InvariantViolation::LayoutMismatch(node.id.clone()));
            }
            if let RowLayout::Special(slots) = layout {
                if !slots.is_exclusive() {
                    violations.push(InvariantViolation::SpecialSlotsOverlap(node.id.clone()));
                }
            }
        }
        NodeContent::Section { wrappers } => {
            if node.kind != NodeKind::Section {
                violations.push(InvariantViolation::LayoutMismatch(node.id.clone()));
            }
            if wrappers.is_empty() {
                violations.push(InvariantViolation::SectionWithoutWrapper(node.id.clone()));
            }
        }
        NodeContent::Block => {
            if node.kind != NodeKind::Block {
                violations.push(InvariantViolation::LayoutMismatch(node.id.clone()));
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    DuplicateId(NodeId),
    LayoutMismatch(NodeId),
    SectionWithoutWrapper(NodeId),
    SpecialSlotsOverlap(NodeId),
    MisplacedKind { node: NodeId, grouping: GroupingId },
    FullscreenOutsideFullRow(NodeId),
    StaleAffordance(GroupingId),
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::DuplicateId(id) => write!(f, "duplicate node id {}", id),
            InvariantViolation::LayoutMismatch(id) => {
                write!(f, "{} has a grouping shape that does not match its variant", id)
            }
            InvariantViolation::SectionWithoutWrapper(id) => {
                write!(f, "section {} has no blocks wrapper", id)
            }
            InvariantViolation::SpecialSlotsOverlap(id) => {
                write!(f, "special row {} holds both blocks and sections", id)
            }
            InvariantViolation::MisplacedKind { node, grouping } => {
                write!(f, "{} cannot live in {}", node, grouping)
            }
            InvariantViolation::FullscreenOutsideFullRow(id) => {
                write!(f, "fullscreen-only block {} is outside a full row", id)
            }
            InvariantViolation::StaleAffordance(grouping) => {
                write!(f, "initial-add flag of {} is stale", grouping)
            }
        }
    }
}
