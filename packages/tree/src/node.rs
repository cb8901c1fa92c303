//! # Page tree nodes
//!
//! ```text
//! Page
//!  └─ rows: Grouping<Row>
//!      ├─ Row (full)      → Grouping<Block>
//!      ├─ Row (special)   → SpecialSlots { blocks?, sections? }
//!      └─ Row (standard)  → Grouping<Section>
//!                             └─ Section → [Grouping<Block>, ...]
//! ```
//!
//! Groupings are typed slots, not nodes. Which node kind a grouping accepts is
//! decided by its [`GroupingId`].

use crate::ids::{GroupingId, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved row pattern for fullscreen rows
pub const FULL_PATTERN: &str = "full";

/// Prefix marking special row patterns
pub const SPECIAL_PREFIX: &str = "special-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Row,
    Section,
    Block,
}

impl NodeKind {
    pub const ALL: [NodeKind; 3] = [NodeKind::Row, NodeKind::Section, NodeKind::Block];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Row => "row",
            NodeKind::Section => "section",
            NodeKind::Block => "block",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "row" => Some(NodeKind::Row),
            "section" => Some(NodeKind::Section),
            "block" => Some(NodeKind::Block),
            _ => None,
        }
    }

    /// Marker class carried by rendered elements of this kind
    pub fn marker_class(&self) -> &'static str {
        match self {
            NodeKind::Row => "npb-row",
            NodeKind::Section => "npb-section",
            NodeKind::Block => "npb-block",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural sub-type of a node.
///
/// Rows derive it from their pattern id. Sections are `Special` inside special
/// rows. For blocks, `Full` means fullscreen-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Standard,
    Special,
    Full,
}

impl Variant {
    /// Row variant for a pattern id. Unknown patterns fall back to `Standard`.
    pub fn for_row_pattern(pattern_id: &str) -> Self {
        if pattern_id == FULL_PATTERN {
            Variant::Full
        } else if pattern_id.starts_with(SPECIAL_PREFIX) {
            Variant::Special
        } else {
            Variant::Standard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Standard => "standard",
            Variant::Special => "special",
            Variant::Full => "full",
        }
    }

}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `type` parameter of section and block fragment requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Standard,
    Special,
}

impl SectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Standard => "standard",
            SectionType::Special => "special",
        }
    }

    pub fn variant(&self) -> Variant {
        match self {
            SectionType::Standard => Variant::Standard,
            SectionType::Special => Variant::Special,
        }
    }
}

/// Ordered child slot. `initial_add` mirrors emptiness and drives the
/// "initial add" affordance of the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grouping {
    pub entities: Vec<Node>,
    pub initial_add: bool,
}

impl Grouping {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            initial_add: true,
        }
    }

    pub fn with_entities(entities: Vec<Node>) -> Self {
        let initial_add = entities.is_empty();
        Self {
            entities,
            initial_add,
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn position(&self, id: &NodeId) -> Option<usize> {
        self.entities.iter().position(|n| &n.id == id)
    }

    /// Recompute the affordance flag, returns true when it flipped
    pub fn refresh_initial_add(&mut self) -> bool {
        let visible = self.entities.is_empty();
        let changed = visible != self.initial_add;
        self.initial_add = visible;
        changed
    }
}

impl Default for Grouping {
    fn default() -> Self {
        Self::new()
    }
}

/// Slots of a special row. At most one of the two lists is non-empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpecialSlots {
    pub blocks: Option<Grouping>,
    pub sections: Option<Grouping>,
}

impl SpecialSlots {
    /// Both lists holding entities at the same time breaks the row
    pub fn is_exclusive(&self) -> bool {
        let blocks = self.blocks.as_ref().map(|g| !g.is_empty()).unwrap_or(false);
        let sections = self.sections.as_ref().map(|g| !g.is_empty()).unwrap_or(false);
        !(blocks && sections)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "lowercase")]
pub enum RowLayout {
    Full { blocks: Grouping },
    Special(SpecialSlots),
    Standard { sections: Grouping },
}

impl RowLayout {
    /// Empty layout matching a row variant
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Full => RowLayout::Full {
                blocks: Grouping::new(),
            },
            Variant::Special => RowLayout::Special(SpecialSlots {
                blocks: None,
                sections: Some(Grouping::new()),
            }),
            Variant::Standard => RowLayout::Standard {
                sections: Grouping::new(),
            },
        }
    }

    pub fn variant(&self) -> Variant {
        match self {
            RowLayout::Full { .. } => Variant::Full,
            RowLayout::Special(_) => Variant::Special,
            RowLayout::Standard { .. } => Variant::Standard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "content", rename_all = "lowercase")]
pub enum NodeContent {
    Row(RowLayout),
    Section { wrappers: Vec<Grouping> },
    Block,
}

/// Universal unit of the page tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub pattern_id: String,
    pub variant: Variant,
    /// User-editable friendly name
    pub label: String,
    pub expanded: bool,
    pub content: NodeContent,
}

impl Node {
    pub fn row(id: impl Into<NodeId>, pattern_id: impl Into<String>) -> Self {
        let pattern_id = pattern_id.into();
        let variant = Variant::for_row_pattern(&pattern_id);
        Self {
            id: id.into(),
            kind: NodeKind::Row,
            pattern_id,
            variant,
            label: NodeKind::Row.as_str().to_string(),
            expanded: true,
            content: NodeContent::Row(RowLayout::for_variant(variant)),
        }
    }

    /// Section with a single empty blocks wrapper
    pub fn section(
        id: impl Into<NodeId>,
        pattern_id: impl Into<String>,
        section_type: SectionType,
    ) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Section,
            pattern_id: pattern_id.into(),
            variant: section_type.variant(),
            label: NodeKind::Section.as_str().to_string(),
            expanded: true,
            content: NodeContent::Section {
                wrappers: vec![Grouping::new()],
            },
        }
    }

    pub fn block(id: impl Into<NodeId>, pattern_id: impl Into<String>, variant: Variant) -> Self {
        let pattern_id = pattern_id.into();
        Self {
            id: id.into(),
            kind: NodeKind::Block,
            label: crate::registry::humanize(&pattern_id),
            pattern_id,
            variant,
            expanded: true,
            content: NodeContent::Block,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_layout(mut self, layout: RowLayout) -> Self {
        if self.kind == NodeKind::Row {
            self.variant = layout.variant();
            self.content = NodeContent::Row(layout);
        }
        self
    }

    pub fn with_wrappers(mut self, wrappers: Vec<Grouping>) -> Self {
        if self.kind == NodeKind::Section {
            self.content = NodeContent::Section { wrappers };
        }
        self
    }

    pub fn is_fullscreen_only(&self) -> bool {
        self.kind == NodeKind::Block && self.variant == Variant::Full
    }

    /// Groupings directly owned by this node, in document order
    pub fn groupings(&self) -> Vec<(GroupingId, &Grouping)> {
        let id = &self.id;
        match &self.content {
            NodeContent::Row(RowLayout::Full { blocks }) => {
                vec![(GroupingId::blocks(id.clone(), 0), blocks)]
            }
            NodeContent::Row(RowLayout::Standard { sections }) => {
                vec![(GroupingId::sections(id.clone()), sections)]
            }
            NodeContent::Row(RowLayout::Special(slots)) => {
                let mut out = Vec::new();
                if let Some(blocks) = &slots.blocks {
                    out.push((GroupingId::special_blocks(id.clone()), blocks));
                }
                if let Some(sections) = &slots.sections {
                    out.push((GroupingId::special_sections(id.clone()), sections));
                }
                out
            }
            NodeContent::Section { wrappers } => wrappers
                .iter()
                .enumerate()
                .map(|(i, w)| (GroupingId::blocks(id.clone(), i), w))
                .collect(),
            NodeContent::Block => Vec::new(),
        }
    }

    pub fn groupings_mut(&mut self) -> Vec<(GroupingId, &mut Grouping)> {
        let id = self.id.clone();
        match &mut self.content {
            NodeContent::Row(RowLayout::Full { blocks }) => {
                vec![(GroupingId::blocks(id, 0), blocks)]
            }
            NodeContent::Row(RowLayout::Standard { sections }) => {
                vec![(GroupingId::sections(id), sections)]
            }
            NodeContent::Row(RowLayout::Special(slots)) => {
                let mut out = Vec::new();
                if let Some(blocks) = &mut slots.blocks {
                    out.push((GroupingId::special_blocks(id.clone()), blocks));
                }
                if let Some(sections) = &mut slots.sections {
                    out.push((GroupingId::special_sections(id), sections));
                }
                out
            }
            NodeContent::Section { wrappers } => wrappers
                .iter_mut()
                .enumerate()
                .map(|(i, w)| (GroupingId::blocks(id.clone(), i), w))
                .collect(),
            NodeContent::Block => Vec::new(),
        }
    }

    /// Grouping of this node addressed by `grouping`
    pub fn own_grouping(&self, grouping: &GroupingId) -> Option<&Grouping> {
        self.groupings()
            .into_iter()
            .find(|(gid, _)| gid == grouping)
            .map(|(_, g)| g)
    }

    pub fn own_grouping_mut(&mut self, grouping: &GroupingId) -> Option<&mut Grouping> {
        self.groupings_mut()
            .into_iter()
            .find(|(gid, _)| gid == grouping)
            .map(|(_, g)| g)
    }

    /// Special slots of a special row
    pub fn special_slots(&self) -> Option<&SpecialSlots> {
        match &self.content {
            NodeContent::Row(RowLayout::Special(slots)) => Some(slots),
            _ => None,
        }
    }

    /// Number of blocks held anywhere below this node
    pub fn block_count(&self) -> usize {
        self.groupings()
            .into_iter()
            .flat_map(|(_, g)| g.entities.iter())
            .map(|child| {
                if child.kind == NodeKind::Block {
                    1
                } else {
                    child.block_count()
                }
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_variant_from_pattern() {
        assert_eq!(Variant::for_row_pattern("full"), Variant::Full);
        assert_eq!(Variant::for_row_pattern("special-2"), Variant::Special);
        assert_eq!(Variant::for_row_pattern("standard-1"), Variant::Standard);
        // Unknown patterns are standard, not an error
        assert_eq!(Variant::for_row_pattern("mystery"), Variant::Standard);
        assert_eq!(Variant::for_row_pattern("fullwidth"), Variant::Standard);
    }

    #[test]
    fn test_row_layout_matches_variant() {
        let full = Node::row("r1", "full");
        assert_eq!(full.groupings()[0].0, GroupingId::blocks("r1", 0));

        let special = Node::row("r2", "special-1");
        let gids: Vec<_> = special.groupings().into_iter().map(|(g, _)| g).collect();
        assert_eq!(gids, vec![GroupingId::special_sections("r2")]);

        let standard = Node::row("r3", "standard-1");
        assert_eq!(standard.groupings()[0].0, GroupingId::sections("r3"));
        assert_eq!(standard.label, "row");
    }

    #[test]
    fn test_special_slots_exclusivity() {
        let block = Node::block("b1", "text", Variant::Special);
        let section = Node::section("s1", "sec-a", SectionType::Special);

        let slots = SpecialSlots {
            blocks: Some(Grouping::with_entities(vec![block.clone()])),
            sections: Some(Grouping::new()),
        };
        assert!(slots.is_exclusive());

        let broken = SpecialSlots {
            blocks: Some(Grouping::with_entities(vec![block])),
            sections: Some(Grouping::with_entities(vec![section])),
        };
        assert!(!broken.is_exclusive());
    }

    #[test]
    fn test_grouping_refresh_reports_flip() {
        let mut grouping = Grouping::new();
        assert!(grouping.initial_add);
        assert!(!grouping.refresh_initial_add());

        grouping
            .entities
            .push(Node::block("b1", "text", Variant::Standard));
        assert!(grouping.refresh_initial_add());
        assert!(!grouping.initial_add);
    }

    #[test]
    fn test_block_count() {
        let mut section = Node::section("s1", "sec-a", SectionType::Standard);
        if let NodeContent::Section { wrappers } = &mut section.content {
            wrappers[0].entities.push(Node::block("b1", "text", Variant::Standard));
            wrappers[0].entities.push(Node::block("b2", "image", Variant::Standard));
        }
        let mut row = Node::row("r1", "standard-1");
        row.own_grouping_mut(&GroupingId::sections("r1"))
            .unwrap()
            .entities
            .push(section);

        assert_eq!(row.block_count(), 2);
    }
}
