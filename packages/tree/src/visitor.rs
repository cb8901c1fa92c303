use crate::ids::{GroupingId, NodeId};
use crate::node::{Grouping, Node, NodeKind};
use crate::page::Page;

/// Visitor pattern for traversing the page tree immutably
///
/// Default implementations walk the entire tree in document order.
/// Override specific visit_* methods to collect what you need.
pub trait Visitor: Sized {
    fn visit_page(&mut self, page: &Page) {
        walk_page(self, page);
    }

    fn visit_grouping(&mut self, id: &GroupingId, grouping: &Grouping) {
        walk_grouping(self, id, grouping);
    }

    /// `parent` is the grouping holding the node, `index` its position there
    fn visit_node(&mut self, node: &Node, _parent: &GroupingId, _index: usize) {
        walk_node(self, node);
    }
}

pub fn walk_page<V: Visitor>(visitor: &mut V, page: &Page) {
    visitor.visit_grouping(&GroupingId::Rows, &page.rows);
}

pub fn walk_grouping<V: Visitor>(visitor: &mut V, id: &GroupingId, grouping: &Grouping) {
    for (index, node) in grouping.entities.iter().enumerate() {
        visitor.visit_node(node, id, index);
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, node: &Node) {
    for (id, grouping) in node.groupings() {
        visitor.visit_grouping(&id, grouping);
    }
}

/// Counts nodes per kind
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NodeCounter {
    pub rows: usize,
    pub sections: usize,
    pub blocks: usize,
}

impl NodeCounter {
    pub fn total(&self) -> usize {
        self.rows + self.sections + self.blocks
    }
}

impl Visitor for NodeCounter {
    fn visit_node(&mut self, node: &Node, _parent: &GroupingId, _index: usize) {
        match node.kind {
            NodeKind::Row => self.rows += 1,
            NodeKind::Section => self.sections += 1,
            NodeKind::Block => self.blocks += 1,
        }
        walk_node(self, node);
    }
}

/// Records `node id → (parent grouping, index)` for every node
#[derive(Debug, Default)]
pub struct ParentIndex {
    pub entries: Vec<(NodeId, GroupingId, usize)>,
}

impl Visitor for ParentIndex {
    fn visit_node(&mut self, node: &Node, parent: &GroupingId, index: usize) {
        self.entries.push((node.id.clone(), parent.clone(), index));
        walk_node(self, node);
    }
}

/// Collects every grouping id in document order
#[derive(Debug, Default)]
pub struct GroupingCollector {
    pub groupings: Vec<GroupingId>,
}

impl Visitor for GroupingCollector {
    fn visit_grouping(&mut self, id: &GroupingId, grouping: &Grouping) {
        self.groupings.push(id.clone());
        walk_grouping(self, id, grouping);
    }
}

/// Collects the ids of a node and all its descendants
pub fn subtree_ids(node: &Node) -> Vec<NodeId> {
    struct Collector(Vec<NodeId>);

    impl Visitor for Collector {
        fn visit_node(&mut self, node: &Node, _parent: &GroupingId, _index: usize) {
            self.0.push(node.id.clone());
            walk_node(self, node);
        }
    }

    let mut collector = Collector(vec![node.id.clone()]);
    walk_node(&mut collector, node);
    collector.0
}
