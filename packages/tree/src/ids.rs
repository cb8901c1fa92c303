use crate::node::NodeKind;
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable node identifier. Assigned once, never reused within a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Address of a grouping (a typed child slot) inside the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "slot", rename_all = "kebab-case")]
pub enum GroupingId {
    /// The page's rows container
    Rows,
    /// Section slot of a standard row
    Sections { row: NodeId },
    /// Section list of a special row
    SpecialSections { row: NodeId },
    /// Block list of a special row
    SpecialBlocks { row: NodeId },
    /// N-th blocks wrapper of a section, or the single wrapper of a full row
    Blocks { owner: NodeId, index: usize },
}

impl GroupingId {
    pub fn sections(row: impl Into<NodeId>) -> Self {
        GroupingId::Sections { row: row.into() }
    }

    pub fn special_sections(row: impl Into<NodeId>) -> Self {
        GroupingId::SpecialSections { row: row.into() }
    }

    pub fn special_blocks(row: impl Into<NodeId>) -> Self {
        GroupingId::SpecialBlocks { row: row.into() }
    }

    pub fn blocks(owner: impl Into<NodeId>, index: usize) -> Self {
        GroupingId::Blocks {
            owner: owner.into(),
            index,
        }
    }

    /// Node kind this grouping holds
    pub fn accepts(&self) -> NodeKind {
        match self {
            GroupingId::Rows => NodeKind::Row,
            GroupingId::Sections { .. } | GroupingId::SpecialSections { .. } => NodeKind::Section,
            GroupingId::SpecialBlocks { .. } | GroupingId::Blocks { .. } => NodeKind::Block,
        }
    }

    /// Node owning this grouping (`None` for the rows container)
    pub fn owner(&self) -> Option<&NodeId> {
        match self {
            GroupingId::Rows => None,
            GroupingId::Sections { row }
            | GroupingId::SpecialSections { row }
            | GroupingId::SpecialBlocks { row } => Some(row),
            GroupingId::Blocks { owner, .. } => Some(owner),
        }
    }
}

impl fmt::Display for GroupingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupingId::Rows => f.write_str("rows"),
            GroupingId::Sections { row } => write!(f, "sections:{}", row),
            GroupingId::SpecialSections { row } => write!(f, "special-sections:{}", row),
            GroupingId::SpecialBlocks { row } => write!(f, "special-blocks:{}", row),
            GroupingId::Blocks { owner, index } => write!(f, "blocks:{}:{}", owner, index),
        }
    }
}

/// Generate a document seed from a page key (URL, path...) using CRC32
pub fn get_page_seed(key: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential node id generator for one page
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u32,
}

impl IdGenerator {
    pub fn new(page_key: &str) -> Self {
        Self {
            seed: get_page_seed(page_key),
            count: 0,
        }
    }

    /// Generate next sequential id
    pub fn new_id(&mut self) -> NodeId {
        self.count += 1;
        NodeId(format!("npb-{}-{}", self.seed, self.count))
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_seed_is_deterministic() {
        assert_eq!(get_page_seed("/home"), get_page_seed("/home"));
        assert_ne!(get_page_seed("/home"), get_page_seed("/about"));
    }

    #[test]
    fn test_sequential_ids() {
        let mut gen = IdGenerator::new("/home");

        let id1 = gen.new_id();
        let id2 = gen.new_id();

        assert!(id1.as_str().ends_with("-1"));
        assert!(id2.as_str().ends_with("-2"));
        assert!(id1.as_str().starts_with(&format!("npb-{}", gen.seed())));
    }

    #[test]
    fn test_grouping_display() {
        assert_eq!(GroupingId::Rows.to_string(), "rows");
        assert_eq!(GroupingId::blocks("s1", 2).to_string(), "blocks:s1:2");
        assert_eq!(
            GroupingId::special_sections("r1").to_string(),
            "special-sections:r1"
        );
        assert_eq!(GroupingId::blocks("s1", 0).owner(), Some(&NodeId::from("s1")));
        assert_eq!(GroupingId::Rows.owner(), None);
        assert_eq!(GroupingId::special_blocks("r1").accepts(), NodeKind::Block);
        assert_eq!(GroupingId::sections("r1").accepts(), NodeKind::Section);
    }
}
