//! # Neo Page Builder Tree
//!
//! In-memory page tree of the page builder.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ markup: renderer HTML → Element             │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ rebuild: Element → Page (pure walk)         │
//! │  - rows / sections / blocks by marker class │
//! │  - grouping shape from row variant          │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ render: Page → Element (same markers)       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use npb_tree::{rebuild_from_html, render::page_to_html};
//!
//! let page = rebuild_from_html(html)?;
//! assert!(page.validate().is_ok());
//! let html = page_to_html(&page);
//! ```

pub mod error;
pub mod ids;
pub mod markup;
pub mod node;
pub mod page;
pub mod rebuild;
pub mod registry;
pub mod render;
pub mod visitor;

pub use error::{TreeError, TreeResult};
pub use ids::{get_page_seed, GroupingId, IdGenerator, NodeId};
pub use markup::{parse_element, parse_fragment, Element, MarkupNode};
pub use node::{Grouping, Node, NodeContent, NodeKind, RowLayout, SectionType, SpecialSlots, Variant};
pub use page::{find_by_identifier, EntitiesSettings, InvariantViolation, Location, Page};
pub use rebuild::{classify, default_label, rebuild, rebuild_from_html, NodeSettings};
pub use registry::{humanize, CrossFamilyRule, PatternConfig, PatternRegistry, StaticPatternRegistry};
pub use visitor::{subtree_ids, NodeCounter, Visitor};
