//! # Rebuild
//!
//! Pure walk of rendered markup into a [`Page`]. Never touches the markup.
//!
//! Markers read:
//! - `#npb-rows-wrapper` rows container (`data-pattern-settings`: JSON object
//!   keyed by pattern id)
//! - `.npb-row`, `.npb-section`, `.npb-block` nodes (`id`, `data-pattern`,
//!   `data-label`, `data-expanded`, `data-type`, `data-settings`)
//! - `.npb-blocks-wrapper`, `.npb-row-special-section`,
//!   `.npb-row-special-blocks` groupings

use crate::error::{TreeError, TreeResult};
use crate::ids::NodeId;
use crate::markup::{parse_element, Element};
use crate::node::{Grouping, Node, NodeKind, RowLayout, SectionType, SpecialSlots, Variant};
use crate::page::{EntitiesSettings, Page};
use crate::registry::humanize;
use serde_json::Value;
use std::collections::BTreeMap;

pub const ROWS_CONTAINER_ID: &str = "npb-rows-wrapper";
pub const BLOCKS_WRAPPER_CLASS: &str = "npb-blocks-wrapper";
pub const SPECIAL_SECTIONS_CLASS: &str = "npb-row-special-section";
pub const SPECIAL_BLOCKS_CLASS: &str = "npb-row-special-blocks";

/// Settings payloads found on node elements, keyed by node id
pub type NodeSettings = BTreeMap<NodeId, Value>;

/// Build a page from the rendered subtree containing the rows container
pub fn rebuild(root: &Element) -> TreeResult<Page> {
    let container = root
        .find_by_id(ROWS_CONTAINER_ID)
        .ok_or(TreeError::MissingRowsContainer)?;

    let mut settings = NodeSettings::new();
    let rows = container
        .outermost(&|e| e.has_class(NodeKind::Row.marker_class()))
        .into_iter()
        .map(|el| classify_row(el, &mut settings))
        .collect::<TreeResult<Vec<_>>>()?;

    let mut page = Page::with_rows(rows);
    page.entities_settings = EntitiesSettings {
        by_node: settings,
        by_pattern: parse_pattern_settings(container)?,
    };
    Ok(page)
}

pub fn rebuild_from_html(html: &str) -> TreeResult<Page> {
    rebuild(&parse_element(html)?)
}

/// Classify a fragment element of a known kind. `family` is the variant of
/// the row the node will live in; rows ignore it.
pub fn classify(kind: NodeKind, element: &Element, family: Variant) -> TreeResult<(Node, NodeSettings)> {
    let element = if element.has_class(kind.marker_class()) {
        element
    } else {
        element
            .find(&|e| e.has_class(kind.marker_class()))
            .ok_or_else(|| TreeError::unexpected_fragment(kind.as_str(), element.tag.clone()))?
    };

    let mut settings = NodeSettings::new();
    let node = match kind {
        NodeKind::Row => classify_row(element, &mut settings)?,
        NodeKind::Section => classify_section(element, section_type_for(family), &mut settings)?,
        NodeKind::Block => classify_block(element, family, &mut settings)?,
    };
    Ok((node, settings))
}

fn section_type_for(family: Variant) -> SectionType {
    match family {
        Variant::Special => SectionType::Special,
        _ => SectionType::Standard,
    }
}

fn classify_row(element: &Element, settings: &mut NodeSettings) -> TreeResult<Node> {
    let id = required_id(element, NodeKind::Row)?;
    let pattern = element.attr("data-pattern").unwrap_or("").to_string();
    let variant = if pattern.is_empty() {
        variant_from_row_class(element)
    } else {
        Variant::for_row_pattern(&pattern)
    };

    let layout = match variant {
        Variant::Full => {
            let wrapper = element
                .find(&|e| e.has_class(BLOCKS_WRAPPER_CLASS))
                .unwrap_or(element);
            RowLayout::Full {
                blocks: collect_blocks(wrapper, Variant::Full, settings)?,
            }
        }
        Variant::Special => {
            let blocks = element
                .find(&|e| e.has_class(SPECIAL_BLOCKS_CLASS))
                .map(|slot| collect_blocks(slot, Variant::Special, settings))
                .transpose()?;
            let sections = element
                .find(&|e| e.has_class(SPECIAL_SECTIONS_CLASS))
                .map(|slot| collect_sections(slot, SectionType::Special, settings))
                .transpose()?;
            if blocks.is_none() && sections.is_none() {
                RowLayout::for_variant(Variant::Special)
            } else {
                RowLayout::Special(SpecialSlots { blocks, sections })
            }
        }
        Variant::Standard => RowLayout::Standard {
            sections: collect_sections(element, SectionType::Standard, settings)?,
        },
    };

    let mut node = Node::row(id, pattern).with_layout(layout);
    apply_common(&mut node, element, settings)?;
    Ok(node)
}

fn variant_from_row_class(element: &Element) -> Variant {
    if element.has_class("npb-row-full") {
        Variant::Full
    } else if element.has_class("npb-row-special") {
        Variant::Special
    } else {
        Variant::Standard
    }
}

fn collect_sections(
    container: &Element,
    section_type: SectionType,
    settings: &mut NodeSettings,
) -> TreeResult<Grouping> {
    let sections = container
        .outermost(&|e| e.has_class(NodeKind::Section.marker_class()))
        .into_iter()
        .map(|el| classify_section(el, section_type, settings))
        .collect::<TreeResult<Vec<_>>>()?;
    Ok(Grouping::with_entities(sections))
}

fn classify_section(
    element: &Element,
    section_type: SectionType,
    settings: &mut NodeSettings,
) -> TreeResult<Node> {
    let id = required_id(element, NodeKind::Section)?;
    let pattern = element.attr("data-pattern").unwrap_or("");
    let family = section_type.variant();

    let wrappers = element.outermost(&|e| e.has_class(BLOCKS_WRAPPER_CLASS));
    let wrappers = if wrappers.is_empty() {
        vec![collect_blocks(element, family, settings)?]
    } else {
        wrappers
            .into_iter()
            .map(|w| collect_blocks(w, family, settings))
            .collect::<TreeResult<Vec<_>>>()?
    };

    let mut node = Node::section(id, pattern, section_type).with_wrappers(wrappers);
    apply_common(&mut node, element, settings)?;
    Ok(node)
}

fn collect_blocks(container: &Element, family: Variant, settings: &mut NodeSettings) -> TreeResult<Grouping> {
    let blocks = container
        .outermost(&|e| e.has_class(NodeKind::Block.marker_class()))
        .into_iter()
        .map(|el| classify_block(el, family, settings))
        .collect::<TreeResult<Vec<_>>>()?;
    Ok(Grouping::with_entities(blocks))
}

fn classify_block(element: &Element, family: Variant, settings: &mut NodeSettings) -> TreeResult<Node> {
    let id = required_id(element, NodeKind::Block)?;
    let pattern = element.attr("data-pattern").unwrap_or("");
    let variant = match element.attr("data-type") {
        Some("full") => Variant::Full,
        _ if family == Variant::Special => Variant::Special,
        _ => Variant::Standard,
    };

    let mut node = Node::block(id, pattern, variant);
    apply_common(&mut node, element, settings)?;
    Ok(node)
}

fn required_id(element: &Element, kind: NodeKind) -> TreeResult<NodeId> {
    element
        .id()
        .filter(|id| !id.is_empty())
        .map(NodeId::from)
        .ok_or_else(|| TreeError::missing_id(kind.marker_class()))
}

/// Label, expanded state and settings shared by every node kind
fn apply_common(node: &mut Node, element: &Element, settings: &mut NodeSettings) -> TreeResult<()> {
    node.label = match element.attr("data-label") {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => default_label(node.kind, &node.pattern_id),
    };
    node.expanded = element.attr("data-expanded") != Some("false");

    if let Some(raw) = element.attr("data-settings") {
        let value = serde_json::from_str(raw).map_err(|e| TreeError::InvalidSettings {
            id: node.id.to_string(),
            message: e.to_string(),
        })?;
        settings.insert(node.id.clone(), value);
    }
    Ok(())
}

/// Default friendly name: `row`, `section`, or the humanized block pattern
pub fn default_label(kind: NodeKind, pattern_id: &str) -> String {
    match kind {
        NodeKind::Row | NodeKind::Section => kind.as_str().to_string(),
        NodeKind::Block => humanize(pattern_id),
    }
}

fn parse_pattern_settings(container: &Element) -> TreeResult<BTreeMap<String, Value>> {
    let Some(raw) = container.attr("data-pattern-settings") else {
        return Ok(BTreeMap::new());
    };
    serde_json::from_str(raw).map_err(|e| TreeError::InvalidSettings {
        id: ROWS_CONTAINER_ID.to_string(),
        message: e.to_string(),
    })
}
