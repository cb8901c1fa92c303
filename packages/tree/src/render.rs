//! Render a page back to markup using the same markers `rebuild` reads.

use crate::markup::Element;
use crate::node::{Grouping, Node, NodeContent, NodeKind, RowLayout};
use crate::page::Page;
use crate::rebuild::{BLOCKS_WRAPPER_CLASS, ROWS_CONTAINER_ID, SPECIAL_BLOCKS_CLASS, SPECIAL_SECTIONS_CLASS};
use serde_json::Value;

pub fn page_to_markup(page: &Page) -> Element {
    let mut container = Element::new("div").with_attr("id", ROWS_CONTAINER_ID);
    if !page.entities_settings.by_pattern.is_empty() {
        container.set_attr(
            "data-pattern-settings",
            to_json(&page.entities_settings.by_pattern),
        );
    }
    for row in page.rows() {
        container = container.with_child(node_to_markup(page, row));
    }
    container
}

pub fn page_to_html(page: &Page) -> String {
    page_to_markup(page).to_html()
}

/// Markup of one node and its subtree. Node-keyed settings of `page` are
/// written to `data-settings`.
pub fn node_to_markup(page: &Page, node: &Node) -> Element {
    let mut element = Element::new("div")
        .with_attr("id", node.id.as_str())
        .with_attr("class", node_classes(node))
        .with_attr("data-pattern", node.pattern_id.as_str())
        .with_attr("data-label", node.label.as_str());

    if !node.expanded {
        element.set_attr("data-expanded", "false");
    }
    if node.kind == NodeKind::Block {
        element.set_attr("data-type", node.variant.as_str());
    }
    if let Some(settings) = page.entities_settings.by_node.get(&node.id) {
        element.set_attr("data-settings", to_json(settings));
    }

    match &node.content {
        NodeContent::Row(RowLayout::Full { blocks }) => {
            element.with_child(grouping_markup(page, BLOCKS_WRAPPER_CLASS, blocks))
        }
        NodeContent::Row(RowLayout::Special(slots)) => {
            if let Some(blocks) = &slots.blocks {
                element = element.with_child(grouping_markup(page, SPECIAL_BLOCKS_CLASS, blocks));
            }
            if let Some(sections) = &slots.sections {
                element = element.with_child(grouping_markup(page, SPECIAL_SECTIONS_CLASS, sections));
            }
            element
        }
        NodeContent::Row(RowLayout::Standard { sections }) => sections
            .entities
            .iter()
            .fold(element, |el, section| el.with_child(node_to_markup(page, section))),
        NodeContent::Section { wrappers } => wrappers.iter().fold(element, |el, wrapper| {
            el.with_child(grouping_markup(page, BLOCKS_WRAPPER_CLASS, wrapper))
        }),
        NodeContent::Block => element,
    }
}

fn node_classes(node: &Node) -> String {
    let marker = node.kind.marker_class();
    match node.kind {
        NodeKind::Row => {
            let family = match node.variant.as_str() {
                "standard" => "normal",
                other => other,
            };
            format!("{marker} {marker}-{family}")
        }
        NodeKind::Section => format!("{marker} {marker}-{}", node.variant),
        NodeKind::Block => marker.to_string(),
    }
}

fn grouping_markup(page: &Page, class: &str, grouping: &Grouping) -> Element {
    grouping
        .entities
        .iter()
        .fold(Element::new("div").with_attr("class", class), |el, child| {
            el.with_child(node_to_markup(page, child))
        })
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| Value::Null.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rebuild::rebuild;

    #[test]
    fn test_row_classes() {
        let page = Page::new();
        let row = node_to_markup(&page, &Node::row("r1", "standard-2"));
        assert_eq!(row.attr("class"), Some("npb-row npb-row-normal"));

        let full = node_to_markup(&page, &Node::row("r2", "full"));
        assert_eq!(full.attr("class"), Some("npb-row npb-row-full"));
        assert!(full.find(&|e| e.has_class(BLOCKS_WRAPPER_CLASS)).is_some());
    }

    #[test]
    fn test_render_then_rebuild_round_trips() {
        let mut row = Node::row("r1", "special-1");
        row.expanded = false;
        let page = Page::with_rows(vec![row.with_label("Intro")]);

        let rebuilt = rebuild(&page_to_markup(&page)).unwrap();
        assert_eq!(rebuilt, page);
    }
}
