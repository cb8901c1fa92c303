//! # Render-Fragment Synchronizer
//!
//! Everything the builder asks the external renderer for goes through a
//! [`FragmentRequest`]. Returned markup is adopted into the model: parsed,
//! checked to hold exactly one element of the requested kind, given fresh ids
//! and classified with the rebuild rules.
//!
//! ```text
//! FragmentRequest ──fetch──▶ markup ──adopt──▶ (Node, settings, view html)
//! ```

use crate::document::PageDocument;
use crate::errors::FetchError;
use crate::panel::{DisplayMode, NodeDescriptor, PanelType};
use npb_tree::{classify, parse_element, Element, Node, NodeKind, NodeSettings, PatternRegistry, SectionType, Variant};
use std::future::Future;

/// One call to the fragment API
#[derive(Debug, Clone, PartialEq)]
pub enum FragmentRequest {
    /// Full page markup
    Page,
    Row {
        pattern: String,
    },
    Section {
        pattern: String,
        section_type: SectionType,
    },
    Block {
        pattern: String,
        /// Block count of the destination section
        iteration: usize,
        block_type: SectionType,
    },
    /// Choice picker listing the patterns of a kind
    Picker {
        kind: NodeKind,
        is_special: Option<bool>,
    },
    Panel {
        panel_type: PanelType,
        info: NodeDescriptor,
        mode: DisplayMode,
    },
}

impl FragmentRequest {
    /// Path segment under `/neo-page-builder/`
    pub fn endpoint(&self) -> &'static str {
        match self {
            FragmentRequest::Page => "page",
            FragmentRequest::Row { .. } => "row",
            FragmentRequest::Section { .. } => "section",
            FragmentRequest::Block { .. } => "block",
            FragmentRequest::Picker { .. } => "fixed-modal",
            FragmentRequest::Panel { .. } => "panel",
        }
    }

    /// Form-encoded parameters
    pub fn form(&self) -> Vec<(&'static str, String)> {
        match self {
            FragmentRequest::Page => vec![],
            FragmentRequest::Row { pattern } => vec![("pattern", pattern.clone())],
            FragmentRequest::Section { pattern, section_type } => vec![
                ("pattern", pattern.clone()),
                ("type", section_type.as_str().to_string()),
            ],
            FragmentRequest::Block {
                pattern,
                iteration,
                block_type,
            } => vec![
                ("iteration", iteration.to_string()),
                ("pattern", pattern.clone()),
                ("type", block_type.as_str().to_string()),
            ],
            FragmentRequest::Picker { kind, is_special } => {
                let mut form = vec![("type", kind.as_str().to_string())];
                if let Some(special) = is_special {
                    form.push(("isSpecial", special.to_string()));
                }
                form
            }
            FragmentRequest::Panel { panel_type, info, mode } => vec![
                ("type", panel_type.as_str().to_string()),
                ("info", info.to_json().to_string()),
                ("mode", mode.as_str().to_string()),
            ],
        }
    }

    /// Node kind an insert request produces
    pub fn node_kind(&self) -> Option<NodeKind> {
        match self {
            FragmentRequest::Row { .. } => Some(NodeKind::Row),
            FragmentRequest::Section { .. } => Some(NodeKind::Section),
            FragmentRequest::Block { .. } => Some(NodeKind::Block),
            _ => None,
        }
    }

    pub fn pattern(&self) -> Option<&str> {
        match self {
            FragmentRequest::Row { pattern }
            | FragmentRequest::Section { pattern, .. }
            | FragmentRequest::Block { pattern, .. } => Some(pattern),
            _ => None,
        }
    }
}

/// The external fragment renderer
pub trait FragmentRenderer {
    fn fetch(&self, request: &FragmentRequest) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// A fragment turned into model data
#[derive(Debug, Clone, PartialEq)]
pub struct AdoptedFragment {
    pub node: Node,
    pub settings: NodeSettings,
    /// Markup for the view, carrying the reassigned ids
    pub html: String,
}

/// Adopt the markup returned for an insert request.
///
/// `family` is the variant of the destination row. Blocks whose pattern the
/// registry marks fullscreen-only become `Variant::Full` whatever the markup
/// says.
pub fn adopt_fragment<P: PatternRegistry + ?Sized>(
    document: &mut PageDocument,
    registry: &P,
    kind: NodeKind,
    pattern: &str,
    family: Variant,
    html: &str,
) -> Result<AdoptedFragment, FetchError> {
    let root = parse_element(html)?;
    let mut element = single_marker(root, kind)?;

    if element.attr("data-pattern").map_or(true, str::is_empty) {
        element.set_attr("data-pattern", pattern);
    }
    let fullscreen = kind == NodeKind::Block
        && registry
            .resolve(kind, pattern)
            .map_or(false, |config| config.fullscreen_only);
    if fullscreen {
        element.set_attr("data-type", Variant::Full.as_str());
    }

    document.assign_ids(&mut element);
    let (node, settings) = classify(kind, &element, family)?;

    Ok(AdoptedFragment {
        node,
        settings,
        html: element.to_html(),
    })
}

fn single_marker(root: Element, kind: NodeKind) -> Result<Element, FetchError> {
    let marker = kind.marker_class();
    if root.has_class(marker) {
        return Ok(root);
    }

    let found = root.outermost(&|e| e.has_class(marker));
    match found.as_slice() {
        [element] => Ok((*element).clone()),
        [] => Err(FetchError::Decode(format!("fragment holds no {}", kind))),
        _ => Err(FetchError::Decode(format!(
            "fragment holds {} {} elements, expected one",
            found.len(),
            kind
        ))),
    }
}
