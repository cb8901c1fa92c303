//! Settings/revisions side-panel
//!
//! A panel is opened from a trigger that knows the ids of its enclosing row,
//! section and block. The innermost one wins; its descriptor is sent to the
//! renderer, which answers with the panel markup.

use crate::errors::EditError;
use npb_tree::{NodeId, NodeKind, Page};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelType {
    Settings,
    Revisions,
}

impl PanelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelType::Settings => "settings",
            PanelType::Revisions => "revisions",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Standalone,
    Sidebar,
    Fullscreen,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Standalone => "standalone",
            DisplayMode::Sidebar => "sidebar",
            DisplayMode::Fullscreen => "fullscreen",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ids of the elements enclosing a panel trigger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelAnchor {
    pub row: Option<NodeId>,
    pub section: Option<NodeId>,
    pub block: Option<NodeId>,
}

impl PanelAnchor {
    /// Anchor of a trigger sitting on `id`
    pub fn enclosing(page: &Page, id: &NodeId) -> Option<Self> {
        let node = page.find_by_identifier(id)?;
        let row = page.row_of(id).map(|r| r.id.clone());

        let section = match node.kind {
            NodeKind::Section => Some(node.id.clone()),
            NodeKind::Block => page
                .locate(id)
                .and_then(|loc| loc.grouping.owner().cloned())
                .filter(|owner| {
                    page.find_by_identifier(owner)
                        .map_or(false, |n| n.kind == NodeKind::Section)
                }),
            NodeKind::Row => None,
        };

        Some(Self {
            row,
            section,
            block: (node.kind == NodeKind::Block).then(|| node.id.clone()),
        })
    }

    /// Block > Section > Row
    pub fn resolve(&self) -> Option<&NodeId> {
        self.block
            .as_ref()
            .or(self.section.as_ref())
            .or(self.row.as_ref())
    }
}

/// What the renderer needs to build a panel for one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    pub id: NodeId,
    pub kind: NodeKind,
    pub pattern_id: String,
    pub label: String,
    #[serde(default)]
    pub settings: Option<Value>,
}

impl NodeDescriptor {
    /// `info` parameter of the panel request
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::String(self.id.to_string()));
        map.insert("kind".to_string(), Value::String(self.kind.as_str().to_string()));
        map.insert("patternId".to_string(), Value::String(self.pattern_id.clone()));
        map.insert("label".to_string(), Value::String(self.label.clone()));
        map.insert("settings".to_string(), self.settings.clone().unwrap_or(Value::Null));
        Value::Object(map)
    }
}

pub fn describe(page: &Page, anchor: &PanelAnchor) -> Result<NodeDescriptor, EditError> {
    let id = anchor
        .resolve()
        .ok_or_else(|| EditError::IncompatibleTarget("panel trigger has no enclosing node".to_string()))?;
    let node = page
        .find_by_identifier(id)
        .ok_or_else(|| EditError::NodeNotFound(id.clone()))?;

    Ok(NodeDescriptor {
        id: node.id.clone(),
        kind: node.kind,
        pattern_id: node.pattern_id.clone(),
        label: node.label.clone(),
        settings: page.settings_for(node).cloned(),
    })
}

/// Page-width bookkeeping of the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelLayout {
    pub mode: DisplayMode,
    pub panel_width: u32,
    pub page_width: u32,
    /// Width taken from the page
    pub reserved: u32,
}

impl PanelLayout {
    pub fn new(panel_width: u32, page_width: u32) -> Self {
        Self {
            mode: DisplayMode::Standalone,
            panel_width,
            page_width,
            reserved: 0,
        }
    }

    /// Switch mode, returns the new reserved width
    pub fn set_mode(&mut self, mode: DisplayMode) -> u32 {
        self.mode = mode;
        self.reserve();
        self.reserved
    }

    pub fn resize(&mut self, panel_width: u32) {
        self.panel_width = panel_width;
        self.reserve();
    }

    pub fn content_width(&self) -> u32 {
        self.page_width.saturating_sub(self.reserved)
    }

    fn reserve(&mut self) {
        self.reserved = match self.mode {
            DisplayMode::Sidebar => self.panel_width.min(self.page_width),
            DisplayMode::Standalone | DisplayMode::Fullscreen => 0,
        };
    }
}
