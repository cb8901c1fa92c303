use crate::panel::PanelLayout;
use npb_tree::{CrossFamilyRule, PatternConfig, StaticPatternRegistry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_NAME: &str = "npb.config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Page builder configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderConfig {
    /// Base URL of the fragment renderer
    #[serde(default = "default_renderer_url")]
    pub renderer_url: String,

    /// Known patterns. Empty means the built-in set.
    #[serde(default)]
    pub patterns: Vec<PatternConfig>,

    #[serde(default)]
    pub panel: PanelConfig,

    /// Allowed moves across row families
    #[serde(default)]
    pub cross_family: Vec<CrossFamilyRule>,

    /// Open the section picker right after a row is added
    #[serde(default = "default_true")]
    pub auto_add_section: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelConfig {
    #[serde(default = "default_panel_width")]
    pub default_width: u32,

    #[serde(default = "default_page_width")]
    pub page_width: u32,
}

fn default_renderer_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_true() -> bool {
    true
}

fn default_panel_width() -> u32 {
    400
}

fn default_page_width() -> u32 {
    1440
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            default_width: default_panel_width(),
            page_width: default_page_width(),
        }
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            renderer_url: default_renderer_url(),
            patterns: vec![],
            panel: PanelConfig::default(),
            cross_family: vec![],
            auto_add_section: true,
        }
    }
}

impl BuilderConfig {
    /// Load config from a directory, defaults when the file is absent
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = dir.as_ref().join(DEFAULT_CONFIG_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn registry(&self) -> StaticPatternRegistry {
        let mut registry = if self.patterns.is_empty() {
            StaticPatternRegistry::builtin()
        } else {
            StaticPatternRegistry::new(self.patterns.clone())
        };
        for rule in &self.cross_family {
            registry = registry.with_cross_family(rule.clone());
        }
        registry
    }

    pub fn panel_layout(&self) -> PanelLayout {
        PanelLayout::new(self.panel.default_width, self.panel.page_width)
    }
}
