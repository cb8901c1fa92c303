//! Pattern registry
//!
//! The registry is the only place that knows which pattern ids exist for each
//! node kind. The core relies on it for validation and never hardcodes pattern
//! names beyond `"full"` and the `"special-"` prefix.

use crate::node::{NodeKind, Variant, SPECIAL_PREFIX};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternConfig {
    pub id: String,
    pub kind: NodeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Listed by the special-family picker
    #[serde(default)]
    pub special: bool,

    /// Blocks only: may live in full rows exclusively
    #[serde(default)]
    pub fullscreen_only: bool,

    /// Sections only: layout complexity level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<u8>,
}

impl PatternConfig {
    pub fn new(kind: NodeKind, id: impl Into<String>) -> Self {
        let id = id.into();
        let special = kind == NodeKind::Row && id.starts_with(SPECIAL_PREFIX);
        Self {
            id,
            kind,
            label: None,
            special,
            fullscreen_only: false,
            complexity: None,
        }
    }

    pub fn special(mut self) -> Self {
        self.special = true;
        self
    }

    pub fn fullscreen_only(mut self) -> Self {
        self.fullscreen_only = true;
        self
    }

    pub fn with_complexity(mut self, level: u8) -> Self {
        self.complexity = Some(level);
        self
    }

    /// Label shown in pickers and used as default block name
    pub fn display_label(&self) -> String {
        self.label.clone().unwrap_or_else(|| humanize(&self.id))
    }
}

/// A node kind pair whose move across row families is allowed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossFamilyRule {
    pub kind: NodeKind,
    pub from: Variant,
    pub to: Variant,
}

/// Source of pattern configuration
pub trait PatternRegistry {
    /// Configuration for a pattern of the given kind, `None` if unknown
    fn resolve(&self, kind: NodeKind, pattern_id: &str) -> Option<&PatternConfig>;

    /// Patterns offered by the picker for a kind
    fn choices(&self, kind: NodeKind, special: bool) -> Vec<&PatternConfig>;

    /// Whether a node of `kind` may be dragged from a `from` row family into
    /// a `to` row family. Rejected unless declared.
    fn allows_cross_family(&self, _kind: NodeKind, _from: Variant, _to: Variant) -> bool {
        false
    }

    fn is_valid(&self, kind: NodeKind, pattern_id: &str) -> bool {
        self.resolve(kind, pattern_id).is_some()
    }
}

/// In-memory registry, usually built from configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticPatternRegistry {
    patterns: Vec<PatternConfig>,
    cross_family: Vec<CrossFamilyRule>,
}

impl StaticPatternRegistry {
    pub fn new(patterns: Vec<PatternConfig>) -> Self {
        Self {
            patterns,
            cross_family: Vec::new(),
        }
    }

    /// Built-in pattern set used when no configuration is provided
    pub fn builtin() -> Self {
        use NodeKind::*;
        Self::new(vec![
            PatternConfig::new(Row, "standard-1"),
            PatternConfig::new(Row, "standard-2"),
            PatternConfig::new(Row, "standard-3"),
            PatternConfig::new(Row, "full"),
            PatternConfig::new(Row, "special-1"),
            PatternConfig::new(Row, "special-2"),
            PatternConfig::new(Section, "sec-a").with_complexity(1),
            PatternConfig::new(Section, "sec-b").with_complexity(2),
            PatternConfig::new(Section, "sec-c").with_complexity(3),
            PatternConfig::new(Section, "sec-special-a").special().with_complexity(1),
            PatternConfig::new(Section, "sec-special-b").special().with_complexity(2),
            PatternConfig::new(Block, "text"),
            PatternConfig::new(Block, "image"),
            PatternConfig::new(Block, "button"),
            PatternConfig::new(Block, "video"),
            PatternConfig::new(Block, "hero").fullscreen_only(),
            PatternConfig::new(Block, "slider").fullscreen_only(),
        ])
    }

    pub fn with_cross_family(mut self, rule: CrossFamilyRule) -> Self {
        self.cross_family.push(rule);
        self
    }

    pub fn register(&mut self, pattern: PatternConfig) {
        self.patterns
            .retain(|p| !(p.kind == pattern.kind && p.id == pattern.id));
        self.patterns.push(pattern);
    }

    pub fn patterns(&self) -> &[PatternConfig] {
        &self.patterns
    }
}

impl PatternRegistry for StaticPatternRegistry {
    fn resolve(&self, kind: NodeKind, pattern_id: &str) -> Option<&PatternConfig> {
        self.patterns
            .iter()
            .find(|p| p.kind == kind && p.id == pattern_id)
    }

    fn choices(&self, kind: NodeKind, special: bool) -> Vec<&PatternConfig> {
        self.patterns
            .iter()
            .filter(|p| p.kind == kind)
            .filter(|p| kind == NodeKind::Row || p.special == special)
            .collect()
    }

    fn allows_cross_family(&self, kind: NodeKind, from: Variant, to: Variant) -> bool {
        self.cross_family
            .iter()
            .any(|r| r.kind == kind && r.from == from && r.to == to)
    }
}

/// Turn a pattern id into a readable label: dashes and underscores become
/// spaces, first letter is capitalized.
pub fn humanize(s: &str) -> String {
    let cleaned = s.replace(['-', '_'], " ");
    let mut chars = cleaned.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("text-image"), "Text image");
        assert_eq!(humanize("hero_banner"), "Hero banner");
        assert_eq!(humanize(""), "");
    }

    #[test]
    fn test_resolve_is_kind_scoped() {
        let registry = StaticPatternRegistry::builtin();
        assert!(registry.is_valid(NodeKind::Row, "full"));
        assert!(!registry.is_valid(NodeKind::Block, "full"));
        assert!(!registry.is_valid(NodeKind::Section, "nope"));
    }

    #[test]
    fn test_choices_filter_special_family() {
        let registry = StaticPatternRegistry::builtin();

        let standard: Vec<_> = registry
            .choices(NodeKind::Section, false)
            .into_iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(standard, vec!["sec-a", "sec-b", "sec-c"]);

        let special = registry.choices(NodeKind::Section, true);
        assert!(special.iter().all(|p| p.special));

        // Rows are listed regardless of the flag
        assert_eq!(registry.choices(NodeKind::Row, true).len(), 6);
    }

    #[test]
    fn test_cross_family_rejected_unless_declared() {
        let registry = StaticPatternRegistry::builtin();
        assert!(!registry.allows_cross_family(NodeKind::Section, Variant::Special, Variant::Standard));

        let registry = registry.with_cross_family(CrossFamilyRule {
            kind: NodeKind::Section,
            from: Variant::Special,
            to: Variant::Standard,
        });
        assert!(registry.allows_cross_family(NodeKind::Section, Variant::Special, Variant::Standard));
        assert!(!registry.allows_cross_family(NodeKind::Section, Variant::Standard, Variant::Special));
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut registry = StaticPatternRegistry::builtin();
        registry.register(PatternConfig::new(NodeKind::Block, "text").fullscreen_only());
        let text = registry.resolve(NodeKind::Block, "text").unwrap();
        assert!(text.fullscreen_only);
        assert_eq!(
            registry.patterns().iter().filter(|p| p.id == "text").count(),
            1
        );
    }
}
