//! # Post-Effect System
//!
//! Mutations trigger cascading effects to keep the page consistent.
//!
//! Effects are analyzed against the page *before* the primary mutation runs,
//! since a removal takes the subtree they need to inspect with it. Post-effects
//! are deterministic and only generate the secondary mutations that are needed.

use crate::mutations::{Mutation, MutationError};
use npb_tree::{subtree_ids, Page};

/// Post-effect that can be triggered by a mutation
pub trait PostEffect: std::fmt::Debug {
    /// Analyze the mutation and generate secondary mutations if needed
    fn analyze(&self, mutation: &Mutation, page: &Page) -> Vec<Mutation>;
}

/// Drop node-keyed settings of a removed subtree
#[derive(Debug)]
pub struct CleanupOrphanedSettings;

impl PostEffect for CleanupOrphanedSettings {
    fn analyze(&self, mutation: &Mutation, page: &Page) -> Vec<Mutation> {
        let Mutation::RemoveNode { node_id } = mutation else {
            return vec![];
        };
        let Some(node) = page.find_by_identifier(node_id) else {
            return vec![];
        };

        let node_ids: Vec<_> = subtree_ids(node)
            .into_iter()
            .filter(|id| page.entities_settings.by_node.contains_key(id))
            .collect();

        if node_ids.is_empty() {
            vec![]
        } else {
            vec![Mutation::ClearSettings { node_ids }]
        }
    }
}

/// Post-effect engine that applies all registered effects
#[derive(Debug)]
pub struct PostEffectEngine {
    effects: Vec<Box<dyn PostEffect>>,
}

impl PostEffectEngine {
    /// Create engine with default effects
    pub fn new() -> Self {
        Self {
            effects: vec![Box::new(CleanupOrphanedSettings)],
        }
    }

    pub fn with_effect(mut self, effect: Box<dyn PostEffect>) -> Self {
        self.effects.push(effect);
        self
    }

    /// Analyze a mutation and generate all secondary mutations
    pub fn analyze(&self, mutation: &Mutation, page: &Page) -> Vec<Mutation> {
        self.effects
            .iter()
            .flat_map(|effect| effect.analyze(mutation, page))
            .collect()
    }

    /// Apply a mutation with all its post-effects. On error the page may hold
    /// a partial result; callers restore their snapshot.
    pub fn apply_with_effects(
        &self,
        mutation: Mutation,
        page: &mut Page,
    ) -> Result<Vec<Mutation>, MutationError> {
        let secondary = self.analyze(&mutation, page);

        mutation.apply(page)?;
        let mut applied = vec![mutation];

        for secondary_mutation in secondary {
            secondary_mutation.apply(page)?;
            applied.push(secondary_mutation);
        }

        Ok(applied)
    }
}

impl Default for PostEffectEngine {
    fn default() -> Self {
        Self::new()
    }
}
