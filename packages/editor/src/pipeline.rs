//! # Editing Pipeline
//!
//! Coordinates one edit: Snapshot → Mutate (+ post-effects) → Diff
//!
//! The Pipeline manages:
//! - Applying mutations and their post-effects atomically
//! - Versioning (only successful edits move the version)
//! - Deriving view patches from the before/after snapshots

use crate::document::PageDocument;
use crate::mutations::{Mutation, MutationError};
use crate::post_effects::PostEffectEngine;
use crate::view_diff::{diff_pages_with, ViewPatch};
use npb_tree::{NodeId, Page};
use std::collections::BTreeMap;

/// Manages the model → view pipeline
#[derive(Debug)]
pub struct Pipeline {
    document: PageDocument,
    effects: PostEffectEngine,
}

impl Pipeline {
    pub fn new(document: PageDocument) -> Self {
        Self {
            document,
            effects: PostEffectEngine::new(),
        }
    }

    pub fn with_effects(mut self, effects: PostEffectEngine) -> Self {
        self.effects = effects;
        self
    }

    /// Apply mutation and get the view patches it implies
    pub fn apply_mutation(&mut self, mutation: Mutation) -> Result<PipelineResult, MutationError> {
        self.apply_with_fragment(mutation, None)
    }

    /// Apply mutation, using `html` as the view markup of an inserted node
    ///
    /// This:
    /// 1. Snapshots the page
    /// 2. Applies the mutation and its post-effects
    /// 3. Restores the snapshot if anything fails
    /// 4. Diffs snapshot against the new page
    pub fn apply_with_fragment(
        &mut self,
        mutation: Mutation,
        html: Option<String>,
    ) -> Result<PipelineResult, MutationError> {
        let fragments: BTreeMap<NodeId, String> = match (&mutation, html) {
            (Mutation::InsertNode { node, .. }, Some(html)) => [(node.id.clone(), html)].into(),
            _ => BTreeMap::new(),
        };

        let before = self.document.page().clone();

        let applied = match self.effects.apply_with_effects(mutation, self.document.page_mut()) {
            Ok(applied) => applied,
            Err(e) => {
                *self.document.page_mut() = before;
                return Err(e);
            }
        };

        let version = self.document.bump_version();
        let patches = diff_pages_with(&before, self.document.page(), &fragments);

        Ok(PipelineResult {
            version,
            applied,
            patches,
        })
    }

    /// Replace the whole model (page init, explicit resync). The view
    /// already shows this page, so no patches are produced.
    pub fn resync(&mut self, page: Page) -> u64 {
        self.document.replace_page(page)
    }

    pub fn document(&self) -> &PageDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut PageDocument {
        &mut self.document
    }

    pub fn page(&self) -> &Page {
        self.document.page()
    }
}

/// Result of pipeline execution
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// New version number
    pub version: u64,

    /// Primary mutation followed by its post-effects
    pub applied: Vec<Mutation>,

    /// View updates, in application order
    pub patches: Vec<ViewPatch>,
}
