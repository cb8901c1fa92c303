//! # Neo Page Builder Editor
//!
//! Editing engine of the page builder: validated mutations on the page tree,
//! fragment fetching and adoption, drag reordering and the side panel.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ builder: one controller per edited page     │
//! │  - triggers, pickers, drags, panel          │
//! │  - injected registry + fragment renderer    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ pipeline: snapshot → mutation → diff        │
//! │  - post-effects (settings cleanup)          │
//! │  - all or nothing, version on success       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ view_diff: Page × Page → ViewPatch          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Model is source of truth**: the view is a projection driven by patches
//! 2. **Rebuild only to resync**: markup is read back on init and on request
//! 3. **Failures are terminal**: a failed fetch or rejected edit changes nothing
//!
//! ## Usage
//!
//! ```rust,ignore
//! use npb_editor::{Builder, BuilderConfig, HttpFragmentRenderer, Trigger};
//! use npb_tree::{GroupingId, NodeKind};
//!
//! let config = BuilderConfig::load(".")?;
//! let renderer = HttpFragmentRenderer::new(&config.renderer_url);
//! let mut builder = Builder::from_config(renderer, &config, "/home");
//!
//! builder.init().await?;
//! let outcome = builder
//!     .insert(Trigger::new(NodeKind::Row, GroupingId::Rows), "standard-1")
//!     .await?;
//! for patch in &outcome.result.patches {
//!     view.apply(patch);
//! }
//! ```

mod builder;
mod config;
mod document;
mod errors;
mod http;
mod mutations;
mod observer;
mod panel;
mod pipeline;
mod post_effects;
mod reorder;
mod session;
mod synchronizer;
mod view_diff;

pub use builder::{Builder, InsertOutcome, InsertTicket, PanelTicket, PickerOpening};
pub use config::{BuilderConfig, ConfigError, PanelConfig, DEFAULT_CONFIG_NAME};
pub use document::PageDocument;
pub use errors::{EditError, FetchError};
pub use http::HttpFragmentRenderer;
pub use mutations::{check_placement, Mutation, MutationError};
pub use observer::{DomChange, RebuildScheduler};
pub use panel::{describe, DisplayMode, NodeDescriptor, PanelAnchor, PanelLayout, PanelType};
pub use pipeline::{Pipeline, PipelineResult};
pub use post_effects::{CleanupOrphanedSettings, PostEffect, PostEffectEngine};
pub use reorder::{
    check_reorder, reorder_group, DragCoordinator, DragGesture, DragOutcome, DragPhase, ReorderGroup,
};
pub use session::{ActivePicker, FetchTicket, PickerTicket, Trigger, TriggerSession};
pub use synchronizer::{adopt_fragment, AdoptedFragment, FragmentRenderer, FragmentRequest};
pub use view_diff::{diff_pages, diff_pages_with, Anchor, ViewPatch};
