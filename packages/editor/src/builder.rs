//! # Builder Controller
//!
//! The single state object of one page builder instance. Owns the page
//! pipeline, trigger session, drag coordinator, rebuild scheduler and panel
//! layout; the pattern registry and fragment renderer are injected.
//!
//! Every operation that needs the renderer comes in two phases so a UI loop
//! can await the fetch without holding the builder:
//!
//! ```text
//! begin_insert(trigger, pattern) ──▶ InsertTicket { request }
//!                                          │ renderer.fetch(request)
//! finish_insert(ticket, result)  ◀─────────┘ ──▶ InsertOutcome { patches }
//! ```
//!
//! The `async` helpers (`init`, `insert`, `picker`, `panel`) chain both
//! phases for callers that can hold the builder across the await.

use crate::config::BuilderConfig;
use crate::document::PageDocument;
use crate::errors::{EditError, FetchError};
use crate::mutations::{check_placement, Mutation};
use crate::observer::{DomChange, RebuildScheduler};
use crate::panel::{describe, DisplayMode, PanelAnchor, PanelLayout, PanelType};
use crate::pipeline::{Pipeline, PipelineResult};
use crate::reorder::{DragCoordinator, DragOutcome, DragPhase, ReorderGroup};
use crate::session::{FetchTicket, PickerTicket, Trigger, TriggerSession};
use crate::synchronizer::{adopt_fragment, FragmentRenderer, FragmentRequest};
use npb_tree::{
    rebuild_from_html, GroupingId, Node, NodeId, NodeKind, Page, PatternConfig, PatternRegistry,
    SectionType, StaticPatternRegistry, Variant,
};
use tracing::{debug, error, info, warn};

/// Insert waiting for its fragment
#[derive(Debug, Clone)]
pub struct InsertTicket {
    fetch: FetchTicket,
    request: FragmentRequest,
    pattern: String,
    family: Variant,
}

impl InsertTicket {
    pub fn request(&self) -> &FragmentRequest {
        &self.request
    }

    pub fn trigger(&self) -> &Trigger {
        &self.fetch.trigger
    }
}

/// A picker the UI has to fetch
#[derive(Debug, Clone, PartialEq)]
pub struct PickerOpening {
    pub ticket: PickerTicket,
    pub request: FragmentRequest,
}

#[derive(Debug, Clone)]
pub struct InsertOutcome {
    pub node_id: NodeId,
    pub result: PipelineResult,
    /// Section picker opened for a freshly added row
    pub follow_up: Option<PickerOpening>,
}

/// Panel waiting for its markup
#[derive(Debug, Clone, PartialEq)]
pub struct PanelTicket {
    pub request: FragmentRequest,
}

pub struct Builder<R, P = StaticPatternRegistry> {
    renderer: R,
    registry: P,
    pipeline: Pipeline,
    session: TriggerSession,
    drag: DragCoordinator,
    scheduler: RebuildScheduler,
    panel: PanelLayout,
    auto_add_section: bool,
}

impl<R: FragmentRenderer> Builder<R, StaticPatternRegistry> {
    pub fn from_config(renderer: R, config: &BuilderConfig, page_key: impl Into<String>) -> Self {
        let mut builder = Self::new(renderer, config.registry(), page_key);
        builder.panel = config.panel_layout();
        builder.auto_add_section = config.auto_add_section;
        builder
    }
}

impl<R: FragmentRenderer, P: PatternRegistry> Builder<R, P> {
    pub fn new(renderer: R, registry: P, page_key: impl Into<String>) -> Self {
        let defaults = BuilderConfig::default();
        Self {
            renderer,
            registry,
            pipeline: Pipeline::new(PageDocument::new(page_key)),
            session: TriggerSession::new(),
            drag: DragCoordinator::new(),
            scheduler: RebuildScheduler::new(),
            panel: defaults.panel_layout(),
            auto_add_section: defaults.auto_add_section,
        }
    }

    pub fn with_auto_add_section(mut self, enabled: bool) -> Self {
        self.auto_add_section = enabled;
        self
    }

    pub fn page(&self) -> &Page {
        self.pipeline.page()
    }

    pub fn version(&self) -> u64 {
        self.pipeline.document().version
    }

    pub fn session(&self) -> &TriggerSession {
        &self.session
    }

    pub fn registry(&self) -> &P {
        &self.registry
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn drag_phase(&self) -> DragPhase {
        self.drag.phase()
    }

    pub fn panel_layout(&self) -> &PanelLayout {
        &self.panel
    }

    // -- Page init and resync --

    /// Adopt the page markup. A failed fetch leaves the page empty.
    pub fn finish_init(&mut self, result: Result<String, FetchError>) -> Result<u64, EditError> {
        let html = result.map_err(|e| {
            error!(error = %e, "Page fetch failed");
            EditError::FetchFailure(e)
        })?;
        self.resync_from_markup(&html)
    }

    /// Replace the model with a rebuild of rendered markup
    pub fn resync_from_markup(&mut self, html: &str) -> Result<u64, EditError> {
        let page = rebuild_from_html(html)?;
        let version = self.pipeline.resync(page);
        info!(version, nodes = self.page().node_count(), "Page rebuilt from markup");
        Ok(version)
    }

    /// Record a DOM change for the next flush
    pub fn observe(&mut self, change: &DomChange) -> bool {
        self.scheduler.notify(change)
    }

    /// Run the pending rebuild, if any, against the current view markup
    pub fn flush_rebuild(&mut self, html: &str) -> Result<Option<u64>, EditError> {
        match self.scheduler.flush() {
            Some(coalesced) => {
                debug!(coalesced, "Flushing rebuild");
                self.resync_from_markup(html).map(Some)
            }
            None => Ok(None),
        }
    }

    // -- Pickers --

    pub fn open_picker(&mut self, trigger: Trigger) -> Result<PickerOpening, EditError> {
        let is_special = match trigger.kind {
            NodeKind::Row => None,
            _ => Some(self.family_of(&trigger.grouping) == Variant::Special),
        };
        let request = FragmentRequest::Picker {
            kind: trigger.kind,
            is_special,
        };
        let ticket = self.session.open_picker(trigger)?;
        Ok(PickerOpening { ticket, request })
    }

    /// Hand the picker markup in. Returns `None` for a response that lost
    /// its picker to a dismiss or a newer picker.
    pub fn picker_response(
        &mut self,
        ticket: PickerTicket,
        result: Result<String, FetchError>,
    ) -> Result<Option<String>, EditError> {
        if !self.session.is_live(ticket) {
            debug!(generation = ticket.generation, "Discarding late picker response");
            return Ok(None);
        }

        match result {
            Ok(html) => {
                self.session.fill_picker(ticket, html.clone());
                Ok(Some(html))
            }
            Err(e) => {
                error!(error = %e, "Picker fetch failed");
                self.session.close_picker(ticket);
                Err(EditError::FetchFailure(e))
            }
        }
    }

    /// Patterns the open picker offers
    pub fn picker_choices(&self) -> Result<Vec<&PatternConfig>, EditError> {
        let picker = self.session.active_picker().ok_or(EditError::NoActivePicker)?;
        let special = self.family_of(&picker.trigger.grouping) == Variant::Special;
        Ok(self.registry.choices(picker.trigger.kind, special))
    }

    /// Pick a pattern in the open picker and start its insert
    pub fn choose(&mut self, pattern: &str) -> Result<InsertTicket, EditError> {
        let trigger = self.session.choose()?;
        self.begin_insert(trigger, pattern)
    }

    /// Click outside the picker
    pub fn dismiss(&mut self) {
        debug!("Picker dismissed");
        self.session.dismiss();
    }

    // -- Inserts --

    pub fn begin_insert(&mut self, trigger: Trigger, pattern: &str) -> Result<InsertTicket, EditError> {
        self.check_insert(&trigger, pattern).map_err(|e| {
            warn!(%trigger, pattern, error = %e, "Insert rejected");
            e
        })?;

        let family = self.family_of(&trigger.grouping);
        let section_type = match family {
            Variant::Special => SectionType::Special,
            _ => SectionType::Standard,
        };
        let request = match trigger.kind {
            NodeKind::Row => FragmentRequest::Row {
                pattern: pattern.to_string(),
            },
            NodeKind::Section => FragmentRequest::Section {
                pattern: pattern.to_string(),
                section_type,
            },
            NodeKind::Block => FragmentRequest::Block {
                pattern: pattern.to_string(),
                iteration: self.block_count_of_owner(&trigger.grouping),
                block_type: section_type,
            },
        };

        let fetch = self.session.begin_fetch(trigger)?;
        Ok(InsertTicket {
            fetch,
            request,
            pattern: pattern.to_string(),
            family,
        })
    }

    pub fn finish_insert(
        &mut self,
        ticket: InsertTicket,
        result: Result<String, FetchError>,
    ) -> Result<InsertOutcome, EditError> {
        self.session.finish_fetch(&ticket.fetch);
        let trigger = ticket.fetch.trigger;

        let html = result.map_err(|e| {
            error!(%trigger, error = %e, "Fragment fetch failed");
            EditError::FetchFailure(e)
        })?;

        let adopted = adopt_fragment(
            self.pipeline.document_mut(),
            &self.registry,
            trigger.kind,
            &ticket.pattern,
            ticket.family,
            &html,
        )
        .map_err(|e| {
            error!(%trigger, error = %e, "Unusable fragment");
            EditError::FetchFailure(e)
        })?;

        let node_id = adopted.node.id.clone();
        let mutation = Mutation::InsertNode {
            grouping: trigger.grouping.clone(),
            after: trigger.after.clone(),
            node: adopted.node,
            settings: adopted.settings,
        };
        let result = self
            .pipeline
            .apply_with_fragment(mutation, Some(adopted.html))
            .map_err(|e| {
                warn!(%trigger, error = %e, "Insert rejected after fetch");
                EditError::from(e)
            })?;
        info!(version = result.version, node = %node_id, %trigger, "Node inserted");

        let follow_up = if trigger.kind == NodeKind::Row && self.auto_add_section {
            self.section_trigger_for(&node_id)
                .and_then(|t| self.open_picker(t).ok())
        } else {
            None
        };

        Ok(InsertOutcome {
            node_id,
            result,
            follow_up,
        })
    }

    fn check_insert(&self, trigger: &Trigger, pattern: &str) -> Result<(), EditError> {
        let config = self
            .registry
            .resolve(trigger.kind, pattern)
            .ok_or_else(|| EditError::invalid_pattern(trigger.kind, pattern))?;

        let grouping = self
            .page()
            .grouping(&trigger.grouping)
            .ok_or_else(|| EditError::GroupingNotFound(trigger.grouping.clone()))?;

        if trigger.grouping.accepts() != trigger.kind {
            return Err(EditError::IncompatibleTarget(format!(
                "{} does not accept a {}",
                trigger.grouping, trigger.kind
            )));
        }
        if let Some(after) = &trigger.after {
            if grouping.position(after).is_none() {
                return Err(EditError::IncompatibleTarget(format!(
                    "{} is not a child of {}",
                    after, trigger.grouping
                )));
            }
        }

        let draft_id = NodeId::new("");
        let draft = match trigger.kind {
            NodeKind::Row => Node::row(draft_id, pattern),
            NodeKind::Section => Node::section(draft_id, pattern, SectionType::Standard),
            NodeKind::Block => {
                let variant = if config.fullscreen_only {
                    Variant::Full
                } else {
                    Variant::Standard
                };
                Node::block(draft_id, pattern, variant)
            }
        };
        check_placement(self.page(), &trigger.grouping, &draft)?;

        if self.session.is_disabled(trigger) {
            return Err(EditError::TriggerBusy(trigger.to_string()));
        }
        Ok(())
    }

    fn family_of(&self, grouping: &GroupingId) -> Variant {
        self.page()
            .row_of_grouping(grouping)
            .map_or(Variant::Standard, |row| row.variant)
    }

    fn block_count_of_owner(&self, grouping: &GroupingId) -> usize {
        grouping
            .owner()
            .and_then(|owner| self.page().find_by_identifier(owner))
            .map_or(0, |owner| owner.block_count())
    }

    fn section_trigger_for(&self, row_id: &NodeId) -> Option<Trigger> {
        let row = self.page().find_by_identifier(row_id)?;
        let grouping = match row.variant {
            Variant::Standard => GroupingId::sections(row_id.clone()),
            Variant::Special => GroupingId::special_sections(row_id.clone()),
            Variant::Full => return None,
        };
        self.page().grouping(&grouping)?;
        Some(Trigger::new(NodeKind::Section, grouping))
    }

    // -- Direct edits --

    pub fn remove_node(&mut self, node_id: &NodeId) -> Result<PipelineResult, EditError> {
        self.apply(Mutation::RemoveNode {
            node_id: node_id.clone(),
        })
    }

    pub fn rename_node(&mut self, node_id: &NodeId, label: &str) -> Result<PipelineResult, EditError> {
        self.apply(Mutation::RenameNode {
            node_id: node_id.clone(),
            label: label.to_string(),
        })
    }

    pub fn set_expanded(&mut self, node_id: &NodeId, expanded: bool) -> Result<PipelineResult, EditError> {
        self.apply(Mutation::SetExpanded {
            node_id: node_id.clone(),
            expanded,
        })
    }

    fn apply(&mut self, mutation: Mutation) -> Result<PipelineResult, EditError> {
        let description = format!("{:?}", mutation);
        let node = mutation.node_id().map(NodeId::to_string).unwrap_or_default();
        match self.pipeline.apply_mutation(mutation) {
            Ok(result) => {
                info!(version = result.version, %node, patches = result.patches.len(), "Applied {}", description);
                Ok(result)
            }
            Err(e) => {
                warn!(%node, error = %e, "Rejected {}", description);
                Err(e.into())
            }
        }
    }

    // -- Drag and drop --

    pub fn begin_drag(&mut self, node_id: &NodeId) -> Result<ReorderGroup, EditError> {
        let gesture = self.drag.begin(self.pipeline.page(), &self.registry, node_id)?;
        Ok(gesture.group.clone())
    }

    /// Release the dragged node over `target`, `None` outside any grouping
    pub fn drop_drag(&mut self, target: Option<(GroupingId, usize)>) -> Result<DragOutcome, EditError> {
        let outcome = self.drag.drop(&mut self.pipeline, &self.registry, target)?;
        if let DragOutcome::Committed { result } = &outcome {
            info!(version = result.version, "Reorder committed");
        }
        Ok(outcome)
    }

    pub fn cancel_drag(&mut self) -> Result<DragOutcome, EditError> {
        self.drag.cancel()
    }

    // -- Side panel --

    pub fn begin_panel(&self, anchor: &PanelAnchor, panel_type: PanelType) -> Result<PanelTicket, EditError> {
        let info = describe(self.page(), anchor)?;
        Ok(PanelTicket {
            request: FragmentRequest::Panel {
                panel_type,
                info,
                mode: self.panel.mode,
            },
        })
    }

    pub fn finish_panel(&self, ticket: PanelTicket, result: Result<String, FetchError>) -> Result<String, EditError> {
        result.map_err(|e| {
            error!(endpoint = ticket.request.endpoint(), error = %e, "Panel fetch failed");
            EditError::FetchFailure(e)
        })
    }

    /// Switch the panel display mode, returns the page width now reserved
    pub fn set_display_mode(&mut self, mode: DisplayMode) -> u32 {
        self.panel.set_mode(mode)
    }

    pub fn resize_panel(&mut self, width: u32) {
        self.panel.resize(width);
    }

    // -- One-shot async helpers --

    pub async fn init(&mut self) -> Result<u64, EditError> {
        let result = self.renderer.fetch(&FragmentRequest::Page).await;
        self.finish_init(result)
    }

    pub async fn insert(&mut self, trigger: Trigger, pattern: &str) -> Result<InsertOutcome, EditError> {
        let ticket = self.begin_insert(trigger, pattern)?;
        let result = self.renderer.fetch(ticket.request()).await;
        self.finish_insert(ticket, result)
    }

    pub async fn picker(&mut self, trigger: Trigger) -> Result<Option<String>, EditError> {
        let opening = self.open_picker(trigger)?;
        let result = self.renderer.fetch(&opening.request).await;
        self.picker_response(opening.ticket, result)
    }

    pub async fn panel(&self, anchor: &PanelAnchor, panel_type: PanelType) -> Result<String, EditError> {
        let ticket = self.begin_panel(anchor, panel_type)?;
        let result = self.renderer.fetch(&ticket.request).await;
        self.finish_panel(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;

    /// Renderer that is never reached by the synchronous paths
    struct Offline;

    impl FragmentRenderer for Offline {
        fn fetch(&self, _request: &FragmentRequest) -> impl Future<Output = Result<String, FetchError>> + Send {
            async { Err(FetchError::Transport("offline".to_string())) }
        }
    }

    fn builder() -> Builder<Offline> {
        let mut builder = Builder::new(Offline, StaticPatternRegistry::builtin(), "/home");
        builder
            .resync_from_markup(
                r#"<div id="npb-rows-wrapper">
                     <div id="r1" class="npb-row" data-pattern="standard-1">
                       <div id="s1" class="npb-section" data-pattern="sec-a">
                         <div class="npb-blocks-wrapper">
                           <div id="b1" class="npb-block" data-pattern="text"></div>
                         </div>
                       </div>
                     </div>
                     <div id="r2" class="npb-row" data-pattern="special-1">
                       <div class="npb-row-special-blocks">
                         <div id="b2" class="npb-block" data-pattern="text"></div>
                       </div>
                       <div class="npb-row-special-section"></div>
                     </div>
                   </div>"#,
            )
            .unwrap();
        builder
    }

    #[test]
    fn test_block_request_params() {
        let mut builder = builder();
        let ticket = builder
            .begin_insert(Trigger::new(NodeKind::Block, GroupingId::blocks("s1", 0)), "image")
            .unwrap();

        assert_eq!(
            ticket.request(),
            &FragmentRequest::Block {
                pattern: "image".to_string(),
                iteration: 1,
                block_type: SectionType::Standard,
            }
        );
        assert!(builder.session().is_disabled(ticket.trigger()));
    }

    #[test]
    fn test_insert_validation() {
        let mut builder = builder();

        let unknown = builder.begin_insert(Trigger::new(NodeKind::Row, GroupingId::Rows), "mystery");
        assert!(matches!(unknown, Err(EditError::InvalidPattern { .. })));

        let fullscreen = builder.begin_insert(Trigger::new(NodeKind::Block, GroupingId::blocks("s1", 0)), "hero");
        assert!(fullscreen.unwrap_err().is_incompatible());

        let bad_anchor = builder.begin_insert(
            Trigger::new(NodeKind::Block, GroupingId::blocks("s1", 0)).after("b2"),
            "text",
        );
        assert!(bad_anchor.unwrap_err().is_incompatible());

        // Special row already holds blocks
        let exclusive = builder.begin_insert(
            Trigger::new(NodeKind::Section, GroupingId::special_sections("r2")),
            "sec-special-a",
        );
        assert!(exclusive.unwrap_err().is_incompatible());

        assert_eq!(builder.session().disabled_count(), 0);
    }

    #[test]
    fn test_busy_trigger() {
        let mut builder = builder();
        let trigger = Trigger::new(NodeKind::Row, GroupingId::Rows);
        let _ticket = builder.begin_insert(trigger.clone(), "full").unwrap();

        assert!(matches!(
            builder.begin_insert(trigger, "full"),
            Err(EditError::TriggerBusy(_))
        ));
    }

    #[test]
    fn test_picker_special_flag_and_choices() {
        let mut builder = builder();
        let opening = builder
            .open_picker(Trigger::new(NodeKind::Block, GroupingId::special_blocks("r2")))
            .unwrap();
        assert_eq!(
            opening.request,
            FragmentRequest::Picker {
                kind: NodeKind::Block,
                is_special: Some(true),
            }
        );
        assert!(builder.picker_choices().is_ok());

        let html = builder
            .picker_response(opening.ticket, Ok("<ul class=\"npb-fixed-modal\"/>".to_string()))
            .unwrap();
        assert!(html.is_some());
    }

    #[test]
    fn test_edits_and_rename_default() {
        let mut builder = builder();

        builder.rename_node(&"s1".into(), "Pricing").unwrap();
        let result = builder.rename_node(&"s1".into(), "   ").unwrap();
        assert_eq!(builder.page().find_by_identifier(&"s1".into()).unwrap().label, "section");
        assert_eq!(result.version, builder.version());

        builder.set_expanded(&"r1".into(), false).unwrap();
        assert!(!builder.page().find_by_identifier(&"r1".into()).unwrap().expanded);

        assert!(matches!(
            builder.remove_node(&"nope".into()),
            Err(EditError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_flush_rebuild_only_when_scheduled() {
        let mut builder = builder();
        let html = r#"<div id="npb-rows-wrapper"></div>"#;

        assert_eq!(builder.flush_rebuild(html).unwrap(), None);
        assert!(builder.observe(&DomChange {
            target_id: Some("npb-rows-wrapper".to_string()),
            class: None,
        }));
        assert!(builder.flush_rebuild(html).unwrap().is_some());
        assert!(builder.page().rows().is_empty());
    }

    #[test]
    fn test_panel_request_uses_current_mode() {
        let mut builder = builder();
        assert_eq!(builder.set_display_mode(DisplayMode::Sidebar), 400);

        let anchor = PanelAnchor::enclosing(builder.page(), &"b1".into()).unwrap();
        let ticket = builder.begin_panel(&anchor, PanelType::Revisions).unwrap();
        let FragmentRequest::Panel { info, mode, .. } = &ticket.request else {
            panic!("Expected panel request");
        };
        assert_eq!(info.id.as_str(), "b1");
        assert_eq!(*mode, DisplayMode::Sidebar);
    }
}
