//! # Drag-Reorder Coordinator
//!
//! ```text
//!          begin              drop (accepted)
//!   Idle ────────▶ Dragging ──────────────────▶ Committed
//!                     │
//!                     └── drop (rejected/outside), cancel ──▶ Cancelled
//! ```
//!
//! A dragged node can only land in a grouping of its reorder group: rows pool
//! in the page root, sections pool across the section slots of rows of one
//! family, blocks pool across the block groupings of rows of one family.
//! Families pool together only when the registry declares it.
//!
//! A cancelled gesture yields exactly one `RestorePosition` patch.

use crate::errors::EditError;
use crate::mutations::Mutation;
use crate::pipeline::{Pipeline, PipelineResult};
use crate::view_diff::ViewPatch;
use npb_tree::{GroupingId, Location, NodeId, NodeKind, Page, PatternRegistry, Variant};
use tracing::debug;

/// Groupings a dragged node may be dropped into
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderGroup {
    pub kind: NodeKind,
    /// Row family of the dragged node, `None` for rows
    pub family: Option<Variant>,
    pub groupings: Vec<GroupingId>,
}

impl ReorderGroup {
    pub fn contains(&self, grouping: &GroupingId) -> bool {
        self.groupings.contains(grouping)
    }
}

/// Row family a grouping belongs to
fn family_of(page: &Page, grouping: &GroupingId) -> Option<Variant> {
    page.row_of_grouping(grouping).map(|row| row.variant)
}

fn families_compatible<P: PatternRegistry + ?Sized>(
    registry: &P,
    kind: NodeKind,
    from: Variant,
    to: Variant,
) -> bool {
    from == to || registry.allows_cross_family(kind, from, to)
}

pub fn reorder_group<P: PatternRegistry + ?Sized>(
    page: &Page,
    registry: &P,
    node_id: &NodeId,
) -> Option<ReorderGroup> {
    let node = page.find_by_identifier(node_id)?;

    if node.kind == NodeKind::Row {
        return Some(ReorderGroup {
            kind: NodeKind::Row,
            family: None,
            groupings: vec![GroupingId::Rows],
        });
    }

    let family = page.row_of(node_id)?.variant;
    let groupings = page
        .groupings()
        .into_iter()
        .filter(|g| g.accepts() == node.kind)
        .filter(|g| {
            family_of(page, g)
                .map_or(false, |to| families_compatible(registry, node.kind, family, to))
        })
        .collect();

    Some(ReorderGroup {
        kind: node.kind,
        family: Some(family),
        groupings,
    })
}

/// Accept or reject moving `node_id` to `index` of `grouping`
pub fn check_reorder<P: PatternRegistry + ?Sized>(
    page: &Page,
    registry: &P,
    node_id: &NodeId,
    grouping: &GroupingId,
    index: usize,
) -> Result<(), EditError> {
    let node = page
        .find_by_identifier(node_id)
        .ok_or_else(|| EditError::NodeNotFound(node_id.clone()))?;
    if page.grouping(grouping).is_none() {
        return Err(EditError::GroupingNotFound(grouping.clone()));
    }

    if node.kind != NodeKind::Row {
        let from = page.row_of(node_id).map(|row| row.variant);
        let to = family_of(page, grouping);
        if let (Some(from), Some(to)) = (from, to) {
            if !families_compatible(registry, node.kind, from, to) {
                return Err(EditError::IncompatibleTarget(format!(
                    "{} cannot move from a {} row into a {} row",
                    node.kind, from, to
                )));
            }
        }
    }

    Mutation::MoveNode {
        node_id: node_id.clone(),
        grouping: grouping.clone(),
        index,
    }
    .validate(page)
    .map_err(EditError::from)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragGesture {
    pub node_id: NodeId,
    pub origin: Location,
    pub group: ReorderGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging,
    Committed,
    Cancelled,
}

#[derive(Debug, Clone)]
pub enum DragOutcome {
    Committed {
        result: PipelineResult,
    },
    Cancelled {
        /// Always the single `RestorePosition` of the dragged node
        patches: Vec<ViewPatch>,
        /// Why the drop was refused, `None` for an explicit cancel or a drop
        /// outside any grouping
        reason: Option<EditError>,
    },
}

impl DragOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, DragOutcome::Committed { .. })
    }

    pub fn patches(&self) -> &[ViewPatch] {
        match self {
            DragOutcome::Committed { result } => &result.patches,
            DragOutcome::Cancelled { patches, .. } => patches,
        }
    }
}

/// Drag gesture state machine, one gesture at a time
#[derive(Debug, Default)]
pub struct DragCoordinator {
    gesture: Option<DragGesture>,
    phase: DragPhase,
}

impl DragCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn gesture(&self) -> Option<&DragGesture> {
        self.gesture.as_ref()
    }

    pub fn begin<P: PatternRegistry + ?Sized>(
        &mut self,
        page: &Page,
        registry: &P,
        node_id: &NodeId,
    ) -> Result<&DragGesture, EditError> {
        if self.gesture.is_some() {
            return Err(EditError::IncompatibleTarget(
                "a drag gesture is already in progress".to_string(),
            ));
        }

        let origin = page
            .locate(node_id)
            .ok_or_else(|| EditError::NodeNotFound(node_id.clone()))?;
        let group = reorder_group(page, registry, node_id)
            .ok_or_else(|| EditError::NodeNotFound(node_id.clone()))?;

        self.phase = DragPhase::Dragging;
        Ok(&*self.gesture.insert(DragGesture {
            node_id: node_id.clone(),
            origin,
            group,
        }))
    }

    /// Drop the dragged node. `target` is `None` when released outside any
    /// grouping.
    pub fn drop<P: PatternRegistry + ?Sized>(
        &mut self,
        pipeline: &mut Pipeline,
        registry: &P,
        target: Option<(GroupingId, usize)>,
    ) -> Result<DragOutcome, EditError> {
        let gesture = self.gesture.take().ok_or(EditError::DragNotActive)?;

        let Some((grouping, index)) = target else {
            debug!(node = %gesture.node_id, "Drop outside any grouping");
            return Ok(self.cancelled(gesture, None));
        };

        let checked = check_reorder(pipeline.page(), registry, &gesture.node_id, &grouping, index).and_then(|_| {
            if gesture.group.contains(&grouping) {
                Ok(())
            } else {
                Err(EditError::IncompatibleTarget(format!(
                    "{} is outside the reorder group of {}",
                    grouping, gesture.node_id
                )))
            }
        });
        if let Err(e) = checked {
            debug!(node = %gesture.node_id, %grouping, error = %e, "Reorder rejected");
            return Ok(self.cancelled(gesture, Some(e)));
        }

        let mutation = Mutation::MoveNode {
            node_id: gesture.node_id.clone(),
            grouping,
            index,
        };
        match pipeline.apply_mutation(mutation) {
            Ok(result) => {
                self.phase = DragPhase::Committed;
                Ok(DragOutcome::Committed { result })
            }
            Err(e) => {
                let e = EditError::from(e);
                debug!(node = %gesture.node_id, error = %e, "Move failed");
                Ok(self.cancelled(gesture, Some(e)))
            }
        }
    }

    pub fn cancel(&mut self) -> Result<DragOutcome, EditError> {
        let gesture = self.gesture.take().ok_or(EditError::DragNotActive)?;
        debug!(node = %gesture.node_id, "Drag cancelled");
        Ok(self.cancelled(gesture, None))
    }

    fn cancelled(&mut self, gesture: DragGesture, reason: Option<EditError>) -> DragOutcome {
        self.phase = DragPhase::Cancelled;
        DragOutcome::Cancelled {
            patches: vec![ViewPatch::RestorePosition {
                node_id: gesture.node_id,
                grouping: gesture.origin.grouping,
                index: gesture.origin.index,
            }],
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PageDocument;
    use npb_tree::{CrossFamilyRule, StaticPatternRegistry};

    const PAGE: &str = r#"<div id="npb-rows-wrapper">
        <div id="r1" class="npb-row" data-pattern="standard-1">
          <div id="s1" class="npb-section" data-pattern="sec-a">
            <div class="npb-blocks-wrapper">
              <div id="b1" class="npb-block" data-pattern="text"></div>
              <div id="b2" class="npb-block" data-pattern="image"></div>
            </div>
          </div>
        </div>
        <div id="r2" class="npb-row" data-pattern="full">
          <div class="npb-blocks-wrapper">
            <div id="b3" class="npb-block" data-pattern="hero" data-type="full"></div>
            <div id="b4" class="npb-block" data-pattern="button"></div>
          </div>
        </div>
        <div id="r3" class="npb-row" data-pattern="full">
          <div class="npb-blocks-wrapper"></div>
        </div>
        <div id="r4" class="npb-row" data-pattern="standard-2">
          <div id="s2" class="npb-section" data-pattern="sec-b"></div>
        </div>
      </div>"#;

    fn pipeline() -> Pipeline {
        Pipeline::new(PageDocument::from_markup("/home", PAGE).unwrap())
    }

    #[test]
    fn test_reorder_groups() {
        let pipeline = pipeline();
        let registry = StaticPatternRegistry::builtin();
        let page = pipeline.page();

        let rows = reorder_group(page, &registry, &"r2".into()).unwrap();
        assert_eq!(rows.groupings, vec![GroupingId::Rows]);

        let full_blocks = reorder_group(page, &registry, &"b4".into()).unwrap();
        assert_eq!(full_blocks.family, Some(Variant::Full));
        assert_eq!(
            full_blocks.groupings,
            vec![GroupingId::blocks("r2", 0), GroupingId::blocks("r3", 0)]
        );

        let standard_blocks = reorder_group(page, &registry, &"b1".into()).unwrap();
        assert_eq!(
            standard_blocks.groupings,
            vec![GroupingId::blocks("s1", 0), GroupingId::blocks("s2", 0)]
        );

        let sections = reorder_group(page, &registry, &"s1".into()).unwrap();
        assert_eq!(
            sections.groupings,
            vec![GroupingId::sections("r1"), GroupingId::sections("r4")]
        );
    }

    #[test]
    fn test_cross_family_needs_declaration() {
        let pipeline = pipeline();
        let page = pipeline.page();
        let target = GroupingId::blocks("s2", 0);

        let strict = StaticPatternRegistry::builtin();
        let err = check_reorder(page, &strict, &"b4".into(), &target, 0).unwrap_err();
        assert!(err.is_incompatible());

        let lenient = StaticPatternRegistry::builtin().with_cross_family(CrossFamilyRule {
            kind: NodeKind::Block,
            from: Variant::Full,
            to: Variant::Standard,
        });
        assert!(check_reorder(page, &lenient, &"b4".into(), &target, 0).is_ok());
        // Fullscreen-only blocks stay out of standard rows regardless
        assert!(check_reorder(page, &lenient, &"b3".into(), &target, 0)
            .unwrap_err()
            .is_incompatible());
    }

    #[test]
    fn test_cross_family_move_takes_destination_family() {
        let mut pipeline = Pipeline::new(
            PageDocument::from_markup(
                "/home",
                r#"<div id="npb-rows-wrapper">
                     <div id="std" class="npb-row" data-pattern="standard-1">
                       <div id="sec" class="npb-section" data-pattern="sec-a">
                         <div class="npb-blocks-wrapper">
                           <div id="b1" class="npb-block" data-pattern="text"></div>
                         </div>
                       </div>
                     </div>
                     <div id="spc" class="npb-row" data-pattern="special-1">
                       <div class="npb-row-special-section">
                         <div id="sec2" class="npb-section" data-pattern="sec-special-a">
                           <div class="npb-blocks-wrapper"></div>
                         </div>
                       </div>
                     </div>
                   </div>"#,
            )
            .unwrap(),
        );
        let registry = StaticPatternRegistry::builtin().with_cross_family(CrossFamilyRule {
            kind: NodeKind::Block,
            from: Variant::Standard,
            to: Variant::Special,
        });
        let target = GroupingId::blocks("sec2", 0);

        check_reorder(pipeline.page(), &registry, &"b1".into(), &target, 0).unwrap();
        pipeline
            .apply_mutation(Mutation::MoveNode {
                node_id: "b1".into(),
                grouping: target,
                index: 0,
            })
            .unwrap();

        let moved = pipeline.page().find_by_identifier(&"b1".into()).unwrap();
        assert_eq!(moved.variant, Variant::Special);

        let rebuilt =
            npb_tree::rebuild_from_html(&npb_tree::render::page_to_html(pipeline.page())).unwrap();
        assert_eq!(&rebuilt, pipeline.page());
    }

    #[test]
    fn test_committed_drag() {
        let mut pipeline = pipeline();
        let registry = StaticPatternRegistry::builtin();
        let mut drag = DragCoordinator::new();

        drag.begin(pipeline.page(), &registry, &"b4".into()).unwrap();
        assert_eq!(drag.phase(), DragPhase::Dragging);

        let outcome = drag
            .drop(&mut pipeline, &registry, Some((GroupingId::blocks("r3", 0), 0)))
            .unwrap();

        assert!(outcome.is_committed());
        assert_eq!(drag.phase(), DragPhase::Committed);
        assert!(drag.gesture().is_none());
        assert!(outcome.patches().contains(&ViewPatch::SetInitialAdd {
            grouping: GroupingId::blocks("r3", 0),
            visible: false,
        }));
        assert_eq!(
            pipeline.page().locate(&"b4".into()).unwrap().grouping,
            GroupingId::blocks("r3", 0)
        );
    }

    #[test]
    fn test_rejected_drop_restores_origin() {
        let mut pipeline = pipeline();
        let registry = StaticPatternRegistry::builtin();
        let mut drag = DragCoordinator::new();
        let before = pipeline.page().clone();

        drag.begin(pipeline.page(), &registry, &"b1".into()).unwrap();
        // Standard-row block into a full row
        let outcome = drag
            .drop(&mut pipeline, &registry, Some((GroupingId::blocks("r3", 0), 0)))
            .unwrap();

        assert_eq!(drag.phase(), DragPhase::Cancelled);
        assert!(matches!(
            &outcome,
            DragOutcome::Cancelled { reason: Some(e), .. } if e.is_incompatible()
        ));
        assert_eq!(
            outcome.patches(),
            &[ViewPatch::RestorePosition {
                node_id: "b1".into(),
                grouping: GroupingId::blocks("s1", 0),
                index: 0,
            }]
        );
        assert_eq!(pipeline.page(), &before);
        assert_eq!(pipeline.document().version, 0);
    }

    #[test]
    fn test_cancel_and_idle_errors() {
        let mut pipeline = pipeline();
        let registry = StaticPatternRegistry::builtin();
        let mut drag = DragCoordinator::new();

        assert!(matches!(drag.cancel(), Err(EditError::DragNotActive)));
        assert!(matches!(
            drag.drop(&mut pipeline, &registry, None),
            Err(EditError::DragNotActive)
        ));

        drag.begin(pipeline.page(), &registry, &"s1".into()).unwrap();
        assert!(drag.begin(pipeline.page(), &registry, &"s2".into()).is_err());

        let outcome = drag.cancel().unwrap();
        assert!(matches!(
            outcome,
            DragOutcome::Cancelled { reason: None, ref patches } if patches.len() == 1
        ));
    }
}
