//! Rebuild and render-back tests over full rendered pages

use npb_tree::render::{page_to_html, page_to_markup};
use npb_tree::{
    rebuild, rebuild_from_html, GroupingId, Grouping, Node, NodeId, NodeKind, Page, RowLayout,
    SectionType, SpecialSlots, Variant,
};
use proptest::prelude::*;

const PAGE: &str = include_str!("fixtures/page.html");

#[test]
fn test_rebuild_fixture_page() {
    let page = rebuild_from_html(PAGE).unwrap();

    let counts = page.counts();
    assert_eq!((counts.rows, counts.sections, counts.blocks), (4, 2, 6));
    assert!(page.validate().is_ok());

    let variants: Vec<_> = page.rows().iter().map(|r| r.variant).collect();
    assert_eq!(
        variants,
        vec![Variant::Standard, Variant::Full, Variant::Special, Variant::Special]
    );

    let intro = &page.rows()[0];
    assert_eq!(intro.label, "Intro");
    let section = page.find_by_identifier(&"sec-1".into()).unwrap();
    let wrappers = section.groupings();
    assert_eq!(wrappers.len(), 2);
    assert_eq!(wrappers[0].1.len(), 2);
    assert!(!wrappers[0].1.initial_add);
    assert!(wrappers[1].1.initial_add);

    let hero = page.find_by_identifier(&"blk-3".into()).unwrap();
    assert!(hero.is_fullscreen_only());
    assert_eq!(hero.label, "Big hero");
    let button = page.find_by_identifier(&"blk-4".into()).unwrap();
    assert_eq!(button.variant, Variant::Standard);
    assert_eq!(button.label, "Button");

    assert!(!page.rows()[2].expanded);
}

#[test]
fn test_special_rows_distinguish_slots() {
    let page = rebuild_from_html(PAGE).unwrap();

    let sectioned = page.rows()[2].special_slots().unwrap();
    assert!(sectioned.blocks.is_none());
    assert_eq!(sectioned.sections.as_ref().unwrap().len(), 1);

    // Blocks inside special sections are flattened like standard ones
    let video = page.find_by_identifier(&"blk-5".into()).unwrap();
    assert_eq!(video.variant, Variant::Special);
    assert_eq!(
        page.locate(&video.id).unwrap().grouping,
        GroupingId::blocks("sec-2", 0)
    );

    let blocky = page.rows()[3].special_slots().unwrap();
    assert!(blocky.sections.is_none());
    assert_eq!(
        page.locate(&"blk-6".into()).unwrap().grouping,
        GroupingId::special_blocks("row-4")
    );
}

#[test]
fn test_settings_are_collected() {
    let page = rebuild_from_html(PAGE).unwrap();

    let text = page.find_by_identifier(&"blk-1".into()).unwrap();
    assert_eq!(page.settings_for(text).unwrap()["align"], "center");

    // No node entry, falls back to the pattern entry
    let other_text = page.find_by_identifier(&"blk-6".into()).unwrap();
    assert_eq!(page.settings_for(other_text).unwrap()["align"], "left");

    let image = page.find_by_identifier(&"blk-2".into()).unwrap();
    assert!(page.settings_for(image).is_none());
}

#[test]
fn test_rebuild_is_idempotent_on_fixture() {
    let first = rebuild_from_html(PAGE).unwrap();
    let second = rebuild(&page_to_markup(&first)).unwrap();
    assert_eq!(first, second);

    let third = rebuild_from_html(&page_to_html(&second)).unwrap();
    assert_eq!(second, third);
}

fn block_pattern() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("text"), Just("image"), Just("button"), Just("video")]
}

fn blocks(prefix: String, variant: Variant) -> impl Strategy<Value = Grouping> {
    prop::collection::vec(block_pattern(), 0..4).prop_map(move |patterns| {
        Grouping::with_entities(
            patterns
                .into_iter()
                .enumerate()
                .map(|(i, p)| Node::block(format!("{prefix}-b{i}"), p, variant))
                .collect(),
        )
    })
}

fn sections(prefix: String, section_type: SectionType) -> impl Strategy<Value = Grouping> {
    prop::collection::vec(prop::collection::vec(0usize..3, 1..3), 0..3).prop_map(move |shape| {
        let family = section_type.variant();
        Grouping::with_entities(
            shape
                .into_iter()
                .enumerate()
                .map(|(s, wrapper_sizes)| {
                    let id = format!("{prefix}-s{s}");
                    let wrappers = wrapper_sizes
                        .into_iter()
                        .enumerate()
                        .map(|(w, size)| {
                            Grouping::with_entities(
                                (0..size)
                                    .map(|b| Node::block(format!("{id}-w{w}-b{b}"), "text", family))
                                    .collect(),
                            )
                        })
                        .collect();
                    Node::section(id, "sec-a", section_type).with_wrappers(wrappers)
                })
                .collect(),
        )
    })
}

fn row(index: usize) -> impl Strategy<Value = Node> {
    let id = format!("r{index}");
    prop_oneof![
        blocks(id.clone(), Variant::Full).prop_map({
            let id = id.clone();
            move |blocks| Node::row(id.clone(), "full").with_layout(RowLayout::Full { blocks })
        }),
        sections(id.clone(), SectionType::Standard).prop_map({
            let id = id.clone();
            move |sections| {
                Node::row(id.clone(), "standard-1").with_layout(RowLayout::Standard { sections })
            }
        }),
        sections(id.clone(), SectionType::Special).prop_map({
            let id = id.clone();
            move |sections| {
                Node::row(id.clone(), "special-1").with_layout(RowLayout::Special(SpecialSlots {
                    blocks: None,
                    sections: Some(sections),
                }))
            }
        }),
        blocks(id.clone(), Variant::Special).prop_map(move |blocks| {
            Node::row(id.clone(), "special-2").with_layout(RowLayout::Special(SpecialSlots {
                blocks: Some(blocks),
                sections: None,
            }))
        }),
    ]
}

fn page() -> impl Strategy<Value = Page> {
    (0usize..5)
        .prop_flat_map(|n| (0..n).map(row).collect::<Vec<_>>())
        .prop_map(Page::with_rows)
}

proptest! {
    #[test]
    fn prop_render_rebuild_is_identity(page in page()) {
        prop_assert!(page.validate().is_ok());
        let rebuilt = rebuild(&page_to_markup(&page)).unwrap();
        prop_assert_eq!(&rebuilt, &page);
        prop_assert_eq!(rebuilt.node_count(), page.node_count());
    }
}

#[test]
fn test_find_by_identifier_on_rows() {
    let page = rebuild_from_html(PAGE).unwrap();
    let row = npb_tree::find_by_identifier(&page, &NodeId::from("row-2")).unwrap();
    assert_eq!(row.kind, NodeKind::Row);
    assert_eq!(row.block_count(), 2);
}
