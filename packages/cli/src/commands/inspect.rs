use super::load_page;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use npb_editor::BuilderConfig;
use npb_tree::visitor::{walk_grouping, walk_node};
use npb_tree::{GroupingId, Grouping, Node, NodeId, NodeKind, Page, PatternRegistry, Visitor};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Rendered page markup
    pub input: PathBuf,

    /// Print the rebuilt page as JSON instead of a tree
    #[arg(long)]
    pub json: bool,
}

pub fn inspect(args: InspectArgs, cwd: &str) -> Result<()> {
    let (path, page) = load_page(&args.input, cwd)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    let registry = BuilderConfig::load(cwd)?.registry();

    println!("🔍 {} {}", "Inspecting".green().bold(), path.display());
    println!();
    for line in tree_lines(&page) {
        println!("   {}", line);
    }
    println!();

    let counts = page.counts();
    println!(
        "   Rows: {}  Sections: {}  Blocks: {}",
        counts.rows, counts.sections, counts.blocks
    );

    for (id, kind, pattern) in unknown_patterns(&page, &registry) {
        println!(
            "   {} {} {} uses unknown pattern {}",
            "⚠".yellow(),
            kind,
            id,
            pattern.bright_white()
        );
    }
    println!();

    match page.validate() {
        Ok(()) => {
            println!("   {} All invariants hold", "✓".green());
            println!();
            println!("✨ {}", "Done".green().bold());
            Ok(())
        }
        Err(violations) => {
            for violation in &violations {
                println!("   {} {}", "✗".red(), violation);
            }
            println!();
            Err(anyhow!("{} invariant violation(s)", violations.len()))
        }
    }
}

/// Indented outline of the page, one line per grouping and node
pub(crate) fn tree_lines(page: &Page) -> Vec<String> {
    struct Outline {
        depth: usize,
        lines: Vec<String>,
    }

    impl Visitor for Outline {
        fn visit_grouping(&mut self, id: &GroupingId, grouping: &Grouping) {
            let indent = "  ".repeat(self.depth);
            if grouping.initial_add {
                self.lines.push(format!("{}[{}] (empty)", indent, id));
            } else {
                self.lines.push(format!("{}[{}]", indent, id));
            }
            self.depth += 1;
            walk_grouping(self, id, grouping);
            self.depth -= 1;
        }

        fn visit_node(&mut self, node: &Node, _parent: &GroupingId, _index: usize) {
            let indent = "  ".repeat(self.depth);
            let collapsed = if node.expanded { "" } else { " (collapsed)" };
            self.lines.push(format!(
                "{}{} {} {} {} \"{}\"{}",
                indent,
                node.kind,
                node.id,
                node.pattern_id,
                node.variant.as_str(),
                node.label,
                collapsed
            ));
            self.depth += 1;
            walk_node(self, node);
            self.depth -= 1;
        }
    }

    let mut outline = Outline {
        depth: 0,
        lines: Vec::new(),
    };
    outline.visit_page(page);
    outline.lines
}

/// Nodes whose pattern the registry does not know
pub(crate) fn unknown_patterns<P: PatternRegistry>(
    page: &Page,
    registry: &P,
) -> Vec<(NodeId, NodeKind, String)> {
    struct Unknown<'a, P> {
        registry: &'a P,
        found: Vec<(NodeId, NodeKind, String)>,
    }

    impl<P: PatternRegistry> Visitor for Unknown<'_, P> {
        fn visit_node(&mut self, node: &Node, _parent: &GroupingId, _index: usize) {
            if !self.registry.is_valid(node.kind, &node.pattern_id) {
                self.found
                    .push((node.id.clone(), node.kind, node.pattern_id.clone()));
            }
            walk_node(self, node);
        }
    }

    let mut visitor = Unknown {
        registry,
        found: Vec::new(),
    };
    visitor.visit_page(page);
    visitor.found
}

#[cfg(test)]
mod tests {
    use super::*;
    use npb_tree::{rebuild_from_html, StaticPatternRegistry};
    use std::fs;

    const PAGE: &str = r#"<div id="npb-rows-wrapper">
        <div id="r1" class="npb-row" data-pattern="standard-1" data-label="Intro">
          <div id="s1" class="npb-section" data-pattern="sec-a" data-expanded="false">
            <div class="npb-blocks-wrapper">
              <div id="b1" class="npb-block" data-pattern="text"></div>
              <div id="b2" class="npb-block" data-pattern="carousel"></div>
            </div>
          </div>
        </div>
        <div id="r2" class="npb-row" data-pattern="full">
          <div class="npb-blocks-wrapper"></div>
        </div>
      </div>"#;

    #[test]
    fn test_tree_lines_outline() {
        let page = rebuild_from_html(PAGE).unwrap();
        let lines = tree_lines(&page);

        assert_eq!(lines[0], "[rows]");
        assert_eq!(lines[1], "  row r1 standard-1 standard \"Intro\"");
        assert!(lines[3].starts_with("      section s1 sec-a standard"));
        assert!(lines[3].ends_with("(collapsed)"));
        assert_eq!(lines.last().unwrap(), "    [blocks:r2:0] (empty)");
    }

    #[test]
    fn test_unknown_patterns() {
        let page = rebuild_from_html(PAGE).unwrap();
        let unknown = unknown_patterns(&page, &StaticPatternRegistry::builtin());

        assert_eq!(
            unknown,
            vec![(NodeId::from("b2"), NodeKind::Block, "carousel".to_string())]
        );
    }

    #[test]
    fn test_inspect_reports_violations() {
        let dir = tempfile::tempdir().unwrap();
        // A fullscreen-only block inside a standard section
        fs::write(
            dir.path().join("page.html"),
            r#"<div id="npb-rows-wrapper">
                 <div id="r1" class="npb-row" data-pattern="standard-1">
                   <div id="s1" class="npb-section" data-pattern="sec-a">
                     <div class="npb-blocks-wrapper">
                       <div id="b1" class="npb-block" data-pattern="hero" data-type="full"></div>
                     </div>
                   </div>
                 </div>
               </div>"#,
        )
        .unwrap();
        let cwd = dir.path().display().to_string();

        let args = InspectArgs {
            input: "page.html".into(),
            json: false,
        };
        assert!(inspect(args, &cwd).is_err());

        let args = InspectArgs {
            input: "missing.html".into(),
            json: false,
        };
        assert!(inspect(args, &cwd).is_err());
    }
}
