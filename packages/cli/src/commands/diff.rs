use super::load_page;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use npb_editor::{diff_pages, Anchor, ViewPatch};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Page markup before the edit
    pub old: PathBuf,

    /// Page markup after the edit
    pub new: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn diff(args: DiffArgs, cwd: &str) -> Result<()> {
    let (old_path, old) = load_page(&args.old, cwd)?;
    let (new_path, new) = load_page(&args.new, cwd)?;
    let patches = diff_pages(&old, &new);

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&patches)?),
        "text" => {
            println!(
                "🔀 {} {} → {}",
                "Diffing".green().bold(),
                old_path.display(),
                new_path.display()
            );
            println!();
            if patches.is_empty() {
                println!("   {} No changes", "✓".green());
            }
            for patch in &patches {
                println!("   {}", describe(patch));
            }
            println!();
            println!("✨ {} {} patch(es)", "Done".green().bold(), patches.len());
        }
        other => {
            return Err(anyhow!("Unknown format: {}. Use: text or json", other));
        }
    }
    Ok(())
}

fn anchor_text(anchor: &Anchor) -> String {
    match anchor {
        Anchor::Start => "at start".to_string(),
        Anchor::After(id) => format!("after {}", id),
    }
}

/// One-line rendering of a patch for the text format
pub(crate) fn describe(patch: &ViewPatch) -> String {
    match patch {
        ViewPatch::InsertFragment {
            grouping,
            anchor,
            node_id,
            ..
        } => format!(
            "{} insert {} into {} {}",
            "+".green(),
            node_id,
            grouping,
            anchor_text(anchor)
        ),
        ViewPatch::RemoveNode { node_id } => format!("{} remove {}", "-".red(), node_id),
        ViewPatch::MoveNode {
            node_id,
            grouping,
            anchor,
        } => format!(
            "{} move {} to {} {}",
            "~".yellow(),
            node_id,
            grouping,
            anchor_text(anchor)
        ),
        ViewPatch::SetLabel { node_id, label } => {
            format!("{} label {} = \"{}\"", "~".yellow(), node_id, label)
        }
        ViewPatch::SetExpanded { node_id, expanded } => {
            format!("{} expanded {} = {}", "~".yellow(), node_id, expanded)
        }
        ViewPatch::SetInitialAdd { grouping, visible } => {
            let state = if *visible { "show" } else { "hide" };
            format!("{} {} initial add on {}", "•".blue(), state, grouping)
        }
        ViewPatch::RestorePosition {
            node_id,
            grouping,
            index,
        } => format!(
            "{} restore {} to {}[{}]",
            "↺".blue(),
            node_id,
            grouping,
            index
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use npb_tree::GroupingId;
    use std::fs;

    #[test]
    fn test_describe_move() {
        colored::control::set_override(false);
        let patch = ViewPatch::MoveNode {
            node_id: "b2".into(),
            grouping: GroupingId::blocks("s1", 0),
            anchor: Anchor::Start,
        };
        assert_eq!(describe(&patch), "~ move b2 to blocks:s1:0 at start");

        let patch = ViewPatch::SetInitialAdd {
            grouping: GroupingId::Rows,
            visible: true,
        };
        assert_eq!(describe(&patch), "• show initial add on rows");
    }

    #[test]
    fn test_diff_rejects_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let page = r#"<div id="npb-rows-wrapper">
                        <div id="r1" class="npb-row" data-pattern="full">
                          <div class="npb-blocks-wrapper"></div>
                        </div>
                      </div>"#;
        fs::write(dir.path().join("old.html"), page).unwrap();
        fs::write(dir.path().join("new.html"), page).unwrap();
        let cwd = dir.path().display().to_string();

        let args = |format: &str| DiffArgs {
            old: "old.html".into(),
            new: "new.html".into(),
            format: format.to_string(),
        };
        assert!(diff(args("json"), &cwd).is_ok());
        assert!(diff(args("text"), &cwd).is_ok());
        assert!(diff(args("yaml"), &cwd).is_err());
    }
}
