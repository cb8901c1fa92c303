use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use npb_editor::BuilderConfig;
use npb_tree::{NodeKind, PatternConfig};

#[derive(Args, Debug)]
pub struct PatternsArgs {
    /// Only list one kind (row, section, block)
    #[arg(short, long)]
    pub kind: Option<String>,
}

pub fn patterns(args: PatternsArgs, cwd: &str) -> Result<()> {
    let kinds = match args.kind.as_deref() {
        None => NodeKind::ALL.to_vec(),
        Some(raw) => vec![NodeKind::parse(raw)
            .ok_or_else(|| anyhow!("Invalid kind: {}. Use: row, section, or block", raw))?],
    };

    let registry = BuilderConfig::load(cwd)?.registry();

    for kind in kinds {
        let listed: Vec<&PatternConfig> = registry
            .patterns()
            .iter()
            .filter(|p| p.kind == kind)
            .collect();

        println!("{} ({})", kind.as_str().bright_white().bold(), listed.len());
        for pattern in listed {
            println!("   {}", pattern_line(pattern));
        }
        println!();
    }
    Ok(())
}

pub(crate) fn pattern_line(pattern: &PatternConfig) -> String {
    let mut flags = Vec::new();
    if pattern.special {
        flags.push("special".to_string());
    }
    if pattern.fullscreen_only {
        flags.push("fullscreen only".to_string());
    }
    if let Some(level) = pattern.complexity {
        flags.push(format!("complexity {}", level));
    }

    let mut line = format!("{:<16} {}", pattern.id, pattern.display_label());
    if !flags.is_empty() {
        line.push_str(&format!(" [{}]", flags.join(", ")));
    }
    line
}
