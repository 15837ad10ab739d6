//! Expansion command - manage the persisted set of open nodes

use anyhow::{anyhow, Context, Result};
use clap::Subcommand;
use entity_tree::{ExpansionKey, ExpansionTracker};
use std::path::Path;

use crate::cli::{CliContext, OutputFormat, OutputFormatter};

#[derive(Debug, Subcommand)]
pub enum ExpansionCommand {
    /// List expanded nodes
    List,

    /// Mark a node as expanded
    Add {
        id: String,
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        resource: Option<String>,
    },

    /// Mark a node as collapsed
    Remove {
        id: String,
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        resource: Option<String>,
    },

    /// Forget every key mentioning an entity
    Forget { id: String },

    /// Collapse everything
    Clear,
}

pub async fn execute(ctx: &CliContext, command: ExpansionCommand) -> Result<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let path = ctx
        .expansion_path()
        .ok_or_else(|| anyhow!("No [tree] expansion_state file configured"))?;
    let mut tracker = ExpansionTracker::load(&path)
        .with_context(|| format!("Failed to load expansion state {:?}", path))?;

    match command {
        ExpansionCommand::List => {
            list(&tracker, &formatter);
            return Ok(());
        }
        ExpansionCommand::Add {
            id,
            parent,
            resource,
        } => {
            let key = ExpansionKey::new(id, parent.as_deref(), resource.as_deref());
            if tracker.add_expanded_node(key.clone()) {
                formatter.success(&format!("Expanded {}", key));
            } else {
                formatter.warning(&format!("{} was already expanded", key));
            }
        }
        ExpansionCommand::Remove {
            id,
            parent,
            resource,
        } => {
            let key = ExpansionKey::new(id, parent.as_deref(), resource.as_deref());
            if tracker.remove_expanded_node(&key) {
                formatter.success(&format!("Collapsed {}", key));
            } else {
                formatter.warning(&format!("{} was not expanded", key));
            }
        }
        ExpansionCommand::Forget { id } => {
            let removed = tracker.forget_entity(&id);
            formatter.success(&format!("Removed {} key(s) mentioning {}", removed, id));
        }
        ExpansionCommand::Clear => {
            let count = tracker.len();
            tracker.clear();
            formatter.success(&format!("Cleared {} key(s)", count));
        }
    }

    save(&tracker, &path)
}

fn save(tracker: &ExpansionTracker, path: &Path) -> Result<()> {
    tracker
        .save(path)
        .with_context(|| format!("Failed to save expansion state {:?}", path))
}

fn list(tracker: &ExpansionTracker, formatter: &OutputFormatter) {
    match formatter.format() {
        OutputFormat::Json => {
            let keys: Vec<_> = tracker.keys().collect();
            formatter.json(&keys);
        }
        _ => {
            if tracker.is_empty() {
                formatter.list_item("(no expanded nodes)");
                return;
            }
            let rows: Vec<Vec<String>> = tracker
                .keys()
                .map(|key| {
                    vec![
                        key.entity_id.clone(),
                        key.parent_id.clone().unwrap_or_else(|| "-".to_string()),
                        key.resource_id.clone().unwrap_or_else(|| "-".to_string()),
                    ]
                })
                .collect();
            formatter.table(&["Entity", "Parent", "Resource"], &rows);
        }
    }
}
