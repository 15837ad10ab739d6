//! Inspect command - property inspector for one entity

use anyhow::{anyhow, Result};
use clap::Args;
use entity_tree::inspector::{AccessControlPanel, InspectorSession, TabState, ViewTab};
use entity_tree::transport::FixedAnswer;
use entity_tree::ViewName;
use serde_json::{json, Value};
use std::sync::Arc;

use super::resolve_entity;
use crate::cli::{CliContext, OutputFormat, OutputFormatter};

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Entity id
    id: String,

    /// Entity type, when the server should not be asked
    #[arg(short = 't', long = "type")]
    entity_type: Option<String>,

    /// Show only this view (all, in, out, html)
    #[arg(long)]
    view: Option<ViewName>,

    /// Also show owner and visibility switches
    #[arg(long)]
    access: bool,
}

pub async fn execute(ctx: &CliContext, args: InspectArgs) -> Result<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let rest = ctx.rest_client()?;
    let entity = resolve_entity(rest.as_ref(), &args.id, args.entity_type.as_deref()).await?;

    let mut session = ctx.session(Arc::new(FixedAnswer(false)))?;
    session.open_inspector(&entity).await;
    if let Some(view) = args.view {
        session.inspector_mut().select_tab(view)?;
    }

    let panel = if args.access {
        Some(session.access_panel(&entity.id).await?)
    } else {
        None
    };

    let inspector = session
        .inspector()
        .session()
        .ok_or_else(|| anyhow!("Inspector did not open"))?;
    let tabs: Vec<&ViewTab> = match args.view {
        Some(view) => inspector.tabs.iter().filter(|t| t.view == view).collect(),
        None => inspector.tabs.iter().collect(),
    };

    match formatter.format() {
        OutputFormat::Json => {
            let mut out = json!({
                "id": inspector.entity_id,
                "type": inspector.entity_type.as_str(),
                "views": tabs.iter().map(|t| tab_json(t)).collect::<Vec<_>>(),
            });
            if let Some(panel) = &panel {
                out["access"] = access_json(panel);
            }
            formatter.json(&out);
        }
        _ => {
            print_inspector(inspector, &tabs, &formatter);
            if let Some(panel) = &panel {
                print_access(panel, &formatter);
            }
        }
    }
    Ok(())
}

fn print_inspector(inspector: &InspectorSession, tabs: &[&ViewTab], formatter: &OutputFormatter) {
    formatter.section(&inspector.title());
    for tab in tabs {
        let marker = if tab.header_active { " *" } else { "" };
        formatter.section(&format!("{}{}", tab.label, marker));
        match &tab.state {
            TabState::Loading => formatter.list_item("(loading)"),
            TabState::Failed(message) => formatter.warning(&format!("{}: {}", tab.label, message)),
            TabState::Loaded(tables) if tables.is_empty() => formatter.list_item("(no records)"),
            TabState::Loaded(tables) => {
                for table in tables {
                    formatter.kv("Record", &table.record_id);
                    let rows: Vec<Vec<String>> = table
                        .rows
                        .iter()
                        .map(|row| {
                            let editable = if row.editable { "yes" } else { "" };
                            vec![row.label.clone(), row.value.display(), editable.to_string()]
                        })
                        .collect();
                    formatter.table(&["Key", "Value", "Editable"], &rows);
                    println!();
                }
            }
        }
    }
}

fn print_access(panel: &AccessControlPanel, formatter: &OutputFormatter) {
    formatter.section("Access Control");
    formatter.kv("Owner", panel.owner.as_deref().unwrap_or("(none)"));
    for switch in &panel.switches {
        let state = if switch.enabled { "on" } else { "off" };
        formatter.kv(switch.label(), state);
    }
}

fn tab_json(tab: &ViewTab) -> Value {
    let (state, records) = match &tab.state {
        TabState::Loading => ("loading", Value::Null),
        TabState::Failed(message) => ("failed", json!(message)),
        TabState::Loaded(tables) => (
            "loaded",
            tables
                .iter()
                .map(|table| {
                    json!({
                        "id": table.record_id,
                        "rows": table.rows.iter().map(|row| json!({
                            "key": row.key,
                            "label": row.label,
                            "value": row.raw(),
                            "editable": row.editable,
                        })).collect::<Vec<_>>(),
                    })
                })
                .collect::<Vec<_>>()
                .into(),
        ),
    };
    json!({
        "view": tab.view.as_str(),
        "label": tab.label,
        "active": tab.header_active,
        "state": state,
        "records": records,
    })
}

fn access_json(panel: &AccessControlPanel) -> Value {
    let mut out = json!({ "owner": panel.owner });
    for switch in &panel.switches {
        out[switch.key] = json!(switch.enabled);
    }
    out
}
