//! Tree command - render an entity graph

use anyhow::{bail, Context, Result};
use clap::Args;
use entity_tree::model::sort_by_name;
use entity_tree::transport::FixedAnswer;
use entity_tree::{ConsoleSession, EffectReport, ExpandState};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{report_failures, resolve_entity};
use crate::cli::graph::GraphSurface;
use crate::cli::output::TreeLine;
use crate::cli::{CliContext, OutputFormat, OutputFormatter};

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// JSON file holding one entity or an array of entities
    #[arg(short, long, value_name = "GRAPH", conflicts_with = "id")]
    file: Option<PathBuf>,

    /// Render the children of this entity from the server
    #[arg(long)]
    id: Option<String>,

    /// Root resource the entity is shown under
    #[arg(long)]
    resource: Option<String>,

    /// Expand every collapsed node showing this entity (repeatable)
    #[arg(short, long, value_name = "ID")]
    expand: Vec<String>,
}

pub async fn execute(ctx: &CliContext, args: TreeArgs) -> Result<()> {
    let formatter = OutputFormatter::new(ctx.output_format);

    let (mut session, report) = match (&args.file, &args.id) {
        (Some(path), _) => render_file(ctx, path).await?,
        (None, Some(id)) => render_remote(ctx, id, args.resource.as_deref()).await?,
        (None, None) => bail!("Either --file or --id is required"),
    };
    report_failures(&formatter, &report);

    for id in &args.expand {
        let handles = session.view().find_by_entity(id);
        if handles.is_empty() {
            formatter.warning(&format!("No node shows entity {}", id));
        }
        for handle in handles {
            let state = session.view().node(handle).map(|n| n.expand);
            match state {
                Some(ExpandState::Collapsed) => {
                    let (_, report) = session.toggle(handle).await?;
                    report_failures(&formatter, &report);
                }
                Some(ExpandState::Leaf) => formatter.warning(&expand_skipped(id)),
                _ => {}
            }
        }
    }

    print_tree(&session, &formatter);
    Ok(())
}

async fn render_file(ctx: &CliContext, path: &Path) -> Result<(ConsoleSession, EffectReport)> {
    let mut graph = GraphSurface::load(path)
        .with_context(|| format!("Failed to read entity graph {:?}", path))?;
    if ctx.config.tree.sort_components {
        sort_by_name(graph.roots_mut());
    }
    let roots = graph.roots().to_vec();
    let graph = Arc::new(graph);

    let session = ConsoleSession::new(graph.clone(), graph, Arc::new(FixedAnswer(false)));
    let mut session = ctx.attach_tracker(session)?;

    let mut report = EffectReport::default();
    for root in &roots {
        let (_, r) = session.render_tree(root).await;
        report.failures.extend(r.failures);
    }
    Ok((session, report))
}

async fn render_remote(
    ctx: &CliContext,
    id: &str,
    resource: Option<&str>,
) -> Result<(ConsoleSession, EffectReport)> {
    let rest = ctx.rest_client()?;
    let entity = resolve_entity(rest.as_ref(), id, None).await?;
    ctx.status(&format!("Loading children of {} from {}", id, rest.root()));

    let mut session = ctx.session(Arc::new(FixedAnswer(false)))?;
    let (rendered, mut report) = session.render(&entity, None, resource, false, true).await;
    let handle = rendered.handle();

    let already_open = session
        .view()
        .node(handle)
        .is_some_and(|n| n.expand.is_open());
    if !already_open {
        let (_, r) = session.toggle(handle).await?;
        report.failures.extend(r.failures);
    }
    Ok((session, report))
}

/// Leaves have no children to load: tree-form graphs draw their whole
/// subtree up front, and typed entities without collections have none.
fn expand_skipped(id: &str) -> String {
    format!("{} cannot be expanded; everything below it is already shown", id)
}

fn print_tree(session: &ConsoleSession, formatter: &OutputFormatter) {
    let lines = session.view().walk();
    match formatter.format() {
        OutputFormat::Json => {
            let out: Vec<TreeLine> = lines
                .iter()
                .map(|(depth, node)| TreeLine::new(*depth, node))
                .collect();
            formatter.json(&out);
        }
        _ => {
            for (depth, node) in lines {
                formatter.tree_node(depth, node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity_tree::ConsoleConfig;

    const GRAPH: &str = r#"{"id": "r1", "type": "Resource", "name": "Home", "children": [
        {"id": "e1", "type": "Element", "children": [{"id": "c1", "type": "Content"}]}
    ]}"#;

    fn context(dir: &Path) -> CliContext {
        CliContext {
            config_path: dir.join("entity_console.toml"),
            config: ConsoleConfig::default(),
            output_format: OutputFormat::Plain,
            quiet: true,
        }
    }

    #[tokio::test]
    async fn file_graph_renders_as_leaves() {
        let dir = tempfile::tempdir().unwrap();
        let graph = dir.path().join("site.json");
        std::fs::write(&graph, GRAPH).unwrap();

        let (session, report) = render_file(&context(dir.path()), &graph).await.unwrap();

        assert!(report.is_clean());
        let nodes: Vec<_> = session
            .view()
            .walk()
            .iter()
            .map(|(d, n)| (*d, n.entity_id.clone(), n.expand))
            .collect();
        assert_eq!(
            nodes,
            vec![
                (0, "r1".to_string(), ExpandState::Leaf),
                (1, "e1".to_string(), ExpandState::Leaf),
                (2, "c1".to_string(), ExpandState::Leaf),
            ]
        );
        assert!(expand_skipped("e1").starts_with("e1 cannot be expanded"));
    }
}
