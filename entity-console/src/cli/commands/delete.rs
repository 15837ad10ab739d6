//! Delete command - remove one entity after confirmation

use anyhow::Result;
use clap::Args;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use entity_tree::transport::{CommandSurface, ConfirmSurface, FixedAnswer};
use std::sync::Arc;

use super::resolve_entity;
use crate::cli::{CliContext, OutputFormatter};

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Entity id
    id: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

/// Interactive yes/no prompt on the terminal
pub struct TerminalConfirm;

impl ConfirmSurface for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

pub async fn execute(ctx: &CliContext, args: DeleteArgs) -> Result<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let rest = ctx.rest_client()?;
    let confirm: Arc<dyn ConfirmSurface> = if args.yes {
        Arc::new(FixedAnswer(true))
    } else {
        Arc::new(TerminalConfirm)
    };

    // Children decide whether the delete affordance is enabled.
    let children = rest.children(&args.id, None).await?;
    let entity = resolve_entity(rest.as_ref(), &args.id, None)
        .await?
        .with_children(children);

    let mut session = ctx.session(confirm)?;
    let (rendered, _) = session.render(&entity, None, None, false, false).await;
    let handle = rendered.handle();

    let enabled = session
        .view()
        .node(handle)
        .is_some_and(|n| n.delete.is_enabled());
    if !enabled {
        formatter.warning(&format!(
            "{} still has children; remove them first",
            entity.id
        ));
        return Ok(());
    }

    if session.delete(handle).await? {
        formatter.success(&format!("Deleted {}", entity.id));
    } else {
        formatter.warning("Nothing deleted");
    }
    Ok(())
}
