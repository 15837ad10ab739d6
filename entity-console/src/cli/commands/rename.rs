//! Rename command - inline rename of one entity

use anyhow::Result;
use clap::Args;
use entity_tree::transport::FixedAnswer;
use std::sync::Arc;

use super::{report_failures, resolve_entity};
use crate::cli::{CliContext, OutputFormatter};

#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Entity id
    id: String,

    /// New name
    name: String,
}

pub async fn execute(ctx: &CliContext, args: RenameArgs) -> Result<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let rest = ctx.rest_client()?;
    let entity = resolve_entity(rest.as_ref(), &args.id, None).await?;

    let mut session = ctx.session(Arc::new(FixedAnswer(false)))?;
    let (rendered, _) = session.render(&entity, None, None, false, false).await;
    let (committed, report) = session.rename(rendered.handle(), &args.name).await?;

    report_failures(&formatter, &report);
    match committed {
        Some(name) if report.is_clean() => {
            formatter.success(&format!("Renamed {} to '{}'", entity.id, name))
        }
        Some(_) => formatter.error(&format!("Rename of {} was not saved", entity.id)),
        None => formatter.warning("Nothing to commit"),
    }
    Ok(())
}
