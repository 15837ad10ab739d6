//! Config command - configuration management

use anyhow::{Context, Result};
use clap::Subcommand;
use entity_tree::config::{ENV_ROOT_URL, ENV_TOKEN};

use crate::cli::{CliContext, OutputFormat, OutputFormatter};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate,

    /// Initialize a new configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, default_value = "entity_console.toml")]
        output: String,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn execute(ctx: &CliContext, command: ConfigCommand) -> Result<()> {
    let formatter = OutputFormatter::new(ctx.output_format);

    match &command {
        ConfigCommand::Show => show_config(ctx, &formatter),
        ConfigCommand::Validate => validate_config(ctx, &formatter),
        ConfigCommand::Init { output, force } => init_config(output, *force, &formatter),
    }
}

fn show_config(ctx: &CliContext, formatter: &OutputFormatter) -> Result<()> {
    if ctx.output_format == OutputFormat::Json {
        formatter.json(&ctx.config);
        return Ok(());
    }

    let server = &ctx.config.server;
    formatter.section("Configuration");
    formatter.kv("Config file", ctx.config_path.to_string_lossy().as_ref());

    formatter.section("Server");
    formatter.kv("Root URL", &server.root_url);
    formatter.kv("Session header", &server.session_header);
    formatter.kv(
        "Session token",
        if server.session_token.is_some() { "(set)" } else { "(none)" },
    );
    formatter.kv("Page size", &server.page_size.to_string());
    formatter.kv("Timeout (ms)", &server.timeout_ms.to_string());

    formatter.section("Tree");
    formatter.kv(
        "Expansion state",
        &ctx.expansion_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(in memory)".to_string()),
    );
    formatter.kv("Sort components", &ctx.config.tree.sort_components.to_string());
    Ok(())
}

fn validate_config(ctx: &CliContext, formatter: &OutputFormatter) -> Result<()> {
    ctx.status(&format!("Validating configuration: {:?}", ctx.config_path));

    let warnings = ctx.validate_config();
    if warnings.is_empty() {
        formatter.success("Configuration is valid");
    } else {
        formatter.success("Configuration is valid with warnings:");
        for warning in warnings {
            formatter.warning(&warning);
        }
    }
    Ok(())
}

fn init_config(output: &str, force: bool, formatter: &OutputFormatter) -> Result<()> {
    let path = std::path::Path::new(output);

    if path.exists() && !force {
        formatter.error(&format!(
            "File already exists: {}. Use --force to overwrite.",
            output
        ));
        return Ok(());
    }

    let template = format!(
        r#"# Entity console configuration
# Generated by: entity-console config init
#
# {root} and {token} override the server settings below.

[server]
root_url = "http://localhost:8082/rest/"
# session_token = "..."
session_header = "X-Session-Token"
page_size = 10
timeout_ms = 10000

[tree]
# expansion_state = "expanded.json"
sort_components = true
"#,
        root = ENV_ROOT_URL,
        token = ENV_TOKEN
    );

    std::fs::write(path, template)
        .with_context(|| format!("Failed to write config file {}", output))?;

    formatter.success(&format!("Created configuration file: {}", output));
    Ok(())
}
