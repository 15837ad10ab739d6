//! Entity console - command-line front end for the entity tree
//!
//! # Usage
//!
//! ```bash
//! # Render a graph stored on disk, opening one node
//! entity-console tree --file site.json --expand c1
//!
//! # Render the children of a server-side entity
//! entity-console tree --id 4f2a --resource 9c1e
//!
//! # Property inspector
//! entity-console inspect 4f2a --view html
//! entity-console -o json inspect 4f2a --access
//!
//! # Mutations
//! entity-console rename 4f2a "Landing page"
//! entity-console set 4f2a position 3
//! entity-console delete 4f2a
//!
//! # Expansion state and configuration
//! entity-console expansion list
//! entity-console config validate
//! ```

mod cli;

use clap::{Parser, Subcommand};
use cli::commands::{
    config::ConfigCommand, delete::DeleteArgs, expansion::ExpansionCommand,
    inspect::InspectArgs, rename::RenameArgs, set::SetArgs, tree::TreeArgs,
};
use cli::{commands, CliContext, OutputFormat};
use std::path::PathBuf;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "entity-console")]
#[command(version)]
#[command(about = "Entity tree, inspector and editor for the content console", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE", env = "ENTITY_CONSOLE_CONFIG")]
    config: Option<PathBuf>,

    /// Output format (table, json, plain)
    #[arg(short, long, global = true, default_value = "table")]
    output_format: String,

    /// Suppress status messages
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an entity tree
    Tree(TreeArgs),

    /// Show the property inspector for an entity
    Inspect(InspectArgs),

    /// Rename an entity
    Rename(RenameArgs),

    /// Set one property of an entity
    Set(SetArgs),

    /// Delete an entity
    Delete(DeleteArgs),

    /// Persisted expansion state
    Expansion {
        #[command(subcommand)]
        command: ExpansionCommand,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

fn init_logging(verbose: bool, ansi: bool) {
    let level = if verbose { "debug" } else { "info" };
    let mut filter = EnvFilter::from_default_env();
    for target in ["entity_console", "entity_tree"] {
        if let Ok(directive) = format!("{}={}", target, level).parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let output_format: OutputFormat = cli.output_format.parse().unwrap_or_else(|e| {
        eprintln!("Warning: {}. Using table format.", e);
        OutputFormat::Table
    });
    init_logging(cli.verbose, output_format == OutputFormat::Table);

    let context = match cli.config {
        Some(path) => CliContext::new(path),
        None => CliContext::with_defaults(),
    };
    let mut ctx = match context {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error loading configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    ctx.output_format = output_format;
    ctx.quiet = cli.quiet;

    let result = match cli.command {
        Commands::Tree(args) => commands::tree::execute(&ctx, args).await,
        Commands::Inspect(args) => commands::inspect::execute(&ctx, args).await,
        Commands::Rename(args) => commands::rename::execute(&ctx, args).await,
        Commands::Set(args) => commands::set::execute(&ctx, args).await,
        Commands::Delete(args) => commands::delete::execute(&ctx, args).await,
        Commands::Expansion { command } => commands::expansion::execute(&ctx, command).await,
        Commands::Config { command } => commands::config::execute(&ctx, command).await,
    };

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
