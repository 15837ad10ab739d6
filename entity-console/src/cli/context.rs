//! CLI context - configuration and services shared by all commands

use anyhow::{Context, Result};
use entity_tree::transport::ConfirmSurface;
use entity_tree::{ConsoleConfig, ConsoleSession, RestClient};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Config file names tried when `--config` is not given
const DEFAULT_CONFIG_PATHS: &[&str] = &["entity_console.toml", "config/entity_console.toml"];

pub struct CliContext {
    pub config_path: PathBuf,
    pub config: ConsoleConfig,
    pub output_format: super::OutputFormat,
    /// Suppress status messages
    pub quiet: bool,
}

impl CliContext {
    pub fn new(config_path: PathBuf) -> Result<Self> {
        let config = ConsoleConfig::load(&config_path)
            .with_context(|| format!("Failed to load config file {:?}", config_path))?;
        Ok(Self {
            config_path,
            config,
            output_format: super::OutputFormat::Table,
            quiet: false,
        })
    }

    /// Use the first config file found in the usual places, or defaults
    pub fn with_defaults() -> Result<Self> {
        let found = DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists());
        match found {
            Some(path) => Self::new(path),
            None => Self::new(PathBuf::from(DEFAULT_CONFIG_PATHS[0])),
        }
    }

    pub fn validate_config(&self) -> Vec<String> {
        let mut warnings = self.config.validate();
        if !self.config_path.exists() {
            warnings.insert(
                0,
                format!("Config file {:?} not found; using defaults", self.config_path),
            );
        }
        warnings
    }

    pub fn rest_client(&self) -> Result<Arc<RestClient>> {
        let client = RestClient::new(&self.config.server).context("Failed to create REST client")?;
        Ok(Arc::new(client))
    }

    /// Session against the configured server, with the persisted expansion
    /// state when one is configured.
    pub fn session(&self, confirm: Arc<dyn ConfirmSurface>) -> Result<ConsoleSession> {
        let rest = self.rest_client()?;
        let session = ConsoleSession::new(rest.clone(), rest, confirm)
            .with_page_size(self.config.effective_page_size());
        self.attach_tracker(session)
    }

    pub fn attach_tracker(&self, session: ConsoleSession) -> Result<ConsoleSession> {
        match self.expansion_path() {
            Some(path) => session
                .with_tracker_file(&path)
                .with_context(|| format!("Failed to load expansion state {:?}", path)),
            None => Ok(session),
        }
    }

    /// Expansion state file, relative paths resolved against the config file
    pub fn expansion_path(&self) -> Option<PathBuf> {
        let path = self.config.tree.expansion_state.as_ref()?;
        if path.is_absolute() {
            return Some(path.clone());
        }
        let base = self
            .config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Some(base.join(path))
    }

    /// Print status message (respects quiet mode)
    pub fn status(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", message);
        }
    }
}
