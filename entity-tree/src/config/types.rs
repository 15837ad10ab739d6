use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConsoleError, ConsoleResult};

pub const ENV_ROOT_URL: &str = "ENTITY_CONSOLE_ROOT_URL";
pub const ENV_TOKEN: &str = "ENTITY_CONSOLE_TOKEN";

const DEFAULT_ROOT_URL: &str = "http://localhost:8082/rest/";
const DEFAULT_SESSION_HEADER: &str = "X-Session-Token";
const DEFAULT_PAGE_SIZE: usize = 10;
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Top-level console configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConsoleConfig {
    pub server: ServerConfig,
    pub tree: TreeConfig,
}

/// Where entities live and how requests authenticate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Entity collection root; entity ids are appended to it
    pub root_url: String,
    pub session_token: Option<String>,
    /// Header carrying the session token
    pub session_header: String,
    /// Records requested per inspector view
    pub page_size: usize,
    pub timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root_url: DEFAULT_ROOT_URL.to_string(),
            session_token: None,
            session_header: DEFAULT_SESSION_HEADER.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// File the expansion tracker is persisted to. `None` keeps it in memory.
    pub expansion_state: Option<PathBuf>,
    /// Order top-level components by name before rendering
    pub sort_components: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            expansion_state: None,
            sort_components: true,
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from a TOML file. A missing file yields defaults.
    /// Environment overrides are applied afterwards.
    pub fn load(path: &Path) -> ConsoleResult<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                ConsoleError::Config(format!("Failed to read config file {:?}: {}", path, e))
            })?;
            Self::from_toml_str(&content)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> ConsoleResult<Self> {
        let mut config: ConsoleConfig = toml::from_str(content)?;
        config.normalize();
        Ok(config)
    }

    pub fn to_toml_string(&self) -> ConsoleResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConsoleError::Config(e.to_string()))
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ENV_ROOT_URL).filter(|v| !v.trim().is_empty()) {
            self.server.root_url = root;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.trim().is_empty()) {
            self.server.session_token = Some(token);
        }
        self.normalize();
    }

    fn normalize(&mut self) {
        let trimmed = self.server.root_url.trim();
        self.server.root_url = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{}/", trimmed)
        };
    }

    /// Check the configuration, returning human-readable warnings
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if url::Url::parse(&self.server.root_url).is_err() {
            warnings.push(format!(
                "server.root_url '{}' is not a valid URL",
                self.server.root_url
            ));
        }
        if self.server.session_token.is_none() {
            warnings.push("No session token configured; requests are anonymous".to_string());
        }
        if self.server.page_size == 0 {
            warnings.push("server.page_size is 0; the inspector will request 1 record".to_string());
        }
        if self.server.session_header.trim().is_empty() {
            warnings.push("server.session_header is empty".to_string());
        }

        warnings
    }

    /// Page size actually sent to the server
    pub fn effective_page_size(&self) -> usize {
        self.server.page_size.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = ConsoleConfig::from_toml_str(
            r#"
            [server]
            root_url = "https://cms.example.org/api"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.root_url, "https://cms.example.org/api/");
        assert_eq!(config.server.page_size, 10);
        assert_eq!(config.server.session_header, "X-Session-Token");
        assert!(config.tree.sort_components);
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> =
            [(ENV_ROOT_URL, "http://other:9000/rest"), (ENV_TOKEN, "abc")]
                .into_iter()
                .collect();
        let mut config = ConsoleConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.server.root_url, "http://other:9000/rest/");
        assert_eq!(config.server.session_token.as_deref(), Some("abc"));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = ConsoleConfig::default();
        config.apply_overrides(|_| Some("  ".to_string()));
        assert_eq!(config.server.root_url, DEFAULT_ROOT_URL);
        assert!(config.server.session_token.is_none());
    }

    #[test]
    fn validate_flags_zero_page_size() {
        let mut config = ConsoleConfig::default();
        config.server.page_size = 0;
        config.server.session_token = Some("t".into());

        let warnings = config.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("page_size"));
        assert_eq!(config.effective_page_size(), 1);
    }
}
