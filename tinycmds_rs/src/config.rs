//! Configuration file support for tinycmds.
//!
//! Loads optional `.tinycmds/config.toml` from the host's root directory.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

/// Default bound on nested (re-entrant) dispatch.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Root configuration structure
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct TinyConfig {
    pub dispatch: DispatchConfig,
    pub registry: RegistryConfig,
    pub chat: ChatConfig,
    /// Host-supplied values that predicates can test against (e.g. `job = "WHM"`)
    pub facts: BTreeMap<String, String>,
}

/// Dispatcher settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// How deep commands may re-dispatch other commands
    pub max_depth: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Registry settings
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// When set, every invocation name also registers `/<prefix><name>`.
    pub alias_prefix: Option<String>,
}

/// Message presentation settings for hosts
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Tag shown in front of every notification
    pub prefix: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            prefix: "TinyCmds".to_string(),
        }
    }
}

impl TinyConfig {
    /// Load config from `.tinycmds/config.toml` in the given root directory.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(".tinycmds").join("config.toml");
        Self::load_from_path(&config_path)
    }

    /// Load config from a specific path.
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn fact(&self, name: &str) -> Option<&str> {
        self.facts.get(name).map(String::as_str)
    }
}
