//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/layertree/layertree.toml`
//! 3. Local config: explicit file passed with `--config`
//! 4. Environment variables: `LAYERTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::UnreferencedGroups;

/// Unified configuration for layertree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Placement of groups a present display order never mentions
    pub unreferenced_groups: UnreferencedGroups,
    /// Print group ids next to names in tree output
    pub show_ids: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            unreferenced_groups: UnreferencedGroups::Omit,
            show_ids: false,
        }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub unreferenced_groups: Option<UnreferencedGroups>,
    pub show_ids: Option<bool>,
}

/// Get the XDG config directory for layertree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "layertree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("layertree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            unreferenced_groups: overlay
                .unreferenced_groups
                .unwrap_or(self.unreferenced_groups),
            show_ids: overlay.show_ids.unwrap_or(self.show_ids),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_config` - Optional explicit config file, applied over the global one
    pub fn load(local_config: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // An explicitly requested file must exist
        if let Some(local) = local_config {
            let raw = load_raw_settings(local)?;
            current = current.merge_with(&raw);
        }

        Self::apply_env_overrides(current)
    }

    /// Apply LAYERTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("LAYERTREE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("unreferenced_groups") {
            settings.unreferenced_groups = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }
        if let Ok(val) = config.get_bool("show_ids") {
            settings.show_ids = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# layertree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/layertree/layertree.toml
#   Local:  file given with --config
#   Env:    LAYERTREE_* environment variables

# Groups never named by a document's display order:
#   "omit"            leave them out of the tree (still togglable by id)
#   "append-to-root"  list them under the root after the ordered entries
# unreferenced_groups = "omit"

# Print "<num> <gen> R" ids next to group names
# show_ids = false
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
