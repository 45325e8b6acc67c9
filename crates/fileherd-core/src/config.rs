//! Orchestrator configuration types.

use std::path::Path;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Configuration for routing and trash handling.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct OrchestratorConfig {
    /// Device prefix marking extended-length paths the executor cannot handle.
    #[builder(default = "default_long_path_prefix()")]
    #[serde(default = "default_long_path_prefix")]
    pub long_path_prefix: String,

    /// URL schemes of remote transfer locations, matched case-insensitively.
    #[builder(default = "default_remote_schemes()")]
    #[serde(default = "default_remote_schemes")]
    pub remote_schemes: Vec<String>,

    /// Extensions of archives that can be browsed like folders.
    #[builder(default = "default_archive_extensions()")]
    #[serde(default = "default_archive_extensions")]
    pub archive_extensions: Vec<String>,

    /// Directory names that hold the system trash.
    #[builder(default = "default_trash_dir_names()")]
    #[serde(default = "default_trash_dir_names")]
    pub trash_dir_names: Vec<String>,

    /// File name prefix of trashed item data.
    #[builder(default = "default_trash_data_prefix()")]
    #[serde(default = "default_trash_data_prefix")]
    pub trash_data_prefix: String,

    /// File name prefix of the metadata companion of a trashed item.
    #[builder(default = "default_trash_info_prefix()")]
    #[serde(default = "default_trash_info_prefix")]
    pub trash_info_prefix: String,

    /// Route eligible batches through the privileged executor.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub prefer_privileged: bool,

    /// Number of entries kept by the undo log.
    #[builder(default = "default_history_depth()")]
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,
}

fn default_long_path_prefix() -> String {
    r"\\?\".to_string()
}

fn default_remote_schemes() -> Vec<String> {
    ["ftp://", "ftps://", "ftpes://"].map(String::from).to_vec()
}

fn default_archive_extensions() -> Vec<String> {
    vec![".zip".to_string()]
}

fn default_trash_dir_names() -> Vec<String> {
    vec!["$Recycle.Bin".to_string()]
}

fn default_trash_data_prefix() -> String {
    "$R".to_string()
}

fn default_trash_info_prefix() -> String {
    "$I".to_string()
}

fn default_true() -> bool {
    true
}

fn default_history_depth() -> usize {
    100
}

fn check_values(history_depth: usize, data_prefix: &str, info_prefix: &str) -> Result<(), String> {
    if history_depth == 0 {
        return Err("History depth must be at least 1".to_string());
    }
    if data_prefix.is_empty() || info_prefix.is_empty() {
        return Err("Trash prefixes cannot be empty".to_string());
    }
    if data_prefix.chars().count() != info_prefix.chars().count() {
        return Err("Trash data and info prefixes must have the same length".to_string());
    }
    Ok(())
}

impl OrchestratorConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let data_prefix = self
            .trash_data_prefix
            .clone()
            .unwrap_or_else(default_trash_data_prefix);
        let info_prefix = self
            .trash_info_prefix
            .clone()
            .unwrap_or_else(default_trash_info_prefix);
        check_values(
            self.history_depth.unwrap_or_else(default_history_depth),
            &data_prefix,
            &info_prefix,
        )
    }
}

impl OrchestratorConfig {
    /// Create a new config builder.
    pub fn builder() -> OrchestratorConfigBuilder {
        OrchestratorConfigBuilder::default()
    }

    /// Parse a config from TOML. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ModelError> {
        let config: Self = toml::from_str(content).map_err(|e| ModelError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ModelError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Check values that serde cannot enforce.
    pub fn validate(&self) -> Result<(), ModelError> {
        check_values(
            self.history_depth,
            &self.trash_data_prefix,
            &self.trash_info_prefix,
        )
        .map_err(ModelError::config)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            long_path_prefix: default_long_path_prefix(),
            remote_schemes: default_remote_schemes(),
            archive_extensions: default_archive_extensions(),
            trash_dir_names: default_trash_dir_names(),
            trash_data_prefix: default_trash_data_prefix(),
            trash_info_prefix: default_trash_info_prefix(),
            prefer_privileged: true,
            history_depth: default_history_depth(),
        }
    }
}
