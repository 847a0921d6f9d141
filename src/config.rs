//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/jobad/jobad.toml`
//! 3. Local config: `<document_dir>/.jobad.toml`
//! 4. Environment variables: `JOBAD_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::services::ChangeScope;
use crate::application::ApplicationError;
use crate::domain::ComparisonPolicy;

/// Unified configuration for jobad.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    /// How `<` and `>` compare values
    pub comparison: ComparisonPolicy,
    /// What is re-evaluated after a property change
    pub change_scope: ChangeScope,
    /// Reject documents containing malformed conditions at load time
    pub strict_expressions: bool,
}

/// Raw settings for intermediate parsing (fields are Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub comparison: Option<ComparisonPolicy>,
    pub change_scope: Option<ChangeScope>,
    pub strict_expressions: Option<bool>,
}

/// Get the XDG config directory for jobad.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "jobad").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("jobad.toml"))
}

/// Get the path to the local config file next to a document.
pub fn local_config_path(document_dir: &Path) -> PathBuf {
    document_dir.join(".jobad.toml")
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
    /// Overlay wins for every field it specifies.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            comparison: overlay.comparison.unwrap_or(self.comparison),
            change_scope: overlay.change_scope.unwrap_or(self.change_scope),
            strict_expressions: overlay
                .strict_expressions
                .unwrap_or(self.strict_expressions),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `document_dir` - Optional directory holding a local `.jobad.toml`
    pub fn load(document_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = document_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        Self::apply_env_overrides(current)
    }

    /// Apply JOBAD_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("JOBAD"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("comparison") {
            settings.comparison = match val.to_lowercase().as_str() {
                "numeric" => ComparisonPolicy::Numeric,
                "lexical" => ComparisonPolicy::Lexical,
                other => {
                    return Err(ApplicationError::Config {
                        message: format!("JOBAD_COMPARISON: unknown policy `{}`", other),
                    })
                }
            };
        }
        if let Ok(val) = config.get_string("change_scope") {
            settings.change_scope = match val.to_lowercase().as_str() {
                "subtree" => ChangeScope::Subtree,
                "document" => ChangeScope::Document,
                other => {
                    return Err(ApplicationError::Config {
                        message: format!("JOBAD_CHANGE_SCOPE: unknown scope `{}`", other),
                    })
                }
            };
        }
        if let Ok(val) = config.get_bool("strict_expressions") {
            settings.strict_expressions = val;
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
        r#"# jobad configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/jobad/jobad.toml
#   Local:  <document_dir>/.jobad.toml
#   Env:    JOBAD_* environment variables

# How `<` and `>` compare: "numeric" (integers when both sides parse, text otherwise)
# or "lexical" (always text)
# comparison = "numeric"

# Re-evaluated after a property change: "subtree" or "document"
# change_scope = "subtree"

# Fail loading documents that contain malformed conditions
# strict_expressions = false
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
