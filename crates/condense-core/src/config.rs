use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "condense.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub fields: FieldRules,
}

/// Field classification for the condenser.
///
/// Every field is exactly one of: identity-discard (`discard`), mergeable
/// (`merge`), or carry-through (anything else).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRules {
    /// Input column holding the pre-assigned cluster id.
    #[serde(default = "default_cluster_key")]
    pub cluster_key: String,
    /// Per-entry fields dropped from every aggregate.
    #[serde(default = "default_discard")]
    pub discard: Vec<String>,
    /// Fields whose distinct values are unioned, in merge order.
    #[serde(default = "default_merge")]
    pub merge: Vec<String>,
    /// Joins merged values.
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default)]
    pub missing_key: MissingKeyPolicy,
}

impl Default for FieldRules {
    fn default() -> Self {
        Self {
            cluster_key: default_cluster_key(),
            discard: default_discard(),
            merge: default_merge(),
            separator: default_separator(),
            missing_key: MissingKeyPolicy::default(),
        }
    }
}

impl FieldRules {
    /// Returns true if `name` is an identity-discard field.
    #[must_use]
    pub fn is_discarded(&self, name: &str) -> bool {
        self.discard.iter().any(|d| d == name)
    }
}

/// How rows without a usable cluster key are condensed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingKeyPolicy {
    /// Each keyless row becomes its own aggregate.
    #[default]
    Singleton,
    /// All keyless rows form a single trailing cluster.
    Group,
}

fn default_cluster_key() -> String {
    "Cluster ID".to_string()
}

fn default_discard() -> Vec<String> {
    [
        "Cluster ID",
        "ID",
        "ADDRESS_1",
        "ADDRESS_2",
        "CITY",
        "STATE",
        "ZIPCODE",
        "PHONE",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_merge() -> Vec<String> {
    [
        "FULL_NAME",
        "EMAIL",
        "NPI_NUMBER",
        "JDE_NUMBER",
        "FOX_CHS_ID",
        "FOX_WBY_ID",
        "MODIO_ID",
        "FSMB_ID",
        "DIVISION",
        "SOURCE",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_separator() -> String {
    "; ".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) | Self::Read { .. } | Self::Parse { .. } => {
                ErrorCode::ConfigParseError
            }
        }
    }
}

/// Load a config file. The file must exist.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file is missing, unreadable, or not valid TOML.
pub fn load_config(path: &Path) -> Result<ProjectConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str::<ProjectConfig>(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve the effective config.
///
/// An explicit path wins and must exist. Otherwise `condense.toml` in
/// `working_dir` is used when present, else built-in defaults.
///
/// # Errors
///
/// Returns [`ConfigError`] if the selected file cannot be read or parsed.
pub fn resolve_config(
    explicit: Option<&Path>,
    working_dir: &Path,
) -> Result<ProjectConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_config(path);
    }

    let path = working_dir.join(DEFAULT_CONFIG_FILE);
    if !path.exists() {
        tracing::debug!("no {DEFAULT_CONFIG_FILE} found, using built-in field rules");
        return Ok(ProjectConfig::default());
    }

    tracing::debug!(path = %path.display(), "loading field rules");
    load_config(&path)
}
