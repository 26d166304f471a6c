//! Connection settings for the Notion workspace
//!
//! Settings are assembled from layers: command line flags, environment
//! variables and an optional JSON file. Higher layers win field by field.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{DbError, DbResult};

/// Default upstream API root
pub const DEFAULT_API_URL: &str = "https://api.notion.com/v1";

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "ACTRACK_CONFIG";

/// Config file location relative to the platform config directory
pub const CONFIG_FILE: &str = "actrack/config.json";

/// One source of settings. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub parent_database_id: Option<String>,
    pub child_database_id: Option<String>,
}

/// Fully resolved settings
#[derive(Clone, PartialEq, Eq)]
pub struct NotionConfig {
    pub api_url: String,
    pub token: String,
    pub parent_database_id: String,
    pub child_database_id: String,
}

impl fmt::Debug for NotionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionConfig")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("parent_database_id", &self.parent_database_id)
            .field("child_database_id", &self.child_database_id)
            .finish()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ConfigLayer {
    /// Read a layer from a JSON file.
    pub fn from_file(path: &Path) -> DbResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| DbError::ConfigFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&text).map_err(|e| DbError::Config {
            message: format!("invalid config file {}: {}", path.display(), e),
        })
    }

    /// Read the config file if it exists. A missing file is an empty layer.
    pub fn load_optional(path: Option<&Path>) -> DbResult<Self> {
        match path {
            Some(path) if path.exists() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// Fill unset fields of `self` from `lower`.
    pub fn or(self, lower: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            api_url: non_blank(self.api_url).or(non_blank(lower.api_url)),
            token: non_blank(self.token).or(non_blank(lower.token)),
            parent_database_id: non_blank(self.parent_database_id)
                .or(non_blank(lower.parent_database_id)),
            child_database_id: non_blank(self.child_database_id)
                .or(non_blank(lower.child_database_id)),
        }
    }

    /// Turn the merged layer into validated settings.
    pub fn resolve(self) -> DbResult<NotionConfig> {
        let missing = |what: &str, flag: &str, env: &str| DbError::Config {
            message: format!("missing {} (set {} or {})", what, flag, env),
        };

        let config = NotionConfig {
            api_url: non_blank(self.api_url).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            token: non_blank(self.token)
                .ok_or_else(|| missing("API token", "--token", "NOTION_API_KEY"))?,
            parent_database_id: non_blank(self.parent_database_id).ok_or_else(|| {
                missing("parent database id", "--parent-db", "NOTION_DB_PARENT")
            })?,
            child_database_id: non_blank(self.child_database_id)
                .ok_or_else(|| missing("child database id", "--child-db", "NOTION_DB_CHILD"))?,
        };
        config.validate()?;
        Ok(config)
    }
}

impl NotionConfig {
    /// Reject settings that cannot possibly reach the upstream API.
    pub fn validate(&self) -> DbResult<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(DbError::Config {
                message: format!("API URL must be http(s), got '{}'", self.api_url),
            });
        }
        if self.token.trim().is_empty() {
            return Err(DbError::Config {
                message: "API token is empty".to_string(),
            });
        }
        if self.parent_database_id.trim().is_empty() || self.child_database_id.trim().is_empty() {
            return Err(DbError::Config {
                message: "database ids must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Config file location.
///
/// Priority:
/// 1. `override_path` (the value of `ACTRACK_CONFIG`, if non-empty)
/// 2. `<config_dir>/actrack/config.json`
pub fn config_file_path(override_path: Option<String>) -> Option<PathBuf> {
    if let Some(path) = non_blank(override_path) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join(CONFIG_FILE))
}
