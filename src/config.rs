//! Configuration
//!
//! Two sources, both read once at startup:
//! - Environment: `NOTION_KEY` (integration token) and `NOTION_DATABASE_ID`
//! - Optional TOML file: `--config <path>`, else `~/.config/cover-sync/config.toml`
//!   when it exists. Missing keys fall back to the defaults below.
//!
//! CLI flags are applied on top by the command layer.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cover::{CanvasSize, CoverOptions, Resample};
use crate::notion::{DatabaseId, NOTION_API_BASE, NOTION_VERSION};

/// Environment variable holding the integration token
pub const TOKEN_VAR: &str = "NOTION_KEY";
/// Environment variable holding the database to sync
pub const DATABASE_VAR: &str = "NOTION_DATABASE_ID";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Config file layout
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub cover: CoverSection,
    pub notion: NotionSection,
}

/// `[cover]` table
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoverSection {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub color_quality: Option<u32>,
    pub filter: Option<Resample>,
}

/// `[notion]` table
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotionSection {
    pub api_base: Option<String>,
    pub version: Option<String>,
}

/// Where and how to talk to Notion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotionSettings {
    pub api_base: String,
    pub version: String,
}

impl Default for NotionSettings {
    fn default() -> Self {
        Self {
            api_base: NOTION_API_BASE.to_string(),
            version: NOTION_VERSION.to_string(),
        }
    }
}

/// Resolved settings, defaults merged with the config file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub cover: CoverOptions,
    pub notion: NotionSettings,
}

impl Settings {
    /// Load settings from `path`, or from the default location if it exists
    ///
    /// An explicit path must exist; the default one is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => Some(read_file(path)?),
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(path) => Some(read_file(&path)?),
                None => None,
            },
        };

        Self::from_file(file.unwrap_or_default())
    }

    /// Merge a parsed config file over the defaults and validate the result
    pub fn from_file(file: FileConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let canvas = CanvasSize {
            width: file.cover.width.unwrap_or(defaults.cover.canvas.width),
            height: file.cover.height.unwrap_or(defaults.cover.canvas.height),
        };
        let settings = Self {
            cover: CoverOptions {
                canvas,
                color_quality: file.cover.color_quality.unwrap_or(defaults.cover.color_quality),
                filter: file.cover.filter.unwrap_or(defaults.cover.filter),
            },
            notion: NotionSettings {
                api_base: file.notion.api_base.unwrap_or(defaults.notion.api_base),
                version: file.notion.version.unwrap_or(defaults.notion.version),
            },
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Apply CLI overrides
    pub fn with_overrides(mut self, color_quality: Option<u32>, filter: Option<Resample>) -> Result<Self, ConfigError> {
        if let Some(quality) = color_quality {
            self.cover.color_quality = quality;
        }
        if let Some(filter) = filter {
            self.cover.filter = filter;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let canvas = self.cover.canvas;
        if canvas.width == 0 || canvas.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "cover canvas must be non-empty, got {}x{}",
                canvas.width, canvas.height
            )));
        }
        if self.cover.color_quality == 0 {
            return Err(ConfigError::Invalid("color_quality must be at least 1".to_string()));
        }
        if url::Url::parse(&self.notion.api_base).is_err() {
            return Err(ConfigError::Invalid(format!(
                "notion.api_base is not a URL: {}",
                self.notion.api_base
            )));
        }
        Ok(())
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), "loaded config file");
    Ok(file)
}

/// `~/.config/cover-sync/config.toml` on Linux
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(env!("CARGO_PKG_NAME")).join("config.toml"))
}

/// Secrets and ids taken from the environment
#[derive(Clone)]
pub struct Credentials {
    token: String,
    database_id: Option<DatabaseId>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("database_id", &self.database_id)
            .finish()
    }
}

impl Credentials {
    /// Read credentials from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through `lookup`; empty values count as missing
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let token = read(TOKEN_VAR).ok_or(ConfigError::MissingVar(TOKEN_VAR))?;
        let database_id = read(DATABASE_VAR).map(DatabaseId::new);

        Ok(Self { token, database_id })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// The database to sync; required only by commands that query it
    pub fn database_id(&self) -> Result<&DatabaseId, ConfigError> {
        self.database_id.as_ref().ok_or(ConfigError::MissingVar(DATABASE_VAR))
    }
}
