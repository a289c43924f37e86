//! Config file discovery and merging.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::pages::PageSelection;
use super::settings::ConversionSettings;
use super::tools::ToolPaths;
use super::vocabulary::Vocabulary;
use super::ConfigError;

/// Config filename looked up in the working directory.
pub const CONFIG_FILENAME: &str = "ocrsweep.toml";

/// Options for loading the config file.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Directory searched for `ocrsweep.toml` (defaults to the CWD).
    pub search_dir: Option<PathBuf>,
    /// Skip the per-user config directory.
    pub skip_user_config: bool,
}

/// Conversion options as they appear in a config file or on the command
/// line. Unset fields fall through to the next layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOverrides {
    #[serde(skip_serializing_if = "Option::is_none", alias = "lang")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimize: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate_pages: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deskew: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drawing_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deep_verify: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiet: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<PageSelection>,
}

impl ConversionOverrides {
    /// Layer `other` on top of `self`; set fields in `other` win.
    pub fn merged(self, other: ConversionOverrides) -> Self {
        Self {
            language: other.language.or(self.language),
            optimize: other.optimize.or(self.optimize),
            jobs: other.jobs.or(self.jobs),
            rotate_pages: other.rotate_pages.or(self.rotate_pages),
            deskew: other.deskew.or(self.deskew),
            drawing_mode: other.drawing_mode.or(self.drawing_mode),
            deep_verify: other.deep_verify.or(self.deep_verify),
            quiet: other.quiet.or(self.quiet),
            pages: other.pages.or(self.pages),
        }
    }

    /// Apply onto the defaults and validate.
    pub fn into_settings(self) -> Result<ConversionSettings, ConfigError> {
        let defaults = ConversionSettings::default();
        ConversionSettings {
            language: self
                .language
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .unwrap_or(defaults.language),
            optimize: self.optimize.unwrap_or(defaults.optimize),
            jobs: self.jobs.unwrap_or(defaults.jobs),
            rotate_pages: self.rotate_pages.unwrap_or(defaults.rotate_pages),
            deskew: self.deskew.unwrap_or(defaults.deskew),
            drawing_mode: self.drawing_mode.unwrap_or(defaults.drawing_mode),
            deep_verify: self.deep_verify.unwrap_or(defaults.deep_verify),
            quiet: self.quiet.unwrap_or(defaults.quiet),
            pages: self.pages.or(defaults.pages),
        }
        .validate()
    }
}

/// Config file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub conversion: ConversionOverrides,
    pub tools: ToolPaths,
    pub vocabulary: Vocabulary,
    /// Where this config was read from, if anywhere.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ocrsweep").join("config.toml"))
}

/// Locate the config file to use, if any.
fn find_config(options: &LoadOptions) -> Option<PathBuf> {
    if let Some(ref path) = options.config_path {
        return Some(path.clone());
    }

    let search_dir = options
        .search_dir
        .clone()
        .or_else(|| std::env::current_dir().ok());
    if let Some(candidate) = search_dir.map(|d| d.join(CONFIG_FILENAME)) {
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    if options.skip_user_config {
        return None;
    }
    user_config_path().filter(|p| p.is_file())
}

/// Load the config file, falling back to defaults when none exists.
///
/// An explicitly requested file that cannot be read is an error.
pub fn load_config(options: &LoadOptions) -> Result<Config, ConfigError> {
    match find_config(options) {
        Some(path) => {
            tracing::debug!("Loading config from {}", path.display());
            Config::from_file(&path)
        }
        None => {
            tracing::debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}
