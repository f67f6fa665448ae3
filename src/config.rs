//! Global configuration management
//!
//! Config is stored at `~/.config/hangproto/config.toml`. A missing or
//! unreadable file yields the defaults; command-line flags override it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::ports::DEFAULT_PROTOCOL_ID;
use crate::paths;

/// Global hangproto configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Where protocols and studies are read from
    #[serde(default)]
    pub library: LibraryConfig,
    /// Output preferences
    #[serde(default)]
    pub output: OutputConfig,
}

/// Protocol and study locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Directory of protocol documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocols_dir: Option<PathBuf>,
    /// Directory of study metadata documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub studies_dir: Option<PathBuf>,
    /// Id of the protocol used when nothing matches
    #[serde(default = "default_protocol_id")]
    pub default_protocol_id: String,
    /// Add the built-in default protocol when the library lacks one
    #[serde(default = "default_true")]
    pub builtin_default: bool,
}

fn default_protocol_id() -> String {
    DEFAULT_PROTOCOL_ID.to_string()
}

const fn default_true() -> bool {
    true
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            protocols_dir: None,
            studies_dir: None,
            default_protocol_id: default_protocol_id(),
            builtin_default: true,
        }
    }
}

/// Output preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Emit JSON unless `--json` is given explicitly
    #[serde(default)]
    pub json: bool,
    /// Include per-rule match details in human output
    #[serde(default)]
    pub show_details: bool,
}

impl GlobalConfig {
    /// Get the config file path
    #[must_use]
    pub fn config_path() -> PathBuf {
        paths::global_config()
    }

    /// Load config from disk, or the defaults if not present
    #[must_use]
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from a specific file, or the defaults
    #[must_use]
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path).map(|content| toml::from_str(&content)) {
            Ok(Ok(config)) => config,
            Ok(Err(e)) => {
                log::warn!("ignoring invalid config {}: {e}", path.display());
                Self::default()
            },
            Err(e) => {
                log::warn!("cannot read config {}: {e}", path.display());
                Self::default()
            },
        }
    }

    /// Save config to disk
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Protocol library directory, configured or default
    #[must_use]
    pub fn protocols_dir(&self) -> PathBuf {
        self.library.protocols_dir.clone().unwrap_or_else(paths::default_protocols_dir)
    }

    /// Study metadata directory, configured or default
    #[must_use]
    pub fn studies_dir(&self) -> PathBuf {
        self.library.studies_dir.clone().unwrap_or_else(paths::default_studies_dir)
    }
}
