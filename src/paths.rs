//! Centralized path definitions for hangproto
//!
//! ## Storage Layout
//!
//! ```text
//! ~/.config/hangproto/
//! ├── config.toml               # User preferences
//! ├── protocols/                # Default protocol library
//! │   ├── chest-ct.json
//! │   └── mammo.toml
//! └── studies/                  # Default study metadata documents
//!     └── 1.2.840.113619.json
//! ```
//!
//! Every directory can be overridden in `config.toml` or on the command line.

use std::path::PathBuf;

/// Directory name under the user's config dir
const APP_DIR: &str = "hangproto";

/// Global config filename
const GLOBAL_CONFIG_FILE: &str = "config.toml";

/// Protocol library subdirectory
const PROTOCOLS_DIR: &str = "protocols";

/// Study metadata subdirectory
const STUDIES_DIR: &str = "studies";

/// Get the global hangproto directory.
///
/// Returns `~/.config/hangproto/` (platform config dir).
#[must_use]
pub fn global_config_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Get the global config file path.
#[must_use]
pub fn global_config() -> PathBuf {
    global_config_dir().join(GLOBAL_CONFIG_FILE)
}

/// Default protocol library directory.
#[must_use]
pub fn default_protocols_dir() -> PathBuf {
    global_config_dir().join(PROTOCOLS_DIR)
}

/// Default study metadata directory.
#[must_use]
pub fn default_studies_dir() -> PathBuf {
    global_config_dir().join(STUDIES_DIR)
}
