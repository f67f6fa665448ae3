//! Set up the user's hangproto directory

use std::fs;

use anyhow::Context;

use hanging_protocols::builtin::default_protocol;
use hanging_protocols::config::GlobalConfig;
use hanging_protocols::output::{InitReport, OutputMode};

/// Write the default config and create the protocol and study directories
///
/// The built-in fallback protocol is written into the library so it can be
/// edited like any other protocol.
pub fn init(force: bool, mode: OutputMode) -> anyhow::Result<()> {
    let config_path = GlobalConfig::config_path();
    if config_path.exists() && !force {
        InitReport {
            initialized: false,
            config: config_path.display().to_string(),
            protocols_dir: None,
            studies_dir: None,
            default_protocol: None,
        }
        .render(mode);
        return Ok(());
    }

    let config = GlobalConfig::default();
    config.save().with_context(|| format!("cannot write {}", config_path.display()))?;

    let protocols_dir = config.protocols_dir();
    let studies_dir = config.studies_dir();
    fs::create_dir_all(&protocols_dir).with_context(|| format!("cannot create {}", protocols_dir.display()))?;
    fs::create_dir_all(&studies_dir).with_context(|| format!("cannot create {}", studies_dir.display()))?;

    let fallback = default_protocol();
    let fallback_path = protocols_dir.join(format!("{}.json", fallback.id));
    let written = if force || !fallback_path.exists() {
        let document = serde_json::to_string_pretty(&fallback.to_object()?)?;
        fs::write(&fallback_path, document).with_context(|| format!("cannot write {}", fallback_path.display()))?;
        Some(fallback_path.display().to_string())
    } else {
        None
    };

    InitReport {
        initialized: true,
        config: config_path.display().to_string(),
        protocols_dir: Some(protocols_dir.display().to_string()),
        studies_dir: Some(studies_dir.display().to_string()),
        default_protocol: written,
    }
    .render(mode);
    Ok(())
}
