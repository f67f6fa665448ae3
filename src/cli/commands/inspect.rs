//! Summarize protocol documents

use std::path::Path;

use anyhow::Context;
use hanging_protocols::adapters::{DirectoryProtocolSource, load_protocol_file};
use hanging_protocols::output::{InspectReport, OutputMode, ProtocolInfo};

/// Load each file (or directory of files) and print a summary per protocol
pub fn inspect(paths: &[impl AsRef<Path>], mode: OutputMode) -> anyhow::Result<()> {
    let mut protocols = Vec::new();

    for path in paths {
        let path = path.as_ref();
        if path.is_dir() {
            let source = DirectoryProtocolSource::open(path)
                .with_context(|| format!("cannot load protocols from {}", path.display()))?;
            for file in source.files() {
                for protocol in load_protocol_file(file)? {
                    protocols.push(ProtocolInfo::new(file.display().to_string(), &protocol));
                }
            }
        } else {
            let loaded = load_protocol_file(path).with_context(|| format!("cannot load {}", path.display()))?;
            for protocol in &loaded {
                protocols.push(ProtocolInfo::new(path.display().to_string(), protocol));
            }
        }
    }

    InspectReport { protocols }.render(mode);
    Ok(())
}
