//! Adapter implementations for port traits
//!
//! This module contains concrete implementations that handle I/O:
//!
//! - `memory` - Protocol library held in memory
//! - `directory` - Protocol library read from JSON/TOML documents
//! - `studies` - Study metadata read from JSON documents

pub mod directory;
pub mod memory;
pub mod studies;

pub use directory::{DirectoryProtocolSource, is_protocol_document, load_protocol_file};
pub use memory::InMemoryProtocolSource;
pub use studies::{DirectoryStudySource, load_study_file};
