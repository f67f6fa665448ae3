//! Port traits (interfaces) for external collaborators
//!
//! The engine depends only on these traits: where protocols come from,
//! how prior studies are loaded, and how constraints are evaluated.
//! Implementations live in the `adapters` module and in
//! [`crate::core::services::Validators`].

mod protocol_source;
mod study_source;
mod validator;

pub use protocol_source::{DEFAULT_PROTOCOL_ID, IterationStats, ProtocolDataSource, ProtocolVisitor, SearchResult};
pub use study_source::StudyMetadataSource;
pub use validator::ConstraintValidator;
