//! Business logic services
//!
//! Pure orchestration logic that operates on domain models. Only the
//! engine performs I/O, and only through the port traits.
//!
//! - [`validators`] - Built-in constraint validators
//! - [`matcher`] - Score metadata against rules
//! - [`memo`] - Single-flight memo cells
//! - [`engine`] - Protocol ranking and image matching

pub mod engine;
pub mod matcher;
pub mod memo;
pub mod validators;

pub use engine::{
    ImageMatch, ImageMatches, MemoKey, ProtocolEngine, ProtocolMatch, ProtocolSummary, SortingInfo,
};
pub use matcher::{AttributeCallback, FailedRule, MatchDetails, MatchResult, Matcher, PassedRule};
pub use memo::{Memo, MemoState, RetryMemo};
pub use validators::Validators;
