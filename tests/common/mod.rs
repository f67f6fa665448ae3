//! Common test utilities shared across test types
//!
//! - `fixtures.rs` - Test data builders
//! - `mocks.rs` - Counting and failing data sources

pub mod fixtures;
pub mod mocks;
