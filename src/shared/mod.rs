//! Shared utilities used across the codebase
//!
//! - [`sort`] - Multi-key stable sorting
//! - [`date`] - Strict date parsing for documents
//! - [`collections`] - Vector helpers

pub mod collections;
pub mod date;
pub mod sort;
