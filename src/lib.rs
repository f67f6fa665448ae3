//! hanging-protocols - Hanging protocol selection and image placement
//!
//! A hanging protocol describes how a radiology study is laid out on screen:
//! stages of screens, each screen a grid of viewports, each viewport selecting
//! images by weighted rules. This library ranks a protocol library against a
//! study and ranks the images of the study (or a prior) for each viewport.

// Deny all clippy warnings in this crate
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_import_braces,
    unused_qualifications
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cargo_common_metadata
)]

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod adapters;
pub mod builtin;
pub mod config;
pub mod core;
pub mod document;
pub mod output;
pub mod paths;
pub mod shared;
