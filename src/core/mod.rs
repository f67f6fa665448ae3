//! Core domain logic for hanging protocols
//!
//! This module contains pure business logic with no I/O dependencies.
//! All external interactions are abstracted through port traits.
//!
//! ## Architecture
//!
//! - `models/` - Domain types (Rule, Protocol, Viewport, study metadata)
//! - `services/` - Validators, matcher and the protocol engine
//! - `ports/` - Trait definitions for protocol and study sources
//! - `error` - Error types shared by all layers

pub mod error;
pub mod models;
pub mod ports;
pub mod services;
