//! Meli Pulse Core - Shared domain types.
//!
//! This crate provides the types used across all Meli Pulse components:
//! - `dashboard` - Marketplace client, metrics engine and JSON API
//! - `cli` - Command-line runs of the metrics engine
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions over them - no I/O,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Marketplace records (orders, packs, questions, listings),
//!   derived sale records, snapshots, and the revenue accounting rules

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
