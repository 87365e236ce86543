//! Meli Pulse dashboard library.
//!
//! This crate provides the dashboard backend as a library, allowing it to be
//! tested and reused by the CLI.
//!
//! # Components
//!
//! - [`mercadolibre`] - REST client for the marketplace API
//! - [`engine`] - order aggregation and metrics computation
//! - [`routes`] - JSON API served by the `meli-pulse-dashboard` binary

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod engine;
pub mod error;
pub mod mercadolibre;
pub mod routes;
pub mod state;
