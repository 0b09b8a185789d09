//! bundle-core library: the weighted graph model, quota tables, error codes,
//! and configuration shared by the Bundle Index engine and CLI.
//!
//! # Conventions
//!
//! - **Errors**: library modules return typed `thiserror` errors that map to
//!   an [`error::ErrorCode`]. Config loading uses `anyhow::Result`.
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `debug!`).

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod graph;
pub mod quota;
