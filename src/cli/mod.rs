//! # CLI Module
//!
//! Command-line access to a route configuration, used to check a table before deploying it.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! ```bash
//! edge-router routes --config config/app.yaml
//! ```
//!
//! ### `resolve`
//!
//! ```bash
//! edge-router resolve --config config/app.yaml --method POST /api/update/7
//! ```
//!
//! Exits with status 1 when the path is not mapped.
//!
//! ### `link`
//!
//! ```bash
//! edge-router link --config config/app.yaml --controller User --action edit --arg id=42
//! ```
//!
//! `--config` falls back to the `EDGE_CONFIG` environment variable.

mod commands;


pub use commands::{run_cli, Cli, Commands};
