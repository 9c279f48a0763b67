//! Async client for the Ripple social feed API.
//!
//! The crate is organized around two layers:
//!
//! - [`api`] - wire types, the failure taxonomy, and the HTTP client
//! - [`feed`] - the filter/pagination state machine that orchestrates it
//!
//! [`config`] holds the optional TOML configuration used by the CLI binary.

pub mod api;
pub mod config;
pub mod feed;
