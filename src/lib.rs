//! G-code / M-code hover documentation
//!
//! Resolves a CNC program token such as `g1` or `M30` to documentation text,
//! scraped from the Haas code reference and cached on disk for seven days.
//!
//! # Modules
//!
//! - [`code`]: Token validation and normalization into cache keys
//! - [`extract`]: HTML fragment to hover text reduction
//! - [`fetcher`]: Remote documentation source
//! - [`cache`]: Expiring, JSON-persisted documentation cache
//! - [`lookup`]: Normalize, cache, fetch and store pipeline
//! - [`mcp`]: MCP tool exposing lookups to an editor host

pub mod cache;
pub mod code;
pub mod extract;
pub mod fetcher;
pub mod lookup;
pub mod mcp;
