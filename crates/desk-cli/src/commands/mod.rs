//! Command implementations
//!
//! Every command writes its result to the given writer and returns an
//! `anyhow` error for the binary to report.

pub mod mcp;
pub mod panes;
pub mod structure;
