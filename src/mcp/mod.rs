//! Model Context Protocol (MCP) integration for Rusty Digest.
//!
//! This module wires the summarization pipeline into an MCP server so editors and agent hosts
//! can summarize PDFs over stdio. The surface area consists of:
//!
//! - Tools: `summarize-document`, `extract-text`, and `metrics`.
//! - Resources: `mcp://settings` with the effective pipeline defaults.

mod format;
pub mod handlers;
mod registry;
mod schemas;
mod server;

pub use server::RustyDigestMcpServer;
