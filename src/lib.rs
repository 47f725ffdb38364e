#![deny(missing_docs)]

//! Core library for Rusty Digest: PDF text extraction, sentence-aligned chunking, and
//! map-then-reduce abstractive summarization.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// PDF text extraction and previews.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Model Context Protocol server implementation.
pub mod mcp;
/// Pipeline metrics helpers.
pub mod metrics;
/// Document summarization pipeline utilities.
pub mod processing;
/// Summarization model clients.
pub mod summarization;
