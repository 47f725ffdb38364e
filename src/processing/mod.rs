//! Summarization pipeline: cleaning, chunking, map-then-reduce aggregation.

pub mod aggregate;
pub mod chunking;
pub mod cleaning;
mod service;
pub mod types;

pub use service::{DigestApi, DigestService};
pub use types::{
    Aggregate, ChunkFailure, ChunkOutcome, ChunkWarning, ChunkingError, ExtractionOutcome,
    ProcessingError, SummaryOptions, SummaryOutcome,
};
