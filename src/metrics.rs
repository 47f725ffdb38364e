use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing summarization activity.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_summarized: AtomicU64,
    chunks_summarized: AtomicU64,
    chunks_failed: AtomicU64,
    last_chunk_count: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed document along with its per-chunk results.
    pub fn record_document(&self, chunks_summarized: u64, chunks_failed: u64) {
        self.documents_summarized.fetch_add(1, Ordering::Relaxed);
        self.chunks_summarized
            .fetch_add(chunks_summarized, Ordering::Relaxed);
        self.chunks_failed
            .fetch_add(chunks_failed, Ordering::Relaxed);
        self.last_chunk_count
            .store(chunks_summarized + chunks_failed, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let documents_summarized = self.documents_summarized.load(Ordering::Relaxed);
        MetricsSnapshot {
            documents_summarized,
            chunks_summarized: self.chunks_summarized.load(Ordering::Relaxed),
            chunks_failed: self.chunks_failed.load(Ordering::Relaxed),
            last_chunk_count: (documents_summarized > 0)
                .then(|| self.last_chunk_count.load(Ordering::Relaxed)),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents summarized since startup.
    pub documents_summarized: u64,
    /// Chunks whose summary was produced successfully.
    pub chunks_summarized: u64,
    /// Chunks skipped because the model call failed.
    pub chunks_failed: u64,
    /// Chunk count of the most recent document, if any.
    pub last_chunk_count: Option<u64>,
}
