//! Output types returned by the generator.

use serde::{Deserialize, Serialize};

/// A finished PDF plus bookkeeping about how it was produced.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    /// The encoded PDF.
    pub bytes: Vec<u8>,
    /// Sanitised download filename.
    pub filename: String,
    pub stats: GenerationStats,
}

impl GeneratedDocument {
    pub fn page_count(&self) -> usize {
        self.stats.pages_produced
    }
}

/// Per-request counters and timings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Image count after clamping.
    pub requested: usize,
    /// URLs returned by the search.
    pub urls_found: usize,
    pub pages_produced: usize,
    /// URLs that failed to download, decode or fit.
    pub images_skipped: usize,
    pub search_duration_ms: u64,
    /// Download, decode and fit time across all images.
    pub fetch_duration_ms: u64,
    pub encode_duration_ms: u64,
    pub total_duration_ms: u64,
    /// Size of the encoded PDF.
    pub pdf_bytes: usize,
}
