//! Progress-callback trait for per-image generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GeneratorConfigBuilder::progress_callback`] to receive
//! events as the generator walks the search results. The CLI uses it to drive
//! a terminal progress bar; the HTTP server leaves it unset.
//!
//! # Example
//!
//! ```rust
//! use query2pdf::{GenerationProgressCallback, GeneratorConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     pages: Arc<AtomicUsize>,
//! }
//!
//! impl GenerationProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, index: usize, total: usize, _orientation: query2pdf::Orientation) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("image {}/{} placed", index, total);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     pages: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = GeneratorConfig::builder()
//!     .progress_callback(counter as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::config::Orientation;
use std::sync::Arc;

/// Called by the generator as it processes each image URL.
///
/// Implementations must be `Send + Sync`: one config (and its callback) can be
/// shared by concurrent requests. All methods default to no-ops.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once after the search returned `total_urls` URLs.
    fn on_generation_start(&self, total_urls: usize) {
        let _ = total_urls;
    }

    /// Called just before an image is downloaded.
    ///
    /// # Arguments
    /// * `index`: 1-indexed position in the search results
    /// * `total`: number of URLs being processed
    fn on_image_start(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called when an image has been placed on a page.
    fn on_page_complete(&self, index: usize, total: usize, orientation: Orientation) {
        let _ = (index, total, orientation);
    }

    /// Called when an image is skipped.
    ///
    /// # Arguments
    /// * `error`: human-readable reason
    fn on_image_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after every URL has been attempted.
    fn on_generation_complete(&self, total_urls: usize, page_count: usize) {
        let _ = (total_urls, page_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GeneratorConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
