//! Request orchestration: query → search → fetch/fit per image → PDF.
//!
//! [`Generator`] holds no per-request state. Each call to
//! [`Generator::generate`] is one linear pipeline whose images, pages and
//! counters are local to that call, so a single `Arc<Generator>` serves any
//! number of concurrent requests without locking.
//!
//! Images are processed one at a time in search-result order. A URL that
//! fails to download, decode or fit is logged and skipped; the request only
//! fails when not a single page could be produced.

use crate::config::{GeneratorConfig, OrientationMode};
use crate::error::{GenerateError, ImageError};
use crate::output::{GeneratedDocument, GenerationStats};
use crate::pipeline::encode;
use crate::pipeline::fetch::{FetchOutcome, HttpImageFetcher, ImageFetch};
use crate::pipeline::fit::{self, FittedPage};
use crate::pipeline::orient::select_orientation;
use crate::pipeline::search::{ImageSearch, SerpApiSearch};
use crate::request::GenerationRequest;
use image::RgbImage;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Turns [`GenerationRequest`]s into PDFs.
pub struct Generator {
    config: GeneratorConfig,
    search: Arc<dyn ImageSearch>,
    fetcher: Arc<dyn ImageFetch>,
}

impl Generator {
    /// Production generator: SerpApi search and HTTP image downloads.
    pub fn new(config: GeneratorConfig) -> Result<Self, GenerateError> {
        let search = Arc::new(SerpApiSearch::from_config(&config)?);
        let fetcher = Arc::new(HttpImageFetcher::from_config(&config)?);
        Ok(Self::with_collaborators(config, search, fetcher))
    }

    /// Generator with caller-supplied search and fetch implementations.
    pub fn with_collaborators(
        config: GeneratorConfig,
        search: Arc<dyn ImageSearch>,
        fetcher: Arc<dyn ImageFetch>,
    ) -> Self {
        Self {
            config,
            search,
            fetcher,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Run one request to completion.
    ///
    /// # Errors
    /// - [`GenerateError::Validation`]: blank query or unknown orientation;
    ///   raised before any outbound call
    /// - [`GenerateError::Configuration`]: no search credential
    /// - [`GenerateError::Upstream`]: search failed or found nothing
    /// - [`GenerateError::NoPagesProduced`]: every image URL failed
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedDocument, GenerateError> {
        let total_start = Instant::now();

        // ── Step 1: Validate ─────────────────────────────────────────────
        let query = request.query()?.to_string();
        let mode = request.orientation_mode()?;
        let count = request.image_count(self.config.max_images);
        let margin_ratio = request.margin_ratio;
        let filename = request.sanitized_filename();
        info!(
            "Generating PDF for {:?}: {} images, orientation {:?}, margin {}",
            query, count, mode, margin_ratio
        );

        // ── Step 2: Search ───────────────────────────────────────────────
        let search_start = Instant::now();
        let mut urls = self.search.search(&query, count).await?;
        urls.truncate(count);
        let search_duration_ms = search_start.elapsed().as_millis() as u64;
        if urls.is_empty() {
            return Err(GenerateError::Upstream {
                message: "No image URLs returned".into(),
                detail: None,
            });
        }
        info!("Search found {} URLs in {}ms", urls.len(), search_duration_ms);

        // ── Step 3: Fetch, orient and fit each image in order ────────────
        let total = urls.len();
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_generation_start(total);
        }

        let fetch_start = Instant::now();
        let mut pages: Vec<FittedPage> = Vec::with_capacity(total);
        let mut skipped = 0usize;

        for (i, url) in urls.iter().enumerate() {
            let index = i + 1;
            if let Some(ref cb) = self.config.progress_callback {
                cb.on_image_start(index, total);
            }

            let placed = match self.fetcher.fetch(url).await {
                FetchOutcome::Fetched(img) => self.place(url, img, mode, margin_ratio).await,
                FetchOutcome::Failed(e) => Err(e),
            };

            match placed {
                Ok(page) => {
                    debug!("Image {}/{} → {} page", index, total, page.orientation);
                    if let Some(ref cb) = self.config.progress_callback {
                        cb.on_page_complete(index, total, page.orientation);
                    }
                    pages.push(page);
                }
                Err(e) => {
                    warn!("Skipping image {}/{}: {}", index, total, e);
                    if let Some(ref cb) = self.config.progress_callback {
                        cb.on_image_error(index, total, &e.to_string());
                    }
                    skipped += 1;
                }
            }
        }
        let fetch_duration_ms = fetch_start.elapsed().as_millis() as u64;

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_generation_complete(total, pages.len());
        }

        if pages.is_empty() {
            return Err(GenerateError::NoPagesProduced { attempted: total });
        }

        // ── Step 4: Encode ───────────────────────────────────────────────
        let encode_start = Instant::now();
        let pages_produced = pages.len();
        let dpi = self.config.dpi;
        let title = query.clone();
        let bytes = tokio::task::spawn_blocking(move || {
            encode::encode_document(pages, dpi, Some(&title))
        })
        .await
        .map_err(|e| GenerateError::Internal(format!("Encode task panicked: {e}")))??;
        let encode_duration_ms = encode_start.elapsed().as_millis() as u64;

        let stats = GenerationStats {
            requested: count,
            urls_found: total,
            pages_produced,
            images_skipped: skipped,
            search_duration_ms,
            fetch_duration_ms,
            encode_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
            pdf_bytes: bytes.len(),
        };

        info!(
            "PDF ready: {}/{} pages, {} bytes, {}ms total",
            pages_produced, total, stats.pdf_bytes, stats.total_duration_ms
        );

        Ok(GeneratedDocument {
            bytes,
            filename,
            stats,
        })
    }

    /// Generate and write the PDF to `output_path`.
    ///
    /// Uses atomic write (temp file + rename) to prevent partial files.
    pub async fn generate_to_file(
        &self,
        request: &GenerationRequest,
        output_path: impl AsRef<Path>,
    ) -> Result<GenerationStats, GenerateError> {
        let doc = self.generate(request).await?;
        let path = output_path.as_ref();
        let write_err = |source| GenerateError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let tmp_path = path.with_extension("pdf.tmp");
        tokio::fs::write(&tmp_path, &doc.bytes)
            .await
            .map_err(write_err)?;
        tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

        Ok(doc.stats)
    }

    /// Orient and fit one decoded image off the async executor.
    async fn place(
        &self,
        url: &str,
        img: RgbImage,
        mode: OrientationMode,
        margin_ratio: f64,
    ) -> Result<FittedPage, ImageError> {
        let dpi = self.config.dpi;
        let layout_failed = |detail: String| ImageError::LayoutFailed {
            url: url.to_string(),
            detail,
        };

        tokio::task::spawn_blocking(move || {
            let orientation = select_orientation(mode, img.width(), img.height());
            fit::fit_to_page(&img, orientation, margin_ratio, dpi)
        })
        .await
        .map_err(|e| layout_failed(format!("fit task panicked: {e}")))?
        .map_err(|e| layout_failed(e.to_string()))
    }
}
