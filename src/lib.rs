//! # query2pdf
//!
//! Turn an image-search query into a printable A4 PDF: one search result per
//! page, scaled to fill the page, centred on white.
//!
//! ## Pipeline Overview
//!
//! ```text
//! query
//!  │
//!  ├─ 1. Validate  trim query, clamp count to 1–20
//!  ├─ 2. Search    SerpApi google_images → ordered image URLs
//!  ├─ 3. Fetch     download + decode each URL (failures are skipped)
//!  ├─ 4. Orient    auto: aspect ≥ 1.0 → landscape, else portrait
//!  ├─ 5. Fit       Lanczos3 scale into the margin box, centre on white A4
//!  └─ 6. Encode    multi-page PDF, page size = pixels at 300 DPI
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use query2pdf::{GenerationRequest, Generator, GeneratorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GeneratorConfig::builder()
//!         .serpapi_key(std::env::var("SERPAPI_KEY")?)
//!         .build()?;
//!     let generator = Generator::new(config)?;
//!
//!     let mut request = GenerationRequest::new("lighthouses at dusk");
//!     request.num_images = 4;
//!     let stats = generator.generate_to_file(&request, "lighthouses.pdf").await?;
//!     eprintln!("{} pages, {} skipped", stats.pages_produced, stats.images_skipped);
//!     Ok(())
//! }
//! ```
//!
//! ## Serving over HTTP
//!
//! [`server::build_router`] wraps a shared [`Generator`] in an axum router
//! exposing `GET` (health), `OPTIONS` (CORS preflight) and `POST`
//! (generation). The `query2pdf serve` binary command runs it.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `query2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod request;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GeneratorConfig, GeneratorConfigBuilder, Orientation, OrientationMode};
pub use error::{GenerateError, ImageError};
pub use generate::Generator;
pub use output::{GeneratedDocument, GenerationStats};
pub use pipeline::fetch::{FetchOutcome, HttpImageFetcher, ImageFetch};
pub use pipeline::search::{ImageSearch, SerpApiSearch};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use request::GenerationRequest;
