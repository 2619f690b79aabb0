//! Pipeline stages for query-to-PDF generation.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the two network-facing stages can be replaced by fakes.
//!
//! ## Data Flow
//!
//! ```text
//! search ──▶ fetch ──▶ orient ──▶ fit ──▶ encode
//! (URLs)    (RGB8)    (page)    (A4)    (PDF)
//! ```
//!
//! 1. [`search`]: query text → ordered image URLs (SerpApi)
//! 2. [`fetch`]: URL → decoded RGB image, or a per-image failure
//! 3. [`orient`]: portrait vs. landscape from the aspect ratio
//! 4. [`fit`]: aspect-preserving scale onto a white, margin-inset page
//! 5. [`encode`]: fitted pages → one multi-page PDF at the page DPI

pub mod encode;
pub mod fetch;
pub mod fit;
pub mod orient;
pub mod search;
