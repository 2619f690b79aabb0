//! Error types for the query2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`GenerateError`] (**fatal**): the request cannot produce a document
//!   (missing query, no search credential, search API down, every image
//!   failed). Returned as `Err(GenerateError)` from
//!   [`crate::generate::Generator::generate`].
//!
//! * [`ImageError`] (**non-fatal**): a single image URL could not be turned
//!   into a page (download refused, undecodable bytes). The generator logs
//!   it and moves on to the next URL.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the query2pdf library.
///
/// Per-image failures use [`ImageError`] and never abort a request.
#[derive(Debug, Error)]
pub enum GenerateError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The request body or one of its fields is unusable.
    #[error("{0}")]
    Validation(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// A required setting (the search API key) is missing.
    #[error("{0}")]
    Configuration(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Upstream errors ───────────────────────────────────────────────────
    /// The image-search API failed or returned nothing usable.
    #[error("{message}")]
    Upstream {
        message: String,
        detail: Option<String>,
    },

    /// URLs were found but not one of them became a page.
    #[error("No pages created (all {attempted} image URLs failed)")]
    NoPagesProduced { attempted: usize },

    // ── Layout / encoding errors ──────────────────────────────────────────
    /// A decoded image reported a zero width or height.
    #[error("Invalid image size: {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },

    /// The document encoder was handed no pages.
    #[error("No pages to save")]
    EmptyPageSet,

    /// lopdf refused to serialise the document.
    #[error("PDF encoding failed: {0}")]
    PdfEncoding(#[from] lopdf::Error),

    /// Serialising the finished document to bytes failed.
    #[error("PDF write failed: {0}")]
    PdfWrite(#[source] std::io::Error),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GenerateError {
    /// Shorthand for an upstream failure that carries a diagnostic detail.
    pub fn upstream(message: impl Into<String>, detail: impl ToString) -> Self {
        GenerateError::Upstream {
            message: message.into(),
            detail: Some(detail.to_string()),
        }
    }

    /// Extra diagnostic text suitable for an error response body.
    pub fn detail(&self) -> Option<String> {
        match self {
            GenerateError::Upstream { detail, .. } => detail.clone(),
            GenerateError::InvalidImageSize { .. }
            | GenerateError::EmptyPageSet
            | GenerateError::PdfEncoding(_)
            | GenerateError::PdfWrite(_)
            | GenerateError::OutputWriteFailed { .. }
            | GenerateError::InvalidConfig(_)
            | GenerateError::Internal(_) => Some(self.to_string()),
            _ => None,
        }
    }
}

/// A non-fatal error for a single image URL.
///
/// Reported through [`crate::pipeline::fetch::FetchOutcome`] and the
/// progress callback. The overall request continues unless ALL images fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ImageError {
    /// Transport error, timeout or non-2xx status.
    #[error("Image {url}: download failed: {reason}")]
    FetchFailed { url: String, reason: String },

    /// The body was fetched but is not a decodable image.
    #[error("Image {url}: decode failed: {reason}")]
    DecodeFailed { url: String, reason: String },

    /// The decoded image could not be placed on a page.
    #[error("Image {url}: layout failed: {detail}")]
    LayoutFailed { url: String, detail: String },
}

impl ImageError {
    /// URL of the image that failed.
    pub fn url(&self) -> &str {
        match self {
            ImageError::FetchFailed { url, .. }
            | ImageError::DecodeFailed { url, .. }
            | ImageError::LayoutFailed { url, .. } => url,
        }
    }
}
