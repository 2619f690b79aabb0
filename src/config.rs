//! Configuration types for query-to-PDF generation.
//!
//! Process-wide settings (search credential, timeouts, page resolution) live
//! in [`GeneratorConfig`], built via [`GeneratorConfigBuilder`]. Per-call
//! options (query, image count, orientation, margin, filename) arrive as a
//! [`crate::request::GenerationRequest`] instead.
//!
//! The library never reads `SERPAPI_KEY` itself; the binary passes it in
//! through [`GeneratorConfigBuilder::serpapi_key`].

use crate::error::GenerateError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default SerpApi search endpoint.
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://serpapi.com/search";

/// Resolution used for page sizing and PDF scale.
pub const DEFAULT_DPI: u32 = 300;

/// Hard ceiling on images per request.
pub const MAX_IMAGES: usize = 20;

/// Largest image download accepted, in bytes.
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 25 * 1024 * 1024;

/// Configuration for a [`crate::generate::Generator`].
///
/// # Example
/// ```rust
/// use query2pdf::GeneratorConfig;
///
/// let config = GeneratorConfig::builder()
///     .serpapi_key("test-key")
///     .request_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 300);
/// ```
#[derive(Clone)]
pub struct GeneratorConfig {
    /// SerpApi credential. `None` makes every search fail with
    /// [`GenerateError::Configuration`] before any network call.
    pub serpapi_key: Option<String>,

    /// Search endpoint URL. Default: [`DEFAULT_SEARCH_ENDPOINT`].
    pub search_endpoint: String,

    /// Page resolution in dots per inch. Range: 72–600. Default: 300.
    ///
    /// Used both to size the A4 canvas in pixels and to scale the PDF page,
    /// so a viewer reports 8.27 × 11.69 in regardless of the value. The HTTP
    /// endpoint always runs at the default; lower values are for quick CLI
    /// drafts and tests.
    pub dpi: u32,

    /// Upper clamp for `num_images`. Range: 1–20. Default: 20.
    pub max_images: usize,

    /// TCP connect timeout for outbound calls, in seconds. Default: 5.
    pub connect_timeout_secs: u64,

    /// Whole-request timeout for outbound calls, in seconds. Default: 20.
    pub request_timeout_secs: u64,

    /// `User-Agent` sent with image downloads.
    pub user_agent: String,

    /// Download size cap per image. Larger bodies fail that image only.
    /// Default: 25 MiB.
    pub max_image_bytes: u64,

    /// Optional per-image progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            serpapi_key: None,
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            dpi: DEFAULT_DPI,
            max_images: MAX_IMAGES,
            connect_timeout_secs: 5,
            request_timeout_secs: 20,
            user_agent: format!(
                "Mozilla/5.0 (compatible; query2pdf/{})",
                env!("CARGO_PKG_VERSION")
            ),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("serpapi_key", &self.serpapi_key.as_ref().map(|_| "<redacted>"))
            .field("search_endpoint", &self.search_endpoint)
            .field("dpi", &self.dpi)
            .field("max_images", &self.max_images)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_image_bytes", &self.max_image_bytes)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn GenerationProgressCallback>"),
            )
            .finish()
    }
}

impl GeneratorConfig {
    /// Create a new builder for `GeneratorConfig`.
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GeneratorConfig`].
#[derive(Debug)]
pub struct GeneratorConfigBuilder {
    config: GeneratorConfig,
}

impl GeneratorConfigBuilder {
    /// Set the SerpApi key. Blank strings count as "no key".
    pub fn serpapi_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        let key = key.trim();
        self.config.serpapi_key = if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        };
        self
    }

    pub fn search_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.search_endpoint = url.into();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn max_images(mut self, n: usize) -> Self {
        self.config.max_images = n.clamp(1, MAX_IMAGES);
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout_secs = secs;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn max_image_bytes(mut self, bytes: u64) -> Self {
        self.config.max_image_bytes = bytes.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GeneratorConfig, GenerateError> {
        let c = &self.config;
        if c.search_endpoint.trim().is_empty() {
            return Err(GenerateError::InvalidConfig(
                "search endpoint must not be empty".into(),
            ));
        }
        if c.connect_timeout_secs == 0 || c.request_timeout_secs == 0 {
            return Err(GenerateError::InvalidConfig(
                "timeouts must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Page orientation actually used for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Portrait => f.write_str("portrait"),
            Orientation::Landscape => f.write_str("landscape"),
        }
    }
}

/// Orientation requested by the caller.
///
/// `Auto` picks per image (see [`crate::pipeline::orient::select_orientation`]);
/// the explicit modes apply to every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrientationMode {
    #[default]
    Auto,
    Portrait,
    Landscape,
}

impl FromStr for OrientationMode {
    type Err = GenerateError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(OrientationMode::Auto),
            "portrait" => Ok(OrientationMode::Portrait),
            "landscape" => Ok(OrientationMode::Landscape),
            other => Err(GenerateError::Validation(format!(
                "orientation must be one of auto, portrait, landscape (got '{other}')"
            ))),
        }
    }
}
