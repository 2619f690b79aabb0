//! The per-call input bundle and its normalisation rules.

use crate::config::OrientationMode;
use crate::error::GenerateError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_NUM_IMAGES: i64 = 6;
pub const DEFAULT_MARGIN_RATIO: f64 = 0.03;
pub const DEFAULT_FILENAME: &str = "google_images.pdf";

/// One generation request, as posted to the endpoint.
///
/// Every field but `querytext` has a default, so `{"querytext":"cats"}` is a
/// complete request. Values are stored as received; clamping happens in the
/// accessors and in the fitter.
///
/// An explicit `null` is read the same as an absent field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub querytext: String,

    #[serde(default = "default_num_images", deserialize_with = "null_as_default_num_images")]
    pub num_images: i64,

    #[serde(default = "default_orientation", deserialize_with = "null_as_default_orientation")]
    pub orientation: String,

    #[serde(default = "default_margin_ratio", deserialize_with = "null_as_default_margin_ratio")]
    pub margin_ratio: f64,

    #[serde(default = "default_filename", deserialize_with = "null_as_default_filename")]
    pub filename: String,
}

fn default_num_images() -> i64 {
    DEFAULT_NUM_IMAGES
}

fn default_orientation() -> String {
    "auto".to_string()
}

fn default_margin_ratio() -> f64 {
    DEFAULT_MARGIN_RATIO
}

fn default_filename() -> String {
    DEFAULT_FILENAME.to_string()
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

fn null_as_default_num_images<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    Ok(Option::<i64>::deserialize(d)?.unwrap_or(DEFAULT_NUM_IMAGES))
}

fn null_as_default_orientation<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(default_orientation))
}

fn null_as_default_margin_ratio<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(d)?.unwrap_or(DEFAULT_MARGIN_RATIO))
}

fn null_as_default_filename<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(default_filename))
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            querytext: String::new(),
            num_images: DEFAULT_NUM_IMAGES,
            orientation: default_orientation(),
            margin_ratio: DEFAULT_MARGIN_RATIO,
            filename: default_filename(),
        }
    }
}

impl GenerationRequest {
    /// Request for `query` with every other field at its default.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            querytext: query.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON body. An empty body counts as `{}`.
    pub fn from_json(body: &[u8]) -> Result<Self, GenerateError> {
        let body = if body.iter().all(u8::is_ascii_whitespace) {
            b"{}".as_slice()
        } else {
            body
        };
        serde_json::from_slice(body)
            .map_err(|e| GenerateError::Validation(format!("Invalid JSON body: {e}")))
    }

    /// Trimmed query text, or a validation error when blank.
    pub fn query(&self) -> Result<&str, GenerateError> {
        let q = self.querytext.trim();
        if q.is_empty() {
            Err(GenerateError::Validation("querytext is required".into()))
        } else {
            Ok(q)
        }
    }

    /// Requested image count clamped to `[1, max]`.
    pub fn image_count(&self, max: usize) -> usize {
        let max = max.max(1);
        self.num_images.clamp(1, max as i64) as usize
    }

    pub fn orientation_mode(&self) -> Result<OrientationMode, GenerateError> {
        self.orientation.parse()
    }

    /// Filename safe to embed in a quoted `Content-Disposition` value.
    pub fn sanitized_filename(&self) -> String {
        sanitize_filename(&self.filename)
    }
}

static RE_UNSAFE_FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["\\/\x00-\x1f\x7f]"#).unwrap());

/// Replace characters that would break a quoted header value or escape a
/// directory. Blank names fall back to [`DEFAULT_FILENAME`].
pub fn sanitize_filename(name: &str) -> String {
    let cleaned = RE_UNSAFE_FILENAME.replace_all(name.trim(), "_");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        cleaned.to_string()
    }
}
