//! Image download and decode.
//!
//! A fetch never returns `Err`. Every URL yields a [`FetchOutcome`] and the
//! generator skips the `Failed` ones. Decoding runs in `spawn_blocking`.

use crate::config::GeneratorConfig;
use crate::error::{GenerateError, ImageError};
use async_trait::async_trait;
use image::RgbImage;
use std::time::Duration;
use tracing::debug;

/// Result of fetching one image URL.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Downloaded and decoded, normalised to 8-bit RGB.
    Fetched(RgbImage),
    /// Anything else; the URL is skipped.
    Failed(ImageError),
}

/// Capability: turn an image URL into decoded pixels.
#[async_trait]
pub trait ImageFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// reqwest-backed fetcher with a fixed `User-Agent`, bounded timeouts and a
/// body size cap.
pub struct HttpImageFetcher {
    client: reqwest::Client,
    max_bytes: u64,
}

impl HttpImageFetcher {
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, GenerateError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GenerateError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            max_bytes: config.max_image_bytes,
        })
    }
}

#[async_trait]
impl ImageFetch for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let failed = |reason: String| {
            FetchOutcome::Failed(ImageError::FetchFailed {
                url: url.to_string(),
                reason,
            })
        };

        let mut response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return failed("timed out".into()),
            Err(e) => return failed(e.to_string()),
        };

        if !response.status().is_success() {
            return failed(format!("HTTP {}", response.status()));
        }

        let too_large = |len: u64| {
            failed(format!(
                "body of {len} bytes exceeds {} byte limit",
                self.max_bytes
            ))
        };
        if let Some(len) = response.content_length().filter(|&len| len > self.max_bytes) {
            return too_large(len);
        }

        // The cap also holds when Content-Length is missing.
        let mut bytes: Vec<u8> = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let len = (bytes.len() + chunk.len()) as u64;
                    if len > self.max_bytes {
                        return too_large(len);
                    }
                    bytes.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => return failed(e.to_string()),
            }
        }
        debug!("Downloaded {} bytes from {}", bytes.len(), url);

        let owned_url = url.to_string();
        match tokio::task::spawn_blocking(move || decode_image(&owned_url, &bytes)).await {
            Ok(outcome) => outcome,
            Err(e) => FetchOutcome::Failed(ImageError::DecodeFailed {
                url: url.to_string(),
                reason: format!("decode task panicked: {e}"),
            }),
        }
    }
}

/// Decode image bytes of any supported format into RGB8.
pub fn decode_image(url: &str, bytes: &[u8]) -> FetchOutcome {
    match image::load_from_memory(bytes) {
        Ok(img) => {
            debug!("Decoded {} → {}x{}", url, img.width(), img.height());
            FetchOutcome::Fetched(img.to_rgb8())
        }
        Err(e) => FetchOutcome::Failed(ImageError::DecodeFailed {
            url: url.to_string(),
            reason: e.to_string(),
        }),
    }
}
