//! Image search: query text → ordered list of image URLs.
//!
//! The generator only sees the [`ImageSearch`] trait, so tests swap in a
//! canned list of URLs and never touch the network. [`SerpApiSearch`] is the
//! production implementation (SerpApi's `google_images` engine).

use crate::config::GeneratorConfig;
use crate::error::GenerateError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Capability: find up to `count` image URLs for `query`, best match first.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<String>, GenerateError>;
}

/// SerpApi Google Images client.
pub struct SerpApiSearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl SerpApiSearch {
    /// Build a client from the generator configuration.
    ///
    /// A missing key is not an error here: it surfaces as
    /// [`GenerateError::Configuration`] on the first search, so request
    /// validation still runs first.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, GenerateError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GenerateError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.search_endpoint.clone(),
            api_key: config.serpapi_key.clone(),
            timeout_secs: config.request_timeout_secs,
        })
    }
}

#[async_trait]
impl ImageSearch for SerpApiSearch {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<String>, GenerateError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            GenerateError::Configuration("Missing SERPAPI_KEY env var".into())
        })?;

        let count = count.max(1);
        info!("Searching images: {:?} (want {})", query, count);

        let num = count.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("engine", "google_images"),
                ("q", query),
                ("num", num.as_str()),
                ("api_key", api_key),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerateError::upstream(
                        "Image search timed out",
                        format!("no response after {}s", self.timeout_secs),
                    )
                } else {
                    GenerateError::upstream("Image search failed", e.without_url())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerateError::upstream(
                "Image search failed",
                format!("HTTP {status}"),
            ));
        }

        let body: SerpApiResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::upstream("Image search returned invalid JSON", e.without_url()))?;

        if let Some(err) = body.error {
            return Err(GenerateError::upstream("Image search failed", err));
        }

        let urls = collect_urls(body.images_results, count);
        debug!("Search returned {} usable URLs", urls.len());
        Ok(urls)
    }
}

#[derive(Debug, Default, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    images_results: Option<Vec<SerpApiImage>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SerpApiImage {
    #[serde(default)]
    original: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
}

/// First `count` results, preferring the full-size `original` over the
/// `thumbnail`. Results with neither are dropped after the cut.
fn collect_urls(results: Option<Vec<SerpApiImage>>, count: usize) -> Vec<String> {
    results
        .unwrap_or_default()
        .into_iter()
        .take(count)
        .filter_map(|item| {
            item.original
                .filter(|u| !u.is_empty())
                .or(item.thumbnail.filter(|u| !u.is_empty()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    const KEY: &str = "k-secret-123";

    /// Serve `router` on an ephemeral local port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}")
    }

    /// Echoes `engine|q|num|api_key` back as the single result's URL.
    async fn echo_params(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        let original = ["engine", "q", "num", "api_key"]
            .iter()
            .map(|k| params.get(*k).cloned().unwrap_or_default())
            .collect::<Vec<_>>()
            .join("|");
        Json(json!({ "images_results": [{ "original": original }] }))
    }

    fn fake_serpapi() -> Router {
        Router::new()
            .route("/search", get(echo_params))
            .route(
                "/unavailable",
                get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "try later") }),
            )
            .route(
                "/api-error",
                get(|| async { Json(json!({ "error": "Invalid API key." })) }),
            )
            .route("/junk", get(|| async { "<html>not json</html>" }))
    }

    async fn search_at(base: &str, path: &str) -> Result<Vec<String>, GenerateError> {
        let config = GeneratorConfig::builder()
            .serpapi_key(KEY)
            .search_endpoint(format!("{base}{path}"))
            .connect_timeout_secs(2)
            .request_timeout_secs(5)
            .build()
            .unwrap();
        SerpApiSearch::from_config(&config)
            .unwrap()
            .search("red panda", 3)
            .await
    }

    fn assert_key_hidden(err: &GenerateError) {
        let text = format!("{err} {:?}", err.detail());
        assert!(!text.contains(KEY), "key leaked: {text}");
    }

    #[tokio::test]
    async fn sends_engine_query_count_and_key() {
        let base = serve(fake_serpapi()).await;
        let urls = search_at(&base, "/search").await.unwrap();
        assert_eq!(urls, vec![format!("google_images|red panda|3|{KEY}")]);
    }

    #[tokio::test]
    async fn non_2xx_is_upstream() {
        let base = serve(fake_serpapi()).await;
        let err = search_at(&base, "/unavailable").await.unwrap_err();
        assert!(matches!(err, GenerateError::Upstream { .. }), "got {err:?}");
        assert!(err.detail().unwrap().contains("503"));
        assert_eq!(crate::server::status_for(&err), StatusCode::BAD_GATEWAY);
        assert_key_hidden(&err);
    }

    #[tokio::test]
    async fn api_error_body_is_upstream() {
        let base = serve(fake_serpapi()).await;
        let err = search_at(&base, "/api-error").await.unwrap_err();
        assert!(matches!(err, GenerateError::Upstream { .. }), "got {err:?}");
        assert_eq!(err.detail().as_deref(), Some("Invalid API key."));
    }

    #[tokio::test]
    async fn non_json_body_is_upstream_without_key() {
        let base = serve(fake_serpapi()).await;
        let err = search_at(&base, "/junk").await.unwrap_err();
        assert!(matches!(err, GenerateError::Upstream { .. }), "got {err:?}");
        assert_key_hidden(&err);
    }

    #[tokio::test]
    async fn transport_error_is_upstream_without_key() {
        // Nothing listens on the discard port.
        let err = search_at("http://127.0.0.1:9", "/search").await.unwrap_err();
        assert!(matches!(err, GenerateError::Upstream { .. }), "got {err:?}");
        assert_key_hidden(&err);
    }

    fn parse(json: &str) -> SerpApiResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn prefers_original_then_thumbnail() {
        let body = parse(
            r#"{"images_results":[
                {"original":"https://a/full.jpg","thumbnail":"https://a/t.jpg"},
                {"thumbnail":"https://b/t.jpg"},
                {"original":"","thumbnail":"https://c/t.jpg"},
                {"title":"no urls"},
                {"original":"https://e/full.jpg"}
            ]}"#,
        );
        let urls = collect_urls(body.images_results, 10);
        assert_eq!(
            urls,
            vec![
                "https://a/full.jpg",
                "https://b/t.jpg",
                "https://c/t.jpg",
                "https://e/full.jpg"
            ]
        );
    }

    #[test]
    fn takes_first_n_in_order() {
        let body = parse(
            r#"{"images_results":[
                {"original":"1"},{"original":"2"},{"original":"3"},{"original":"4"}
            ]}"#,
        );
        assert_eq!(collect_urls(body.images_results, 2), vec!["1", "2"]);
    }

    #[test]
    fn missing_or_null_results_are_empty() {
        assert!(collect_urls(parse("{}").images_results, 5).is_empty());
        assert!(collect_urls(parse(r#"{"images_results":null}"#).images_results, 5).is_empty());
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let config = GeneratorConfig::builder()
            // Unroutable: a request would error as Upstream, not Configuration.
            .search_endpoint("http://127.0.0.1:9/search")
            .build()
            .unwrap();
        let search = SerpApiSearch::from_config(&config).unwrap();
        let err = search.search("cats", 3).await.unwrap_err();
        assert!(matches!(err, GenerateError::Configuration(_)), "got {err:?}");
    }
}
