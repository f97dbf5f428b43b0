//! News-index adapter: NewsAPI `everything` search.
//!
//! Only the total match count matters, so the request asks for a single
//! article per page. Disabled without an API key.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{classify_http_error, FailureKind, RawSignal, SourceAdapter, SourceFailure, SourceSignal};

const API_URL: &str = "https://newsapi.org/v2/everything";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EverythingResponse {
    #[serde(default)]
    total_results: u64,
}

pub struct NewsApiAdapter {
    http: reqwest::Client,
    api_key: Option<String>,
    api_url: String,
}

impl NewsApiAdapter {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_api_url(api_key, API_URL)
    }

    pub fn with_api_url(api_key: Option<String>, api_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("hype-meter/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(8))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            api_url: api_url.to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for NewsApiAdapter {
    async fn fetch(&self, query: &str) -> SourceSignal {
        let Some(key) = &self.api_key else {
            return Err(SourceFailure::new(
                FailureKind::Unconfigured,
                "NewsAPI disabled: missing API key.",
            ));
        };

        let resp = self
            .http
            .get(&self.api_url)
            .header("X-Api-Key", key)
            .query(&[("q", query), ("pageSize", "1")])
            .send()
            .await
            .map_err(|e| {
                SourceFailure::new(classify_http_error(&e), format!("NewsAPI error: {e}"))
            })?;

        match resp.status().as_u16() {
            429 => Err(SourceFailure::new(
                FailureKind::RateLimited,
                "NewsAPI error: rate limited.",
            )),
            s if s >= 400 => Err(SourceFailure::new(
                FailureKind::NetworkError,
                format!("NewsAPI error: request returned {s}."),
            )),
            _ => {
                let body: EverythingResponse = resp.json().await.map_err(|e| {
                    SourceFailure::new(FailureKind::MalformedResponse, format!("NewsAPI error: {e}"))
                })?;
                Ok(RawSignal::News {
                    article_count: body.total_results,
                })
            }
        }
    }

    fn name(&self) -> &'static str {
        "NewsAPI"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_is_unconfigured_without_network() {
        let adapter = NewsApiAdapter::with_api_url(None, "http://127.0.0.1:1");
        let failure = adapter.fetch("rust").await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Unconfigured);
    }

    #[test]
    fn total_results_deserializes() {
        let raw = r#"{"status":"ok","totalResults":230,"articles":[]}"#;
        let body: EverythingResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(body.total_results, 230);
    }
}
