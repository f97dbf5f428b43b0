//! Discussion-platform adapter: Reddit site-wide search.
//!
//! Runs the app-only OAuth flow (client_credentials) and counts matching
//! posts across all public subreddits, capped at 10 by the search limit.
//! Without credentials the adapter is constructed disabled and returns
//! `Unconfigured` without touching the network.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{classify_http_error, FailureKind, RawSignal, SourceAdapter, SourceFailure, SourceSignal};
use crate::config::RedditCredentials;

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const SEARCH_URL: &str = "https://oauth.reddit.com/search";
const SEARCH_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: SearchData,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    children: Vec<serde_json::Value>,
}

pub struct RedditAdapter {
    http: reqwest::Client,
    credentials: Option<RedditCredentials>,
    token_url: String,
    search_url: String,
}

impl RedditAdapter {
    pub fn new(credentials: Option<RedditCredentials>) -> Self {
        Self::with_urls(credentials, TOKEN_URL, SEARCH_URL)
    }

    pub fn with_urls(
        credentials: Option<RedditCredentials>,
        token_url: &str,
        search_url: &str,
    ) -> Self {
        let user_agent = credentials
            .as_ref()
            .map(|c| c.user_agent.clone())
            .unwrap_or_else(|| "hype-meter".to_string());
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(8))
            .build()
            .expect("reqwest client");
        Self {
            http,
            credentials,
            token_url: token_url.to_string(),
            search_url: search_url.to_string(),
        }
    }

    async fn access_token(&self, creds: &RedditCredentials) -> Result<String, SourceFailure> {
        let resp = self
            .http
            .post(&self.token_url)
            .basic_auth(&creds.client_id, Some(&creds.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| SourceFailure::new(classify_http_error(&e), format!("Reddit error: {e}")))?;

        match resp.status().as_u16() {
            429 => Err(SourceFailure::new(
                FailureKind::RateLimited,
                "Reddit error: rate limited.",
            )),
            s if s >= 400 => Err(SourceFailure::new(
                FailureKind::NetworkError,
                format!("Reddit error: token request returned {s}."),
            )),
            _ => resp
                .json::<TokenResponse>()
                .await
                .map(|t| t.access_token)
                .map_err(|e| {
                    SourceFailure::new(FailureKind::MalformedResponse, format!("Reddit error: {e}"))
                }),
        }
    }
}

#[async_trait]
impl SourceAdapter for RedditAdapter {
    async fn fetch(&self, query: &str) -> SourceSignal {
        let Some(creds) = &self.credentials else {
            return Err(SourceFailure::new(
                FailureKind::Unconfigured,
                "Reddit disabled: missing credentials.",
            ));
        };

        let token = self.access_token(creds).await?;

        let limit = SEARCH_LIMIT.to_string();
        let resp = self
            .http
            .get(&self.search_url)
            .bearer_auth(token)
            .query(&[("q", query), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| SourceFailure::new(classify_http_error(&e), format!("Reddit error: {e}")))?;

        match resp.status().as_u16() {
            429 => Err(SourceFailure::new(
                FailureKind::RateLimited,
                "Reddit error: rate limited.",
            )),
            s if s >= 400 => Err(SourceFailure::new(
                FailureKind::NetworkError,
                format!("Reddit error: search returned {s}."),
            )),
            _ => {
                let body: SearchResponse = resp.json().await.map_err(|e| {
                    SourceFailure::new(FailureKind::MalformedResponse, format!("Reddit error: {e}"))
                })?;
                Ok(RawSignal::Discussion {
                    post_count: body.data.children.len() as u32,
                })
            }
        }
    }

    fn name(&self) -> &'static str {
        "Reddit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_adapter_is_unconfigured_without_network() {
        // Unroutable URLs: any network attempt would error as NetworkError,
        // not Unconfigured, so this also proves no call is made.
        let adapter = RedditAdapter::with_urls(None, "http://127.0.0.1:1", "http://127.0.0.1:1");
        let out = adapter.fetch("rust").await;
        let failure = out.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Unconfigured);
        assert_eq!(failure.message, "Reddit disabled: missing credentials.");
    }

    #[test]
    fn search_body_counts_children() {
        let raw = r#"{"data":{"children":[{"kind":"t3"},{"kind":"t3"},{"kind":"t3"}]}}"#;
        let body: SearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(body.data.children.len(), 3);
    }
}
