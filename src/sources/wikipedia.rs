//! Encyclopedia adapter: exact-title page lookup against the MediaWiki API.
//!
//! No auto-suggest or fuzzy search — scoring must be deterministic, so a
//! query either hits its exact page (redirects allowed) or fails. The raw
//! signal is the page's outbound link count, gathered by following
//! `plcontinue` pagination.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{classify_http_error, FailureKind, RawSignal, SourceAdapter, SourceFailure, SourceSignal};

const API_URL: &str = "https://en.wikipedia.org/w/api.php";
/// How many disambiguation options to surface in the snippet.
const MAX_OPTIONS_SHOWN: usize = 10;

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(rename = "continue")]
    cont: Option<Continue>,
    query: Option<QueryBody>,
}

#[derive(Debug, Deserialize)]
struct Continue {
    plcontinue: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    pageprops: Option<PageProps>,
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    disambiguation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Link {
    title: String,
}

pub struct WikipediaAdapter {
    http: reqwest::Client,
}

impl WikipediaAdapter {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .user_agent("hype-meter/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(8))
            .build()
            .expect("reqwest client");
        Self { http }
    }

    async fn fetch_page(&self, query: &str, plcontinue: Option<&str>) -> Result<QueryResponse, SourceFailure> {
        let mut params = vec![
            ("action", "query".to_string()),
            ("prop", "links|pageprops".to_string()),
            ("titles", query.to_string()),
            ("pllimit", "max".to_string()),
            ("plnamespace", "0".to_string()),
            ("redirects", "1".to_string()),
            ("format", "json".to_string()),
            ("formatversion", "2".to_string()),
        ];
        if let Some(c) = plcontinue {
            params.push(("plcontinue", c.to_string()));
        }

        let resp = self
            .http
            .get(API_URL)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                SourceFailure::new(classify_http_error(&e), format!("Wikipedia error: {e}"))
            })?;

        if resp.status().as_u16() == 429 {
            return Err(SourceFailure::new(
                FailureKind::RateLimited,
                "Wikipedia error: rate limited.",
            ));
        }

        resp.json::<QueryResponse>().await.map_err(|e| {
            SourceFailure::new(
                FailureKind::MalformedResponse,
                format!("Wikipedia error: {e}"),
            )
        })
    }
}

impl Default for WikipediaAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for WikipediaAdapter {
    async fn fetch(&self, query: &str) -> SourceSignal {
        let mut link_count: u64 = 0;
        let mut plcontinue: Option<String> = None;
        let mut first = true;

        loop {
            let body = self.fetch_page(query, plcontinue.as_deref()).await?;
            let page = body
                .query
                .and_then(|q| q.pages.into_iter().next())
                .ok_or_else(|| {
                    SourceFailure::new(
                        FailureKind::MalformedResponse,
                        "Wikipedia error: response carried no pages.",
                    )
                })?;

            if first {
                if page.missing {
                    return Err(SourceFailure::new(
                        FailureKind::NotFound,
                        "Wikipedia page not found.",
                    ));
                }
                if page
                    .pageprops
                    .as_ref()
                    .is_some_and(|p| p.disambiguation.is_some())
                {
                    // A disambiguation page's links are the candidate meanings.
                    let options: Vec<&str> = page
                        .links
                        .iter()
                        .take(MAX_OPTIONS_SHOWN)
                        .map(|l| l.title.as_str())
                        .collect();
                    return Err(SourceFailure::new(
                        FailureKind::Ambiguous,
                        format!("Wikipedia disambiguation: {options:?}"),
                    ));
                }
                first = false;
            }

            link_count += page.links.len() as u64;
            plcontinue = body.cont.and_then(|c| c.plcontinue);
            if plcontinue.is_none() {
                break;
            }
        }

        Ok(RawSignal::Encyclopedia { link_count })
    }

    fn name(&self) -> &'static str {
        "Wikipedia"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_page_flag_deserializes() {
        let raw = r#"{"query":{"pages":[{"title":"Xyzzy123","missing":true}]}}"#;
        let body: QueryResponse = serde_json::from_str(raw).unwrap();
        assert!(body.query.unwrap().pages[0].missing);
    }

    #[test]
    fn disambiguation_and_links_deserialize() {
        let raw = r#"{
            "continue": {"plcontinue": "123|0|Next", "continue": "||"},
            "query": {"pages": [{
                "title": "Mercury",
                "pageprops": {"disambiguation": ""},
                "links": [{"ns":0,"title":"Mercury (planet)"},{"ns":0,"title":"Mercury (element)"}]
            }]}
        }"#;
        let body: QueryResponse = serde_json::from_str(raw).unwrap();
        let page = &body.query.unwrap().pages[0];
        assert!(page.pageprops.as_ref().unwrap().disambiguation.is_some());
        assert_eq!(page.links.len(), 2);
        assert_eq!(body.cont.unwrap().plcontinue.as_deref(), Some("123|0|Next"));
    }
}
