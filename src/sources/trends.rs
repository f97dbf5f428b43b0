//! Trend-service adapter: search-interest over the trailing 30 days plus
//! related queries, via the three-step widget protocol (explore for tokens,
//! then one call per widget).
//!
//! The upstream rate-limits aggressively, so a minimum delay is inserted
//! before every dependent call. Responses carry an XSSI prefix (`)]}'`)
//! that must be stripped before JSON parsing. An all-zero interest series
//! means "no data", never a valid zero score.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{
    classify_http_error, FailureKind, RawSignal, RelatedQuery, SourceAdapter, SourceFailure,
    SourceSignal, TrendData,
};

const BASE_URL: &str = "https://trends.google.com/trends/api";
/// Trailing window queried for interest over time.
const TIMEFRAME: &str = "today 1-m";
/// Minimum pause between dependent calls to the same upstream.
const INTER_CALL_DELAY: Duration = Duration::from_millis(500);

pub struct TrendsAdapter {
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    widgets: Vec<Widget>,
}

#[derive(Debug, Deserialize)]
struct Widget {
    id: String,
    token: String,
    request: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    default: TimelineDefault,
}

#[derive(Debug, Deserialize)]
struct TimelineDefault {
    #[serde(rename = "timelineData")]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    #[serde(default)]
    value: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct RelatedResponse {
    default: RelatedDefault,
}

#[derive(Debug, Deserialize)]
struct RelatedDefault {
    #[serde(rename = "rankedList")]
    ranked_list: Vec<RankedList>,
}

#[derive(Debug, Deserialize)]
struct RankedList {
    #[serde(rename = "rankedKeyword", default)]
    ranked_keyword: Vec<RankedKeyword>,
}

#[derive(Debug, Deserialize)]
struct RankedKeyword {
    query: String,
    #[serde(default)]
    value: Option<i64>,
}

impl TrendsAdapter {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .user_agent("hype-meter/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self { http }
    }

    async fn get_text(&self, url: &str, params: &[(&str, String)]) -> Result<String, SourceFailure> {
        let resp = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| SourceFailure::new(classify_http_error(&e), format!("Trends error: {e}")))?;

        match resp.status().as_u16() {
            429 => Err(SourceFailure::new(
                FailureKind::RateLimited,
                "Trends error: rate limited (429).",
            )),
            s if s >= 400 => Err(SourceFailure::new(
                FailureKind::NetworkError,
                format!("Trends error: request returned {s}."),
            )),
            _ => resp.text().await.map_err(|e| {
                SourceFailure::new(FailureKind::NetworkError, format!("Trends error: {e}"))
            }),
        }
    }
}

impl Default for TrendsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for TrendsAdapter {
    async fn fetch(&self, query: &str) -> SourceSignal {
        // Step 1: explore — widget tokens for this keyword/timeframe.
        let req = json!({
            "comparisonItem": [{"keyword": query, "geo": "", "time": TIMEFRAME}],
            "category": 0,
            "property": "",
        });
        let explore_url = format!("{BASE_URL}/explore");
        let body = self
            .get_text(
                &explore_url,
                &[
                    ("hl", "en-US".to_string()),
                    ("tz", "360".to_string()),
                    ("req", req.to_string()),
                ],
            )
            .await?;
        let (timeseries, related) = parse_explore(&body)?;

        // Step 2: interest over time.
        tokio::time::sleep(INTER_CALL_DELAY).await;
        let multiline_url = format!("{BASE_URL}/widgetdata/multiline");
        let body = self
            .get_text(
                &multiline_url,
                &[
                    ("hl", "en-US".to_string()),
                    ("tz", "360".to_string()),
                    ("req", timeseries.request.to_string()),
                    ("token", timeseries.token),
                ],
            )
            .await?;
        let (latest, prior_sum) = interest_from_timeline(&parse_timeline(&body)?)?;

        // Step 3: related queries.
        tokio::time::sleep(INTER_CALL_DELAY).await;
        let related_url = format!("{BASE_URL}/widgetdata/relatedsearches");
        let body = self
            .get_text(
                &related_url,
                &[
                    ("hl", "en-US".to_string()),
                    ("tz", "360".to_string()),
                    ("req", related.request.to_string()),
                    ("token", related.token),
                ],
            )
            .await?;
        let (related_top, related_rising) = parse_related(&body)?;

        Ok(RawSignal::Trend(TrendData {
            latest,
            prior_sum,
            related_top,
            related_rising,
        }))
    }

    fn name(&self) -> &'static str {
        "Trends"
    }
}

/// Widget responses are prefixed with `)]}'`-style junk; JSON starts at the
/// first brace.
fn strip_xssi_prefix(body: &str) -> Result<&str, SourceFailure> {
    body.find('{').map(|i| &body[i..]).ok_or_else(|| {
        SourceFailure::new(
            FailureKind::MalformedResponse,
            "Trends error: no JSON in response.",
        )
    })
}

fn parse_explore(body: &str) -> Result<(Widget, Widget), SourceFailure> {
    let parsed: ExploreResponse = serde_json::from_str(strip_xssi_prefix(body)?).map_err(|e| {
        SourceFailure::new(FailureKind::MalformedResponse, format!("Trends error: {e}"))
    })?;

    let mut timeseries = None;
    let mut related = None;
    for w in parsed.widgets {
        match w.id.as_str() {
            "TIMESERIES" if timeseries.is_none() => timeseries = Some(w),
            "RELATED_QUERIES" if related.is_none() => related = Some(w),
            _ => {}
        }
    }
    match (timeseries, related) {
        (Some(t), Some(r)) => Ok((t, r)),
        _ => Err(SourceFailure::new(
            FailureKind::MalformedResponse,
            "Trends error: expected widgets missing from explore response.",
        )),
    }
}

fn parse_timeline(body: &str) -> Result<Vec<f64>, SourceFailure> {
    let parsed: TimelineResponse = serde_json::from_str(strip_xssi_prefix(body)?).map_err(|e| {
        SourceFailure::new(FailureKind::MalformedResponse, format!("Trends error: {e}"))
    })?;
    Ok(parsed
        .default
        .timeline_data
        .iter()
        .filter_map(|p| p.value.first().copied())
        .collect())
}

/// Latest index value and the sum of everything before it. An empty or
/// all-zero series is "no data" for this keyword/window.
fn interest_from_timeline(values: &[f64]) -> Result<(f64, f64), SourceFailure> {
    let no_data = values.is_empty() || values.iter().all(|v| *v == 0.0);
    if no_data {
        return Err(SourceFailure::new(
            FailureKind::NotFound,
            "Could not retrieve sufficient trend data.",
        ));
    }
    let latest = *values.last().unwrap_or(&0.0);
    let prior_sum = values[..values.len() - 1].iter().sum();
    Ok((latest, prior_sum))
}

/// First ranked list holds top related terms, second the rising ones.
fn parse_related(body: &str) -> Result<(Vec<RelatedQuery>, Vec<RelatedQuery>), SourceFailure> {
    let parsed: RelatedResponse = serde_json::from_str(strip_xssi_prefix(body)?).map_err(|e| {
        SourceFailure::new(FailureKind::MalformedResponse, format!("Trends error: {e}"))
    })?;

    let mut lists = parsed.default.ranked_list.into_iter();
    let top = lists
        .next()
        .map(|l| {
            l.ranked_keyword
                .into_iter()
                .map(|k| RelatedQuery {
                    query: k.query,
                    change: None,
                })
                .collect()
        })
        .unwrap_or_default();
    let rising = lists
        .next()
        .map(|l| {
            l.ranked_keyword
                .into_iter()
                .map(|k| RelatedQuery {
                    change: k.value.map(|v| v.to_string()),
                    query: k.query,
                })
                .collect()
        })
        .unwrap_or_default();
    Ok((top, rising))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xssi_prefix_is_stripped() {
        let body = ")]}'\n{\"a\":1}";
        assert_eq!(strip_xssi_prefix(body).unwrap(), "{\"a\":1}");

        let err = strip_xssi_prefix(")]}'").unwrap_err();
        assert_eq!(err.kind, FailureKind::MalformedResponse);
    }

    #[test]
    fn explore_yields_both_widgets() {
        let body = r#")]}'
        {"widgets":[
            {"id":"TIMESERIES","token":"t1","request":{"time":"today 1-m"}},
            {"id":"RELATED_TOPICS","token":"t2","request":{}},
            {"id":"RELATED_QUERIES","token":"t3","request":{}}
        ]}"#;
        let (ts, rel) = parse_explore(body).unwrap();
        assert_eq!(ts.token, "t1");
        assert_eq!(rel.token, "t3");
    }

    #[test]
    fn timeline_parses_first_value_per_point() {
        let body = r#")]}',
        {"default":{"timelineData":[
            {"time":"1","value":[10]},
            {"time":"2","value":[0]},
            {"time":"3","value":[63]}
        ]}}"#;
        let values = parse_timeline(body).unwrap();
        assert_eq!(values, vec![10.0, 0.0, 63.0]);

        let (latest, prior_sum) = interest_from_timeline(&values).unwrap();
        assert_eq!(latest, 63.0);
        assert_eq!(prior_sum, 10.0);
    }

    #[test]
    fn all_zero_series_is_no_data() {
        let err = interest_from_timeline(&[0.0, 0.0, 0.0]).unwrap_err();
        assert_eq!(err.kind, FailureKind::NotFound);
        assert_eq!(err.message, "Could not retrieve sufficient trend data.");

        assert!(interest_from_timeline(&[]).is_err());
    }

    #[test]
    fn fading_interest_keeps_prior_sum() {
        let (latest, prior_sum) = interest_from_timeline(&[80.0, 60.0, 0.0]).unwrap();
        assert_eq!(latest, 0.0);
        assert_eq!(prior_sum, 140.0);
    }

    #[test]
    fn related_lists_split_top_and_rising() {
        let body = r#")]}'
        {"default":{"rankedList":[
            {"rankedKeyword":[{"query":"rust lang","value":100},{"query":"rust game","value":80}]},
            {"rankedKeyword":[{"query":"rust 2.0","value":250}]}
        ]}}"#;
        let (top, rising) = parse_related(body).unwrap();
        assert_eq!(top.len(), 2);
        assert!(top[0].change.is_none());
        assert_eq!(rising[0].query, "rust 2.0");
        assert_eq!(rising[0].change.as_deref(), Some("250"));
    }
}
