//! # Score Normalizer
//! Pure mapping from raw adapter signals to bounded contributions.
//! No I/O; every rule clamps its delta so no single source can dominate
//! the merged score.

use crate::sources::{RawSignal, SourceSignal, TrendData};

/// Hard per-source maxima.
pub const ENCYCLOPEDIA_MAX: f64 = 20.0;
pub const DISCUSSION_MAX: f64 = 30.0;
pub const NEWS_MAX: f64 = 50.0;
pub const TREND_MAX: f64 = 30.0;

/// Normalized output of one adapter for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub score_delta: f64,
    pub snippets: Vec<String>,
    pub title_hint: Option<String>,
}

impl Contribution {
    fn failed(snippet: String) -> Self {
        Self {
            score_delta: 0.0,
            snippets: vec![snippet],
            title_hint: None,
        }
    }
}

/// Map one signal to its contribution. A failure contributes zero score and
/// exactly one explanatory snippet; it never aborts the other adapters.
pub fn contribution(signal: &SourceSignal) -> Contribution {
    let raw = match signal {
        Ok(raw) => raw,
        Err(failure) => return Contribution::failed(failure.message.clone()),
    };

    match raw {
        RawSignal::Encyclopedia { link_count } => Contribution {
            score_delta: (*link_count as f64 / 100.0).min(ENCYCLOPEDIA_MAX),
            snippets: vec![format!("Wikipedia links: {link_count}")],
            title_hint: Some("Reference Data".to_string()),
        },
        RawSignal::Discussion { post_count } => Contribution {
            score_delta: (*post_count as f64 * 2.0).min(DISCUSSION_MAX),
            snippets: vec![format!("Discussion posts: {post_count}")],
            title_hint: (*post_count > 0).then(|| "Discussion Data".to_string()),
        },
        RawSignal::News { article_count } => Contribution {
            score_delta: (*article_count as f64 / 10.0).min(NEWS_MAX),
            snippets: vec![format!("News articles: {article_count}")],
            title_hint: (*article_count > 0).then(|| "News Data".to_string()),
        },
        RawSignal::Trend(data) => Contribution {
            score_delta: (data.latest / 2.0).min(TREND_MAX),
            snippets: trend_snippets(data),
            title_hint: Some(trend_title(data).to_string()),
        },
    }
}

/// Interest-bucket title. A current value of zero after a non-zero history
/// overrides the bucket.
fn trend_title(data: &TrendData) -> &'static str {
    if data.latest == 0.0 && data.prior_sum > 0.0 {
        return "Interest Fading?";
    }
    match data.latest {
        v if v > 85.0 => "Peak Interest!",
        v if v > 65.0 => "High Interest",
        v if v > 40.0 => "Moderate Interest",
        v if v > 15.0 => "Low Interest",
        _ => "Minimal Interest",
    }
}

/// Up to 2 top related terms, then up to 3 rising ones (with percent change
/// where the upstream reported it).
fn trend_snippets(data: &TrendData) -> Vec<String> {
    let mut out = Vec::new();
    for rq in data.related_top.iter().take(2) {
        out.push(format!("Top related: {}", rq.query));
    }
    for rq in data.related_rising.iter().take(3) {
        match &rq.change {
            Some(pct) => out.push(format!("Rising related: {} (+{pct}%)", rq.query)),
            None => out.push(format!("Rising related: {}", rq.query)),
        }
    }
    if out.is_empty() {
        out.push("No specific related queries found.".to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{FailureKind, RelatedQuery, SourceFailure};

    fn trend(latest: f64, prior_sum: f64) -> TrendData {
        TrendData {
            latest,
            prior_sum,
            related_top: vec![],
            related_rising: vec![],
        }
    }

    #[test]
    fn encyclopedia_clamps_at_twenty() {
        let c = contribution(&Ok(RawSignal::Encyclopedia { link_count: 100_000 }));
        assert_eq!(c.score_delta, 20.0);
        assert_eq!(c.title_hint.as_deref(), Some("Reference Data"));
    }

    #[test]
    fn encyclopedia_scales_below_clamp() {
        let c = contribution(&Ok(RawSignal::Encyclopedia { link_count: 450 }));
        assert_eq!(c.score_delta, 4.5);
        assert_eq!(c.snippets, vec!["Wikipedia links: 450"]);
    }

    #[test]
    fn discussion_clamps_and_hints_only_with_posts() {
        let c = contribution(&Ok(RawSignal::Discussion { post_count: 10 }));
        assert_eq!(c.score_delta, 20.0);
        assert_eq!(c.title_hint.as_deref(), Some("Discussion Data"));

        let zero = contribution(&Ok(RawSignal::Discussion { post_count: 0 }));
        assert_eq!(zero.score_delta, 0.0);
        assert!(zero.title_hint.is_none());

        let big = contribution(&Ok(RawSignal::Discussion { post_count: 200 }));
        assert_eq!(big.score_delta, 30.0);
    }

    #[test]
    fn news_clamps_at_fifty() {
        let c = contribution(&Ok(RawSignal::News { article_count: 230 }));
        assert_eq!(c.score_delta, 23.0);
        assert_eq!(c.title_hint.as_deref(), Some("News Data"));

        let big = contribution(&Ok(RawSignal::News { article_count: 9_999_999 }));
        assert_eq!(big.score_delta, 50.0);
    }

    #[test]
    fn trend_is_additive_and_clamped() {
        let c = contribution(&Ok(RawSignal::Trend(trend(90.0, 500.0))));
        assert_eq!(c.score_delta, 30.0);
        assert_eq!(c.title_hint.as_deref(), Some("Peak Interest!"));

        let mid = contribution(&Ok(RawSignal::Trend(trend(42.0, 100.0))));
        assert_eq!(mid.score_delta, 21.0);
        assert_eq!(mid.title_hint.as_deref(), Some("Moderate Interest"));
    }

    #[test]
    fn trend_zero_with_history_reads_as_fading() {
        let c = contribution(&Ok(RawSignal::Trend(trend(0.0, 340.0))));
        assert_eq!(c.title_hint.as_deref(), Some("Interest Fading?"));
        assert_eq!(c.score_delta, 0.0);
    }

    #[test]
    fn trend_zero_without_history_is_minimal() {
        let c = contribution(&Ok(RawSignal::Trend(trend(0.0, 0.0))));
        assert_eq!(c.title_hint.as_deref(), Some("Minimal Interest"));
    }

    #[test]
    fn trend_related_snippets_keep_top_then_rising_order() {
        let data = TrendData {
            latest: 50.0,
            prior_sum: 10.0,
            related_top: vec![
                RelatedQuery { query: "a".into(), change: None },
                RelatedQuery { query: "b".into(), change: None },
                RelatedQuery { query: "c".into(), change: None },
            ],
            related_rising: vec![RelatedQuery {
                query: "d".into(),
                change: Some("250".into()),
            }],
        };
        let c = contribution(&Ok(RawSignal::Trend(data)));
        assert_eq!(
            c.snippets,
            vec![
                "Top related: a",
                "Top related: b",
                "Rising related: d (+250%)",
            ]
        );
    }

    #[test]
    fn failure_contributes_one_snippet_and_no_score() {
        let sig: SourceSignal = Err(SourceFailure::new(
            FailureKind::NotFound,
            "Wikipedia page not found.",
        ));
        let c = contribution(&sig);
        assert_eq!(c.score_delta, 0.0);
        assert_eq!(c.snippets, vec!["Wikipedia page not found."]);
        assert!(c.title_hint.is_none());
    }
}
