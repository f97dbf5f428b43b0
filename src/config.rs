// src/config.rs
// Environment-provided configuration. A missing credential disables its
// adapter; it never fails startup.

use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "hype-meter";
const DEFAULT_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];

#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct HypeConfig {
    pub reddit: Option<RedditCredentials>,
    pub newsapi_key: Option<String>,
    pub allowed_origins: Vec<String>,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    /// Wall-clock bound applied to each adapter call.
    pub adapter_timeout: Duration,
}

impl HypeConfig {
    /// Read configuration from the process environment (call after
    /// `dotenvy::dotenv()` so a local `.env` is honored).
    pub fn from_env() -> Self {
        let reddit = match (env_var("REDDIT_CLIENT_ID"), env_var("REDDIT_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(RedditCredentials {
                client_id,
                client_secret,
                user_agent: env_var("REDDIT_USER_AGENT")
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            }),
            _ => {
                tracing::info!("Reddit credentials not found; discussion adapter disabled");
                None
            }
        };

        let newsapi_key = env_var("NEWSAPI_KEY");
        if newsapi_key.is_none() {
            tracing::info!("NewsAPI key not found; news adapter disabled");
        }

        let allowed_origins = env_var("HYPE_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ORIGINS.iter().map(|s| s.to_string()).collect());

        Self {
            reddit,
            newsapi_key,
            allowed_origins,
            cache_ttl: duration_secs("HYPE_CACHE_TTL_SECS", 15 * 60),
            cache_capacity: env_var("HYPE_CACHE_CAPACITY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1024),
            adapter_timeout: duration_secs("HYPE_REQUEST_TIMEOUT_SECS", 10),
        }
    }
}

/// Treat unset and empty the same; deployment templates often export blanks.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn duration_secs(name: &str, default: u64) -> Duration {
    Duration::from_secs(
        env_var(name)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both tests mutate process env; serialize them like any other
    // env-dependent test in this crate.
    #[serial_test::serial]
    #[test]
    fn origins_split_and_trim() {
        std::env::set_var(
            "HYPE_ALLOWED_ORIGINS",
            " https://a.example , https://b.example ,",
        );
        let cfg = HypeConfig::from_env();
        assert_eq!(
            cfg.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        std::env::remove_var("HYPE_ALLOWED_ORIGINS");
    }

    #[serial_test::serial]
    #[test]
    fn defaults_apply_without_env() {
        std::env::remove_var("HYPE_CACHE_TTL_SECS");
        std::env::remove_var("HYPE_CACHE_CAPACITY");
        let cfg = HypeConfig::from_env();
        assert_eq!(cfg.cache_ttl, Duration::from_secs(900));
        assert_eq!(cfg.cache_capacity, 1024);
    }
}
