//! Client configuration

use serde::{Deserialize, Serialize};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// GitHub client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubConfig {
    /// API base URL. Derived from the repository host when unset.
    pub api_url: Option<String>,
    /// Bearer token (optional for public repositories)
    pub token: Option<String>,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        GithubConfig {
            api_url: std::env::var("GITHUB_API_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            token: std::env::var("GH_TOKEN")
                .or_else(|_| std::env::var("GITHUB_TOKEN"))
                .ok()
                .filter(|v| !v.trim().is_empty()),
            user_agent: format!("rulegate/{}", rulegate_core::VERSION),
            timeout_secs: std::env::var("RULEGATE_HTTP_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl GithubConfig {
    /// Configuration from `GITHUB_API_URL`, `GH_TOKEN`/`GITHUB_TOKEN` and
    /// `RULEGATE_HTTP_TIMEOUT`.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Configuration for an explicit API base, ignoring the environment.
    pub fn new(api_url: &str) -> Self {
        GithubConfig {
            api_url: Some(api_url.trim_end_matches('/').to_string()),
            token: None,
            user_agent: format!("rulegate/{}", rulegate_core::VERSION),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = GithubConfig::new("https://ghe.example.com/api/v3/")
            .with_token("t0k")
            .with_timeout(5);
        assert_eq!(
            config.api_url.as_deref(),
            Some("https://ghe.example.com/api/v3")
        );
        assert_eq!(config.token.as_deref(), Some("t0k"));
        assert_eq!(config.timeout_secs, 5);
        assert!(config.user_agent.starts_with("rulegate/"));
    }
}
