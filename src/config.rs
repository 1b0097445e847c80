use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(120_000);
/// Automatic retries after the initial attempt; the initial attempt is not counted.
pub const MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_SUCCESS_NOTICE: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Upper bound on network attempts for one submission chain.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub success_notice: Duration,
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            success_notice: DEFAULT_SUCCESS_NOTICE,
            log_level: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_url = env::var("PIXELFORGE_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.api_url);
        let timeout = env::var("PIXELFORGE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);
        let max_retries = env::var("PIXELFORGE_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.retry.max_retries);
        let delay = env::var("PIXELFORGE_RETRY_DELAY_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry.delay);
        let log_level = env::var("PIXELFORGE_LOG_LEVEL").ok();

        Config {
            api_url,
            timeout,
            retry: RetryPolicy { max_retries, delay },
            success_notice: defaults.success_notice,
            log_level,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_success_notice(mut self, duration: Duration) -> Self {
        self.success_notice = duration;
        self
    }

    /// Base URL without a trailing slash, so paths can be appended directly.
    pub fn base_url(&self) -> &str {
        self.api_url.trim().trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.api_url, "http://localhost:5000");
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.max_attempts(), 4);
        assert_eq!(config.retry.delay, Duration::from_secs(3));
    }

    #[test]
    fn test_base_url_strips_trailing_slash() {
        let config = Config::new().with_api_url("http://example.test:8080/ ");
        assert_eq!(config.base_url(), "http://example.test:8080");
    }

    #[test]
    fn test_retry_builder() {
        let policy = RetryPolicy::new()
            .with_max_retries(1)
            .with_delay(Duration::from_millis(5));
        assert_eq!(policy.max_attempts(), 2);
        assert_eq!(policy.delay, Duration::from_millis(5));
    }

    // Only test touching these variables; the env is process-wide.
    #[test]
    fn test_from_env_overrides_and_fallbacks() {
        const VARS: [&str; 5] = [
            "PIXELFORGE_API_URL",
            "PIXELFORGE_TIMEOUT_SECS",
            "PIXELFORGE_MAX_RETRIES",
            "PIXELFORGE_RETRY_DELAY_MS",
            "PIXELFORGE_LOG_LEVEL",
        ];

        env::set_var("PIXELFORGE_API_URL", "http://gen.internal:9000/");
        env::set_var("PIXELFORGE_TIMEOUT_SECS", "30");
        env::set_var("PIXELFORGE_MAX_RETRIES", "5");
        env::set_var("PIXELFORGE_RETRY_DELAY_MS", "250");
        env::set_var("PIXELFORGE_LOG_LEVEL", "debug");

        let config = Config::from_env();
        assert_eq!(config.api_url, "http://gen.internal:9000/");
        assert_eq!(config.base_url(), "http://gen.internal:9000");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.delay, Duration::from_millis(250));
        assert_eq!(config.log_level.as_deref(), Some("debug"));

        env::set_var("PIXELFORGE_API_URL", "   ");
        env::set_var("PIXELFORGE_TIMEOUT_SECS", "0");
        env::set_var("PIXELFORGE_MAX_RETRIES", "many");
        env::set_var("PIXELFORGE_RETRY_DELAY_MS", "-1");
        env::remove_var("PIXELFORGE_LOG_LEVEL");

        let config = Config::from_env();
        let defaults = Config::default();
        assert_eq!(config.api_url, defaults.api_url);
        assert_eq!(config.timeout, defaults.timeout);
        assert_eq!(config.retry, defaults.retry);
        assert_eq!(config.log_level, None);

        env::set_var("PIXELFORGE_TIMEOUT_SECS", "soon");
        assert_eq!(Config::from_env().timeout, defaults.timeout);

        for var in VARS {
            env::remove_var(var);
        }
    }
}
