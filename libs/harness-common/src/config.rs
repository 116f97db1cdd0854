// Harness configuration
// Built from the environment, then overridden by CLI flags

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub base_url: String,
    /// Sent as `X-API-Key`
    pub api_key: Option<String>,
    /// Sent as `Authorization: Bearer ...`
    pub bearer_token: Option<String>,
    /// Per HTTP call. A timed-out call is a transport failure, never a job failure.
    pub request_timeout: Option<Duration>,
    /// Cap on concurrent submissions and concurrent pollers; `None` is full fan-out
    pub max_in_flight: Option<usize>,
    /// Per-job polling deadline; `None` polls until a terminal status
    pub poll_deadline: Option<Duration>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            bearer_token: None,
            request_timeout: None,
            max_in_flight: None,
            poll_deadline: None,
        }
    }
}

impl HarnessConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable numbers fall back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let millis = |key: &str| {
            non_empty(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
        };

        Self {
            base_url: non_empty("HARNESS_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: non_empty("HARNESS_API_KEY"),
            bearer_token: non_empty("HARNESS_BEARER_TOKEN"),
            request_timeout: millis("HARNESS_REQUEST_TIMEOUT_MS"),
            max_in_flight: non_empty("HARNESS_MAX_IN_FLIGHT")
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|n| *n > 0),
            poll_deadline: millis("HARNESS_POLL_DEADLINE_MS"),
        }
    }

    pub fn load_policy(&self) -> PollPolicy {
        PollPolicy {
            deadline: self.poll_deadline,
            ..PollPolicy::load()
        }
    }

    pub fn correctness_policy(&self) -> PollPolicy {
        PollPolicy {
            deadline: self.poll_deadline,
            ..PollPolicy::correctness()
        }
    }
}

/// Backoff between consecutive status polls of one job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait after a reply whose status is not terminal
    pub pending_interval: Duration,
    /// Wait after a reply with no data or a failed call
    pub no_data_interval: Duration,
    pub deadline: Option<Duration>,
}

impl PollPolicy {
    /// Load mode: 150ms after a non-terminal status, 200ms when the service gave nothing
    pub fn load() -> Self {
        Self {
            pending_interval: Duration::from_millis(150),
            no_data_interval: Duration::from_millis(200),
            deadline: None,
        }
    }

    pub fn correctness() -> Self {
        Self {
            pending_interval: Duration::from_millis(150),
            no_data_interval: Duration::from_millis(150),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::from_lookup(lookup(&[]));
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.base_url, "http://localhost:8080");
        assert!(config.max_in_flight.is_none());
        assert!(config.poll_deadline.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = HarnessConfig::from_lookup(lookup(&[
            ("HARNESS_BASE_URL", "http://runner:9000"),
            ("HARNESS_API_KEY", "key-123"),
            ("HARNESS_REQUEST_TIMEOUT_MS", "2500"),
            ("HARNESS_MAX_IN_FLIGHT", "8"),
            ("HARNESS_POLL_DEADLINE_MS", "60000"),
        ]));
        assert_eq!(config.base_url, "http://runner:9000");
        assert_eq!(config.api_key.as_deref(), Some("key-123"));
        assert!(config.bearer_token.is_none());
        assert_eq!(config.request_timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.max_in_flight, Some(8));
        assert_eq!(config.poll_deadline, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = HarnessConfig::from_lookup(lookup(&[
            ("HARNESS_BASE_URL", "  "),
            ("HARNESS_MAX_IN_FLIGHT", "0"),
            ("HARNESS_POLL_DEADLINE_MS", "soon"),
        ]));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.max_in_flight.is_none());
        assert!(config.poll_deadline.is_none());
    }

    #[test]
    fn test_policies() {
        let load = PollPolicy::load();
        assert_eq!(load.pending_interval, Duration::from_millis(150));
        assert_eq!(load.no_data_interval, Duration::from_millis(200));

        let correctness = PollPolicy::correctness();
        assert_eq!(correctness.pending_interval, Duration::from_millis(150));
        assert_eq!(correctness.no_data_interval, Duration::from_millis(150));

        let config = HarnessConfig {
            poll_deadline: Some(Duration::from_secs(5)),
            ..HarnessConfig::default()
        };
        assert_eq!(config.load_policy().deadline, Some(Duration::from_secs(5)));
        assert_eq!(config.correctness_policy().pending_interval, Duration::from_millis(150));
    }
}
