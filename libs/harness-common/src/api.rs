use serde::Deserialize;

/// Remote runner endpoint semantics - defines only paths and envelopes, not transport
/// Keeps the load and correctness modes pointed at the same routes

pub const RUNNER_PREFIX: &str = "/api/v1/runner";
pub const SUBMIT_SEGMENT: &str = "submit";
pub const STATUS_SEGMENT: &str = "status";

// Lowercase so it can be used as a static header name
pub const API_KEY_HEADER: &str = "x-api-key";

fn trimmed(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

/// `POST {base}/api/v1/runner/submit`
pub fn submit_url(base_url: &str) -> String {
    format!("{}{}/{}", trimmed(base_url), RUNNER_PREFIX, SUBMIT_SEGMENT)
}

/// `GET {base}/api/v1/runner/{jobId}/status`
pub fn status_url(base_url: &str, job_id: &str) -> String {
    format!("{}{}/{}/{}", trimmed(base_url), RUNNER_PREFIX, job_id, STATUS_SEGMENT)
}

/// Every reply of the service wraps its payload in `data`
/// Error replies carry `success`/`message` and no `data`
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
}

/// Pull the job id out of a raw submit reply
/// Empty ids count as no id.
pub fn job_id_of(raw: &serde_json::Value) -> Option<String> {
    raw.pointer("/data/jobId")
        .and_then(|id| id.as_str())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
