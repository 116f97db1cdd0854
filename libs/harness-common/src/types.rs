use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Runtime a job is executed with on the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Cpp,
    Go,
    Python,
    Java,
    #[serde(alias = "js")]
    Javascript,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpp" | "c++" => Ok(Language::Cpp),
            "go" => Ok(Language::Go),
            "python" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "javascript" | "js" => Ok(Language::Javascript),
            _ => Err(format!("unsupported language '{}'", s)),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::Cpp => "cpp",
            Language::Go => "go",
            Language::Python => "python",
            Language::Java => "java",
            Language::Javascript => "javascript",
        };
        f.write_str(name)
    }
}

/// Body of `POST /api/v1/runner/submit`. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub language: Language,
    pub code: String,
    #[serde(default)]
    pub input: String,
}

impl JobRequest {
    pub fn new(language: Language, code: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            language,
            code: code.into(),
            input: input.into(),
        }
    }
}

/// Job status as reported by the remote service
///
/// Only `success`, `failed` and `canceled` are terminal. Anything the
/// service reports that we do not recognize maps to `Unknown` and keeps
/// the poller waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Pending,
    Running,
    Success,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed | JobStatus::Canceled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStatus::Queued => "queued",
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
            JobStatus::Canceled => "canceled",
            JobStatus::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// `data` object of `GET /api/v1/runner/{jobId}/status`
///
/// Queued/running jobs only carry `status`; output fields default to empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    pub status: JobStatus,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub stdout: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub stderr: String,
    #[serde(default)]
    pub sandbox_error_type: Option<String>,
    #[serde(default)]
    pub sandbox_error_message: Option<String>,
}

impl StatusPayload {
    pub fn pending() -> Self {
        Self {
            status: JobStatus::Pending,
            stdout: String::new(),
            stderr: String::new(),
            sandbox_error_type: None,
            sandbox_error_message: None,
        }
    }
}

/// Milliseconds since the Unix epoch, the unit of every timestamp in a report
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// An accepted submission: only exists when the service returned a non-empty job id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub job_id: String,
    pub submitted_at: i64,
}

/// Terminal outcome of one job, created once when a poll observes a terminal status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub job_id: String,
    pub status: JobStatus,
    pub stdout: String,
    pub stderr: String,
    pub sandbox_error_type: Option<String>,
    pub sandbox_error_message: Option<String>,
    pub submitted_at: i64,
    pub completed_at: i64,
    pub total_duration_ms: i64,
}

impl JobRecord {
    /// Stamp a terminal payload. A wall clock stepping backwards never
    /// yields a completion before the submission.
    pub fn complete(handle: JobHandle, payload: StatusPayload, now_ms: i64) -> Self {
        let completed_at = now_ms.max(handle.submitted_at);
        Self {
            job_id: handle.job_id,
            status: payload.status,
            stdout: payload.stdout,
            stderr: payload.stderr,
            sandbox_error_type: payload.sandbox_error_type,
            sandbox_error_message: payload.sandbox_error_message,
            submitted_at: handle.submitted_at,
            completed_at,
            total_duration_ms: completed_at - handle.submitted_at,
        }
    }
}

/// One correctness case. Exactly one of the expectation fields should be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub name: String,
    pub body: JobRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_contains: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_error: Option<String>,
}

/// The expectation a case is judged by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation<'a> {
    /// Trimmed stdout equals the value
    Exact(&'a str),
    /// Trimmed stdout contains the value
    Contains(&'a str),
    /// `sandboxErrorType` equals the value
    Error(&'a str),
}

impl<'a> Expectation<'a> {
    pub fn value(&self) -> &'a str {
        match self {
            Expectation::Exact(v) | Expectation::Contains(v) | Expectation::Error(v) => v,
        }
    }
}

impl TestCase {
    pub fn exact(name: impl Into<String>, body: JobRequest, expected: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body,
            expected: Some(expected.into()),
            expected_contains: None,
            expected_error: None,
        }
    }

    pub fn contains(name: impl Into<String>, body: JobRequest, needle: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body,
            expected: None,
            expected_contains: Some(needle.into()),
            expected_error: None,
        }
    }

    pub fn error(name: impl Into<String>, body: JobRequest, error_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body,
            expected: None,
            expected_contains: None,
            expected_error: Some(error_type.into()),
        }
    }

    /// First expectation set, in the order `expected`, `expectedContains`, `expectedError`
    pub fn expectation(&self) -> Option<Expectation<'_>> {
        if let Some(v) = &self.expected {
            return Some(Expectation::Exact(v));
        }
        if let Some(v) = &self.expected_contains {
            return Some(Expectation::Contains(v));
        }
        self.expected_error.as_deref().map(Expectation::Error)
    }

    /// Number of expectation fields set
    pub fn expectation_count(&self) -> usize {
        [&self.expected, &self.expected_contains, &self.expected_error]
            .iter()
            .filter(|field| field.is_some())
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestVerdict {
    Pass,
    Fail,
    Error,
}

/// Snapshot of what the service produced for a case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActualOutput {
    pub stdout: String,
    pub stderr: String,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
}

impl From<&JobRecord> for ActualOutput {
    fn from(record: &JobRecord) -> Self {
        Self {
            stdout: record.stdout.clone(),
            stderr: record.stderr.clone(),
            error_type: record.sandbox_error_type.clone(),
            error_message: record.sandbox_error_message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub name: String,
    pub job_id: Option<String>,
    pub expected: Option<String>,
    pub actual: Option<ActualOutput>,
    pub status: TestVerdict,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_requested: usize,
    /// Submissions the service accepted with a job id
    pub total_submitted: usize,
    pub success: usize,
    pub failed: usize,
    pub canceled: usize,
    /// Accepted jobs dropped after hitting the optional poll deadline
    #[serde(default, skip_serializing_if = "is_zero")]
    pub abandoned: usize,
    /// `None` (serialized as `null`) when no job reached a terminal status
    pub average_duration_ms: Option<f64>,
    pub min_duration_ms: Option<i64>,
    pub max_duration_ms: Option<i64>,
    pub p50_duration_ms: Option<i64>,
    pub p95_duration_ms: Option<i64>,
    pub wall_clock_ms: u64,
}

/// Load-mode report: `jobs` is in completion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub summary: Summary,
    pub jobs: Vec<JobRecord>,
}

/// Written instead of a `Report` when no submission was accepted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedBatch {
    pub error: String,
    /// Raw reply per submission, in submission order; `null` when none was parseable
    pub submit_responses: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoadReport {
    Completed(Report),
    NoJobsAccepted(FailedBatch),
}
