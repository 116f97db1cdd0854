/// Transport Client - one request/response exchange with the remote runner
///
/// **Contract:**
/// - `submit` posts a job and hands back the raw reply plus the job id, if any
/// - `poll_status` fetches the `data` object of a job's status
///
/// Failures never propagate as errors out of this layer. They come back as
/// `Reply::Failed` so callers can log them and keep going; the service under
/// test is expected to be flaky and must not take the harness down with it.

use async_trait::async_trait;
use harness_common::api::{self, Envelope};
use harness_common::config::HarnessConfig;
use harness_common::types::{JobRequest, StatusPayload};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed reply: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid header value for {0}")]
    Header(&'static str),
}

/// Outcome of one exchange
#[derive(Debug)]
pub enum Reply<T> {
    Data(T),
    /// The service answered, but with nothing usable yet
    NoData,
    Failed(TransportError),
}

impl<T> Reply<T> {
    pub fn data(self) -> Option<T> {
        match self {
            Reply::Data(data) => Some(data),
            Reply::NoData | Reply::Failed(_) => None,
        }
    }
}

/// A parsed submit reply
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReply {
    /// Body as received, kept for diagnostics when a whole batch is rejected
    pub raw: serde_json::Value,
    /// `data.jobId`, absent when the service rejected the submission
    pub job_id: Option<String>,
}

impl SubmitReply {
    pub fn from_raw(raw: serde_json::Value) -> Self {
        let job_id = api::job_id_of(&raw);
        Self { raw, job_id }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn submit(&self, request: &JobRequest) -> Reply<SubmitReply>;

    async fn poll_status(&self, job_id: &str) -> Reply<StatusPayload>;
}

/// HTTP/JSON transport against a configured base URL
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &HarnessConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key).map_err(|_| TransportError::Header(api::API_KEY_HEADER))?;
            headers.insert(api::API_KEY_HEADER, value);
        }
        if let Some(token) = &config.bearer_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| TransportError::Header("Authorization"))?;
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The status code is ignored: error replies still carry a JSON body
    /// worth keeping, and anything unparseable is a failure either way.
    async fn read_json(response: reqwest::Response) -> Result<serde_json::Value, TransportError> {
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn submit(&self, request: &JobRequest) -> Reply<SubmitReply> {
        let url = api::submit_url(&self.base_url);
        let response = match self.client.post(&url).json(request).send().await {
            Ok(response) => response,
            Err(e) => return Reply::Failed(e.into()),
        };

        match Self::read_json(response).await {
            Ok(raw) => Reply::Data(SubmitReply::from_raw(raw)),
            Err(e) => Reply::Failed(e),
        }
    }

    async fn poll_status(&self, job_id: &str) -> Reply<StatusPayload> {
        let url = api::status_url(&self.base_url, job_id);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => return Reply::Failed(e.into()),
        };

        let raw = match Self::read_json(response).await {
            Ok(raw) => raw,
            Err(e) => return Reply::Failed(e),
        };

        match serde_json::from_value::<Envelope<StatusPayload>>(raw) {
            Ok(Envelope { data: Some(payload) }) => Reply::Data(payload),
            Ok(Envelope { data: None }) => Reply::NoData,
            Err(e) => Reply::Failed(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_submit_reply_from_raw() {
        let reply = SubmitReply::from_raw(json!({ "data": { "jobId": "j-1" } }));
        assert_eq!(reply.job_id.as_deref(), Some("j-1"));

        let reply = SubmitReply::from_raw(json!({ "success": false, "message": "insufficient credits" }));
        assert!(reply.job_id.is_none());
        assert_eq!(reply.raw["message"], json!("insufficient credits"));
    }

    #[test]
    fn test_reply_data() {
        assert_eq!(Reply::Data(3).data(), Some(3));
        assert_eq!(Reply::<u8>::NoData.data(), None);
    }

    #[test]
    fn test_rejects_unencodable_api_key() {
        let config = HarnessConfig {
            api_key: Some("bad\nkey".to_string()),
            ..HarnessConfig::default()
        };
        assert!(matches!(HttpTransport::new(&config), Err(TransportError::Header(_))));
    }

    #[test]
    fn test_keeps_base_url() {
        let config = HarnessConfig {
            base_url: "http://runner:9000".to_string(),
            bearer_token: Some("tok".to_string()),
            ..HarnessConfig::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.base_url(), "http://runner:9000");
    }
}
