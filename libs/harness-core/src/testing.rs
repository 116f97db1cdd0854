// In-memory transport with scripted replies, shared by the unit tests

use crate::transport::{Reply, SubmitReply, Transport, TransportError};
use async_trait::async_trait;
use harness_common::types::{JobRequest, JobStatus, StatusPayload};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub(crate) enum SubmitStep {
    Accept(String),
    Reject(serde_json::Value),
    Fail,
}

pub(crate) enum StatusStep {
    Data(StatusPayload),
    NoData,
    Fail,
}

pub(crate) fn decode_error() -> TransportError {
    match serde_json::from_str::<serde_json::Value>("<html>") {
        Err(e) => TransportError::Decode(e),
        Ok(_) => unreachable!("html is not json"),
    }
}

pub(crate) fn payload(status: JobStatus, stdout: &str) -> StatusPayload {
    StatusPayload {
        status,
        stdout: stdout.to_string(),
        ..StatusPayload::pending()
    }
}

pub(crate) fn sandbox_error(error_type: &str, message: &str) -> StatusPayload {
    StatusPayload {
        status: JobStatus::Failed,
        stderr: message.to_string(),
        sandbox_error_type: Some(error_type.to_string()),
        sandbox_error_message: Some(message.to_string()),
        ..StatusPayload::pending()
    }
}

/// Submits with no script left are accepted as `job-{n}`. Status polls
/// with no script left answer `fallback`.
pub(crate) struct ScriptedTransport {
    submits: Mutex<VecDeque<SubmitStep>>,
    statuses: Mutex<HashMap<String, VecDeque<StatusStep>>>,
    fallback: StatusPayload,
    submitted: Mutex<Vec<JobRequest>>,
    next_id: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            submits: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(HashMap::new()),
            fallback: payload(JobStatus::Success, "1\n"),
            submitted: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_submits(self, steps: Vec<SubmitStep>) -> Self {
        self.submits.lock().unwrap().extend(steps);
        self
    }

    pub fn with_status(self, job_id: &str, steps: Vec<StatusStep>) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .insert(job_id.to_string(), steps.into_iter().collect());
        self
    }

    pub fn with_fallback(mut self, fallback: StatusPayload) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn submitted(&self) -> Vec<JobRequest> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn submit_count(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_count(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn submit(&self, request: &JobRequest) -> Reply<SubmitReply> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(request.clone());

        let step = self.submits.lock().unwrap().pop_front();
        match step {
            Some(SubmitStep::Accept(id)) => {
                Reply::Data(SubmitReply::from_raw(json!({ "data": { "jobId": id } })))
            }
            Some(SubmitStep::Reject(raw)) => Reply::Data(SubmitReply::from_raw(raw)),
            Some(SubmitStep::Fail) => Reply::Failed(decode_error()),
            None => {
                let n = self.next_id.fetch_add(1, Ordering::SeqCst);
                let id = format!("job-{}", n);
                Reply::Data(SubmitReply::from_raw(json!({ "data": { "jobId": id } })))
            }
        }
    }

    async fn poll_status(&self, job_id: &str) -> Reply<StatusPayload> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        let step = self
            .statuses
            .lock()
            .unwrap()
            .get_mut(job_id)
            .and_then(|steps| steps.pop_front());
        match step {
            Some(StatusStep::Data(payload)) => Reply::Data(payload),
            Some(StatusStep::NoData) => Reply::NoData,
            Some(StatusStep::Fail) => Reply::Failed(decode_error()),
            None => Reply::Data(self.fallback.clone()),
        }
    }
}
