/// Submission Dispatcher - fans out every submission at once
///
/// Each submission is stamped right before its call goes out. Replies are
/// put back in request order, and only the ones carrying a job id become
/// `JobHandle`s. Rejected and failed submissions are kept as raw replies so
/// an all-rejected batch can still be diagnosed.

use crate::task_group::TaskGroup;
use crate::transport::{Reply, Transport};
use harness_common::types::{now_millis, JobHandle, JobRequest};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one submission batch
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub requested: usize,
    /// Accepted submissions, in request order
    pub accepted: Vec<JobHandle>,
    /// One raw reply per request, in request order; `null` for failed calls
    pub responses: Vec<serde_json::Value>,
}

impl Dispatch {
    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    pub fn nothing_accepted(&self) -> bool {
        self.accepted.is_empty()
    }
}

struct Submitted {
    index: usize,
    submitted_at: i64,
    raw: serde_json::Value,
    job_id: Option<String>,
}

pub async fn submit_all<T>(
    transport: Arc<T>,
    requests: Vec<JobRequest>,
    max_in_flight: Option<usize>,
) -> Dispatch
where
    T: Transport + 'static,
{
    let requested = requests.len();
    let mut group = TaskGroup::new(max_in_flight);

    for (index, request) in requests.into_iter().enumerate() {
        let transport = transport.clone();
        group.spawn(async move {
            let submitted_at = now_millis();
            match transport.submit(&request).await {
                Reply::Data(reply) => {
                    if reply.job_id.is_none() {
                        debug!(index, reply = %reply.raw, "Submission rejected");
                    }
                    Submitted {
                        index,
                        submitted_at,
                        raw: reply.raw,
                        job_id: reply.job_id,
                    }
                }
                Reply::NoData => Submitted {
                    index,
                    submitted_at,
                    raw: serde_json::Value::Null,
                    job_id: None,
                },
                Reply::Failed(e) => {
                    warn!(index, error = %e, "Submission failed");
                    Submitted {
                        index,
                        submitted_at,
                        raw: serde_json::Value::Null,
                        job_id: None,
                    }
                }
            }
        });
    }

    let mut submitted = group.join_all().await;
    submitted.sort_by_key(|s| s.index);

    let mut accepted = Vec::with_capacity(submitted.len());
    let mut responses = Vec::with_capacity(submitted.len());
    for s in submitted {
        if let Some(job_id) = s.job_id {
            accepted.push(JobHandle {
                job_id,
                submitted_at: s.submitted_at,
            });
        }
        responses.push(s.raw);
    }

    info!(accepted = accepted.len(), requested, "Submission batch finished");

    Dispatch {
        requested,
        accepted,
        responses,
    }
}
