/// Job Poller - drives one accepted job to a terminal status
///
/// **State machine:**
/// `PENDING -> (poll) -> PENDING | SUCCESS | FAILED | CANCELED`
///
/// - Reply with no data, or a failed call: wait `no_data_interval`, retry
/// - Reply with a non-terminal status: wait `pending_interval`, retry
/// - Reply with a terminal status: stamp `completedAt` and stop
///
/// No retry count. Polling only stops early when the policy carries a deadline.

use crate::task_group::TaskGroup;
use crate::transport::{Reply, Transport};
use harness_common::config::PollPolicy;
use harness_common::types::{now_millis, JobHandle, JobRecord};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, instrument, trace, warn};

#[derive(Debug, Error)]
pub enum PollError {
    #[error("job {job_id} not terminal after {}ms", .waited.as_millis())]
    DeadlineExceeded { job_id: String, waited: Duration },
}

/// Poll `handle` until the service reports a terminal status
#[instrument(skip(transport, handle, policy), fields(job_id = %handle.job_id))]
pub async fn wait_for_terminal<T>(
    transport: &T,
    handle: JobHandle,
    policy: &PollPolicy,
) -> Result<JobRecord, PollError>
where
    T: Transport + ?Sized,
{
    let started = Instant::now();
    let mut polls: u32 = 0;

    loop {
        polls += 1;
        let reply = transport.poll_status(&handle.job_id).await;
        let backoff = match reply {
            Reply::Data(payload) if payload.status.is_terminal() => {
                let record = JobRecord::complete(handle, payload, now_millis());
                debug!(
                    status = %record.status,
                    polls,
                    duration_ms = record.total_duration_ms,
                    "Job reached terminal status"
                );
                return Ok(record);
            }
            Reply::Data(payload) => {
                trace!(status = %payload.status, polls, "Job not finished");
                policy.pending_interval
            }
            Reply::NoData => {
                debug!(polls, "Status reply carried no data");
                policy.no_data_interval
            }
            Reply::Failed(e) => {
                warn!(error = %e, polls, "Status poll failed, retrying");
                policy.no_data_interval
            }
        };

        if let Some(deadline) = policy.deadline {
            let waited = started.elapsed();
            if waited + backoff > deadline {
                warn!(polls, waited_ms = waited.as_millis() as u64, "Poll deadline exceeded");
                return Err(PollError::DeadlineExceeded {
                    job_id: handle.job_id,
                    waited,
                });
            }
        }

        tokio::time::sleep(backoff).await;
    }
}

/// Poll every handle concurrently. Records come back in completion order,
/// followed by the ids of jobs that ran out of deadline.
pub async fn poll_all<T>(
    transport: Arc<T>,
    handles: Vec<JobHandle>,
    policy: PollPolicy,
    max_in_flight: Option<usize>,
) -> (Vec<JobRecord>, Vec<String>)
where
    T: Transport + 'static,
{
    let mut group = TaskGroup::new(max_in_flight);
    for handle in handles {
        let transport = transport.clone();
        group.spawn(async move { wait_for_terminal(transport.as_ref(), handle, &policy).await });
    }

    let mut records = Vec::with_capacity(group.len());
    let mut abandoned = Vec::new();
    for outcome in group.join_all().await {
        match outcome {
            Ok(record) => records.push(record),
            Err(PollError::DeadlineExceeded { job_id, .. }) => abandoned.push(job_id),
        }
    }
    (records, abandoned)
}
