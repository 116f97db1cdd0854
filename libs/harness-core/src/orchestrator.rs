/// Orchestrator - composes dispatcher, poller, aggregator and verdict engine
///
/// **Load mode:** submit every request at once, poll every accepted job at
/// once, aggregate in completion order.
///
/// **Correctness mode:** one case in flight at a time, in suite order. A case
/// that cannot be submitted or polled is recorded as `ERROR` and the suite
/// moves on.
///
/// Neither mode returns an error: a report always comes out, even when the
/// service accepted nothing.

use crate::aggregator::{self, BatchCounts};
use crate::dispatcher;
use crate::poller::{self, PollError};
use crate::transport::{Reply, Transport, TransportError};
use crate::verdict;
use harness_common::config::{HarnessConfig, PollPolicy};
use harness_common::types::{
    now_millis, ActualOutput, FailedBatch, JobHandle, JobRecord, JobRequest, LoadReport, TestCase,
    TestResult, TestVerdict,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

pub const NO_JOBS_SUBMITTED: &str = "No jobs submitted";

/// Why a correctness case ended in `ERROR`
#[derive(Debug, Error)]
pub enum CaseFailure {
    #[error("submission failed: {0}")]
    Submission(#[from] TransportError),
    #[error("submission returned no job id: {0}")]
    Rejected(serde_json::Value),
    #[error("submission returned no data")]
    Empty,
    #[error(transparent)]
    Poll(#[from] PollError),
}

impl CaseFailure {
    pub fn job_id(&self) -> Option<&str> {
        match self {
            CaseFailure::Poll(PollError::DeadlineExceeded { job_id, .. }) => Some(job_id),
            _ => None,
        }
    }
}

pub struct Harness<T> {
    transport: Arc<T>,
    load_policy: PollPolicy,
    correctness_policy: PollPolicy,
    max_in_flight: Option<usize>,
}

impl<T: Transport + 'static> Harness<T> {
    pub fn new(transport: Arc<T>, config: &HarnessConfig) -> Self {
        Self {
            transport,
            load_policy: config.load_policy(),
            correctness_policy: config.correctness_policy(),
            max_in_flight: config.max_in_flight,
        }
    }

    pub fn with_load_policy(mut self, policy: PollPolicy) -> Self {
        self.load_policy = policy;
        self
    }

    pub fn with_correctness_policy(mut self, policy: PollPolicy) -> Self {
        self.correctness_policy = policy;
        self
    }

    /// Submit everything, poll everything, aggregate
    #[instrument(skip(self, requests), fields(jobs = requests.len()))]
    pub async fn run_load(&self, requests: Vec<JobRequest>) -> LoadReport {
        let started = Instant::now();

        let dispatch = dispatcher::submit_all(self.transport.clone(), requests, self.max_in_flight).await;
        info!(
            "Submitted {}/{} jobs",
            dispatch.accepted_count(),
            dispatch.requested
        );

        if dispatch.nothing_accepted() {
            error!(requested = dispatch.requested, "No submission was accepted, skipping polling");
            return LoadReport::NoJobsAccepted(FailedBatch {
                error: NO_JOBS_SUBMITTED.to_string(),
                submit_responses: dispatch.responses,
            });
        }

        let requested = dispatch.requested;
        let accepted = dispatch.accepted_count();
        let (records, abandoned) = poller::poll_all(
            self.transport.clone(),
            dispatch.accepted,
            self.load_policy,
            self.max_in_flight,
        )
        .await;

        if !abandoned.is_empty() {
            warn!(abandoned = abandoned.len(), "Jobs dropped after the poll deadline");
        }

        let report = aggregator::build_report(
            records,
            BatchCounts {
                requested,
                accepted,
                abandoned: abandoned.len(),
                wall_clock_ms: started.elapsed().as_millis() as u64,
            },
        );

        info!(
            success = report.summary.success,
            failed = report.summary.failed,
            canceled = report.summary.canceled,
            average_ms = ?report.summary.average_duration_ms,
            "Load run complete"
        );

        LoadReport::Completed(report)
    }

    /// Run `cases` strictly one after another. `on_result` sees each result
    /// as soon as its case finishes.
    pub async fn run_correctness<F>(&self, cases: &[TestCase], mut on_result: F) -> Vec<TestResult>
    where
        F: FnMut(&TestResult),
    {
        let mut results = Vec::with_capacity(cases.len());
        for case in cases {
            let result = self.run_case(case).await;
            on_result(&result);
            results.push(result);
        }

        let passed = results.iter().filter(|r| r.status == TestVerdict::Pass).count();
        info!(passed, total = results.len(), "Correctness run complete");
        results
    }

    /// Submit, poll and judge one case
    #[instrument(skip(self, case), fields(case = %case.name))]
    pub async fn run_case(&self, case: &TestCase) -> TestResult {
        let started = Instant::now();
        let expected = case.expectation().map(|e| e.value().to_string());

        match self.execute_case(case).await {
            Ok(record) => {
                let passed = verdict::check(case, &record);
                info!(job_id = %record.job_id, passed, "Case judged");
                TestResult {
                    name: case.name.clone(),
                    job_id: Some(record.job_id.clone()),
                    expected,
                    actual: Some(ActualOutput::from(&record)),
                    status: if passed { TestVerdict::Pass } else { TestVerdict::Fail },
                    duration_ms: started.elapsed().as_millis() as u64,
                    error: None,
                }
            }
            Err(failure) => {
                warn!(error = %failure, "Case could not be executed");
                TestResult {
                    name: case.name.clone(),
                    job_id: failure.job_id().map(str::to_string),
                    expected,
                    actual: None,
                    status: TestVerdict::Error,
                    duration_ms: started.elapsed().as_millis() as u64,
                    error: Some(failure.to_string()),
                }
            }
        }
    }

    async fn execute_case(&self, case: &TestCase) -> Result<JobRecord, CaseFailure> {
        let submitted_at = now_millis();
        let reply = match self.transport.submit(&case.body).await {
            Reply::Data(reply) => reply,
            Reply::NoData => return Err(CaseFailure::Empty),
            Reply::Failed(e) => return Err(e.into()),
        };

        let job_id = match reply.job_id {
            Some(job_id) => job_id,
            None => return Err(CaseFailure::Rejected(reply.raw)),
        };
        info!(job_id = %job_id, "Submitted job");

        let handle = JobHandle { job_id, submitted_at };
        let record = poller::wait_for_terminal(self.transport.as_ref(), handle, &self.correctness_policy).await?;
        Ok(record)
    }
}
