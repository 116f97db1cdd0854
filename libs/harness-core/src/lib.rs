//! Submission, polling and verdict engine for exercising a remote code runner.
//!
//! Load mode fans out N submissions, polls every accepted job to a terminal
//! status and aggregates latency. Correctness mode runs a fixed suite one
//! case at a time and judges each output against its expectation.

pub mod aggregator;
pub mod dispatcher;
pub mod orchestrator;
pub mod poller;
pub mod report;
pub mod suite;
pub mod task_group;
pub mod transport;
pub mod verdict;

#[cfg(test)]
mod testing;

pub use orchestrator::Harness;
pub use transport::{HttpTransport, Reply, SubmitReply, Transport, TransportError};
