// CLI commands: wire the harness to HTTP and the JSON report files
use anyhow::{bail, Context, Result};
use harness_common::config::HarnessConfig;
use harness_common::types::{JobRequest, Language, LoadReport, TestResult, TestVerdict};
use harness_core::report::{JsonFileSink, ReportSink};
use harness_core::{suite, Harness, HttpTransport};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub enum LoadProfile {
    Repeated {
        language: Language,
        code: String,
        input: String,
    },
    Mixed,
}

impl LoadProfile {
    fn requests(self, count: usize) -> Vec<JobRequest> {
        match self {
            LoadProfile::Repeated { language, code, input } => {
                suite::repeated_requests(&JobRequest::new(language, code, input), count)
            }
            LoadProfile::Mixed => suite::mixed_requests(count),
        }
    }
}

fn build_harness(config: &HarnessConfig) -> Result<Harness<HttpTransport>> {
    let transport = HttpTransport::new(config).context("Failed to build HTTP client")?;
    Ok(Harness::new(Arc::new(transport), config))
}

/// Submit `jobs` jobs at once, poll them all and write the summary report
pub async fn run_load(
    config: &HarnessConfig,
    profile: LoadProfile,
    jobs: usize,
    output: &Path,
) -> Result<()> {
    if jobs == 0 {
        bail!("--jobs must be at least 1");
    }

    println!("🚀 Submitting {} jobs to {}", jobs, config.base_url);
    let harness = build_harness(config)?;
    let report = harness.run_load(profile.requests(jobs)).await;

    let sink = JsonFileSink::new(output);
    sink.write(&report)?;
    info!(path = %sink.path().display(), "Load report written");

    match &report {
        LoadReport::Completed(report) => {
            let summary = &report.summary;
            println!("✅ Load test complete");
            println!("   Submitted: {}/{}", summary.total_submitted, summary.total_requested);
            println!("   Success:   {}", summary.success);
            println!("   Failed:    {}", summary.failed);
            if summary.canceled > 0 {
                println!("   Canceled:  {}", summary.canceled);
            }
            if summary.abandoned > 0 {
                println!("   Abandoned: {}", summary.abandoned);
            }
            match summary.average_duration_ms {
                Some(avg) => println!("   Average:   {:.1} ms", avg),
                None => println!("   Average:   n/a"),
            }
            if let (Some(p50), Some(p95)) = (summary.p50_duration_ms, summary.p95_duration_ms) {
                println!("   p50/p95:   {} ms / {} ms", p50, p95);
            }
            println!("   Wall time: {} ms", summary.wall_clock_ms);
        }
        LoadReport::NoJobsAccepted(batch) => {
            println!("❌ {}", batch.error);
        }
    }
    println!("📝 Report written to {}", sink.path().display());

    Ok(())
}

/// Run the suite one case at a time; fails when any case is not PASS
pub async fn run_verify(config: &HarnessConfig, cases: Option<&Path>, output: &Path) -> Result<()> {
    let cases = match cases {
        Some(path) => suite::load_cases(path)?,
        None => suite::builtin_cases(),
    };

    println!("🧪 Running {} test cases against {}", cases.len(), config.base_url);
    let harness = build_harness(config)?;
    let results = harness.run_correctness(&cases, print_result).await;

    let sink = JsonFileSink::new(output);
    sink.write(&results)?;

    let (passed, failed, errored) = tally(&results);
    println!();
    println!("📊 {} passed, {} failed, {} errored", passed, failed, errored);
    println!("📝 Results written to {}", sink.path().display());

    if passed != results.len() {
        bail!("{} of {} test cases did not pass", results.len() - passed, results.len());
    }

    Ok(())
}

fn print_result(result: &TestResult) {
    match result.status {
        TestVerdict::Pass => println!("✅ {} ({} ms)", result.name, result.duration_ms),
        TestVerdict::Fail => {
            println!("❌ {} ({} ms)", result.name, result.duration_ms);
            if let Some(expected) = &result.expected {
                println!("   expected: {}", expected);
            }
            if let Some(actual) = &result.actual {
                println!("   stdout:   {}", actual.stdout.trim());
                if let Some(error_type) = &actual.error_type {
                    println!("   error:    {}", error_type);
                }
            }
        }
        TestVerdict::Error => {
            println!("⚠️  {}: {}", result.name, result.error.as_deref().unwrap_or("unknown error"));
        }
    }
}

fn tally(results: &[TestResult]) -> (usize, usize, usize) {
    results.iter().fold((0, 0, 0), |(pass, fail, error), r| match r.status {
        TestVerdict::Pass => (pass + 1, fail, error),
        TestVerdict::Fail => (pass, fail + 1, error),
        TestVerdict::Error => (pass, fail, error + 1),
    })
}
