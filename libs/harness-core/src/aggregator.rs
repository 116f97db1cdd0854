/// Result Aggregator - folds completed job records into a report
///
/// **Counting Rules:**
/// - `success` = records with status `success`
/// - `failed` = records with status `failed`
/// - `canceled` = records with status `canceled` (its own bucket)
/// - `averageDurationMs` = arithmetic mean of `totalDurationMs`, `null` when empty
///
/// Percentiles use nearest-rank over the sorted durations.

use harness_common::types::{JobRecord, JobStatus, Report, Summary};

/// Counts going into a summary besides the records themselves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchCounts {
    pub requested: usize,
    pub accepted: usize,
    pub abandoned: usize,
    pub wall_clock_ms: u64,
}

fn mean(durations: &[i64]) -> Option<f64> {
    if durations.is_empty() {
        return None;
    }
    let total: i64 = durations.iter().sum();
    Some(total as f64 / durations.len() as f64)
}

/// Nearest-rank percentile of an ascending slice
fn percentile(sorted: &[i64], pct: f64) -> Option<i64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    let idx = rank.clamp(1, sorted.len()) - 1;
    Some(sorted[idx])
}

pub fn summarize(records: &[JobRecord], counts: BatchCounts) -> Summary {
    let count = |status: JobStatus| records.iter().filter(|r| r.status == status).count();

    let mut durations: Vec<i64> = records.iter().map(|r| r.total_duration_ms).collect();
    let average = mean(&durations);
    durations.sort_unstable();

    Summary {
        total_requested: counts.requested,
        total_submitted: counts.accepted,
        success: count(JobStatus::Success),
        failed: count(JobStatus::Failed),
        canceled: count(JobStatus::Canceled),
        abandoned: counts.abandoned,
        average_duration_ms: average,
        min_duration_ms: durations.first().copied(),
        max_duration_ms: durations.last().copied(),
        p50_duration_ms: percentile(&durations, 50.0),
        p95_duration_ms: percentile(&durations, 95.0),
        wall_clock_ms: counts.wall_clock_ms,
    }
}

/// Build the load-mode report. `records` keep the order they are given in.
pub fn build_report(records: Vec<JobRecord>, counts: BatchCounts) -> Report {
    let summary = summarize(&records, counts);
    Report {
        summary,
        jobs: records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, status: JobStatus, duration: i64) -> JobRecord {
        JobRecord {
            job_id: id.to_string(),
            status,
            stdout: String::new(),
            stderr: String::new(),
            sandbox_error_type: None,
            sandbox_error_message: None,
            submitted_at: 1_000,
            completed_at: 1_000 + duration,
            total_duration_ms: duration,
        }
    }

    fn counts(n: usize) -> BatchCounts {
        BatchCounts {
            requested: n,
            accepted: n,
            ..BatchCounts::default()
        }
    }

    #[test]
    fn test_single_record_average() {
        let summary = summarize(&[record("a", JobStatus::Success, 100)], counts(1));
        assert_eq!(summary.average_duration_ms, Some(100.0));
        assert_eq!(summary.success, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.min_duration_ms, Some(100));
        assert_eq!(summary.p95_duration_ms, Some(100));
    }

    #[test]
    fn test_status_buckets() {
        let records = vec![
            record("a", JobStatus::Success, 10),
            record("b", JobStatus::Failed, 20),
            record("c", JobStatus::Canceled, 30),
            record("d", JobStatus::Success, 40),
        ];
        let summary = summarize(&records, counts(4));
        assert_eq!(summary.success, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.canceled, 1);
        assert_eq!(summary.total_submitted, 4);
        assert_eq!(summary.average_duration_ms, Some(25.0));
    }

    #[test]
    fn test_empty_batch_has_no_average() {
        let summary = summarize(&[], counts(0));
        assert_eq!(summary.average_duration_ms, None);
        assert_eq!(summary.min_duration_ms, None);
        assert_eq!(summary.p50_duration_ms, None);

        let value = serde_json::to_value(&summary).unwrap();
        assert!(value["averageDurationMs"].is_null());
        assert!(value.get("abandoned").is_none());
    }

    #[test]
    fn test_mean_is_exact() {
        let durations = [120, 95, 300, 41, 77];
        let records: Vec<JobRecord> = durations
            .iter()
            .enumerate()
            .map(|(i, d)| record(&i.to_string(), JobStatus::Success, *d))
            .collect();
        let summary = summarize(&records, counts(5));
        assert_eq!(summary.average_duration_ms, Some(633.0 / 5.0));
        assert_eq!(summary.min_duration_ms, Some(41));
        assert_eq!(summary.max_duration_ms, Some(300));
        assert_eq!(summary.p50_duration_ms, Some(95));
        assert_eq!(summary.p95_duration_ms, Some(300));
    }

    #[test]
    fn test_percentile_nearest_rank() {
        let sorted: Vec<i64> = (1..=20).collect();
        assert_eq!(percentile(&sorted, 50.0), Some(10));
        assert_eq!(percentile(&sorted, 95.0), Some(19));
        assert_eq!(percentile(&sorted, 100.0), Some(20));
        assert_eq!(percentile(&sorted, 0.0), Some(1));
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn test_report_keeps_order_and_counts() {
        let records = vec![
            record("late", JobStatus::Success, 50),
            record("early", JobStatus::Failed, 5),
        ];
        let report = build_report(
            records,
            BatchCounts {
                requested: 5,
                accepted: 3,
                abandoned: 1,
                wall_clock_ms: 900,
            },
        );
        assert_eq!(report.jobs[0].job_id, "late");
        assert_eq!(report.jobs[1].job_id, "early");
        assert_eq!(report.summary.total_requested, 5);
        assert_eq!(report.summary.total_submitted, 3);
        assert_eq!(report.summary.abandoned, 1);
        assert_eq!(report.summary.wall_clock_ms, 900);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["summary"]["abandoned"], 1);
        assert_eq!(value["summary"]["totalSubmitted"], 3);
        assert_eq!(value["jobs"].as_array().unwrap().len(), 2);
    }
}
