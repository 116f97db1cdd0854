/// Verdict Engine - decides pass/fail for one correctness case
///
/// **Matching Rules:**
/// - `expected`: trimmed stdout equals the value exactly (case-sensitive)
/// - `expectedContains`: trimmed stdout contains the value
/// - `expectedError`: `sandboxErrorType` equals the value; stdout is ignored
/// - nothing set: fail, never panic
///
/// Knows nothing about transport or polling. Pure function over a case and
/// a terminal record.

use harness_common::types::{Expectation, JobRecord, TestCase};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaseError {
    #[error("test case '{name}' sets no expectation")]
    MissingExpectation { name: String },
    #[error("test case '{name}' sets more than one expectation")]
    AmbiguousExpectation { name: String },
}

/// Leading/trailing whitespace (and line-ending differences at the edges) are ignored.
/// Internal whitespace and case are preserved.
fn normalize_output(output: &str) -> &str {
    output.trim()
}

pub fn matches(expectation: Expectation<'_>, record: &JobRecord) -> bool {
    match expectation {
        Expectation::Exact(expected) => normalize_output(&record.stdout) == expected,
        Expectation::Contains(needle) => normalize_output(&record.stdout).contains(needle),
        Expectation::Error(error_type) => record.sandbox_error_type.as_deref() == Some(error_type),
    }
}

/// Judge `record` against `case`
///
/// Only one expectation is evaluated. Should a case carry several, the
/// first of `expected`, `expectedContains`, `expectedError` wins; suites
/// loaded through `validate_case` never do.
pub fn check(case: &TestCase, record: &JobRecord) -> bool {
    match case.expectation() {
        Some(expectation) => matches(expectation, record),
        None => false,
    }
}

/// Configuration-time check: exactly one expectation per case
pub fn validate_case(case: &TestCase) -> Result<(), CaseError> {
    match case.expectation_count() {
        1 => Ok(()),
        0 => Err(CaseError::MissingExpectation {
            name: case.name.clone(),
        }),
        _ => Err(CaseError::AmbiguousExpectation {
            name: case.name.clone(),
        }),
    }
}

pub fn validate_cases(cases: &[TestCase]) -> Result<(), CaseError> {
    cases.iter().try_for_each(validate_case)
}
