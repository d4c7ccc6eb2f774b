//! Golden-file testing for omerta.
//!
//! `tests/parser/*.test` files hold source snippets with either the expected
//! S-expression or a fragment of the expected error. [`parser`] reads the
//! format and runs each case; [`TestSummary`] collects the outcomes so one
//! integration test can report every mismatch at once.

pub mod parser;

use std::fmt;

/// Outcome of one golden case.
#[derive(Debug, Clone, PartialEq)]
pub enum TestResult {
    Pass,
    Fail { expected: String, actual: String },
    Skip { reason: String },
}

impl TestResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, TestResult::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, TestResult::Fail { .. })
    }
}

/// A failed case, located by name and line in its `.test` file.
#[derive(Debug, Clone)]
pub struct TestFailure {
    pub name: String,
    pub line: usize,
    pub expected: String,
    pub actual: String,
}

/// Tally of a golden file run.
#[derive(Debug, Default)]
pub struct TestSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: Vec<(String, String)>,
    pub failures: Vec<TestFailure>,
}

impl TestSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: impl Into<String>, line: usize, result: TestResult) {
        match result {
            TestResult::Pass => self.passed += 1,
            TestResult::Fail { expected, actual } => {
                self.failed += 1;
                self.failures.push(TestFailure {
                    name: name.into(),
                    line,
                    expected,
                    actual,
                });
            }
            TestResult::Skip { reason } => self.skipped.push((name.into(), reason)),
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped.len()
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for TestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "golden cases: {} passed, {} failed, {} skipped",
            self.passed,
            self.failed,
            self.skipped.len()
        )?;
        for (name, reason) in &self.skipped {
            writeln!(f, "  skip {name}: {reason}")?;
        }
        for failure in &self.failures {
            writeln!(f, "  FAIL {} (line {})", failure.name, failure.line)?;
            writeln!(f, "    expected: {}", failure.expected)?;
            writeln!(f, "    actual:   {}", failure.actual)?;
        }
        Ok(())
    }
}
