//! Suite report: per-check outcomes and exit-code mapping

use serde::{Deserialize, Serialize};

/// Outcome of a single named check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Stable check name, e.g. "crud: read-after-delete returns 404"
    pub name: String,
    pub passed: bool,
    /// Human-readable detail; for failures, what was expected vs observed.
    pub detail: String,
}

impl CheckOutcome {
    #[must_use]
    pub fn pass(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            detail: detail.into(),
        }
    }
}

/// Aggregated outcomes for one suite run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    pub outcomes: Vec<CheckOutcome>,
}

impl Report {
    pub fn push(&mut self, outcome: CheckOutcome) {
        self.outcomes.push(outcome);
    }

    /// Record an assertion: pass/fail plus its detail line.
    pub fn check(&mut self, name: &str, passed: bool, detail: impl Into<String>) {
        self.outcomes.push(CheckOutcome {
            name: name.to_string(),
            passed,
            detail: detail.into(),
        });
    }

    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    #[must_use]
    pub fn failures(&self) -> Vec<&CheckOutcome> {
        self.outcomes.iter().filter(|o| !o.passed).collect()
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    /// Process exit code: 0 all checks passed, 1 otherwise.
    /// Tool errors (exit 3) never reach a report.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.all_passed())
    }

    /// Terminal rendering, one line per outcome plus a summary.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut out = String::new();
        for o in &self.outcomes {
            let icon = if o.passed { "PASS" } else { "FAIL" };
            out.push_str(&format!("  [{icon}] {}", o.name));
            if !o.passed && !o.detail.is_empty() {
                out.push_str(&format!("\n         {}", o.detail));
            }
            out.push('\n');
        }
        let failed = self.outcomes.len() - self.passed_count();
        out.push_str(&format!(
            "\n{} checks: {} passed, {failed} failed\n",
            self.outcomes.len(),
            self.passed_count(),
        ));
        out
    }
}
