use crate::model::Baseline;
use crate::thresholds::MIN_RUNS_FOR_VERDICT;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    /// Above the report limit but below the fail limit. Logged only.
    Report,
    Fail,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Pass => "Passed",
            Outcome::Report => "Reported",
            Outcome::Fail => "Failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub test_name: String,
    pub runtime: u64,
    pub baseline: Baseline,
    pub outcome: Outcome,
}

impl Verdict {
    pub fn failed(&self) -> bool {
        self.outcome == Outcome::Fail
    }
}

/// Compare one runtime against the baseline stored before it.
///
/// A cold baseline (fewer than [`MIN_RUNS_FOR_VERDICT`] runs) always passes.
/// Reaching `limit_fail` exactly counts as a failure.
pub fn classify(test_name: &str, runtime: u64, baseline: &Baseline) -> Verdict {
    let warm = baseline.runs_included() >= MIN_RUNS_FOR_VERDICT;
    let r = runtime as f64;

    let outcome = if warm && r >= baseline.limit_fail() {
        Outcome::Fail
    } else if warm && r >= baseline.limit_report() {
        Outcome::Report
    } else {
        Outcome::Pass
    };

    Verdict {
        test_name: test_name.to_string(),
        runtime,
        baseline: *baseline,
        outcome,
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rule = "#".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "Test Name: {}", self.test_name)?;
        writeln!(f, "Runtime: {}", self.runtime)?;
        writeln!(f, "Compared against: {}", self.baseline)?;
        writeln!(f, "Comparison result: {}", self.outcome.as_str())?;
        write!(f, "{}", rule)
    }
}
