use serde::{Deserialize, Serialize};

/// Surrogate key of a row in `test_names`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestId(pub i64);

/// Surrogate key of a row in `test_runs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub i64);

impl std::fmt::Display for TestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedTest {
    pub test_id: TestId,
    pub test_name: String,
}

/// Rolling aggregate over a test's recent runtimes.
///
/// Always derived by [`crate::stats::Aggregator`]; never written by hand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineStats {
    pub runs_included: u32,
    pub runtime_avg: f64,
    pub runtime_var: f64,
    pub limit_report: f64,
    pub limit_fail: f64,
}

/// The baseline a new run is compared against.
///
/// `Absent` means no run has been recorded for the test yet. It is a
/// distinct variant so the cold-start policy cannot be bypassed by a
/// forgotten default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Baseline {
    Absent,
    Present(BaselineStats),
}

impl Baseline {
    pub fn runs_included(&self) -> u32 {
        match self {
            Baseline::Absent => 0,
            Baseline::Present(s) => s.runs_included,
        }
    }

    /// Fail threshold, infinite when no baseline exists.
    pub fn limit_fail(&self) -> f64 {
        match self {
            Baseline::Absent => f64::INFINITY,
            Baseline::Present(s) => s.limit_fail,
        }
    }

    /// Report threshold, infinite when no baseline exists.
    pub fn limit_report(&self) -> f64 {
        match self {
            Baseline::Absent => f64::INFINITY,
            Baseline::Present(s) => s.limit_report,
        }
    }

    pub fn stats(&self) -> Option<&BaselineStats> {
        match self {
            Baseline::Absent => None,
            Baseline::Present(s) => Some(s),
        }
    }
}

impl From<Option<BaselineStats>> for Baseline {
    fn from(stats: Option<BaselineStats>) -> Self {
        stats.map_or(Baseline::Absent, Baseline::Present)
    }
}

impl std::fmt::Display for Baseline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Baseline::Absent => write!(f, "no baseline"),
            Baseline::Present(s) => write!(
                f,
                "runs_included={} avg={:.2} var={:.2} limit_report={:.2} limit_fail={:.2}",
                s.runs_included, s.runtime_avg, s.runtime_var, s.limit_report, s.limit_fail
            ),
        }
    }
}

/// One measured execution handed over by the CI job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInput {
    pub test_name: String,
    /// Whole seconds.
    pub runtime: u64,
    pub tool_version: String,
    pub target_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: RunId,
    pub test_id: TestId,
    pub run_timestamp: String,
    pub runtime: u64,
    pub tool_version: String,
    pub target_version: String,
    pub failed: bool,
    pub reported: bool,
}

/// A failed run that no notification has covered yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreportedFailure {
    pub run_id: RunId,
    pub test_id: TestId,
    pub test_name: String,
    pub run_timestamp: String,
    pub runtime: u64,
    pub tool_version: String,
    pub target_version: String,
}
