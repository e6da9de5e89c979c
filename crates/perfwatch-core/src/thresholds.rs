use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Below this many included runs a baseline is cold and nothing can fail.
pub const MIN_RUNS_FOR_VERDICT: u32 = 10;

pub const DEFAULT_REPORT_SIGMA: f64 = 2.0;
pub const DEFAULT_FAIL_SIGMA: f64 = 3.0;
pub const DEFAULT_WINDOW: u32 = 50;
pub const DEFAULT_MIN_MARGIN_SECS: f64 = 2.0;
pub const DEFAULT_MIN_MARGIN_RATIO: f64 = 0.05;

/// How limits are derived from a baseline:
/// `avg + max(k * stddev, max(min_margin_secs, min_margin_ratio * avg))`.
///
/// The margin floor keeps a steady history (zero variance) from failing a
/// run with the same runtime.
///
/// The same policy value is used when the recorder writes stats and when
/// `show` explains them, so both paths agree on the formula.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThresholdPolicy {
    pub report_sigma: f64,
    pub fail_sigma: f64,
    /// Most recent runs included in the aggregate; `None` keeps full history.
    pub window: Option<u32>,
    /// Smallest distance of either limit above the mean, in seconds.
    pub min_margin_secs: f64,
    /// Smallest distance of either limit above the mean, as a fraction of it.
    pub min_margin_ratio: f64,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            report_sigma: DEFAULT_REPORT_SIGMA,
            fail_sigma: DEFAULT_FAIL_SIGMA,
            window: Some(DEFAULT_WINDOW),
            min_margin_secs: DEFAULT_MIN_MARGIN_SECS,
            min_margin_ratio: DEFAULT_MIN_MARGIN_RATIO,
        }
    }
}

impl ThresholdPolicy {
    pub fn report_limit(&self, avg: f64, var: f64) -> f64 {
        avg + (self.report_sigma * var.sqrt()).max(self.margin(avg))
    }

    pub fn fail_limit(&self, avg: f64, var: f64) -> f64 {
        avg + (self.fail_sigma * var.sqrt()).max(self.margin(avg))
    }

    fn margin(&self, avg: f64) -> f64 {
        self.min_margin_secs.max(self.min_margin_ratio * avg.abs())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.report_sigma.is_finite() || !self.fail_sigma.is_finite() {
            return Err(ConfigError("policy sigmas must be finite".into()));
        }
        if !self.min_margin_secs.is_finite()
            || !self.min_margin_ratio.is_finite()
            || self.min_margin_secs < 0.0
            || self.min_margin_ratio < 0.0
        {
            return Err(ConfigError(
                "policy.min_margin_secs and policy.min_margin_ratio must be finite and >= 0".into(),
            ));
        }
        if self.report_sigma < 0.0 {
            return Err(ConfigError(format!(
                "policy.report_sigma must be >= 0 (got {})",
                self.report_sigma
            )));
        }
        if self.fail_sigma < self.report_sigma {
            return Err(ConfigError(format!(
                "policy.fail_sigma ({}) must not be below policy.report_sigma ({})",
                self.fail_sigma, self.report_sigma
            )));
        }
        if let Some(w) = self.window {
            if w < MIN_RUNS_FOR_VERDICT {
                return Err(ConfigError(format!(
                    "policy.window ({}) must be at least {} or no run could ever fail",
                    w, MIN_RUNS_FOR_VERDICT
                )));
            }
        }
        Ok(())
    }
}
