use crate::model::BaselineStats;
use crate::thresholds::ThresholdPolicy;

/// Folds a test's runtime history into [`BaselineStats`].
///
/// Values must be pushed oldest first. The store always reads history in
/// ascending `run_id` order, so recomputing from the same rows produces the
/// same floating point sums.
pub struct Aggregator {
    policy: ThresholdPolicy,
    values: Vec<u64>,
}

impl Aggregator {
    pub fn new(policy: ThresholdPolicy) -> Self {
        Self {
            policy,
            values: Vec::new(),
        }
    }

    pub fn push(&mut self, runtime: u64) {
        self.values.push(runtime);
    }

    /// `None` when nothing was pushed.
    pub fn finish(self) -> Option<BaselineStats> {
        let vs = match self.policy.window {
            Some(w) if self.values.len() > w as usize => {
                &self.values[self.values.len() - w as usize..]
            }
            _ => &self.values[..],
        };

        let n = vs.len();
        if n == 0 {
            return None;
        }

        let sum: f64 = vs.iter().map(|&x| x as f64).sum();
        let mean = sum / (n as f64);
        let variance: f64 = vs
            .iter()
            .map(|&x| (x as f64 - mean).powi(2))
            .sum::<f64>()
            / (n as f64);

        Some(BaselineStats {
            runs_included: u32::try_from(n).unwrap_or(u32::MAX),
            runtime_avg: mean,
            runtime_var: variance,
            limit_report: self.policy.report_limit(mean, variance),
            limit_fail: self.policy.fail_limit(mean, variance),
        })
    }
}

/// Convenience wrapper over [`Aggregator`] for a complete history.
pub fn summarize(history: &[u64], policy: &ThresholdPolicy) -> Option<BaselineStats> {
    let mut agg = Aggregator::new(*policy);
    for &r in history {
        agg.push(r);
    }
    agg.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(window: Option<u32>) -> ThresholdPolicy {
        ThresholdPolicy {
            report_sigma: 1.0,
            fail_sigma: 2.0,
            window,
            min_margin_secs: 0.0,
            min_margin_ratio: 0.0,
        }
    }

    #[test]
    fn empty_history_has_no_stats() {
        assert!(summarize(&[], &policy(None)).is_none());
    }

    #[test]
    fn population_variance_and_limits() {
        // mean 100, deviations +-10 -> var 100, stddev 10
        let history = [90, 110, 90, 110];
        let s = summarize(&history, &policy(None)).unwrap();
        assert_eq!(s.runs_included, 4);
        assert_eq!(s.runtime_avg, 100.0);
        assert_eq!(s.runtime_var, 100.0);
        assert_eq!(s.limit_report, 110.0);
        assert_eq!(s.limit_fail, 120.0);
    }

    #[test]
    fn constant_history_without_margin_collapses_limits_to_mean() {
        let s = summarize(&[42; 12], &policy(None)).unwrap();
        assert_eq!(s.runtime_var, 0.0);
        assert_eq!(s.limit_fail, 42.0);
        assert_eq!(s.limit_report, 42.0);
    }

    #[test]
    fn constant_history_limits_sit_one_margin_above_mean() {
        let s = summarize(&[100; 12], &ThresholdPolicy::default()).unwrap();
        assert_eq!(s.runtime_var, 0.0);
        assert_eq!(s.limit_fail, 105.0);
        assert_eq!(s.limit_report, 105.0);
    }

    #[test]
    fn window_keeps_only_most_recent_runs() {
        // 5 old slow runs followed by 10 fast ones; a window of 10 ignores the slow tail.
        let mut history = vec![1_000; 5];
        history.extend([50; 10]);

        let windowed = summarize(&history, &policy(Some(10))).unwrap();
        assert_eq!(windowed.runs_included, 10);
        assert_eq!(windowed.runtime_avg, 50.0);

        let full = summarize(&history, &policy(None)).unwrap();
        assert_eq!(full.runs_included, 15);
        assert!(full.runtime_avg > 50.0);
    }

    #[test]
    fn recompute_is_bit_identical() {
        let history: Vec<u64> = (0..37).map(|i| 100 + (i * 7919) % 23).collect();
        let a = summarize(&history, &policy(Some(30))).unwrap();
        let b = summarize(&history, &policy(Some(30))).unwrap();
        assert_eq!(a.runtime_avg.to_bits(), b.runtime_avg.to_bits());
        assert_eq!(a.runtime_var.to_bits(), b.runtime_var.to_bits());
        assert_eq!(a.limit_fail.to_bits(), b.limit_fail.to_bits());
        assert_eq!(a, b);
    }
}
