use crate::classify::{classify, Outcome, Verdict};
use crate::errors::{WorkflowError, WorkflowResult};
use crate::model::{Baseline, RunId, RunInput};
use crate::storage::Store;
use crate::thresholds::ThresholdPolicy;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct RecordedRun {
    pub run_id: RunId,
    pub verdict: Verdict,
    /// Baseline after this run was folded in.
    pub refreshed: Baseline,
}

/// Write path for one CI run: classify, insert, re-aggregate.
pub struct RunRecorder {
    store: Store,
    policy: ThresholdPolicy,
}

impl RunRecorder {
    pub fn new(store: Store, policy: ThresholdPolicy) -> Self {
        Self { store, policy }
    }

    pub fn record(&self, input: &RunInput) -> WorkflowResult<RecordedRun> {
        self.record_at(input, Utc::now())
    }

    /// Classification reads the baseline as it was before this run. The
    /// lookup, insert and recompute share one immediate transaction, so a
    /// concurrent recorder for the same test sees either none or all of it.
    pub fn record_at(&self, input: &RunInput, at: DateTime<Utc>) -> WorkflowResult<RecordedRun> {
        let recorded = self.store.write_tx(|tx| {
            let test_id = tx
                .lookup_test_id(&input.test_name)?
                .ok_or_else(|| WorkflowError::UnknownTest(input.test_name.clone()))?;

            let baseline = tx.baseline_for(test_id)?;
            let verdict = classify(&input.test_name, input.runtime, &baseline);

            let run_id = tx.insert_run(
                test_id,
                &at.to_rfc3339(),
                input.runtime,
                &input.tool_version,
                &input.target_version,
                verdict.failed(),
                false,
            )?;

            let refreshed = tx.recompute_baseline(test_id, &self.policy)?;

            Ok(RecordedRun {
                run_id,
                verdict,
                refreshed,
            })
        });

        match &recorded {
            Ok(r) => log_recorded(input, r),
            Err(e) => tracing::error!(
                event = "run.record_failed",
                test_name = %input.test_name,
                runtime = input.runtime,
                error = %e,
                cause = ?std::error::Error::source(e).map(|c| c.to_string())
            ),
        }
        recorded
    }
}

fn log_recorded(input: &RunInput, r: &RecordedRun) {
    tracing::info!(
        event = "run.recorded",
        test_name = %input.test_name,
        run_id = r.run_id.0,
        runtime = input.runtime,
        tool_version = %input.tool_version,
        target_version = %input.target_version,
        outcome = r.verdict.outcome.as_str(),
        runs_included = r.refreshed.runs_included(),
        "\n{}",
        r.verdict
    );
    match r.verdict.outcome {
        Outcome::Fail => tracing::warn!(
            event = "run.regression",
            test_name = %input.test_name,
            runtime = input.runtime,
            limit_fail = r.verdict.baseline.limit_fail(),
            "runtime reached the fail limit"
        ),
        Outcome::Report => tracing::warn!(
            event = "run.slow",
            test_name = %input.test_name,
            runtime = input.runtime,
            limit_report = r.verdict.baseline.limit_report(),
            "runtime above the report limit"
        ),
        Outcome::Pass => {}
    }
}
