use super::{exit_codes, open_store};
use crate::cli::args::{OutputFormat, RecomputeArgs, ShowArgs};
use perfwatch_core::config::PerfwatchConfig;
use perfwatch_core::thresholds::MIN_RUNS_FOR_VERDICT;
use serde_json::json;

pub fn cmd_show(args: ShowArgs, cfg: &PerfwatchConfig) -> anyhow::Result<i32> {
    let store = open_store(cfg)?;
    let baseline = store.lookup_baseline(&args.test_name)?;
    let runs = store.runs_for_test(&args.test_name, args.last)?;

    match args.format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "test_name": args.test_name,
                "baseline": baseline,
                "policy": cfg.policy,
                "runs": runs,
            }))?
        ),
        OutputFormat::Text => {
            println!("Test Name: {}", args.test_name);
            println!("Baseline: {}", baseline);
            if baseline.runs_included() < MIN_RUNS_FOR_VERDICT {
                println!(
                    "note: baseline is cold ({} of {} runs); no run can fail yet",
                    baseline.runs_included(),
                    MIN_RUNS_FOR_VERDICT
                );
            }
            for r in &runs {
                let status = match (r.failed, r.reported) {
                    (true, true) => "failed (reported)",
                    (true, false) => "failed (pending)",
                    _ => "passed",
                };
                println!(
                    "  run {}  {}  {}s  tool={} target={}  {}",
                    r.run_id, r.run_timestamp, r.runtime, r.tool_version, r.target_version, status
                );
            }
        }
    }
    Ok(exit_codes::OK)
}

pub fn cmd_recompute(args: RecomputeArgs, cfg: &PerfwatchConfig) -> anyhow::Result<i32> {
    let store = open_store(cfg)?;
    let baseline = store.recompute_baseline_by_name(&args.test_name, &cfg.policy)?;
    tracing::info!(
        event = "baseline.recomputed",
        test_name = %args.test_name,
        runs_included = baseline.runs_included()
    );
    println!("{}", baseline);
    Ok(exit_codes::OK)
}
