use super::{exit_codes, open_store};
use crate::cli::args::{OutputFormat, RecordArgs};
use crate::cli::input::build_run_input;
use perfwatch_core::config::PerfwatchConfig;
use perfwatch_core::recorder::RunRecorder;
use serde_json::json;

pub fn cmd_record(args: RecordArgs, cfg: &PerfwatchConfig) -> anyhow::Result<i32> {
    let input = build_run_input(
        &args.test_name,
        args.runtime,
        args.log_file.as_deref(),
        &args.tool_version,
        &args.target_version,
    )?;

    let store = open_store(cfg)?;
    let recorder = RunRecorder::new(store, cfg.policy);
    let recorded = recorder.record(&input)?;

    match args.format {
        OutputFormat::Text => println!("{}", recorded.verdict),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "run_id": recorded.run_id,
                "verdict": recorded.verdict,
                "failed": recorded.verdict.failed(),
                "baseline": recorded.refreshed,
            }))?
        ),
    }

    if args.fail_on_regression && recorded.verdict.failed() {
        return Ok(exit_codes::REGRESSION);
    }
    Ok(exit_codes::OK)
}
