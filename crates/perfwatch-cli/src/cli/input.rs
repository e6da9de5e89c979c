//! Turns CI job output into a [`RunInput`].

use perfwatch_core::model::RunInput;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn runtime_line_re() -> Result<&'static Regex, InputError> {
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^TEST RUNTIME:\s*([0-9]+(?:\.[0-9]*)?)\s*$"))
        .as_ref()
        .map_err(|e| InputError(e.to_string()))
}

fn version_prefix_re() -> Option<&'static Regex> {
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\S+\s+version\s+(.+)$"))
        .as_ref()
        .ok()
}

/// The run input could not be read or understood.
#[derive(Debug)]
pub struct InputError(pub String);

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "input error: {}", self.0)
    }
}

impl std::error::Error for InputError {}

pub fn build_run_input(
    test_name: &str,
    runtime: Option<f64>,
    log_file: Option<&Path>,
    tool_version: &str,
    target_version: &str,
) -> Result<RunInput, InputError> {
    let runtime = match (runtime, log_file) {
        (Some(secs), _) => seconds_to_runtime(secs)?,
        (None, Some(path)) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                InputError(format!("failed to read log file {}: {}", path.display(), e))
            })?;
            runtime_from_log(&text).map_err(|e| InputError(format!("{} ({})", e.0, path.display())))?
        }
        (None, None) => return Err(InputError("either --runtime or --log-file is required".into())),
    };

    let test_name = test_name.trim();
    if test_name.is_empty() {
        return Err(InputError("test name must not be empty".into()));
    }

    Ok(RunInput {
        test_name: test_name.to_string(),
        runtime,
        tool_version: normalize_version(tool_version),
        target_version: normalize_version(target_version),
    })
}

/// Whole seconds; fractional parts are truncated. The store keeps runtimes
/// as signed 64-bit integers, so anything from 2^63 up is rejected here.
pub fn seconds_to_runtime(secs: f64) -> Result<u64, InputError> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(InputError(format!(
            "runtime must be a non-negative number of seconds (got {})",
            secs
        )));
    }
    if secs >= i64::MAX as f64 {
        return Err(InputError(format!(
            "runtime {} is out of range (max {} seconds)",
            secs,
            i64::MAX
        )));
    }
    Ok(secs.trunc() as u64)
}

/// Runtime from the last `TEST RUNTIME: <seconds>` line of a test log.
pub fn runtime_from_log(text: &str) -> Result<u64, InputError> {
    let caps = runtime_line_re()?
        .captures_iter(text)
        .last()
        .ok_or_else(|| InputError("no `TEST RUNTIME:` line found in log".into()))?;
    let secs: f64 = caps[1]
        .parse()
        .map_err(|e| InputError(format!("invalid runtime '{}': {}", &caps[1], e)))?;
    seconds_to_runtime(secs)
}

/// `"gpbackup version 1.30.0"` -> `"1.30.0"`; bare versions pass through.
pub fn normalize_version(raw: &str) -> String {
    let trimmed = raw.trim();
    version_prefix_re()
        .and_then(|re| re.captures(trimmed))
        .map(|c| c[1].trim().to_string())
        .unwrap_or_else(|| trimmed.to_string())
}
