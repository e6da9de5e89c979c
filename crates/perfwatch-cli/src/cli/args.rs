use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "perfwatch",
    version,
    about = "Runtime regression gate for CI performance tests"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GlobalArgs {
    /// YAML config file (defaults to ./perfwatch.yaml when it exists)
    #[arg(long, global = true, env = "PERFWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Reject unknown keys in the config file
    #[arg(long, global = true)]
    pub strict_config: bool,

    /// Results database (overrides config and PERFWATCH_DB)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// tracing filter directive, e.g. `info` or `perfwatch_core=debug`
    #[arg(long, global = true, env = "PERFWATCH_LOG", default_value = "info")]
    pub log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a sample config file
    Init(InitArgs),
    /// Create the results schema
    InitDb,
    /// Register one or more named tests
    AddTest(AddTestArgs),
    /// List registered tests
    ListTests(ListTestsArgs),
    /// Classify and store one test run, then refresh its baseline
    Record(RecordArgs),
    /// Notify about failed runs that have not been reported yet
    Sweep(SweepArgs),
    /// Show a test's baseline and recent runs
    Show(ShowArgs),
    /// Recompute a test's baseline from its stored runs
    Recompute(RecomputeArgs),
    Version,
}

#[derive(Parser, Clone)]
pub struct InitArgs {
    #[arg(long, default_value = "perfwatch.yaml")]
    pub out: PathBuf,
}

#[derive(Parser, Clone)]
pub struct AddTestArgs {
    #[arg(required = true)]
    pub names: Vec<String>,
}

#[derive(Parser, Clone)]
pub struct ListTestsArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Clone)]
pub struct RecordArgs {
    pub test_name: String,

    /// Measured runtime in seconds (fractions are truncated)
    #[arg(long, conflicts_with = "log_file", required_unless_present = "log_file")]
    pub runtime: Option<f64>,

    /// Test log containing a `TEST RUNTIME: <seconds>` line
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Version of the tool under test; a leading "<tool> version " is stripped
    #[arg(long, env = "PERFWATCH_TOOL_VERSION")]
    pub tool_version: String,

    /// Version of the target system; a leading "<tool> version " is stripped
    #[arg(long, env = "PERFWATCH_TARGET_VERSION")]
    pub target_version: String,

    /// Exit with status 1 when the run is classified as failed
    #[arg(long)]
    pub fail_on_regression: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NotifierKind {
    /// Slack webhook when configured, otherwise refuse to run
    Auto,
    Slack,
    /// Write the message to the log only
    Log,
}

#[derive(Parser, Clone)]
pub struct SweepArgs {
    /// Print the pending message without sending it or marking anything
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, value_enum, default_value_t = NotifierKind::Auto)]
    pub notifier: NotifierKind,
}

#[derive(Parser, Clone)]
pub struct ShowArgs {
    pub test_name: String,

    /// Number of recent runs to list
    #[arg(long, default_value_t = 10)]
    pub last: u32,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Clone)]
pub struct RecomputeArgs {
    pub test_name: String,
}
