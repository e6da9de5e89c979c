use super::args::*;
use super::input::InputError;
use perfwatch_core::config::{load_config, PerfwatchConfig};
use perfwatch_core::storage::Store;
use perfwatch_core::{ConfigError, WorkflowError};
use anyhow::Context;
use std::path::Path;

pub mod init;
pub mod record;
pub mod registry;
pub mod show;
pub mod sweep;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const REGRESSION: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
    pub const UNKNOWN_TEST: i32 = 3;
    pub const STORE_UNAVAILABLE: i32 = 4;
    pub const DISPATCH_FAILURE: i32 = 5;
    pub const INPUT_ERROR: i32 = 6;
}

const DEFAULT_CONFIG_FILE: &str = "perfwatch.yaml";

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let global = cli.global;
    match cli.cmd {
        Command::Init(args) => init::cmd_init(args),
        Command::InitDb => {
            let cfg = resolve_config(&global)?;
            init::cmd_init_db(&cfg)
        }
        Command::AddTest(args) => registry::cmd_add_test(args, &resolve_config(&global)?),
        Command::ListTests(args) => registry::cmd_list_tests(args, &resolve_config(&global)?),
        Command::Record(args) => record::cmd_record(args, &resolve_config(&global)?),
        Command::Sweep(args) => sweep::cmd_sweep(args, &resolve_config(&global)?).await,
        Command::Show(args) => show::cmd_show(args, &resolve_config(&global)?),
        Command::Recompute(args) => show::cmd_recompute(args, &resolve_config(&global)?),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

/// Config file, then `PERFWATCH_*` environment, then command-line flags.
pub fn resolve_config(global: &GlobalArgs) -> Result<PerfwatchConfig, ConfigError> {
    let mut cfg = match &global.config {
        Some(path) => load_config(path, global.strict_config)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            load_config(Path::new(DEFAULT_CONFIG_FILE), global.strict_config)?
        }
        None => PerfwatchConfig::default(),
    };
    cfg.apply_env();
    if let Some(db) = &global.db {
        cfg.store.path = db.clone();
    }
    cfg.validate()?;

    tracing::debug!(event = "config.resolved", config = ?cfg);
    Ok(cfg)
}

/// Open the configured store, creating its directory and schema if needed.
pub fn open_store(cfg: &PerfwatchConfig) -> anyhow::Result<Store> {
    ensure_parent_dir(&cfg.store.path)?;
    let store = Store::open(&cfg.store)
        .with_context(|| format!("opening {}", cfg.store.path.display()))?;
    store.init_schema()?;
    Ok(store)
}

fn ensure_parent_dir(path: &Path) -> Result<(), WorkflowError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| WorkflowError::StoreDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Map a failed invocation to its documented exit status.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(w) = err.downcast_ref::<WorkflowError>() {
        return match w {
            WorkflowError::UnknownTest(_) => exit_codes::UNKNOWN_TEST,
            WorkflowError::StoreUnavailable(_)
            | WorkflowError::StoreDir { .. }
            | WorkflowError::StoreLockPoisoned => exit_codes::STORE_UNAVAILABLE,
            WorkflowError::DispatchFailure(_) => exit_codes::DISPATCH_FAILURE,
            WorkflowError::Config(_) => exit_codes::CONFIG_ERROR,
        };
    }
    if err.downcast_ref::<InputError>().is_some() {
        return exit_codes::INPUT_ERROR;
    }
    exit_codes::CONFIG_ERROR
}
