use super::{exit_codes, open_store};
use crate::cli::args::InitArgs;
use perfwatch_core::config::{write_sample_config, PerfwatchConfig};

pub fn cmd_init(args: InitArgs) -> anyhow::Result<i32> {
    if args.out.exists() {
        eprintln!("note: {} already exists", args.out.display());
    } else {
        write_sample_config(&args.out)?;
        eprintln!("created {}", args.out.display());
    }
    Ok(exit_codes::OK)
}

pub fn cmd_init_db(cfg: &PerfwatchConfig) -> anyhow::Result<i32> {
    open_store(cfg)?;
    tracing::info!(event = "store.initialized", path = %cfg.store.path.display());
    eprintln!("initialized {}", cfg.store.path.display());
    Ok(exit_codes::OK)
}
