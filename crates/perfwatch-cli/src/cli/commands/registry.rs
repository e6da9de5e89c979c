use super::{exit_codes, open_store};
use crate::cli::args::{AddTestArgs, ListTestsArgs, OutputFormat};
use crate::cli::input::InputError;
use perfwatch_core::config::PerfwatchConfig;

pub fn cmd_add_test(args: AddTestArgs, cfg: &PerfwatchConfig) -> anyhow::Result<i32> {
    let names: Vec<&str> = args.names.iter().map(|n| n.trim()).collect();
    if names.iter().any(|n| n.is_empty()) {
        return Err(InputError("test name must not be empty".into()).into());
    }

    let store = open_store(cfg)?;
    for name in names {
        let id = store.add_test(name)?;
        tracing::info!(event = "test.registered", test_name = %name, test_id = id.0);
        eprintln!("registered {} (id {})", name, id);
    }
    Ok(exit_codes::OK)
}

pub fn cmd_list_tests(args: ListTestsArgs, cfg: &PerfwatchConfig) -> anyhow::Result<i32> {
    let store = open_store(cfg)?;
    let tests = store.list_tests()?;
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tests)?),
        OutputFormat::Text => {
            for t in &tests {
                println!("{}\t{}", t.test_id, t.test_name);
            }
        }
    }
    Ok(exit_codes::OK)
}
