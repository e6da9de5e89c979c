use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;

use cli::args::{Cli, LogFormat};
use cli::commands::{dispatch, exit_code_for};

fn init_logging(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = fmt()
        .with_env_filter(filter)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.global.log_level, cli.global.log_format);

    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            let code = exit_code_for(&e);
            tracing::error!(event = "invocation.failed", exit_code = code, error = %format!("{:#}", e));
            eprintln!("fatal: {:#}", e);
            code
        }
    };
    std::process::exit(code);
}
