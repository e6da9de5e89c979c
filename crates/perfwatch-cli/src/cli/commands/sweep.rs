use super::{exit_codes, open_store};
use crate::cli::args::{NotifierKind, SweepArgs};
use perfwatch_core::config::PerfwatchConfig;
use perfwatch_core::notify::{LogNotifier, Notifier, SlackWebhook, SweepOutcome, Sweeper};
use perfwatch_core::ConfigError;
use std::sync::Arc;

pub async fn cmd_sweep(args: SweepArgs, cfg: &PerfwatchConfig) -> anyhow::Result<i32> {
    let store = open_store(cfg)?;

    if args.dry_run {
        // no channel is needed to preview
        let sweeper = Sweeper::new(store, Arc::new(LogNotifier), &cfg.notify);
        match sweeper.preview()? {
            Some(message) => println!("{}", message),
            None => eprintln!("no unreported failures"),
        }
        return Ok(exit_codes::OK);
    }

    let notifier = build_notifier(args.notifier, cfg)?;
    let sweeper = Sweeper::new(store, notifier, &cfg.notify);

    match sweeper.sweep().await? {
        SweepOutcome::Idle => eprintln!("no unreported failures"),
        SweepOutcome::Reported { run_ids, marked, .. } => {
            eprintln!(
                "notified {} failing run(s); marked {} reported",
                run_ids.len(),
                marked
            );
        }
    }
    Ok(exit_codes::OK)
}

fn build_notifier(kind: NotifierKind, cfg: &PerfwatchConfig) -> Result<Arc<dyn Notifier>, ConfigError> {
    match kind {
        NotifierKind::Log => Ok(Arc::new(LogNotifier)),
        NotifierKind::Auto | NotifierKind::Slack => match SlackWebhook::from_config(&cfg.notify)? {
            Some(webhook) => Ok(Arc::new(webhook)),
            None => Err(ConfigError(
                "no webhook configured: set notify.webhook_url, PERFWATCH_WEBHOOK_URL or SLACK_WEBHOOK_URL (or pass --notifier log)"
                    .into(),
            )),
        },
    }
}
