use super::{message, Notifier};
use crate::config::NotifyConfig;
use crate::errors::{WorkflowError, WorkflowResult};
use crate::model::RunId;
use crate::storage::Store;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Nothing pending; nothing was sent or changed.
    Idle,
    Reported {
        run_ids: Vec<RunId>,
        message: String,
        /// Rows this sweep transitioned. Lower than `run_ids.len()` only when
        /// an overlapping sweep marked some of them first.
        marked: usize,
    },
}

/// Notifies about failed, unreported runs and marks them reported.
///
/// Delivery is at-least-once: a failed dispatch leaves every selected run
/// pending, and the next sweep sends them again together with anything new.
pub struct Sweeper {
    store: Store,
    notifier: Arc<dyn Notifier>,
    title: String,
    timeout: Duration,
}

impl Sweeper {
    pub fn new(store: Store, notifier: Arc<dyn Notifier>, cfg: &NotifyConfig) -> Self {
        Self {
            store,
            notifier,
            title: cfg.title.clone(),
            timeout: Duration::from_millis(cfg.timeout_ms),
        }
    }

    pub async fn sweep(&self) -> WorkflowResult<SweepOutcome> {
        let pending = self.store.select_unreported_failures()?;
        if pending.is_empty() {
            tracing::info!(event = "sweep.idle", "no unreported failures");
            return Ok(SweepOutcome::Idle);
        }

        let run_ids: Vec<RunId> = pending.iter().map(|f| f.run_id).collect();
        let message = message::render(&self.title, &pending);
        let channel = self.notifier.channel_name();

        tracing::info!(
            event = "sweep.dispatch",
            channel,
            failures = run_ids.len(),
            "dispatching consolidated notification"
        );

        match tokio::time::timeout(self.timeout, self.notifier.send(&message)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(self.dispatch_failed(format!("{} channel: {:#}", channel, e), &run_ids))
            }
            Err(_) => {
                return Err(self.dispatch_failed(
                    format!(
                        "{} channel timed out after {}ms",
                        channel,
                        self.timeout.as_millis()
                    ),
                    &run_ids,
                ))
            }
        }

        let marked = self.store.mark_reported(&run_ids)?;
        if marked < run_ids.len() {
            tracing::warn!(
                event = "sweep.overlap",
                selected = run_ids.len(),
                marked,
                "some runs were already marked reported by another sweep"
            );
        }
        tracing::info!(event = "sweep.reported", channel, marked);

        Ok(SweepOutcome::Reported {
            run_ids,
            message,
            marked,
        })
    }

    /// The message the next sweep would send, without sending it.
    pub fn preview(&self) -> WorkflowResult<Option<String>> {
        let pending = self.store.select_unreported_failures()?;
        if pending.is_empty() {
            return Ok(None);
        }
        Ok(Some(message::render(&self.title, &pending)))
    }

    fn dispatch_failed(&self, reason: String, run_ids: &[RunId]) -> WorkflowError {
        tracing::error!(
            event = "sweep.dispatch_failed",
            pending = run_ids.len(),
            reason = %reason,
            "runs stay unreported until the next sweep"
        );
        WorkflowError::DispatchFailure(reason)
    }
}
