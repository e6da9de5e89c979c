use async_trait::async_trait;

pub mod log;
pub mod message;
pub mod slack;
pub mod sweeper;

pub use log::LogNotifier;
pub use slack::SlackWebhook;
pub use sweeper::{SweepOutcome, Sweeper};

/// A chat channel that accepts one opaque text payload per call.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> anyhow::Result<()>;
    fn channel_name(&self) -> &'static str;
}
