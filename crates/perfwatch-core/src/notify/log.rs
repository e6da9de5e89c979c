use super::Notifier;
use async_trait::async_trait;

/// Writes the message to the operator log instead of a chat channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> anyhow::Result<()> {
        tracing::info!(event = "notify.log", "\n{}", text);
        Ok(())
    }

    fn channel_name(&self) -> &'static str {
        "log"
    }
}
