use super::Notifier;
use crate::config::NotifyConfig;
use crate::errors::ConfigError;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Slack incoming-webhook channel.
pub struct SlackWebhook {
    url: String,
    client: reqwest::Client,
}

impl SlackWebhook {
    pub fn new(url: String, timeout: Duration) -> Result<Self, ConfigError> {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError(
                "notify.webhook_url must be an http(s) URL".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { url, client })
    }

    /// `None` when no webhook URL is configured.
    pub fn from_config(cfg: &NotifyConfig) -> Result<Option<Self>, ConfigError> {
        match &cfg.webhook_url {
            Some(url) => Self::new(url.clone(), Duration::from_millis(cfg.timeout_ms)).map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Notifier for SlackWebhook {
    async fn send(&self, text: &str) -> anyhow::Result<()> {
        let resp = self
            .client
            .post(&self.url)
            .json(&json!({ "text": text }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Slack webhook returned {}: {}", status, error_text);
        }
        Ok(())
    }

    fn channel_name(&self) -> &'static str {
        "slack"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_url() {
        assert!(SlackWebhook::new("hooks.slack.com/x".into(), Duration::from_secs(1)).is_err());
    }

    #[test]
    fn from_config_without_url_is_none() {
        let cfg = NotifyConfig::default();
        assert!(SlackWebhook::from_config(&cfg).unwrap().is_none());
    }
}
