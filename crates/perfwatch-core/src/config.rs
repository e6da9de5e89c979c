use crate::errors::ConfigError;
use crate::thresholds::ThresholdPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

pub const DEFAULT_DB_PATH: &str = ".perfwatch/results.db";
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_NOTIFY_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_NOTIFY_TITLE: &str = "Scale perf regressions for the following test runs:";

/// Everything the workflows need, resolved once at process start and passed
/// into each component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PerfwatchConfig {
    #[serde(rename = "configVersion", alias = "version")]
    pub version: u32,
    pub store: StoreConfig,
    pub policy: ThresholdPolicy,
    pub notify: NotifyConfig,
}

impl Default for PerfwatchConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            store: StoreConfig::default(),
            policy: ThresholdPolicy::default(),
            notify: NotifyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// Upper bound on waiting for another writer's lock.
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_PATH),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotifyConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    pub timeout_ms: u64,
    /// First line of every consolidated message.
    pub title: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_ms: DEFAULT_NOTIFY_TIMEOUT_MS,
            title: DEFAULT_NOTIFY_TITLE.to_string(),
        }
    }
}

// Webhook URLs embed a secret token; keep them out of logs.
impl std::fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyConfig")
            .field(
                "webhook_url",
                &self.webhook_url.as_ref().map(|_| "<redacted>"),
            )
            .field("timeout_ms", &self.timeout_ms)
            .field("title", &self.title)
            .finish()
    }
}

impl PerfwatchConfig {
    /// Overlay `PERFWATCH_*` environment variables onto the loaded values.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PERFWATCH_DB") {
            self.store.path = PathBuf::from(v);
        }
        if let Some(v) = lookup("PERFWATCH_BUSY_TIMEOUT_MS") {
            if let Ok(n) = v.parse() {
                self.store.busy_timeout_ms = n;
            }
        }
        if let Some(v) = lookup("PERFWATCH_WEBHOOK_URL").or_else(|| lookup("SLACK_WEBHOOK_URL")) {
            if !v.trim().is_empty() {
                self.notify.webhook_url = Some(v);
            }
        }
        if let Some(v) = lookup("PERFWATCH_NOTIFY_TIMEOUT_MS") {
            if let Ok(n) = v.parse() {
                self.notify.timeout_ms = n;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != SUPPORTED_CONFIG_VERSION {
            return Err(ConfigError(format!(
                "unsupported config version {} (supported: {})",
                self.version, SUPPORTED_CONFIG_VERSION
            )));
        }
        self.policy.validate()?;
        if self.notify.timeout_ms == 0 {
            return Err(ConfigError("notify.timeout_ms must be > 0".into()));
        }
        if self.store.busy_timeout_ms == 0 {
            return Err(ConfigError("store.busy_timeout_ms must be > 0".into()));
        }
        Ok(())
    }
}

/// Load a YAML config file.
///
/// Unknown keys are rejected in strict mode and warned about otherwise. The
/// returned value is validated but does not include environment overrides.
pub fn load_config(path: &Path, strict: bool) -> Result<PerfwatchConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;
    parse_config(&raw, strict)
        .map_err(|e| ConfigError(format!("{} (file: {})", e.0, path.display())))
}

pub fn parse_config(raw: &str, strict: bool) -> Result<PerfwatchConfig, ConfigError> {
    let mut ignored_keys = std::collections::BTreeSet::new();
    let deserializer = serde_yaml::Deserializer::from_str(raw);

    let cfg: PerfwatchConfig = serde_ignored::deserialize(deserializer, |path| {
        ignored_keys.insert(path.to_string());
    })
    .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;

    let meaningful: Vec<_> = ignored_keys
        .iter()
        .filter(|k| !k.starts_with('_') && !k.starts_with("x-"))
        .collect();

    if !meaningful.is_empty() {
        if strict {
            return Err(ConfigError(format!(
                "unknown fields detected in strict mode: {:?}",
                meaningful
            )));
        }
        tracing::warn!(
            event = "config.unknown_fields",
            fields = ?meaningful,
            "ignoring unknown config fields"
        );
    }

    cfg.validate()?;
    Ok(cfg)
}

pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ConfigError(format!("failed to create {}: {}", parent.display(), e)))?;
    }
    std::fs::write(
        path,
        r#"configVersion: 1
store:
  path: .perfwatch/results.db
  busy_timeout_ms: 5000
policy:
  # limit = avg + max(sigma * stddev, margin) over the most recent `window` runs
  # margin = max(min_margin_secs, min_margin_ratio * avg)
  report_sigma: 2.0
  fail_sigma: 3.0
  window: 50
  min_margin_secs: 2.0
  min_margin_ratio: 0.05
notify:
  # or set PERFWATCH_WEBHOOK_URL / SLACK_WEBHOOK_URL
  # webhook_url: https://hooks.slack.com/services/...
  timeout_ms: 10000
  title: "Scale perf regressions for the following test runs:"
"#,
    )
    .map_err(|e| ConfigError(format!("failed to write sample config: {}", e)))?;
    Ok(())
}
