// src/config/mod.rs
//! Process configuration: file (TOML or JSON), then `.env`/environment
//! overrides, then sanitising.

mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use loader::{load_default, load_from, resolve, ENV_CONFIG_PATH};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {path}: {msg}")]
    Parse { path: PathBuf, msg: String },
    #[error("config path {0} does not exist")]
    MissingPath(PathBuf),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub state: StateConfig,
    pub ingest: IngestConfig,
    pub buckets: BucketConfig,
    pub summarizer: SummarizerConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub ledger_path: PathBuf,
    pub ledger_retention_days: u32,
    pub queue_path: PathBuf,
    pub queue_retention_days: u32,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from("data/state.json"),
            ledger_retention_days: crate::store::SeenLedger::DEFAULT_RETENTION_DAYS,
            queue_path: PathBuf::from("data/pending.json"),
            queue_retention_days: crate::store::PendingQueue::DEFAULT_RETENTION_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub max_workers: usize,
    pub collector_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_workers: 8,
            collector_timeout_secs: 10,
            user_agent: crate::ingest::providers::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Per-bucket caps for both jobs. Enqueue caps are kept >= immediate caps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketConfig {
    pub flagship_tag: String,
    pub immediate_policy: usize,
    pub immediate_general: usize,
    pub enqueue_policy: usize,
    pub enqueue_general: usize,
    pub analysis_batch: usize,
    pub analysis_policy: usize,
    pub analysis_general: usize,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            flagship_tag: "黄金".to_string(),
            immediate_policy: 15,
            immediate_general: 20,
            enqueue_policy: 30,
            enqueue_general: 40,
            analysis_batch: 30,
            analysis_policy: 10,
            analysis_general: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub concurrency: usize,
    pub fallback_chars: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: crate::summarize::openai::DEFAULT_BASE_URL.to_string(),
            model: crate::summarize::openai::DEFAULT_MODEL.to_string(),
            max_tokens: 500,
            temperature: 0.3,
            concurrency: 4,
            fallback_chars: 500,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub wxpusher: Option<WxPusherConfig>,
    pub slack_webhook: Option<String>,
    pub email: Option<EmailConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WxPusherConfig {
    pub app_token: String,
    pub uid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub from: String,
    pub to: String,
}

impl AppConfig {
    /// Apply overrides from `get` (the process environment in production).
    pub fn apply_env<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(p) = get("STATE_PATH") {
            self.state.ledger_path = PathBuf::from(p);
        }
        if let Some(p) = get("PENDING_PATH") {
            self.state.queue_path = PathBuf::from(p);
        }

        if let Some(k) = get("OPENROUTER_API_KEY").or_else(|| get("OPENAI_API_KEY")) {
            self.summarizer.api_key = Some(k);
        }
        if let Some(u) = get("OPENAI_BASE_URL") {
            self.summarizer.base_url = u;
        }
        if let Some(m) = get("OPENAI_MODEL") {
            self.summarizer.model = m;
        }

        let token = get("WXPUSHER_APP_TOKEN");
        let uid = get("WXPUSHER_UID");
        if token.is_some() || uid.is_some() {
            let wx = self.notify.wxpusher.get_or_insert_with(Default::default);
            if let Some(t) = token {
                wx.app_token = t;
            }
            if let Some(u) = uid {
                wx.uid = u;
            }
        }

        if let Some(w) = get("SLACK_WEBHOOK_URL") {
            self.notify.slack_webhook = Some(w);
        }

        if let Some(v) = get("SMTP_HOST") {
            self.email_mut().smtp_host = v;
        }
        if let Some(v) = get("SMTP_USER") {
            self.email_mut().smtp_user = v;
        }
        if let Some(v) = get("SMTP_PASS") {
            self.email_mut().smtp_pass = v;
        }
        if let Some(v) = get("NOTIFY_EMAIL_FROM") {
            self.email_mut().from = v;
        }
        if let Some(v) = get("NOTIFY_EMAIL_TO") {
            self.email_mut().to = v;
        }
    }

    fn email_mut(&mut self) -> &mut EmailConfig {
        self.notify.email.get_or_insert_with(Default::default)
    }

    /// Clamp nonsensical values and reject half-configured channels.
    pub fn sanitize(mut self) -> Result<Self, ConfigError> {
        let b = &mut self.buckets;
        b.enqueue_policy = b.enqueue_policy.max(b.immediate_policy);
        b.enqueue_general = b.enqueue_general.max(b.immediate_general);
        if b.flagship_tag.trim().is_empty() {
            return Err(ConfigError::Invalid("buckets.flagship_tag is empty".into()));
        }

        self.ingest.max_workers = self.ingest.max_workers.max(1);
        if self.ingest.collector_timeout_secs == 0 {
            self.ingest.collector_timeout_secs = IngestConfig::default().collector_timeout_secs;
        }
        self.summarizer.concurrency = self.summarizer.concurrency.max(1);
        if !(0.0..=2.0).contains(&self.summarizer.temperature) {
            self.summarizer.temperature = SummarizerConfig::default().temperature;
        }
        if self.summarizer.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            self.summarizer.api_key = None;
        }

        let defaults = StateConfig::default();
        if self.state.ledger_retention_days == 0 {
            self.state.ledger_retention_days = defaults.ledger_retention_days;
        }
        if self.state.queue_retention_days == 0 {
            self.state.queue_retention_days = defaults.queue_retention_days;
        }

        if let Some(wx) = &self.notify.wxpusher {
            if wx.app_token.is_empty() || wx.uid.is_empty() {
                return Err(ConfigError::Invalid(
                    "wxpusher needs both app_token and uid".into(),
                ));
            }
        }
        if self.notify.slack_webhook.as_deref().is_some_and(|w| w.trim().is_empty()) {
            self.notify.slack_webhook = None;
        }
        if let Some(e) = &self.notify.email {
            let missing: Vec<&str> = [
                ("smtp_host", &e.smtp_host),
                ("smtp_user", &e.smtp_user),
                ("smtp_pass", &e.smtp_pass),
                ("from", &e.from),
                ("to", &e.to),
            ]
            .into_iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| k)
            .collect();
            if !missing.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "email is missing {}",
                    missing.join(", ")
                )));
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn sanitize_raises_enqueue_caps_and_zeroes() {
        let mut cfg = AppConfig::default();
        cfg.buckets.immediate_policy = 50;
        cfg.buckets.enqueue_policy = 10;
        cfg.ingest.max_workers = 0;
        cfg.summarizer.concurrency = 0;
        cfg.state.ledger_retention_days = 0;
        let cfg = cfg.sanitize().unwrap();
        assert_eq!(cfg.buckets.enqueue_policy, 50);
        assert_eq!(cfg.ingest.max_workers, 1);
        assert_eq!(cfg.summarizer.concurrency, 1);
        assert_eq!(cfg.state.ledger_retention_days, 7);
    }

    #[test]
    fn openrouter_key_wins_over_openai_key() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[("OPENROUTER_API_KEY", "or"), ("OPENAI_API_KEY", "oa")]));
        assert_eq!(cfg.summarizer.api_key.as_deref(), Some("or"));
    }

    #[test]
    fn half_configured_wxpusher_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[("WXPUSHER_APP_TOKEN", "AT_x")]));
        assert!(matches!(cfg.sanitize(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn email_block_built_from_env() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[
            ("SMTP_HOST", "smtp.e.test"),
            ("SMTP_USER", "u"),
            ("SMTP_PASS", "p"),
            ("NOTIFY_EMAIL_FROM", "a@e.test"),
            ("NOTIFY_EMAIL_TO", "b@e.test"),
        ]));
        let cfg = cfg.sanitize().unwrap();
        assert_eq!(cfg.notify.email.unwrap().to, "b@e.test");
    }

    #[test]
    fn smtp_env_overrides_single_fields_of_file_block() {
        let mut cfg = AppConfig::default();
        cfg.notify.email = Some(EmailConfig {
            smtp_host: "smtp.file.test".into(),
            smtp_user: "u".into(),
            smtp_pass: "old".into(),
            from: "a@e.test".into(),
            to: "b@e.test".into(),
        });
        cfg.apply_env(env(&[("SMTP_PASS", "new"), ("NOTIFY_EMAIL_TO", " c@e.test ")]));
        let email = cfg.sanitize().unwrap().notify.email.unwrap();
        assert_eq!(email.smtp_host, "smtp.file.test");
        assert_eq!(email.smtp_pass, "new");
        assert_eq!(email.to, "c@e.test");
    }

    #[test]
    fn no_smtp_env_leaves_email_unset() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[("SLACK_WEBHOOK_URL", "https://hooks.e.test/x")]));
        assert!(cfg.notify.email.is_none());
        assert!(cfg.notify.slack_webhook.is_some());
    }
}
