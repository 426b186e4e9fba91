// src/notify/mod.rs
//! Outbound delivery. Every channel implements [`Notifier`]; [`NotifierMux`]
//! fans a message out and swallows per-channel failures after logging them.

pub mod email;
pub mod slack;
pub mod wxpusher;

use async_trait::async_trait;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use std::sync::Arc;

pub use email::EmailNotifier;
pub use slack::SlackNotifier;
pub use wxpusher::WxPusherNotifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub title: String,
    pub body: String,
    pub url: Option<String>,
}

impl Message {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.url = if url.trim().is_empty() { None } else { Some(url) };
        self
    }

    /// Body followed by the link line, for plain-text channels.
    pub fn plain_text(&self) -> String {
        match &self.url {
            Some(u) => format!("{}\n{}", self.body, u),
            None => self.body.clone(),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, msg: &Message) -> anyhow::Result<()>;
    fn name(&self) -> &'static str;
}

/// Fallback channel when nothing is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, msg: &Message) -> anyhow::Result<()> {
        tracing::info!(
            target: "notify",
            title = %msg.title,
            url = msg.url.as_deref().unwrap_or(""),
            "{}",
            msg.body
        );
        Ok(())
    }
    fn name(&self) -> &'static str {
        "log"
    }
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("notify_sent_total", "Messages delivered per channel.");
        describe_counter!("notify_errors_total", "Failed deliveries per channel.");
    });
}

#[derive(Default, Clone)]
pub struct NotifierMux {
    channels: Vec<Arc<dyn Notifier>>,
}

impl NotifierMux {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, n: Arc<dyn Notifier>) -> Self {
        self.channels.push(n);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }
}

#[async_trait]
impl Notifier for NotifierMux {
    /// Never fails; delivery errors are logged and counted.
    async fn send(&self, msg: &Message) -> anyhow::Result<()> {
        ensure_metrics_described();
        for ch in &self.channels {
            match ch.send(msg).await {
                Ok(()) => {
                    counter!("notify_sent_total", "channel" => ch.name()).increment(1);
                }
                Err(e) => {
                    counter!("notify_errors_total", "channel" => ch.name()).increment(1);
                    tracing::warn!(channel = ch.name(), title = %msg.title, error = %e, "notify failed");
                }
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mux"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Failing;

    #[async_trait]
    impl Notifier for Failing {
        async fn send(&self, _msg: &Message) -> anyhow::Result<()> {
            anyhow::bail!("channel down")
        }
        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[derive(Default)]
    struct Recording(Mutex<Vec<String>>);

    #[async_trait]
    impl Notifier for Recording {
        async fn send(&self, msg: &Message) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(msg.title.clone());
            Ok(())
        }
        fn name(&self) -> &'static str {
            "recording"
        }
    }

    #[tokio::test]
    async fn mux_continues_past_failing_channel() {
        let rec = Arc::new(Recording::default());
        let mux = NotifierMux::new()
            .with(Arc::new(Failing))
            .with(rec.clone());
        mux.send(&Message::new("t", "b")).await.unwrap();
        assert_eq!(*rec.0.lock().unwrap(), vec!["t".to_string()]);
    }

    #[test]
    fn blank_url_is_dropped() {
        let m = Message::new("t", "b").with_url("  ");
        assert!(m.url.is_none());
        assert_eq!(m.plain_text(), "b");
    }
}
