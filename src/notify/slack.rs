// src/notify/slack.rs
use anyhow::{Context, Result};
use reqwest::Client;

use super::{Message, Notifier};

pub struct SlackNotifier {
    webhook_url: String,
    client: Client,
}

impl SlackNotifier {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            webhook_url: url.into(),
            client,
        }
    }
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, msg: &Message) -> Result<()> {
        let text = format!("*{}*\n{}", msg.title, msg.plain_text());
        let body = serde_json::json!({ "text": text });

        self.client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .context("slack post")?
            .error_for_status()
            .context("slack non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "slack"
    }
}
