// src/notify/wxpusher.rs
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

use super::{Message, Notifier};

pub const WXPUSHER_URL: &str = "http://wxpusher.zjiecode.com/api/send/message";

/// WxPusher push (plain-text content type).
pub struct WxPusherNotifier {
    client: Client,
    endpoint: String,
    app_token: String,
    uid: String,
}

#[derive(Deserialize)]
struct Ack {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    msg: String,
}

impl WxPusherNotifier {
    pub fn new(client: Client, app_token: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: WXPUSHER_URL.to_string(),
            app_token: app_token.into(),
            uid: uid.into(),
        }
    }

    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    pub fn render(msg: &Message) -> String {
        let mut s = format!("标题：{}\n{}", msg.title, msg.body);
        if let Some(u) = &msg.url {
            s.push_str(&format!("\n链接：{u}"));
        }
        s
    }
}

#[async_trait::async_trait]
impl Notifier for WxPusherNotifier {
    async fn send(&self, msg: &Message) -> Result<()> {
        let body = serde_json::json!({
            "appToken": self.app_token,
            "content": Self::render(msg),
            "contentType": 1,
            "uids": [self.uid],
        });
        let ack: Ack = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .context("wxpusher post")?
            .error_for_status()
            .context("wxpusher non-2xx")?
            .json()
            .await
            .context("wxpusher response")?;
        if !ack.success {
            anyhow::bail!("wxpusher rejected message: {}", ack.msg);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "wxpusher"
    }
}
