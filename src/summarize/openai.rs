// src/summarize/openai.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{SummarizeError, Summarizer};
use crate::ingest::types::RawItem;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// OpenAI-compatible chat completions client (OpenRouter by default).
pub struct OpenAiSummarizer {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiSummarizer {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 500,
            temperature: 0.3,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_limits(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Analyst instruction wrapped around one item.
pub fn build_prompt(item: &RawItem) -> String {
    let tag_line = if item.tags.is_empty() {
        String::new()
    } else {
        format!("关注标签：{}\n", item.tags.join(", "))
    };
    format!(
        "你是资深卖方行业分析师。请以清晰、简洁、准确的语言总结以下内容，并重点评估其对目标板块/基金的影响：\n\
         标题：{title}\n\
         正文：{content}\n\n\
         {tag_line}\
         总结要求：\n\
         1) 新闻/政策/会议的关键结论；若为AI行业新闻，请说明主体公司、模型名称、能力特长与开放情况；\n\
         2) 对稀土、白酒、半导体/芯片、创新药、水电、光伏等板块的影响路径（需求/供给/成本/价格/估值/政策风险）；\n\
         3) 对基金市场的影响：可能的申赎、持仓与资金流向变动；\n\
         4) 交易建议（短/中/长期），风险点与触发条件。\n\
         请分条列出，内容务必专业、实用。",
        title = item.title,
        content = item.content,
    )
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, item: &RawItem) -> Result<String, SummarizeError> {
        if self.api_key.is_empty() {
            return Err(SummarizeError::Disabled);
        }
        if !item.has_text() {
            return Err(SummarizeError::NoInput);
        }

        let prompt = build_prompt(item);
        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: &prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(SummarizeError::Status(resp.status().as_u16()));
        }
        let body: Resp = resp.json().await?;
        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            Err(SummarizeError::EmptyResponse)
        } else {
            Ok(text)
        }
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_title_content_and_tags() {
        let it = RawItem::new("s", "光伏装机创新高", "正文", "").with_tags(["光伏"]);
        let p = build_prompt(&it);
        assert!(p.contains("标题：光伏装机创新高\n"));
        assert!(p.contains("正文：正文\n"));
        assert!(p.contains("关注标签：光伏\n"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let s = OpenAiSummarizer::new(reqwest::Client::new(), "k").with_base_url("https://x.test/v1/");
        assert_eq!(s.endpoint(), "https://x.test/v1/chat/completions");
    }

    #[tokio::test]
    async fn missing_key_is_disabled() {
        let s = OpenAiSummarizer::new(reqwest::Client::new(), "");
        let err = s
            .summarize(&RawItem::new("s", "t", "c", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, SummarizeError::Disabled));
    }
}
