//! # Classifier
//!
//! Maps raw text to topic tags by case-sensitive substring matching against
//! four ordered keyword vocabularies:
//!
//! - sector terms (稀土, 白酒, 半导体, ...),
//! - policy / meeting / diplomacy terms,
//! - precious-metal terms,
//! - AI-industry terms.
//!
//! Two synthetic tags are appended after the keyword hits: [`TAG_AI_INDUSTRY`]
//! when any AI term matched and [`TAG_POLICY`] when any policy term matched.
//! Output keeps first-match order with duplicates removed.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Synthetic tag: at least one AI-vocabulary term matched.
pub const TAG_AI_INDUSTRY: &str = "AI行业";
/// Synthetic tag: at least one policy-vocabulary term matched.
pub const TAG_POLICY: &str = "政策类";

pub const SECTOR_TERMS: &[&str] = &[
    "稀土",
    "白酒",
    "半导体",
    "芯片",
    "集成电路",
    "创新药",
    "医药创新",
    "雅江水电",
    "雅砻江",
    "抽水蓄能",
    "光伏",
    "光伏组件",
    "硅料",
    "水电",
];

pub const POLICY_TERMS: &[&str] = &[
    "政策",
    "监管",
    "批复",
    "通知",
    "征求意见",
    "文件",
    "规范",
    "指导意见",
    // meetings, diplomacy, trade
    "会议",
    "峰会",
    "会晤",
    "谈判",
    "磋商",
    "公报",
    "声明",
    "协定",
    "合意",
    "合作框架",
    "禁令",
    "禁运",
    "制裁",
    "关税",
    "出口管制",
];

pub const METAL_TERMS: &[&str] = &["黄金", "金价", "伦敦金", "COMEX黄金", "上海黄金交易所"];

pub const AI_TERMS: &[&str] = &[
    "AI",
    "大模型",
    "模型",
    "LLM",
    "SOTA",
    "对齐",
    "推理",
    "多模态",
    "R1",
    "Llama",
    "Gemini",
    "Claude",
    "GPT",
    "o3",
    "Mistral",
    "xAI",
    "Grok",
    "Hugging Face",
    "OpenAI",
    "Anthropic",
    "Meta AI",
    "Google AI",
    "Microsoft",
    "DeepSeek",
    "Qwen",
    "通义千问",
    "Yi",
    "Baichuan",
    "智谱",
    "GLM",
];

/// The four named keyword lists. Changing the terms changes tagging, not the
/// algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub sectors: Vec<String>,
    pub policy: Vec<String>,
    pub metals: Vec<String>,
    pub ai: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        fn owned(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }
        Self {
            sectors: owned(SECTOR_TERMS),
            policy: owned(POLICY_TERMS),
            metals: owned(METAL_TERMS),
            ai: owned(AI_TERMS),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Classifier {
    vocab: Vocabulary,
}

impl Classifier {
    pub fn new(vocab: Vocabulary) -> Self {
        Self { vocab }
    }

    /// Pure and deterministic; whitespace-only input yields no tags.
    pub fn classify(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<&str> = Vec::new();
        collect_hits(text, &self.vocab.sectors, &mut hits);
        let policy_hit = collect_hits(text, &self.vocab.policy, &mut hits);
        collect_hits(text, &self.vocab.metals, &mut hits);
        let ai_hit = collect_hits(text, &self.vocab.ai, &mut hits);

        if ai_hit {
            hits.push(TAG_AI_INDUSTRY);
        }
        if policy_hit {
            hits.push(TAG_POLICY);
        }

        let mut seen = HashSet::with_capacity(hits.len());
        hits.into_iter()
            .filter(|t| seen.insert(*t))
            .map(str::to_string)
            .collect()
    }
}

/// Appends every term of `list` found in `text`; true if anything matched.
fn collect_hits<'a>(text: &str, list: &'a [String], hits: &mut Vec<&'a str>) -> bool {
    let before = hits.len();
    for kw in list {
        if !kw.is_empty() && text.contains(kw.as_str()) {
            hits.push(kw.as_str());
        }
    }
    hits.len() > before
}

pub fn is_policy_class(tags: &[String]) -> bool {
    tags.iter().any(|t| t == TAG_POLICY)
}

pub fn is_ai_industry(tags: &[String]) -> bool {
    tags.iter().any(|t| t == TAG_AI_INDUSTRY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_whitespace_yield_nothing() {
        let c = Classifier::default();
        assert!(c.classify("").is_empty());
        assert!(c.classify("  \n\t ").is_empty());
    }

    #[test]
    fn overlapping_terms_are_all_reported_once() {
        let c = Classifier::default();
        let tags = c.classify("光伏组件价格 光伏组件 光伏");
        assert_eq!(tags, vec!["光伏".to_string(), "光伏组件".to_string()]);
    }

    #[test]
    fn synthetic_tags_come_last_ai_before_policy() {
        let c = Classifier::default();
        let tags = c.classify("监管发布大模型新规");
        assert_eq!(
            tags,
            vec![
                "监管".to_string(),
                "大模型".to_string(),
                "模型".to_string(),
                TAG_AI_INDUSTRY.to_string(),
                TAG_POLICY.to_string(),
            ]
        );
    }

    #[test]
    fn matching_is_case_sensitive() {
        let c = Classifier::default();
        assert!(c.classify("ai chips").is_empty());
        assert!(is_ai_industry(&c.classify("AI chips")));
    }

    #[test]
    fn custom_vocabulary_changes_tagging() {
        let mut vocab = Vocabulary::default();
        vocab.sectors.push("锂电".to_string());
        let c = Classifier::new(vocab);
        assert_eq!(c.classify("锂电排产"), vec!["锂电".to_string()]);
    }
}
