// src/ingest/providers/mod.rs
//! Concrete collectors and the static registry wired by the binary.
//!
//! Each collector maps exactly one upstream
//! format onto [`RawItem`](crate::ingest::types::RawItem)s.

pub mod eastmoney;
pub mod rss;
pub mod sina_gold;

use std::sync::Arc;
use std::time::Duration;

use crate::ingest::collapse::CollapseGroup;
use crate::ingest::types::Collector;

pub use eastmoney::{EastmoneyFlashCollector, EastmoneyGoldCollector, SectorBoardCollector};
pub use rss::RssCollector;
pub use sina_gold::SinaGoldCollector;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// Collapse group for spot-gold quotes; Eastmoney is preferred over Sina.
pub const GOLD_GROUP: &str = "gold";

pub const AI_OFFICIAL_FEEDS: &[&str] = &[
    "https://openai.com/blog/rss.xml",
    "https://www.anthropic.com/feed.xml",
    "https://ai.googleblog.com/atom.xml",
    "https://www.deepmind.com/blog/rss.xml",
    "https://www.microsoft.com/en-us/research/feed/",
    "https://mistral.ai/news/feed.xml",
    "https://qwenlm.github.io/feed.xml",
    "https://huggingface.co/blog/rss",
];

pub const AI_RESEARCH_FEEDS: &[&str] = &[
    "https://export.arxiv.org/rss/cs.AI",
    "https://export.arxiv.org/rss/cs.CL",
    "https://export.arxiv.org/rss/cs.LG",
    "https://export.arxiv.org/rss/stat.ML",
    "https://export.arxiv.org/rss/cs.CV",
];

pub const AI_PLATFORM_FEEDS: &[&str] = &[
    "https://azure.microsoft.com/en-us/blog/feed/",
    "https://cloud.google.com/feeds/gcp-release-notes.xml",
    "https://aws.amazon.com/about-aws/whats-new/recent/feed/",
    "https://github.com/vllm-project/vllm/releases.atom",
    "https://github.com/ggerganov/llama.cpp/releases.atom",
    "https://github.com/ollama/ollama/releases.atom",
    "https://github.com/huggingface/transformers/releases.atom",
    "https://github.com/huggingface/text-generation-inference/releases.atom",
];

/// Timeout for one upstream request inside a multi-request collector. Strictly
/// below `collector_timeout` so a stalled request fails alone.
pub fn request_budget(collector_timeout: Duration) -> Duration {
    (collector_timeout * 3 / 4).max(Duration::from_millis(100))
}

/// Shared HTTP client for every collector. Each request inherits `timeout`.
pub fn http_client(user_agent: &str, timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(4).min(timeout))
        .timeout(timeout)
        .build()
}

/// The production collector set, in registration order, plus its collapse groups.
pub fn default_registry(
    client: reqwest::Client,
    collector_timeout: Duration,
) -> (Vec<Arc<dyn Collector>>, Vec<CollapseGroup>) {
    let budget = request_budget(collector_timeout);
    let gold_em = EastmoneyGoldCollector::from_client(client.clone());
    let gold_sina = SinaGoldCollector::from_client(client.clone());
    let gold = CollapseGroup::new(GOLD_GROUP, [gold_em.name(), gold_sina.name()]);
    let feeds = |name: &str, urls: &[&str], max_items: usize| {
        RssCollector::from_feeds(name, client.clone(), urls, max_items).with_feed_timeout(budget)
    };

    let collectors: Vec<Arc<dyn Collector>> = vec![
        Arc::new(EastmoneyFlashCollector::from_client(client.clone())),
        Arc::new(EastmoneyFlashCollector::fund(client.clone())),
        Arc::new(gold_em),
        Arc::new(gold_sina),
        Arc::new(SectorBoardCollector::from_client(client.clone()).with_request_timeout(budget)),
        Arc::new(feeds("ai-official", AI_OFFICIAL_FEEDS, 200)),
        Arc::new(feeds("ai-research", AI_RESEARCH_FEEDS, 200)),
        Arc::new(feeds("ai-platforms", AI_PLATFORM_FEEDS, 100)),
    ];
    (collectors, vec![gold])
}
