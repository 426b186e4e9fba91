// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use sector_news_relay::ingest::types::{Collector, CollectorError, RawItem};
use sector_news_relay::notify::{Message, Notifier};
use sector_news_relay::{Classifier, Orchestrator, OrchestratorCfg, SeenLedger};

/// Returns the same items on every crawl and counts calls.
pub struct StaticCollector {
    pub name: String,
    pub items: Vec<RawItem>,
    pub calls: AtomicUsize,
}

impl StaticCollector {
    pub fn new(name: &str, items: Vec<RawItem>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            items,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Collector for StaticCollector {
    async fn crawl(&self) -> Result<Vec<RawItem>, CollectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.items.clone())
    }
    fn name(&self) -> &str {
        &self.name
    }
}

pub struct FailingCollector(pub &'static str);

#[async_trait]
impl Collector for FailingCollector {
    async fn crawl(&self) -> Result<Vec<RawItem>, CollectorError> {
        Err(CollectorError::Status(503))
    }
    fn name(&self) -> &str {
        self.0
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<Message>>,
}

impl RecordingNotifier {
    pub fn titles(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.title.clone())
            .collect()
    }

    pub fn take(&self) -> Vec<Message> {
        std::mem::take(&mut *self.messages.lock().unwrap())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, msg: &Message) -> anyhow::Result<()> {
        self.messages.lock().unwrap().push(msg.clone());
        Ok(())
    }
    fn name(&self) -> &'static str {
        "recording"
    }
}

pub fn item(title: &str, content: &str, url: &str) -> RawItem {
    RawItem::new("test", title, content, url)
}

pub fn orchestrator(dir: &Path) -> Orchestrator {
    Orchestrator::new(
        SeenLedger::open(dir.join("state.json"), 7),
        Classifier::default(),
        OrchestratorCfg::default(),
    )
}
