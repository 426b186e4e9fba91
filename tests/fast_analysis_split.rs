// tests/fast_analysis_split.rs
mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::{orchestrator, RecordingNotifier, StaticCollector};
use sector_news_relay::classify::TAG_POLICY;
use sector_news_relay::scheduler::buckets::BucketCaps;
use sector_news_relay::summarize::{DisabledSummarizer, SummarizeError, Summarizer};
use sector_news_relay::{JobScheduler, PendingQueue, RawItem, SchedulerCfg};

fn general(n: usize) -> Vec<RawItem> {
    (0..n)
        .map(|i| RawItem::new("feed", format!("白酒动态 {i}"), "", format!("https://e.test/g/{i}")))
        .collect()
}

fn policy(n: usize) -> Vec<RawItem> {
    (0..n)
        .map(|i| {
            RawItem::new("feed", format!("稀土政策 {i}"), "", format!("https://e.test/p/{i}"))
                .with_tags(["稀土", TAG_POLICY])
        })
        .collect()
}

fn cfg() -> SchedulerCfg {
    SchedulerCfg {
        immediate: BucketCaps::new(15, 15),
        enqueue: BucketCaps::new(30, 30),
        ..SchedulerCfg::default()
    }
}

struct Echo;

#[async_trait]
impl Summarizer for Echo {
    async fn summarize(&self, item: &RawItem) -> Result<String, SummarizeError> {
        if item.title.ends_with(" 1") {
            Err(SummarizeError::EmptyResponse)
        } else {
            Ok(format!("解读：{}", item.title))
        }
    }
    fn name(&self) -> &'static str {
        "echo"
    }
}

fn scheduler(
    dir: &std::path::Path,
    items: Vec<RawItem>,
    summarizer: Arc<dyn Summarizer>,
    cfg: SchedulerCfg,
) -> (JobScheduler, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let orch = orchestrator(dir).with_collector(StaticCollector::new("feed", items));
    let queue = PendingQueue::open(dir.join("pending.json"), 2);
    let sched = JobScheduler::new(orch, queue, summarizer, notifier.clone(), cfg);
    (sched, notifier)
}

#[tokio::test]
async fn fifty_general_items_split_15_30_20() {
    let dir = tempfile::tempdir().unwrap();
    let (mut sched, notifier) = scheduler(dir.path(), general(50), Arc::new(DisabledSummarizer), cfg());

    let report = sched.run_fast().await;
    assert_eq!(report.collected_novel, 50);
    assert_eq!(report.immediate_general, 15);
    assert_eq!(report.enqueued, 30);
    assert_eq!(report.dropped, 20);
    assert_eq!(sched.queue().len(), 30);

    let msgs = notifier.take();
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].title, "【资讯】速览 15 条");
    assert_eq!(msgs[0].body.lines().filter(|l| !l.starts_with(' ')).count(), 15);
    // everything pushed immediately is also queued
    let queued: Vec<&str> = sched.queue().entries().iter().map(|e| e.item.url.as_str()).collect();
    assert!(queued.contains(&"https://e.test/g/14"));
}

#[tokio::test]
async fn flagship_items_are_pushed_one_by_one_and_never_queued() {
    let dir = tempfile::tempdir().unwrap();
    let mut items: Vec<RawItem> = (0..3)
        .map(|i| RawItem::new("gold", format!("黄金 | 伦敦金 现价:23{i}0"), "开盘:1", ""))
        .collect();
    items.extend(policy(2));
    let (mut sched, notifier) = scheduler(dir.path(), items, Arc::new(DisabledSummarizer), cfg());

    let report = sched.run_fast().await;
    assert_eq!(report.flagship_pushed, 3);
    assert_eq!(report.immediate_policy, 2);
    assert_eq!(report.enqueued, 2);
    assert_eq!(report.dropped, 0);

    let titles = notifier.titles();
    assert_eq!(titles.len(), 4);
    assert!(titles[..3].iter().all(|t| t.starts_with("黄金 |")));
    assert_eq!(titles[3], "【政策】速览 2 条");
}

#[tokio::test]
async fn analysis_caps_buckets_and_drops_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let mut items = policy(12);
    items.extend(general(20));
    let cfg = SchedulerCfg {
        immediate: BucketCaps::new(15, 20),
        enqueue: BucketCaps::new(30, 40),
        analysis_batch: 30,
        analysis: BucketCaps::new(10, 15),
        ..SchedulerCfg::default()
    };
    let (mut sched, notifier) = scheduler(dir.path(), items, Arc::new(Echo), cfg);

    assert_eq!(sched.run_fast().await.enqueued, 32);
    notifier.take();

    let report = sched.run_analysis().await;
    assert_eq!(report.popped, 30);
    assert_eq!(report.summarized, 25);
    // 12 policy -> 10 kept, 18 general popped -> 15 kept
    assert_eq!(report.dropped, 5);
    assert_eq!(report.messages, 2);
    // "稀土政策 1" and "白酒动态 1" fail and fall back
    assert_eq!(report.fallbacks, 2);
    assert_eq!(sched.queue().len(), 2);

    let msgs = notifier.take();
    assert_eq!(msgs[0].title, "【政策】深度解读 10 条");
    assert_eq!(msgs[1].title, "【资讯】深度解读 15 条");
    assert!(msgs[0].body.contains("解读：稀土政策 0"));
    assert!(msgs[0].body.contains("（摘要降级）"));
}

#[tokio::test]
async fn analysis_with_disabled_summarizer_still_sends() {
    let dir = tempfile::tempdir().unwrap();
    let (mut sched, notifier) = scheduler(dir.path(), general(3), Arc::new(DisabledSummarizer), cfg());
    sched.run_fast().await;
    notifier.take();

    let report = sched.run_analysis().await;
    assert_eq!(report.fallbacks, 3);
    assert_eq!(report.messages, 1);
    let msgs = notifier.take();
    assert_eq!(msgs[0].title, "【资讯】深度解读 3 条");
    assert!(msgs[0].body.contains("[标签: 白酒]"));
}

#[tokio::test]
async fn analysis_on_empty_queue_sends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (mut sched, notifier) = scheduler(dir.path(), vec![], Arc::new(DisabledSummarizer), cfg());
    let report = sched.run_analysis().await;
    assert_eq!(report.popped, 0);
    assert_eq!(report.messages, 0);
    assert!(notifier.titles().is_empty());
}

#[tokio::test]
async fn analysis_ignores_flagship_items_left_in_the_queue() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut queue = PendingQueue::open(dir.path().join("pending.json"), 2);
        let mut seeded = vec![RawItem::new("gold", "黄金 | 伦敦金 现价:2351", "开盘:2345", "")
            .with_tags(["黄金"])];
        seeded.extend(policy(1));
        assert_eq!(queue.add_many(seeded), 2);
    }
    let (mut sched, notifier) = scheduler(dir.path(), vec![], Arc::new(Echo), cfg());
    assert_eq!(sched.queue().len(), 2);

    let report = sched.run_analysis().await;
    assert_eq!(report.popped, 2);
    assert_eq!(report.ignored_flagship, 1);
    assert_eq!(report.summarized, 1);
    assert_eq!(report.messages, 1);

    let msgs = notifier.take();
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].title, "【政策】深度解读 1 条");
    assert!(!msgs[0].body.contains("伦敦金"));
    assert!(sched.queue().is_empty());
}
