// tests/rss_feed_timeouts.rs
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use sector_news_relay::ingest::providers::{request_budget, RssCollector};
use sector_news_relay::{Classifier, Collector, Orchestrator, OrchestratorCfg, SeenLedger};

const BLOG_RSS: &str = include_str!("fixtures/ai_blog_rss.xml");

/// Accepts connections and never answers.
async fn stalled_feed() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((sock, _)) = listener.accept().await {
            held.push(sock);
        }
    });
    format!("http://{addr}/stalled.xml")
}

/// Answers every request with `body` as an RSS document.
async fn serving_feed(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut sock, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut req = Vec::new();
                let mut buf = [0u8; 1024];
                loop {
                    match sock.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => req.extend_from_slice(&buf[..n]),
                    }
                    if req.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let resp = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/rss+xml; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = sock.write_all(resp.as_bytes()).await;
                let _ = sock.shutdown().await;
            });
        }
    });
    format!("http://{addr}/feed.xml")
}

fn local_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(timeout)
        .build()
        .unwrap()
}

#[tokio::test]
async fn stalled_feed_fails_alone_within_collector_timeout() {
    let collector_timeout = Duration::from_secs(2);
    let stalled = stalled_feed().await;
    let good = serving_feed(BLOG_RSS).await;

    let rss = RssCollector::from_feeds(
        "ai-official",
        local_client(collector_timeout),
        &[stalled.as_str(), good.as_str()],
        1,
    )
    .with_feed_timeout(request_budget(collector_timeout));

    let dir = tempfile::tempdir().unwrap();
    let mut orch = Orchestrator::new(
        SeenLedger::open(dir.path().join("state.json"), 7),
        Classifier::default(),
        OrchestratorCfg {
            max_workers: 2,
            collector_timeout,
        },
    )
    .with_collector(Arc::new(rss));

    let started = Instant::now();
    let (_, stats) = orch.run_all_with_stats().await;
    assert!(started.elapsed() < collector_timeout);
    assert_eq!(stats.failed_collectors, 0);
    assert_eq!(stats.collected, 1);
}

#[tokio::test]
async fn every_feed_stalled_fails_the_collector() {
    let stalled = stalled_feed().await;
    let rss = RssCollector::from_feeds(
        "ai-research",
        local_client(Duration::from_secs(5)),
        &[stalled.as_str()],
        10,
    )
    .with_feed_timeout(Duration::from_millis(200));
    assert!(rss.crawl().await.is_err());
}
