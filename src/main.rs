//! Sector news relay: binary entrypoint.
//! Loads config, wires collaborators and runs either one fast cycle or the
//! two-interval scheduler loop.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sector_news_relay::metrics::{Metrics, RelayInfo};
use sector_news_relay::{app, config};

use crate::cli::CliArgs;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sector_news_relay=info,warn"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment wins.
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = CliArgs::parse();
    let cfg = config::resolve(args.config.as_deref()).context("failed to load configuration")?;

    let fast = Duration::from_secs(args.fast_interval_secs.max(1));
    let analysis = Duration::from_secs(args.analysis_interval_mins.max(1) * 60);
    let mut scheduler =
        app::build_scheduler(&cfg, fast, analysis).context("failed to build collaborators")?;

    if let Some(addr) = args.metrics_addr {
        let metrics = Metrics::init(&RelayInfo::from_scheduler(&scheduler))?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding metrics listener on {addr}"))?;
        let router = metrics.router();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "metrics server stopped");
            }
        });
        tracing::info!(%addr, "metrics exposed on /metrics");
    }

    if args.once {
        let report = scheduler.run_fast().await;
        println!(
            "novel={} flagship={} immediate_policy={} immediate_general={} enqueued={} dropped={} queue_len={}",
            report.collected_novel,
            report.flagship_pushed,
            report.immediate_policy,
            report.immediate_general,
            report.enqueued,
            report.dropped,
            scheduler.queue().len(),
        );
        return Ok(());
    }

    tracing::info!(
        fast_secs = fast.as_secs(),
        analysis_mins = analysis.as_secs() / 60,
        "scheduler loop starting"
    );
    scheduler.run_loop().await;
    Ok(())
}
