use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Sector news relay: collect, dedup, classify and push market news in two tiers.
#[derive(Parser, Debug)]
#[command(name = "sector-news-relay", version, about)]
pub struct CliArgs {
    /// Run a single fast cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Seconds between fast runs
    #[arg(long, default_value = "300", env = "FAST_INTERVAL_SECS")]
    pub fast_interval_secs: u64,

    /// Minutes between analysis runs
    #[arg(long, default_value = "60", env = "ANALYSIS_INTERVAL_MINS")]
    pub analysis_interval_mins: u64,

    /// Config file (TOML or JSON); overrides $APP_CONFIG_PATH and config/app.*
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Serve Prometheus metrics on this address, e.g. 127.0.0.1:9102
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}
