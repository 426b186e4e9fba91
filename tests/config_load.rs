// tests/config_load.rs
use serial_test::serial;
use std::{env, fs};

use sector_news_relay::config::{self, ConfigError, ENV_CONFIG_PATH};

const OVERRIDE_KEYS: &[&str] = &[
    ENV_CONFIG_PATH,
    "STATE_PATH",
    "PENDING_PATH",
    "OPENROUTER_API_KEY",
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "OPENAI_MODEL",
    "WXPUSHER_APP_TOKEN",
    "WXPUSHER_UID",
    "SLACK_WEBHOOK_URL",
    "SMTP_HOST",
    "SMTP_USER",
    "SMTP_PASS",
    "NOTIFY_EMAIL_FROM",
    "NOTIFY_EMAIL_TO",
];

fn clear_env() {
    for k in OVERRIDE_KEYS {
        env::remove_var(k);
    }
}

#[test]
#[serial]
fn lookup_order_env_then_toml_then_json_then_defaults() {
    clear_env();
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    // nothing on disk
    let cfg = config::load_default().unwrap();
    assert_eq!(cfg.buckets.flagship_tag, "黄金");

    fs::create_dir_all("config").unwrap();
    fs::write("config/app.json", r#"{"ingest":{"max_workers":2}}"#).unwrap();
    assert_eq!(config::load_default().unwrap().ingest.max_workers, 2);

    fs::write("config/app.toml", "[ingest]\nmax_workers = 3\n").unwrap();
    assert_eq!(config::load_default().unwrap().ingest.max_workers, 3);

    let explicit = tmp.path().join("custom.toml");
    fs::write(&explicit, "[ingest]\nmax_workers = 5\n").unwrap();
    env::set_var(ENV_CONFIG_PATH, &explicit);
    assert_eq!(config::load_default().unwrap().ingest.max_workers, 5);

    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml"));
    assert!(matches!(
        config::load_default(),
        Err(ConfigError::MissingPath(_))
    ));

    clear_env();
    env::set_current_dir(&old).unwrap();
}

#[test]
#[serial]
fn resolve_applies_env_overrides_and_sanitises() {
    clear_env();
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("app.toml");
    fs::write(
        &path,
        r#"
        [buckets]
        immediate_general = 25
        enqueue_general = 10

        [summarizer]
        concurrency = 0
        "#,
    )
    .unwrap();
    env::set_var("STATE_PATH", "/tmp/relay-state.json");
    env::set_var("OPENROUTER_API_KEY", "sk-or-test");
    env::set_var("WXPUSHER_APP_TOKEN", "AT_test");
    env::set_var("WXPUSHER_UID", "UID_test");

    let cfg = config::resolve(Some(&path)).unwrap();
    assert_eq!(cfg.buckets.enqueue_general, 25);
    assert_eq!(cfg.summarizer.concurrency, 1);
    assert_eq!(cfg.summarizer.api_key.as_deref(), Some("sk-or-test"));
    assert_eq!(cfg.state.ledger_path.to_str(), Some("/tmp/relay-state.json"));
    assert_eq!(cfg.notify.wxpusher.unwrap().uid, "UID_test");

    clear_env();
}

#[test]
#[serial]
fn explicit_missing_path_is_fatal() {
    clear_env();
    let err = config::resolve(Some(std::path::Path::new("/nonexistent/app.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::MissingPath(_)));
}

#[test]
#[serial]
fn malformed_file_reports_parse_error() {
    clear_env();
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("app.json");
    fs::write(&path, "{ \"ingest\": ").unwrap();
    assert!(matches!(
        config::load_from(&path),
        Err(ConfigError::Parse { .. })
    ));
}
