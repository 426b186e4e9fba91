// src/config/loader.rs
use std::fs;
use std::path::{Path, PathBuf};

use super::{AppConfig, ConfigError};

pub const ENV_CONFIG_PATH: &str = "APP_CONFIG_PATH";

/// Load an explicit file. TOML or JSON, chosen by extension and then by sniffing.
pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse(&content, &ext).map_err(|msg| ConfigError::Parse {
        path: path.to_path_buf(),
        msg,
    })
}

/// Lookup order:
/// 1) $APP_CONFIG_PATH (must exist)
/// 2) config/app.toml
/// 3) config/app.json
/// 4) built-in defaults
pub fn load_default() -> Result<AppConfig, ConfigError> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(ConfigError::MissingPath(pb));
        }
        return load_from(&pb);
    }
    for candidate in ["config/app.toml", "config/app.json"] {
        let pb = PathBuf::from(candidate);
        if pb.exists() {
            return load_from(&pb);
        }
    }
    tracing::debug!("no config file found, using defaults");
    Ok(AppConfig::default())
}

/// Full startup resolution: file (explicit path beats lookup), environment
/// overrides, sanitising.
pub fn resolve(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut cfg = match explicit {
        Some(p) if !p.exists() => return Err(ConfigError::MissingPath(p.to_path_buf())),
        Some(p) => load_from(p)?,
        None => load_default()?,
    };
    cfg.apply_env(|k| std::env::var(k).ok());
    cfg.sanitize()
}

fn parse(s: &str, hint_ext: &str) -> Result<AppConfig, String> {
    let looks_json = s.trim_start().starts_with('{');
    let try_toml_first = hint_ext == "toml" || (hint_ext != "json" && !looks_json);

    if try_toml_first {
        match toml::from_str::<AppConfig>(s) {
            Ok(v) => return Ok(v),
            Err(e) if hint_ext == "toml" => return Err(e.to_string()),
            Err(_) => {}
        }
    }
    match serde_json::from_str::<AppConfig>(s) {
        Ok(v) => Ok(v),
        Err(e) if hint_ext == "json" || try_toml_first => Err(e.to_string()),
        Err(_) => toml::from_str::<AppConfig>(s).map_err(|e| e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = parse(
            r#"
            [buckets]
            flagship_tag = "稀土"
            immediate_general = 5
            "#,
            "toml",
        )
        .unwrap();
        assert_eq!(cfg.buckets.flagship_tag, "稀土");
        assert_eq!(cfg.buckets.immediate_general, 5);
        assert_eq!(cfg.buckets.enqueue_general, 40);
        assert_eq!(cfg.ingest.max_workers, 8);
    }

    #[test]
    fn extensionless_json_is_sniffed() {
        let cfg = parse(r#"{"ingest":{"max_workers":3}}"#, "").unwrap();
        assert_eq!(cfg.ingest.max_workers, 3);
    }

    #[test]
    fn broken_toml_reports_parse_error() {
        assert!(parse("[buckets\nx=", "toml").is_err());
    }
}
