use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::archiver::ArchiverConfig;

pub mod data_dirs;

pub const SNAPSHOTS_DIR: &str = "snapshots";

/// `<backup_root>/<keyspace>/<table>`
pub fn backup_table_dir(backup_root: &Path, keyspace: &str, table: &str) -> PathBuf {
    backup_root.join(keyspace).join(table)
}

/// `<table_dir>/snapshots/<tag>`
pub fn snapshot_dir_for(table_dir: &Path, tag: &str) -> PathBuf {
    table_dir.join(SNAPSHOTS_DIR).join(tag)
}

/// Tag used when the caller does not supply one.
pub fn default_tag() -> String {
    format!("snapshot-{}", chrono::Utc::now().timestamp_millis())
}

fn config_dir() -> Result<PathBuf> {
    if cfg!(windows) {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return Ok(PathBuf::from(appdata).join("snaparchive"));
        }
        if let Ok(home) = std::env::var("USERPROFILE") {
            return Ok(PathBuf::from(home).join("AppData\\Roaming").join("snaparchive"));
        }
        Err(anyhow!("APPDATA not set; cannot determine config directory"))
    } else {
        if let Ok(home) = std::env::var("HOME") {
            return Ok(PathBuf::from(home).join(".snaparchive"));
        }
        Err(anyhow!("HOME not set; cannot determine config directory"))
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}

/// Load the config at `path`; a missing or empty file means defaults.
pub fn load_config(path: &Path) -> Result<ArchiverConfig> {
    if !path.exists() {
        return Ok(ArchiverConfig::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(ArchiverConfig::default());
    }
    let cfg: ArchiverConfig = serde_json::from_str(&content)
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

pub fn save_config(path: &Path, cfg: &ArchiverConfig) -> Result<()> {
    let dir = path.parent().ok_or_else(|| anyhow!("invalid config path {}", path.display()))?;
    fs::create_dir_all(dir)?;
    let json = serde_json::to_string_pretty(cfg)?;
    // Write to a temp file then rename
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    if path.exists() {
        let _ = fs::remove_file(path);
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
