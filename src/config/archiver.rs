use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DATA_DIRECTORY: &str = "/var/lib/cassandra/data";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ArchiverConfig {
    pub date_created: DateTime<Local>,
    pub last_updated: DateTime<Local>,
    /// External directory receiving `<keyspace>/<table>/<file>` backups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_root: Option<PathBuf>,
    /// Data file locations of the node, first entry searched first.
    #[serde(default)]
    pub data_directories: Vec<PathBuf>,
    #[serde(default)]
    pub nodetool: NodetoolConfig,
}

impl ArchiverConfig {
    pub fn new(backup_root: Option<PathBuf>, data_directories: Vec<PathBuf>) -> Self {
        let now = Local::now();
        Self {
            date_created: now,
            last_updated: now,
            backup_root,
            data_directories,
            nodetool: NodetoolConfig::default(),
        }
    }

    /// Data directories to search, falling back to the stock package location.
    pub fn effective_data_directories(&self) -> Vec<PathBuf> {
        if self.data_directories.is_empty() {
            vec![PathBuf::from(DEFAULT_DATA_DIRECTORY)]
        } else {
            self.data_directories.clone()
        }
    }
}

impl Default for ArchiverConfig {
    fn default() -> Self {
        Self::new(None, Vec::new())
    }
}

/// How to reach the node's `nodetool`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodetoolConfig {
    pub binary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// JMX password file handed to nodetool as `-pwf`, keeping the secret off argv.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_file: Option<PathBuf>,
    /// Upper bound for a single nodetool invocation.
    pub timeout_secs: u64,
}

impl Default for NodetoolConfig {
    fn default() -> Self {
        Self {
            binary: "nodetool".into(),
            host: None,
            port: None,
            username: None,
            password_file: None,
            timeout_secs: 300,
        }
    }
}
