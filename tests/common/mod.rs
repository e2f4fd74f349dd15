//! In-memory management client that records calls and simulates the node's
//! snapshot behaviour on a temporary data directory.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use snaparchive::{ArchiveError, ManagementClient, Result};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateSnapshot(String, String),
    ClearSnapshot(String, String),
    ListTables(String),
    ReloadTable(String, String),
}

pub struct FakeNode {
    pub data_dirs: Vec<PathBuf>,
    /// keyspace -> tables, in reported order
    pub keyspaces: Vec<(String, Vec<String>)>,
    pub calls: Mutex<Vec<Call>>,
    /// When false, create_snapshot records the call but writes nothing.
    pub materialize_snapshots: bool,
    pub reload_times_out: bool,
    pub clear_fails: bool,
    pub list_tables_fails: bool,
}

impl FakeNode {
    pub fn new(data_dirs: Vec<PathBuf>) -> Self {
        Self {
            data_dirs,
            keyspaces: Vec::new(),
            calls: Mutex::new(Vec::new()),
            materialize_snapshots: true,
            reload_times_out: false,
            clear_fails: false,
            list_tables_fails: false,
        }
    }

    pub fn with_keyspace(mut self, keyspace: &str, tables: &[&str]) -> Self {
        self.keyspaces.push((keyspace.to_string(), tables.iter().map(|t| t.to_string()).collect()));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn tables(&self, keyspace: &str) -> Result<Vec<String>> {
        self.keyspaces
            .iter()
            .find(|(ks, _)| ks == keyspace)
            .map(|(_, t)| t.clone())
            .ok_or_else(|| ArchiveError::management("tablestats", format!("Keyspace {} does not exist", keyspace)))
    }

    /// `<data>/<ks>/<table>-*` directories, every data root.
    fn table_dirs(&self, keyspace: &str) -> Vec<PathBuf> {
        let mut out = Vec::new();
        for root in &self.data_dirs {
            let ks_dir = root.join(keyspace);
            let Ok(entries) = fs::read_dir(&ks_dir) else { continue };
            for entry in entries.flatten() {
                if entry.path().is_dir() {
                    out.push(entry.path());
                }
            }
        }
        out
    }
}

impl ManagementClient for FakeNode {
    fn name(&self) -> &'static str { "fake" }

    fn create_snapshot(&self, keyspace: &str, tag: &str) -> Result<()> {
        self.record(Call::CreateSnapshot(keyspace.into(), tag.into()));
        self.tables(keyspace)?;
        if !self.materialize_snapshots {
            return Ok(());
        }
        // hard-link live files into snapshots/<tag>, like the database does
        for dir in self.table_dirs(keyspace) {
            let snap = dir.join("snapshots").join(tag);
            fs::create_dir_all(&snap).map_err(|e| ArchiveError::io(&snap, e))?;
            for entry in fs::read_dir(&dir).map_err(|e| ArchiveError::io(&dir, e))?.flatten() {
                let p = entry.path();
                if p.is_file() {
                    let target = snap.join(entry.file_name());
                    fs::hard_link(&p, &target).map_err(|e| ArchiveError::io(&target, e))?;
                }
            }
        }
        Ok(())
    }

    fn clear_snapshot(&self, keyspace: &str, tag: &str) -> Result<()> {
        self.record(Call::ClearSnapshot(keyspace.into(), tag.into()));
        if self.clear_fails {
            return Err(ArchiveError::management("clearsnapshot", "JMX connection refused"));
        }
        for dir in self.table_dirs(keyspace) {
            let snap = dir.join("snapshots").join(tag);
            if snap.exists() {
                fs::remove_dir_all(&snap).map_err(|e| ArchiveError::io(&snap, e))?;
            }
        }
        Ok(())
    }

    fn list_tables(&self, keyspace: &str) -> Result<Vec<String>> {
        self.record(Call::ListTables(keyspace.into()));
        if self.list_tables_fails {
            return Err(ArchiveError::management("tablestats", "JMX connection refused"));
        }
        self.tables(keyspace)
    }

    fn reload_table(&self, keyspace: &str, table: &str) -> Result<()> {
        self.record(Call::ReloadTable(keyspace.into(), table.into()));
        if self.reload_times_out {
            return Err(ArchiveError::Timeout { operation: "refresh".into(), elapsed: Duration::from_secs(1) });
        }
        Ok(())
    }

    fn data_directories(&self) -> Result<Vec<PathBuf>> {
        Ok(self.data_dirs.clone())
    }
}

/// Temporary data directory plus backup root.
pub struct Fixture {
    pub tmp: TempDir,
    pub data: PathBuf,
    pub backup: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("Failed to create temp dir");
        let data = tmp.path().join("data");
        let backup = tmp.path().join("backup");
        fs::create_dir_all(&data).unwrap();
        Self { tmp, data, backup }
    }

    /// Create `<data>/<keyspace>/<dir_name>` holding `files`.
    pub fn table(&self, keyspace: &str, dir_name: &str, files: &[(&str, &[u8])]) -> PathBuf {
        write_table(&self.data, keyspace, dir_name, files)
    }
}

pub fn write_table(data_root: &Path, keyspace: &str, dir_name: &str, files: &[(&str, &[u8])]) -> PathBuf {
    let dir = data_root.join(keyspace).join(dir_name);
    fs::create_dir_all(&dir).unwrap();
    for (name, content) in files {
        fs::write(dir.join(name), content).unwrap();
    }
    dir
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .flatten()
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
