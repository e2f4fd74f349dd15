//! Locating live table and snapshot directories under the node's data roots.
//!
//! On disk a table lives in `<data_dir>/<keyspace>/<table>-<id>` where the id
//! is assigned by the database, so directories are found by prefix scan.

use log::warn;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::snapshot_dir_for;
use crate::error::{ArchiveError, Result};
use crate::utils::io::child_dirs;

/// Find the directory of `table` among the children of `keyspace_dir`.
///
/// Candidates are directories named `<table>-...`. When a dropped and
/// recreated table left several behind, the most recently modified one wins;
/// equal times fall back to the greatest name.
pub fn find_table_dir(keyspace_dir: &Path, table: &str) -> Result<PathBuf> {
    let prefix = format!("{}-", table);
    let mut candidates: Vec<(SystemTime, PathBuf)> = Vec::new();

    for dir in child_dirs(keyspace_dir)? {
        let matches = dir
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(&prefix))
            .unwrap_or(false);
        if !matches {
            continue;
        }
        let modified = fs::metadata(&dir)
            .and_then(|m| m.modified())
            .map_err(|e| ArchiveError::io(&dir, e))?;
        candidates.push((modified, dir));
    }

    if candidates.len() > 1 {
        let names: Vec<String> = candidates.iter().map(|(_, p)| p.display().to_string()).collect();
        warn!("table {} has {} candidate directories: {}", table, candidates.len(), names.join(", "));
    }

    candidates
        .into_iter()
        .max()
        .map(|(_, dir)| dir)
        .ok_or_else(|| ArchiveError::not_found(format!("table directory for '{}'", table), keyspace_dir))
}

/// Table directories for `keyspace`/`table` in every data root that has one,
/// in data-root order.
pub fn find_table_dirs(data_dirs: &[PathBuf], keyspace: &str, table: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for root in data_dirs {
        match find_table_dir(&root.join(keyspace), table) {
            Ok(dir) => found.push(dir),
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(e),
        }
    }
    if found.is_empty() {
        let searched = data_dirs.first().map(|d| d.join(keyspace)).unwrap_or_else(|| PathBuf::from(keyspace));
        return Err(ArchiveError::not_found(format!("table directory for '{}'", table), searched));
    }
    Ok(found)
}

/// The live directory restored files go to: the table's directory in the
/// first data root that holds it.
pub fn find_live_table_dir(data_dirs: &[PathBuf], keyspace: &str, table: &str) -> Result<PathBuf> {
    let mut dirs = find_table_dirs(data_dirs, keyspace, table)?;
    Ok(dirs.remove(0))
}

/// Every `snapshots/<tag>` directory of the table across the data roots.
///
/// A table spread over several disks has part of its snapshot on each, so
/// all of them are returned. Fails when the table exists but no root holds
/// the snapshot.
pub fn find_table_snapshot_dirs(data_dirs: &[PathBuf], keyspace: &str, table: &str, tag: &str) -> Result<Vec<PathBuf>> {
    let table_dirs = find_table_dirs(data_dirs, keyspace, table)?;
    let snapshots: Vec<PathBuf> = table_dirs
        .iter()
        .map(|dir| snapshot_dir_for(dir, tag))
        .filter(|dir| dir.is_dir())
        .collect();

    if snapshots.is_empty() {
        return Err(ArchiveError::not_found("snapshot dir", snapshot_dir_for(&table_dirs[0], tag)));
    }
    Ok(snapshots)
}

pub fn find_table_snapshot_dir(data_dirs: &[PathBuf], keyspace: &str, table: &str, tag: &str) -> Result<PathBuf> {
    let mut dirs = find_table_snapshot_dirs(data_dirs, keyspace, table, tag)?;
    Ok(dirs.remove(0))
}
