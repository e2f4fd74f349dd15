//! Snapshot, copy, clear: per-keyspace backup and restore of table data files.

use indicatif::ProgressBar;
use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::error::{ArchiveError, Result};
use crate::management::ManagementClient;
use crate::storage::{self, data_dirs};
use crate::utils::io::{self, CopyStats};

/// What one table contributed to a backup or restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
    pub table: String,
    pub stats: CopyStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    pub keyspace: String,
    /// Snapshot tag; `None` for restores.
    pub tag: Option<String>,
    pub tables: Vec<TableReport>,
}

impl ArchiveReport {
    pub fn totals(&self) -> CopyStats {
        let mut total = CopyStats::default();
        for t in &self.tables {
            total.add(t.stats);
        }
        total
    }
}

/// Backs up and restores keyspaces of the node behind `client` to and from
/// `backup_root`. Holds no state between calls.
pub struct SnapshotArchiver<C: ManagementClient> {
    client: C,
    backup_root: PathBuf,
    bar: ProgressBar,
}

impl<C: ManagementClient> SnapshotArchiver<C> {
    pub fn new(client: C, backup_root: impl Into<PathBuf>) -> Self {
        Self { client, backup_root: backup_root.into(), bar: ProgressBar::hidden() }
    }

    /// Advance `bar` once per copied file.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.bar = bar;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    /// Back up `keyspace` under a fresh `snapshot-<epoch millis>` tag.
    pub fn backup(&self, keyspace: &str) -> Result<ArchiveReport> {
        self.backup_with_tag(keyspace, &storage::default_tag())
    }

    /// Snapshot `keyspace` as `tag`, copy every table's snapshot into the
    /// backup root, then clear the snapshot. The snapshot is cleared on
    /// every exit path once it has been created.
    pub fn backup_with_tag(&self, keyspace: &str, tag: &str) -> Result<ArchiveReport> {
        require_name("snapshot", "keyspace", keyspace)?;
        require_name("snapshot", "snapshot tag", tag)?;

        info!("Creating snapshot {} of keyspace {}", tag, keyspace);
        let snapshot = SnapshotGuard::take(&self.client, keyspace, tag)?;

        info!("Copying backup of keyspace {}", keyspace);
        let tables = self.copy_keyspace_snapshot(tag, keyspace)?;

        info!("Clearing snapshot {} of keyspace {}", tag, keyspace);
        snapshot.clear()?;

        Ok(ArchiveReport { keyspace: keyspace.to_string(), tag: Some(tag.to_string()), tables })
    }

    fn copy_keyspace_snapshot(&self, tag: &str, keyspace: &str) -> Result<Vec<TableReport>> {
        let tables = self.client.list_tables(keyspace)?;
        let mut reports = Vec::with_capacity(tables.len());
        for table in tables {
            let stats = self.copy_table_snapshot(tag, keyspace, &table)?;
            reports.push(TableReport { table, stats });
        }
        Ok(reports)
    }

    /// Copy the files of `table`'s snapshot `tag` into `<backup_root>/<keyspace>/<table>`.
    pub fn copy_table_snapshot(&self, tag: &str, keyspace: &str, table: &str) -> Result<CopyStats> {
        let data_dirs = self.client.data_directories()?;
        let sources = data_dirs::find_table_snapshot_dirs(&data_dirs, keyspace, table, tag)?;
        let dest = storage::backup_table_dir(&self.backup_root, keyspace, table);

        let mut stats = CopyStats::default();
        for src in &sources {
            stats.add(io::copy_flat_files(src, &dest, &self.bar)?);
        }
        info!("Copied {} files ({} bytes) of {}/{}", stats.files, stats.bytes, keyspace, table);
        Ok(stats)
    }

    /// Snapshot directory of `table` for `tag` in the first data directory holding it.
    pub fn find_table_snapshot_dir(&self, keyspace: &str, table: &str, tag: &str) -> Result<PathBuf> {
        let data_dirs = self.client.data_directories()?;
        data_dirs::find_table_snapshot_dir(&data_dirs, keyspace, table, tag)
    }

    pub fn find_table_dir(&self, keyspace_dir: &Path, table: &str) -> Result<PathBuf> {
        data_dirs::find_table_dir(keyspace_dir, table)
    }

    /// Copy backed-up files of every table of `keyspace` into the live table
    /// directories and have the node reload them. Live files absent from the
    /// backup are left in place. A table with no backup directory (created
    /// after the backup was taken) gets nothing copied but is still reloaded.
    pub fn restore(&self, keyspace: &str) -> Result<ArchiveReport> {
        require_name("restore", "keyspace", keyspace)?;

        let tables = self.client.list_tables(keyspace)?;
        let mut reports = Vec::with_capacity(tables.len());

        for table in tables {
            info!("Restoring backup of {}/{}", keyspace, table);
            let stats = self.restore_table_snapshot(keyspace, &table)?;

            info!("Reloading SSTables for {}/{}", keyspace, table);
            self.client.reload_table(keyspace, &table)?;
            reports.push(TableReport { table, stats });
        }

        Ok(ArchiveReport { keyspace: keyspace.to_string(), tag: None, tables: reports })
    }

    fn restore_table_snapshot(&self, keyspace: &str, table: &str) -> Result<CopyStats> {
        let data_dirs = self.client.data_directories()?;
        let dest = data_dirs::find_live_table_dir(&data_dirs, keyspace, table)?;

        let src = storage::backup_table_dir(&self.backup_root, keyspace, table);
        if !src.is_dir() {
            warn!("No backup of {}/{} at {}; nothing to restore", keyspace, table, src.display());
            return Ok(CopyStats::default());
        }
        io::copy_flat_files(&src, &dest, &self.bar)
    }
}

fn require_name(operation: &str, what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ArchiveError::management(operation, format!("{} name must not be empty", what)));
    }
    Ok(())
}

/// A created snapshot that is cleared exactly once: explicitly through
/// [`SnapshotGuard::clear`], or on drop when the backup bailed out early.
struct SnapshotGuard<'a, C: ManagementClient> {
    client: &'a C,
    keyspace: &'a str,
    tag: &'a str,
    cleared: bool,
}

impl<'a, C: ManagementClient> SnapshotGuard<'a, C> {
    fn take(client: &'a C, keyspace: &'a str, tag: &'a str) -> Result<Self> {
        client.create_snapshot(keyspace, tag)?;
        Ok(Self { client, keyspace, tag, cleared: false })
    }

    fn clear(mut self) -> Result<()> {
        self.cleared = true;
        self.client.clear_snapshot(self.keyspace, self.tag)
    }
}

impl<C: ManagementClient> Drop for SnapshotGuard<'_, C> {
    fn drop(&mut self) {
        if self.cleared {
            return;
        }
        warn!("Backup of {} failed; clearing snapshot {}", self.keyspace, self.tag);
        if let Err(e) = self.client.clear_snapshot(self.keyspace, self.tag) {
            warn!("Failed to clear snapshot {} of keyspace {}: {}", self.tag, self.keyspace, e);
        }
    }
}
