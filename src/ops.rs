use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use colored::*;
use comfy_table::{Attribute, Cell, ContentArrangement, Table, presets::UTF8_FULL};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use crate::archiver::{ArchiveReport, SnapshotArchiver};
use crate::cli::Cli;
use crate::config::archiver::ArchiverConfig;
use crate::management::ManagementClient;
use crate::management::nodetool::NodetoolClient;
use crate::storage;
use crate::utils::io::{child_dirs, summarize_dir};

/// Config file contents with command-line overrides applied.
pub struct Settings {
    pub config_path: PathBuf,
    pub config: ArchiverConfig,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config_path = match &cli.config {
            Some(p) => p.clone(),
            None => storage::default_config_path()?,
        };
        let mut config = storage::load_config(&config_path)?;
        if let Some(root) = &cli.backup_root {
            config.backup_root = Some(root.clone());
        }
        if !cli.data_dirs.is_empty() {
            config.data_directories = cli.data_dirs.clone();
        }
        Ok(Self { config_path, config })
    }

    fn backup_root(&self) -> Result<&Path> {
        self.config
            .backup_root
            .as_deref()
            .ok_or_else(|| anyhow!("no backup root configured; pass --backup-root or run 'snaparchive init'"))
    }
}

/// nodetool connection options given to `init`; unset fields keep the configured value.
#[derive(Debug, Default)]
pub struct NodetoolAccess {
    pub binary: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password_file: Option<PathBuf>,
}

pub fn do_init(settings: &Settings, access: NodetoolAccess) -> Result<()> {
    let mut cfg = settings.config.clone();
    if let Some(binary) = access.binary {
        cfg.nodetool.binary = binary;
    }
    if access.host.is_some() {
        cfg.nodetool.host = access.host;
    }
    if access.port.is_some() {
        cfg.nodetool.port = access.port;
    }
    if access.username.is_some() {
        cfg.nodetool.username = access.username;
    }
    if let Some(file) = access.password_file {
        if !file.is_file() {
            return Err(anyhow!("password file {} does not exist", file.display()));
        }
        cfg.nodetool.password_file = Some(file);
    }
    cfg.last_updated = Local::now();

    let existed = settings.config_path.exists();
    storage::save_config(&settings.config_path, &cfg)?;

    let verb = if existed { "Updated" } else { "Wrote" };
    println!(
        "{} {}",
        "✔".green().bold(),
        format!("{} config at {}", verb, settings.config_path.display()).green()
    );
    if cfg.backup_root.is_none() {
        println!(
            "{} {}",
            "i".yellow().bold(),
            "No backup root set yet; pass --backup-root".yellow()
        );
    }
    Ok(())
}

pub fn do_backup(settings: &Settings, keyspace: &str, tag: Option<String>) -> Result<()> {
    let root = settings.backup_root()?;
    let bar = create_progress_bar("Backing up");
    let archiver = archiver_for(settings, root, &bar);
    let tag = tag.unwrap_or_else(storage::default_tag);

    let result = archiver.backup_with_tag(keyspace, &tag);
    if result.is_err() {
        bar.abandon_with_message("Backup failed");
    }
    let report = result
        .with_context(|| format!("backup of keyspace '{}' failed", keyspace))?;

    bar.finish_with_message("Backup complete");
    print_report(&report);
    println!(
        "{} {}",
        "✔".green().bold(),
        format!("Keyspace '{}' backed up as '{}'", keyspace, tag).green()
    );
    Ok(())
}

pub fn do_restore(settings: &Settings, keyspace: &str) -> Result<()> {
    let root = settings.backup_root()?;
    let bar = create_progress_bar("Restoring");
    let archiver = archiver_for(settings, root, &bar);

    let result = archiver.restore(keyspace);
    if result.is_err() {
        bar.abandon_with_message("Restore failed");
    }
    let report = result
        .with_context(|| format!("restore of keyspace '{}' failed", keyspace))?;

    bar.finish_with_message("Restore complete");
    print_report(&report);
    println!(
        "{} {}",
        "✔".green().bold(),
        format!("Keyspace '{}' restored", keyspace).green()
    );
    Ok(())
}

pub fn do_tables(settings: &Settings, keyspace: &str) -> Result<()> {
    require_keyspace(keyspace)?;
    let client = NodetoolClient::from_config(&settings.config);
    let tables = client.list_tables(keyspace)?;
    if tables.is_empty() {
        println!("{} {}", "i".yellow().bold(), format!("Keyspace '{}' has no tables", keyspace).yellow());
        return Ok(());
    }
    for t in tables {
        println!("{}", t);
    }
    Ok(())
}

pub fn do_list(settings: &Settings, keyspace: Option<&str>) -> Result<()> {
    let root = settings.backup_root()?;
    let rows = collect_backups(root, keyspace)?;

    if rows.is_empty() {
        println!("{} {}", "i".yellow().bold(), "No backups found".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Keyspace").add_attribute(Attribute::Bold),
            Cell::new("Table").add_attribute(Attribute::Bold),
            Cell::new("Files").add_attribute(Attribute::Bold),
            Cell::new("Size").add_attribute(Attribute::Bold),
            Cell::new("Last modified").add_attribute(Attribute::Bold),
        ]);

    for row in &rows {
        let ts = row
            .modified
            .map(|m| m.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".into());
        table.add_row(vec![
            Cell::new(&row.keyspace),
            Cell::new(&row.table),
            Cell::new(row.files),
            Cell::new(human_bytes(row.bytes)),
            Cell::new(ts),
        ]);
    }

    println!("{}", table);
    Ok(())
}

pub fn do_version() {
    println!("{} {}", "snaparchive".bold(), env!("CARGO_PKG_VERSION").cyan());
}

/// One `<keyspace>/<table>` directory of the backup root.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupRow {
    pub keyspace: String,
    pub table: String,
    pub files: u64,
    pub bytes: u64,
    pub modified: Option<DateTime<Local>>,
}

pub fn collect_backups(root: &Path, keyspace: Option<&str>) -> Result<Vec<BackupRow>> {
    let mut rows = Vec::new();
    for ks_dir in child_dirs(root)? {
        let ks = dir_name(&ks_dir);
        if keyspace.is_some_and(|want| want != ks) {
            continue;
        }
        for table_dir in child_dirs(&ks_dir)? {
            let (stats, newest) = summarize_dir(&table_dir)?;
            rows.push(BackupRow {
                keyspace: ks.clone(),
                table: dir_name(&table_dir),
                files: stats.files,
                bytes: stats.bytes,
                modified: newest.map(DateTime::<Local>::from),
            });
        }
    }
    Ok(rows)
}

fn archiver_for(settings: &Settings, root: &Path, bar: &ProgressBar) -> SnapshotArchiver<NodetoolClient> {
    let client = NodetoolClient::from_config(&settings.config);
    SnapshotArchiver::new(client, root).with_progress(bar.clone())
}

fn print_report(report: &ArchiveReport) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Table", "Files", "Size"]);
    for t in &report.tables {
        table.add_row(vec![t.table.clone(), t.stats.files.to_string(), human_bytes(t.stats.bytes)]);
    }
    let total = report.totals();
    table.add_row(vec!["total".to_string(), total.files.to_string(), human_bytes(total.bytes)]);
    println!("{}", table);
}

fn require_keyspace(keyspace: &str) -> Result<()> {
    if keyspace.trim().is_empty() {
        return Err(anyhow!("keyspace name must not be empty"));
    }
    Ok(())
}

fn create_progress_bar(prefix: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} ({pos} files)") {
        bar.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
    }
    bar.set_message(prefix.to_string());
    bar.enable_steady_tick(std::time::Duration::from_millis(80));
    bar
}

fn dir_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default()
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 { format!("{} B", bytes) } else { format!("{:.1} {}", value, UNITS[unit]) }
}
