use indicatif::ProgressBar;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::error::{ArchiveError, Result};

/// Files and bytes moved by one flat copy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyStats {
    pub files: u64,
    pub bytes: u64,
}

impl CopyStats {
    pub fn add(&mut self, other: CopyStats) {
        self.files += other.files;
        self.bytes += other.bytes;
    }
}

/// Regular files directly inside `dir`; sub-directories are not descended into.
pub fn top_level_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| ArchiveError::io(dir, e.into()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Copy every top-level regular file of `from` into `to`, creating `to`
/// (and its parents) when missing and overwriting same-named files.
pub fn copy_flat_files(from: &Path, to: &Path, bar: &ProgressBar) -> Result<CopyStats> {
    fs::create_dir_all(to).map_err(|e| ArchiveError::io(to, e))?;

    let mut stats = CopyStats::default();
    for src in top_level_files(from)? {
        let name = match src.file_name() { Some(n) => n, None => continue };
        let dest = to.join(name);
        let bytes = fs::copy(&src, &dest).map_err(|e| ArchiveError::io(&dest, e))?;
        stats.files += 1;
        stats.bytes += bytes;
        bar.inc(1);
    }
    Ok(stats)
}

/// Immediate sub-directories of `dir`, sorted by name. A missing `dir` yields none.
pub fn child_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| ArchiveError::io(dir, e.into()))?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

/// File count, total size and newest modification time of the files in `dir`.
pub fn summarize_dir(dir: &Path) -> Result<(CopyStats, Option<SystemTime>)> {
    let mut stats = CopyStats::default();
    let mut newest: Option<SystemTime> = None;
    for file in top_level_files(dir)? {
        let md = fs::metadata(&file).map_err(|e| ArchiveError::io(&file, e))?;
        stats.files += 1;
        stats.bytes += md.len();
        if let Ok(modified) = md.modified() {
            newest = Some(newest.map_or(modified, |n| n.max(modified)));
        }
    }
    Ok((stats, newest))
}
