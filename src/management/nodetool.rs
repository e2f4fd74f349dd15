use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use wait_timeout::ChildExt;

use super::ManagementClient;
use crate::config::archiver::{ArchiverConfig, NodetoolConfig};
use crate::error::{ArchiveError, Result};

/// Drives the node through its `nodetool` command line.
pub struct NodetoolClient {
    settings: NodetoolConfig,
    data_directories: Vec<PathBuf>,
}

impl NodetoolClient {
    pub fn new(settings: NodetoolConfig, data_directories: Vec<PathBuf>) -> Self {
        Self { settings, data_directories }
    }

    pub fn from_config(cfg: &ArchiverConfig) -> Self {
        Self::new(cfg.nodetool.clone(), cfg.effective_data_directories())
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.settings.timeout_secs)
    }

    fn connection_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(host) = &self.settings.host {
            args.push("-h".into());
            args.push(host.clone());
        }
        if let Some(port) = self.settings.port {
            args.push("-p".into());
            args.push(port.to_string());
        }
        if let Some(user) = &self.settings.username {
            args.push("-u".into());
            args.push(user.clone());
        }
        if let Some(file) = &self.settings.password_file {
            args.push("-pwf".into());
            args.push(file.display().to_string());
        }
        args
    }

    /// Run `nodetool <connection args> <args>` and return its stdout.
    fn run(&self, operation: &str, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.settings.binary);
        cmd.args(self.connection_args())
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        debug!("nodetool: {} {}", operation, args.join(" "));

        let child = cmd
            .spawn()
            .map_err(|e| ArchiveError::management(operation, format!("failed to launch '{}': {}", self.settings.binary, e)))?;
        let output = wait_with_timeout(child, self.timeout(), operation)?;

        if output.success {
            Ok(output.stdout)
        } else {
            let detail = if output.stderr.trim().is_empty() { output.stdout } else { output.stderr };
            Err(ArchiveError::management(operation, detail.trim().to_string()))
        }
    }
}

impl ManagementClient for NodetoolClient {
    fn name(&self) -> &'static str { "nodetool" }

    fn create_snapshot(&self, keyspace: &str, tag: &str) -> Result<()> {
        self.run("snapshot", &["snapshot", "-t", tag, "--", keyspace]).map(|_| ())
    }

    fn clear_snapshot(&self, keyspace: &str, tag: &str) -> Result<()> {
        self.run("clearsnapshot", &["clearsnapshot", "-t", tag, "--", keyspace]).map(|_| ())
    }

    fn list_tables(&self, keyspace: &str) -> Result<Vec<String>> {
        let out = self.run("tablestats", &["tablestats", "--", keyspace])?;
        Ok(parse_table_names(&out))
    }

    fn reload_table(&self, keyspace: &str, table: &str) -> Result<()> {
        self.run("refresh", &["refresh", "--", keyspace, table]).map(|_| ())
    }

    fn data_directories(&self) -> Result<Vec<PathBuf>> {
        Ok(self.data_directories.clone())
    }
}

struct Finished {
    success: bool,
    stdout: String,
    stderr: String,
}

fn wait_with_timeout(mut child: Child, timeout: Duration, operation: &str) -> Result<Finished> {
    // Drain pipes concurrently so a chatty child cannot block on a full pipe.
    let stdout = child.stdout.take().map(spawn_reader);
    let stderr = child.stderr.take().map(spawn_reader);

    let started = Instant::now();
    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            if let Err(e) = child.kill() {
                warn!("{}: failed to kill nodetool (pid {}) after timeout: {}", operation, child.id(), e);
            } else if let Err(e) = child.wait() {
                warn!("{}: failed to reap nodetool (pid {}): {}", operation, child.id(), e);
            }
            // Readers are not joined: a JVM forked by the launcher may outlive
            // the killed child and keep the pipes open.
            return Err(ArchiveError::Timeout { operation: operation.to_string(), elapsed: started.elapsed() });
        }
        Err(e) => return Err(ArchiveError::management(operation, e.to_string())),
    };

    let collect = |h: Option<thread::JoinHandle<String>>| h.and_then(|h| h.join().ok()).unwrap_or_default();
    Ok(Finished { success: status.success(), stdout: collect(stdout), stderr: collect(stderr) })
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Extract table names from `nodetool tablestats` output.
/// Older releases label them "Column Family:"; secondary indexes ("Table (index):") are skipped.
pub fn parse_table_names(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix("Table:").or_else(|| line.strip_prefix("Column Family:")))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}
