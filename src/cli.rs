use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// snaparchive: snapshot-based keyspace backup and restore
#[derive(Parser, Debug)]
#[command(name = "snaparchive", version, about = "Back up and restore keyspaces of the local database node.", long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Config file (defaults to ~/.snaparchive/config.json)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Backup root directory, overriding the configured one
    #[arg(short = 'b', long = "backup-root", global = true)]
    pub backup_root: Option<PathBuf>,

    /// Node data directory; repeat for multiple disks. Overrides the configured list
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dirs: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a config file from the given options
    Init {
        /// Path of the nodetool binary
        #[arg(long)]
        nodetool: Option<String>,
        /// JMX host passed to nodetool
        #[arg(long)]
        host: Option<String>,
        /// JMX port passed to nodetool
        #[arg(long)]
        port: Option<u16>,
        /// JMX user passed to nodetool
        #[arg(long)]
        username: Option<String>,
        /// JMX password file passed to nodetool as -pwf
        #[arg(long, value_name = "path")]
        password_file: Option<PathBuf>,
    },

    /// Snapshot a keyspace and copy its table files into the backup root
    Backup {
        /// Keyspace to back up
        keyspace: String,
        /// Snapshot tag (defaults to snapshot-<epoch millis>)
        #[arg(short = 't', long)]
        tag: Option<String>,
    },

    /// Copy backed-up table files into the live data directories and reload them
    Restore {
        /// Keyspace to restore
        keyspace: String,
    },

    /// List the tables the node reports for a keyspace
    Tables {
        keyspace: String,
    },

    /// Summarize what the backup root holds
    List {
        /// Only show this keyspace
        keyspace: Option<String>,
    },

    /// Print CLI version
    Version,
}
