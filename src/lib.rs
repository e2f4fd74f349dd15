//! snaparchive: per-keyspace backup and restore of a node's table data files.

pub mod archiver;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod ops;
pub mod storage;
pub mod utils;

pub use archiver::{ArchiveReport, SnapshotArchiver, TableReport};
pub use error::{ArchiveError, Result};
pub use management::ManagementClient;
