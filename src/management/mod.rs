use std::path::PathBuf;

use crate::error::Result;

pub mod nodetool;

/// Administrative control plane of the running database node.
///
/// Implementations own their own timeouts; a call that does not finish in
/// time returns `ArchiveError::Timeout`.
pub trait ManagementClient: Send + Sync {
    fn name(&self) -> &'static str;

    /// Hard-link the keyspace's current data files under `snapshots/<tag>`.
    fn create_snapshot(&self, keyspace: &str, tag: &str) -> Result<()>;

    fn clear_snapshot(&self, keyspace: &str, tag: &str) -> Result<()>;

    /// Table names of the keyspace, in the order the node reports them.
    fn list_tables(&self, keyspace: &str) -> Result<Vec<String>>;

    /// Make the node pick up data files newly placed in the table directory.
    fn reload_table(&self, keyspace: &str, table: &str) -> Result<()>;

    /// Configured data file locations, in configuration order.
    fn data_directories(&self) -> Result<Vec<PathBuf>>;
}
