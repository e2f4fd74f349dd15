use std::path::PathBuf;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Failures surfaced by backup and restore. Nothing is swallowed: every
/// variant reaches the caller of `backup`/`restore` unchanged.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// A control-plane call failed (unknown keyspace, node unreachable, database fault).
    #[error("management call '{operation}' failed: {message}")]
    Management { operation: String, message: String },

    /// An expected table or snapshot directory is missing.
    #[error("{what} not found: {}", path.display())]
    NotFound { what: String, path: PathBuf },

    /// A control-plane call did not complete in time. The node may still be
    /// carrying it out.
    #[error("management call '{operation}' timed out after {}s; it may still be in progress on the node", elapsed.as_secs())]
    Timeout { operation: String, elapsed: Duration },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArchiveError {
    pub fn management(operation: impl Into<String>, message: impl Into<String>) -> Self {
        ArchiveError::Management { operation: operation.into(), message: message.into() }
    }

    pub fn not_found(what: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        ArchiveError::NotFound { what: what.into(), path: path.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArchiveError::Io { path: path.into(), source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ArchiveError::NotFound { .. })
    }
}
