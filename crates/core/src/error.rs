#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(
        "failed to stat {path}: {source}",
        path = path.display()
    )]
    Stat {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "failed to list directory {path}: {source}",
        path = path.display()
    )]
    ReadDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open content: {0}")]
    Open(std::io::Error),
    #[error("range not satisfiable for content of {size} bytes")]
    RangeNotSatisfiable { size: u64 },

    #[error("failed to open read-status database: {0}")]
    StorageOpen(rusqlite::Error),
    #[error("failed to set up read-status schema: {0}")]
    SchemaSetup(rusqlite::Error),
    #[error("read-status query failed: {0}")]
    StorageQuery(#[from] rusqlite::Error),
    #[error("read-status connection lock poisoned")]
    StorageLock,
    #[error("invalid read_at timestamp: {0}")]
    InvalidTimestamp(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
