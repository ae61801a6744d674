use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cache database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// No platform data directory to put the default cache file in.
    #[error("Could not determine application data directory")]
    NoDataDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A cached value could not be encoded or decoded.
    #[error("Cached value is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache migration failed: {0}")]
    Migration(String),

    /// A thread panicked while holding the cache lock.
    #[error("Cache lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, StoreError>;
