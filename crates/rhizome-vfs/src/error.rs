use std::path::PathBuf;

/// Errors from virtual-filesystem operations.
#[derive(Debug, thiserror::Error)]
pub enum VfsError {
    /// The requested document or payload does not exist.
    #[error("not found: {0}")]
    NotFound(PathBuf),

    /// A payload path tried to leave the payload tree.
    #[error("invalid payload path: {0}")]
    InvalidPath(String),

    /// A document exists but is not valid JSON.
    #[error("malformed document {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for virtual-filesystem operations.
pub type VfsResult<T> = Result<T, VfsError>;
