use rhizome_types::Id;
use rhizome_vfs::VfsError;

/// Errors from record parsing, graph restoration, and store operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A required property is absent from a record's property map.
    #[error("missing required property '{key}'")]
    MissingField { key: String },

    /// A property is present but has the wrong shape.
    #[error("property '{key}' is not a {expected}")]
    InvalidField { key: String, expected: &'static str },

    /// The factory has no constructor registered for this classname.
    #[error("unknown classname '{0}'")]
    UnknownClass(String),

    /// The entity is not bound to a live database.
    #[error("entity is not bound to a database")]
    UnboundEntity,

    /// A recorded id does not resolve to a record of the expected kind.
    #[error("unresolved reference to '{id}'")]
    UnresolvedReference { id: Id },

    /// No record with this id exists in the store.
    #[error("no record with id '{id}'")]
    NotFound { id: Id },

    /// A datastream has no data file attached.
    #[error("datastream '{id}' has no data file")]
    NoDataFile { id: Id },

    /// A string is not one of the recognized task states.
    #[error("invalid state '{0}'")]
    InvalidState(String),

    /// An on-disk record contradicts itself or its location.
    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    /// Error from the storage layer.
    #[error(transparent)]
    Vfs(#[from] VfsError),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for database operations.
pub type DbResult<T> = Result<T, DbError>;
