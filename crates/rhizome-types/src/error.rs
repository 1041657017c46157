/// Errors from foundation type construction.
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    /// An identifier may not be the empty string.
    #[error("identifier may not be empty")]
    EmptyId,
}
