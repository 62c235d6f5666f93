//! Errors raised by the core value types.

/// Failure constructing a core value.
#[derive(Debug, thiserror::Error)]
pub enum RustStackError {
    /// An account number that is not twelve digits.
    #[error("invalid AWS account ID: {0} (must be 12-digit numeric string)")]
    InvalidAccountId(String),

    /// A header name or value that cannot be represented on the wire.
    #[error("invalid header {name}: {reason}")]
    InvalidHeader {
        /// The offending header name.
        name: String,
        /// Why the header was rejected.
        reason: String,
    },
}

/// Result alias for core operations.
pub type RustStackResult<T> = Result<T, RustStackError>;
