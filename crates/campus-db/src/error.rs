//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`sqlx`] errors and carries registry outcomes (a full event, a missing
//! row) decided inside a transaction. Converting to [`RegistryError`]
//! unwraps those outcomes and turns everything else into
//! [`RegistryError::Storage`].

use campus_registry::RegistryError;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be turned back into a domain value.
    #[error("Corrupt row: {0}")]
    Decode(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The operation was refused by a registry rule.
    #[error(transparent)]
    Rejected(#[from] RegistryError),
}

impl From<DbError> for RegistryError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Rejected(inner) => inner,
            other => {
                tracing::error!(error = %other, "Storage failure");
                Self::Storage(other.to_string())
            }
        }
    }
}
