//! Error types for the library core
//!
//! This module defines error types using thiserror for ergonomic error handling.
//! The original desktop application collapsed every storage failure into a
//! boolean `false` or a null result, so callers could not tell "not found"
//! apart from "database unreachable" or "constraint violated". Here every
//! fallible operation returns a tagged error instead:
//!
//! - [`LibraryError::NotFound`] — a lookup produced no row
//! - [`LibraryError::Conflict`] — a uniqueness or foreign-key rule was violated
//! - [`LibraryError::OutOfStock`] — a loan was requested for a book with no copies
//! - [`LibraryError::Unavailable`] — the database could not be reached
//! - [`LibraryError::InvalidInput`] / [`LibraryError::InvalidState`] — caller errors
//!
//! Driver errors from sqlx are classified in the manual `From` impl below so
//! that `?` propagation keeps the taxonomy intact.

use thiserror::Error;

/// Result type alias using our LibraryError type
pub type Result<T> = std::result::Result<T, LibraryError>;

/// Main error type for the library core
#[derive(Error, Debug)]
pub enum LibraryError {
    /// A lookup matched no row
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A uniqueness or referential-integrity rule was violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A loan was requested for a book with no available copies
    #[error("Book {book_id} has no available copies")]
    OutOfStock { book_id: i64 },

    /// The database could not be reached or a connection could not be acquired
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Caller-supplied data failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The requested operation is not legal in the entity's current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Username/password pair did not match an active user
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Database schema migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Generic file I/O error (reports, database directory)
    #[error("File I/O error: {0}")]
    FileIoError(String),

    /// Database driver error not covered by the tagged variants
    #[error("Database error: {0}")]
    Database(String),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Classify sqlx driver errors into the tagged taxonomy.
///
/// UNIQUE and FOREIGN KEY violations become [`LibraryError::Conflict`],
/// connection-level failures become [`LibraryError::Unavailable`], and
/// `RowNotFound` becomes [`LibraryError::NotFound`]. Everything else is
/// carried as an opaque `Database` message.
impl From<sqlx::Error> for LibraryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => LibraryError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db) => {
                let message = db.message().to_string();
                if message.contains("UNIQUE constraint failed")
                    || message.contains("FOREIGN KEY constraint failed")
                    || message.contains("CHECK constraint failed")
                {
                    LibraryError::Conflict(message)
                } else {
                    LibraryError::Database(message)
                }
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                LibraryError::Unavailable(err.to_string())
            }
            _ => LibraryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for LibraryError {
    fn from(err: serde_json::Error) -> Self {
        LibraryError::InvalidInput(format!("JSON error: {}", err))
    }
}

// Helper methods for creating common errors
impl LibraryError {
    /// Create a NotFound error with a resource description
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        LibraryError::NotFound(resource.into())
    }

    /// Create a Conflict error with a message
    pub fn conflict<S: Into<String>>(message: S) -> Self {
        LibraryError::Conflict(message.into())
    }

    /// Create an InvalidInput error with a message
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        LibraryError::InvalidInput(message.into())
    }

    /// Check if error means the requested record does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, LibraryError::NotFound(_))
    }

    /// Check if error is a uniqueness or stock conflict.
    ///
    /// `OutOfStock` counts as a conflict: the catalog's invariant
    /// (stock >= 0) blocked the operation.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            LibraryError::Conflict(_) | LibraryError::OutOfStock { .. }
        )
    }

    /// Check if error indicates the database could not be reached
    pub fn is_unavailable(&self) -> bool {
        matches!(self, LibraryError::Unavailable(_))
    }

    /// Get user-friendly error message suitable for display
    ///
    /// Returns actionable messages for the cases a desktop front end shows
    /// in a dialog; falls back to the Display impl for the rest.
    pub fn user_message(&self) -> String {
        match self {
            LibraryError::OutOfStock { .. } => {
                "No copies of this book are available right now.".to_string()
            }
            LibraryError::AuthenticationFailed => {
                "Incorrect username or password.".to_string()
            }
            LibraryError::Unavailable(_) => {
                "The library database cannot be reached. Please try again.".to_string()
            }
            LibraryError::Conflict(msg) => {
                format!("The record conflicts with existing data: {}", msg)
            }
            _ => self.to_string(),
        }
    }
}
