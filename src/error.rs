//! Error types for Bibliotek
//!
//! This module defines error types using thiserror for ergonomic error handling.
//! Errors are categorized by domain (validation, lifecycle conflicts, storage)
//! so callers can distinguish a rejected business rule from a failed database
//! round-trip.

use thiserror::Error;

/// Result type alias using our LibraryError type
pub type Result<T> = std::result::Result<T, LibraryError>;

/// Main error type for Bibliotek
///
/// Validation and conflict variants are raised before any row is written;
/// persistence variants are raised after the enclosing transaction has been
/// rolled back.
#[derive(Error, Debug)]
pub enum LibraryError {
    // ===== Validation Errors =====
    // Caller-supplied data failed a precondition. Nothing was persisted.

    /// Required field is empty or missing
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    /// Generic input validation error
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Date string did not parse as ISO `yyyy-MM-dd`
    #[error("Invalid date '{0}': expected yyyy-MM-dd")]
    InvalidDate(String),

    /// Email address is already registered to another user
    #[error("Email already in use: {0}")]
    DuplicateEmail(String),

    // ===== Conflict Errors =====
    // A lifecycle guard rejected the operation. The transaction was aborted
    // without partial writes.

    /// Copy cannot be borrowed in its current status
    #[error("Copy {copy_id} is not available for borrowing (status: {status})")]
    CopyNotAvailable { copy_id: i64, status: String },

    /// Borrowing has no return date yet and cannot be deleted
    #[error("Borrowing {0} is still open (not returned yet)")]
    BorrowingStillOpen(i64),

    /// Borrowing already has a return date and cannot be returned again
    #[error("Borrowing {0} is already closed")]
    BorrowingAlreadyClosed(i64),

    /// User has borrowings on record and cannot be deleted
    #[error("User {user_id} has {count} borrowing(s) on record")]
    UserHasBorrowings { user_id: i64, count: i64 },

    /// User holds a librarian profile and cannot be deleted
    #[error("User {0} is a librarian")]
    UserIsLibrarian(i64),

    /// Book has copies out on loan and cannot be deleted
    #[error("Book {book_id} has {open} cop(ies) out on loan")]
    BookHasOpenLoans { book_id: i64, open: i64 },

    /// User already holds a librarian profile (one-to-one relation)
    #[error("User {0} is already a librarian")]
    AlreadyLibrarian(i64),

    // ===== Not Found =====

    /// Operation required a row that does not exist
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    // ===== Database/Storage Errors =====

    /// Database schema migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database driver error from sqlx
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ===== Configuration/General Errors =====

    /// Configuration file is invalid or incomplete
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Operation exceeded the configured timeout
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),
}

impl LibraryError {
    /// Create a RecordNotFound error with a resource name
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        LibraryError::RecordNotFound(resource.into())
    }

    /// Create an InvalidInput error with a message
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        LibraryError::InvalidInput(message.into())
    }

    /// Check if error is a validation failure (bad caller input)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LibraryError::MissingRequiredField(_)
                | LibraryError::InvalidInput(_)
                | LibraryError::InvalidDate(_)
                | LibraryError::DuplicateEmail(_)
        )
    }

    /// Check if error is a rejected lifecycle transition
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            LibraryError::CopyNotAvailable { .. }
                | LibraryError::BorrowingStillOpen(_)
                | LibraryError::BorrowingAlreadyClosed(_)
                | LibraryError::UserHasBorrowings { .. }
                | LibraryError::UserIsLibrarian(_)
                | LibraryError::BookHasOpenLoans { .. }
                | LibraryError::AlreadyLibrarian(_)
        )
    }

    /// Check if error came from the storage engine itself
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            LibraryError::Sqlx(_)
                | LibraryError::MigrationFailed(_)
                | LibraryError::Io(_)
                | LibraryError::Timeout(_)
        )
    }

    /// Get user-friendly error message suitable for display
    ///
    /// Validation and conflict errors name the violated rule; storage errors
    /// produce a generic failure message with the underlying cause appended.
    pub fn user_message(&self) -> String {
        match self {
            LibraryError::DuplicateEmail(email) => {
                format!("Email '{}' is already in use. Please choose another one.", email)
            }
            LibraryError::CopyNotAvailable { copy_id, status } => {
                format!(
                    "Copy {} cannot be borrowed right now (current status: {}).",
                    copy_id, status
                )
            }
            LibraryError::BorrowingStillOpen(id) => {
                format!("Cannot delete borrowing {}: the copy has not been returned yet.", id)
            }
            LibraryError::UserHasBorrowings { user_id, .. } => {
                format!("Cannot delete user {}: they have borrowings on record.", user_id)
            }
            LibraryError::UserIsLibrarian(id) => {
                format!("Cannot delete user {}: they hold a librarian position.", id)
            }
            LibraryError::BookHasOpenLoans { book_id, .. } => {
                format!("Cannot delete book {}: it is currently borrowed.", book_id)
            }
            LibraryError::Sqlx(e) => format!("A database operation failed: {}", e),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories_are_disjoint() {
        let conflict = LibraryError::BorrowingStillOpen(42);
        assert!(conflict.is_conflict());
        assert!(!conflict.is_validation());
        assert!(!conflict.is_persistence());

        let validation = LibraryError::DuplicateEmail("a@b.c".into());
        assert!(validation.is_validation());
        assert!(!validation.is_conflict());

        let timeout = LibraryError::Timeout(30);
        assert!(timeout.is_persistence());
    }

    #[test]
    fn test_user_message_names_the_rule() {
        let err = LibraryError::CopyNotAvailable {
            copy_id: 3,
            status: "Borrowed".into(),
        };
        let msg = err.user_message();
        assert!(msg.contains("Copy 3"));
        assert!(msg.contains("Borrowed"));
    }
}
