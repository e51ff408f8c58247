//! Database models for Bibliotek
//!
//! This module contains all database entity models: the catalog side
//! (publishers, books, copies) and the membership side (users, librarians,
//! borrowings).
//!
//! # SQLite Adaptations
//! - Dates stored as TEXT in ISO 8601 format (`YYYY-MM-DD`)
//! - Row timestamps stored as TEXT (`CURRENT_TIMESTAMP`)
//! - Copy status and librarian position stored as TEXT from a closed set,
//!   enforced by CHECK constraints and mirrored by Rust enums

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::error::LibraryError;

// ============================================================================
// ENUMS
// ============================================================================

/// Lending status of a physical copy
///
/// Drives the lifecycle state machine: `Available → Borrowed → Available`.
/// `Damaged` and `Lost` are terminal until a librarian edits the copy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default,
)]
#[sqlx(rename_all = "PascalCase")]
pub enum CopyStatus {
    #[default]
    Available,
    Borrowed,
    Damaged,
    Lost,
}

impl CopyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CopyStatus::Available => "Available",
            CopyStatus::Borrowed => "Borrowed",
            CopyStatus::Damaged => "Damaged",
            CopyStatus::Lost => "Lost",
        }
    }

    /// Whether a new borrowing may be created against this copy
    pub fn is_lendable(&self) -> bool {
        matches!(self, CopyStatus::Available)
    }
}

impl fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CopyStatus {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(CopyStatus::Available),
            "Borrowed" => Ok(CopyStatus::Borrowed),
            "Damaged" => Ok(CopyStatus::Damaged),
            "Lost" => Ok(CopyStatus::Lost),
            other => Err(LibraryError::invalid_input(format!(
                "Unknown copy status: {}",
                other
            ))),
        }
    }
}

/// Staff position of a librarian
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "PascalCase")]
pub enum LibrarianPosition {
    Assistant,
    Librarian,
    HeadLibrarian,
}

impl LibrarianPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            LibrarianPosition::Assistant => "Assistant",
            LibrarianPosition::Librarian => "Librarian",
            LibrarianPosition::HeadLibrarian => "HeadLibrarian",
        }
    }
}

impl fmt::Display for LibrarianPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LibrarianPosition {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Assistant" => Ok(LibrarianPosition::Assistant),
            "Librarian" => Ok(LibrarianPosition::Librarian),
            "HeadLibrarian" => Ok(LibrarianPosition::HeadLibrarian),
            other => Err(LibraryError::invalid_input(format!(
                "Unknown librarian position: {}",
                other
            ))),
        }
    }
}

// ============================================================================
// MAIN ENTITIES
// ============================================================================

/// Library member
///
/// Owns zero-or-one librarian profile and zero-or-many borrowings.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    /// Primary key (auto-increment)
    pub user_id: i64,
    pub name: String,
    /// Unique across all users; used as the login identifier
    pub email: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Publishing house that books in the catalog reference
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Publisher {
    pub publisher_id: i64,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Catalog record for a title
///
/// The book itself is never lent out; lending happens per [`Copy`].
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Book {
    pub book_id: i64,
    pub title: String,
    pub author: String,
    pub publisher_id: i64,
    pub publication_year: i32,
    pub isbn: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Physical, lendable instance of a [`Book`]
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Copy {
    pub copy_id: i64,
    pub book_id: i64,
    pub copy_number: i32,
    pub status: CopyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Loan record linking a [`User`] and a [`Copy`]
///
/// `return_date == None` means the copy is still out (an open borrowing).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Borrowing {
    pub borrowing_id: i64,
    pub user_id: i64,
    pub copy_id: i64,
    pub borrow_date: NaiveDate,
    #[sqlx(default)]
    pub return_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Borrowing {
    /// A borrowing is open while the copy has not been returned
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }
}

/// Staff profile attached one-to-one to a [`User`]
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Librarian {
    pub librarian_id: i64,
    pub user_id: i64,
    pub employment_date: NaiveDate,
    pub position: LibrarianPosition,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// NEW RECORD STRUCTS (for inserts)
// ============================================================================

/// New user record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl NewUser {
    pub fn new(name: &str, email: &str, phone: &str, address: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            address: address.to_string(),
        }
    }
}

/// New publisher record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPublisher {
    pub name: String,
    pub address: String,
    pub phone: String,
}

impl NewPublisher {
    pub fn new(name: &str, address: &str, phone: &str) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
            phone: phone.to_string(),
        }
    }
}

/// New book record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub publisher_id: i64,
    pub publication_year: i32,
    pub isbn: String,
}

impl NewBook {
    pub fn new(title: &str, author: &str, publisher_id: i64, publication_year: i32, isbn: &str) -> Self {
        Self {
            title: title.to_string(),
            author: author.to_string(),
            publisher_id,
            publication_year,
            isbn: isbn.to_string(),
        }
    }
}

/// New copy record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCopy {
    pub book_id: i64,
    pub copy_number: i32,
    pub status: CopyStatus,
}

impl NewCopy {
    /// New copy in the default `Available` status
    pub fn new(book_id: i64, copy_number: i32) -> Self {
        Self {
            book_id,
            copy_number,
            status: CopyStatus::Available,
        }
    }

    pub fn with_status(book_id: i64, copy_number: i32, status: CopyStatus) -> Self {
        Self {
            book_id,
            copy_number,
            status,
        }
    }
}

/// New borrowing record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBorrowing {
    pub user_id: i64,
    pub copy_id: i64,
    pub borrow_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
}

/// New librarian record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLibrarian {
    pub user_id: i64,
    pub employment_date: NaiveDate,
    pub position: LibrarianPosition,
}

// ============================================================================
// VIEW ROWS (joins used by the user-facing listings)
// ============================================================================

/// One row of the "borrowed books" view for a user: the borrowing joined
/// with its copy and catalog record
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BorrowedBookRow {
    pub borrowing_id: i64,
    pub copy_id: i64,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub borrow_date: NaiveDate,
    #[sqlx(default)]
    pub return_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_status_round_trip() {
        for status in [
            CopyStatus::Available,
            CopyStatus::Borrowed,
            CopyStatus::Damaged,
            CopyStatus::Lost,
        ] {
            let parsed: CopyStatus = status.as_str().parse().expect("parse failed");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_copy_status_rejects_free_text() {
        assert!("On Loan".parse::<CopyStatus>().is_err());
        assert!("available".parse::<CopyStatus>().is_err());
    }

    #[test]
    fn test_only_available_is_lendable() {
        assert!(CopyStatus::Available.is_lendable());
        assert!(!CopyStatus::Borrowed.is_lendable());
        assert!(!CopyStatus::Damaged.is_lendable());
        assert!(!CopyStatus::Lost.is_lendable());
    }

    #[test]
    fn test_librarian_position_parse() {
        let pos: LibrarianPosition = "HeadLibrarian".parse().expect("parse failed");
        assert_eq!(pos, LibrarianPosition::HeadLibrarian);
        assert!("Janitor".parse::<LibrarianPosition>().is_err());
    }

    #[test]
    fn test_borrowing_openness() {
        let open = Borrowing {
            borrowing_id: 1,
            user_id: 1,
            copy_id: 1,
            borrow_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            return_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(open.is_open());

        let closed = Borrowing {
            return_date: NaiveDate::from_ymd_opt(2025, 1, 24),
            ..open.clone()
        };
        assert!(!closed.is_open());
    }
}
