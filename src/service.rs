// Bibliotek - Library Management Core
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Library service: the borrowing lifecycle and its guards
//!
//! Repositories give plain CRUD; this layer owns the cross-entity rules:
//!
//! - a copy must be `Available` when a borrowing is created, and flips to
//!   `Borrowed` in the same transaction
//! - returning a copy closes the borrowing and flips the copy back
//! - borrowings can only be deleted once closed
//! - users with borrowings on record, or with a librarian profile, cannot
//!   be deleted
//! - books with copies out on loan cannot be deleted
//!
//! Each guarded operation re-validates its precondition inside a single
//! transaction, so there is no gap between the check and the write. Every
//! mutating operation runs under a timeout; elapsing surfaces
//! [`LibraryError::Timeout`] instead of a business-rule rejection.

use crate::error::{LibraryError, Result};
use crate::storage::models::{
    Book, BorrowedBookRow, Borrowing, Copy, CopyStatus, Librarian, LibrarianPosition, NewUser,
    User,
};
use crate::storage::repo::{
    BookRepo, BorrowingRepo, CopyRepo, LibrarianRepo, PublisherRepo, UserRepo,
};
use crate::storage::Database;
use chrono::NaiveDate;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Default per-operation timeout
const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(30);

/// Parse an ISO `yyyy-MM-dd` date string
pub fn parse_iso_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| LibraryError::InvalidDate(value.to_string()))
}

/// Coordinates repositories and enforces the borrowing lifecycle
///
/// Constructed once at startup from an open [`Database`]; clones share the
/// underlying pool.
#[derive(Debug, Clone)]
pub struct LibraryService {
    db: Database,
    op_timeout: Duration,
    users: UserRepo,
    publishers: PublisherRepo,
    books: BookRepo,
    copies: CopyRepo,
    borrowings: BorrowingRepo,
    librarians: LibrarianRepo,
}

impl LibraryService {
    pub fn new(db: Database) -> Self {
        Self::with_timeout(db, DEFAULT_OP_TIMEOUT)
    }

    pub fn with_timeout(db: Database, op_timeout: Duration) -> Self {
        let pool = db.pool().clone();
        Self {
            users: UserRepo::new(&pool),
            publishers: PublisherRepo::new(&pool),
            books: BookRepo::new(&pool),
            copies: CopyRepo::new(&pool),
            borrowings: BorrowingRepo::new(&pool),
            librarians: LibrarianRepo::new(&pool),
            db,
            op_timeout,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // Repository accessors for plain, unguarded CRUD
    pub fn users(&self) -> &UserRepo {
        &self.users
    }
    pub fn publishers(&self) -> &PublisherRepo {
        &self.publishers
    }
    pub fn books(&self) -> &BookRepo {
        &self.books
    }
    pub fn copies(&self) -> &CopyRepo {
        &self.copies
    }
    pub fn borrowings(&self) -> &BorrowingRepo {
        &self.borrowings
    }
    pub fn librarians(&self) -> &LibrarianRepo {
        &self.librarians
    }

    /// Run a mutating operation under the configured timeout
    async fn timed<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(LibraryError::Timeout(self.op_timeout.as_secs())),
        }
    }

    // ========================================================================
    // REGISTRATION
    // ========================================================================

    /// Register a new user
    ///
    /// Validates the supplied fields and rejects duplicate emails before any
    /// row is written. The uniqueness check and the insert share one
    /// transaction.
    pub async fn register_user(&self, new: &NewUser) -> Result<User> {
        validate_new_user(new)?;

        self.timed(async {
            let mut tx = self.db.pool().begin().await?;

            let existing: Option<i64> =
                sqlx::query_scalar("SELECT user_id FROM Users WHERE email = ?")
                    .bind(&new.email)
                    .fetch_optional(&mut *tx)
                    .await?;
            if existing.is_some() {
                warn!(email = %new.email, "registration rejected: duplicate email");
                return Err(LibraryError::DuplicateEmail(new.email.clone()));
            }

            let result = sqlx::query(
                "INSERT INTO Users (name, email, phone, address) VALUES (?, ?, ?, ?)",
            )
            .bind(&new.name)
            .bind(&new.email)
            .bind(&new.phone)
            .bind(&new.address)
            .execute(&mut *tx)
            .await?;

            let user = sqlx::query_as::<_, User>("SELECT * FROM Users WHERE user_id = ?")
                .bind(result.last_insert_rowid())
                .fetch_one(&mut *tx)
                .await?;

            tx.commit().await?;
            info!(user_id = user.user_id, "registered user");
            Ok(user)
        })
        .await
    }

    /// Look up a user by email (the login path)
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.users.find_by_email(email).await
    }

    // ========================================================================
    // BORROWING LIFECYCLE
    // ========================================================================

    /// Borrow a copy: `Available → Borrowed`
    ///
    /// In one transaction: verifies the user and copy exist, requires the
    /// copy to be `Available`, inserts the open borrowing, and flips the
    /// copy's status. A copy in any other status yields
    /// [`LibraryError::CopyNotAvailable`] and no row is mutated.
    pub async fn borrow_copy(
        &self,
        user_id: i64,
        copy_id: i64,
        borrow_date: NaiveDate,
    ) -> Result<Borrowing> {
        self.timed(async {
            let mut tx = self.db.pool().begin().await?;

            let user_exists: Option<i64> =
                sqlx::query_scalar("SELECT user_id FROM Users WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if user_exists.is_none() {
                return Err(LibraryError::not_found(format!("user {}", user_id)));
            }

            let copy = sqlx::query_as::<_, Copy>("SELECT * FROM Copies WHERE copy_id = ?")
                .bind(copy_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| LibraryError::not_found(format!("copy {}", copy_id)))?;

            // Compare-and-swap on the status column; the WHERE clause is the
            // authoritative availability check
            let flipped = sqlx::query(
                "UPDATE Copies SET status = 'Borrowed' WHERE copy_id = ? AND status = 'Available'",
            )
            .bind(copy_id)
            .execute(&mut *tx)
            .await?;

            if flipped.rows_affected() == 0 {
                warn!(copy_id, status = %copy.status, "borrow rejected: copy not available");
                return Err(LibraryError::CopyNotAvailable {
                    copy_id,
                    status: copy.status.to_string(),
                });
            }

            let result = sqlx::query(
                r#"
                INSERT INTO Borrowings (user_id, copy_id, borrow_date, return_date)
                VALUES (?, ?, ?, NULL)
                "#,
            )
            .bind(user_id)
            .bind(copy_id)
            .bind(borrow_date)
            .execute(&mut *tx)
            .await?;

            let borrowing =
                sqlx::query_as::<_, Borrowing>("SELECT * FROM Borrowings WHERE borrowing_id = ?")
                    .bind(result.last_insert_rowid())
                    .fetch_one(&mut *tx)
                    .await?;

            tx.commit().await?;
            info!(
                borrowing_id = borrowing.borrowing_id,
                user_id, copy_id, "copy borrowed"
            );
            Ok(borrowing)
        })
        .await
    }

    /// Return a copy: close the borrowing and flip `Borrowed → Available`
    pub async fn return_copy(
        &self,
        borrowing_id: i64,
        return_date: NaiveDate,
    ) -> Result<Borrowing> {
        self.timed(async {
            let mut tx = self.db.pool().begin().await?;

            let borrowing =
                sqlx::query_as::<_, Borrowing>("SELECT * FROM Borrowings WHERE borrowing_id = ?")
                    .bind(borrowing_id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or_else(|| {
                        LibraryError::not_found(format!("borrowing {}", borrowing_id))
                    })?;

            if borrowing.return_date.is_some() {
                return Err(LibraryError::BorrowingAlreadyClosed(borrowing_id));
            }
            if return_date < borrowing.borrow_date {
                return Err(LibraryError::invalid_input(format!(
                    "return date {} precedes borrow date {}",
                    return_date, borrowing.borrow_date
                )));
            }

            sqlx::query("UPDATE Borrowings SET return_date = ? WHERE borrowing_id = ?")
                .bind(return_date)
                .bind(borrowing_id)
                .execute(&mut *tx)
                .await?;

            // Only a Borrowed copy snaps back; a copy marked Damaged/Lost
            // while out keeps its status
            sqlx::query(
                "UPDATE Copies SET status = 'Available' WHERE copy_id = ? AND status = 'Borrowed'",
            )
            .bind(borrowing.copy_id)
            .execute(&mut *tx)
            .await?;

            let closed =
                sqlx::query_as::<_, Borrowing>("SELECT * FROM Borrowings WHERE borrowing_id = ?")
                    .bind(borrowing_id)
                    .fetch_one(&mut *tx)
                    .await?;

            tx.commit().await?;
            info!(borrowing_id, copy_id = borrowing.copy_id, "copy returned");
            Ok(closed)
        })
        .await
    }

    /// Delete a borrowing record
    ///
    /// Only closed borrowings may be deleted; deleting one also flips its
    /// copy back to `Available` if the copy is still marked `Borrowed`.
    /// Deleting an unknown id is an idempotent no-op returning `false`.
    pub async fn delete_borrowing(&self, borrowing_id: i64) -> Result<bool> {
        self.timed(async {
            let mut tx = self.db.pool().begin().await?;

            let borrowing =
                sqlx::query_as::<_, Borrowing>("SELECT * FROM Borrowings WHERE borrowing_id = ?")
                    .bind(borrowing_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            let borrowing = match borrowing {
                Some(b) => b,
                None => return Ok(false),
            };

            if borrowing.return_date.is_none() {
                warn!(borrowing_id, "delete rejected: borrowing still open");
                return Err(LibraryError::BorrowingStillOpen(borrowing_id));
            }

            sqlx::query("DELETE FROM Borrowings WHERE borrowing_id = ?")
                .bind(borrowing_id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                "UPDATE Copies SET status = 'Available' WHERE copy_id = ? AND status = 'Borrowed'",
            )
            .bind(borrowing.copy_id)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            info!(borrowing_id, "borrowing deleted");
            Ok(true)
        })
        .await
    }

    // ========================================================================
    // GUARDED DELETES
    // ========================================================================

    /// Delete a user
    ///
    /// Rejected while the user has any borrowing on record or holds a
    /// librarian profile. Deleting an unknown id returns `false`.
    pub async fn delete_user(&self, user_id: i64) -> Result<bool> {
        self.timed(async {
            let mut tx = self.db.pool().begin().await?;

            let exists: Option<i64> =
                sqlx::query_scalar("SELECT user_id FROM Users WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if exists.is_none() {
                return Ok(false);
            }

            let borrowing_count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM Borrowings WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if borrowing_count > 0 {
                warn!(user_id, borrowing_count, "delete rejected: user has borrowings");
                return Err(LibraryError::UserHasBorrowings {
                    user_id,
                    count: borrowing_count,
                });
            }

            let librarian: Option<i64> =
                sqlx::query_scalar("SELECT librarian_id FROM Librarians WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if librarian.is_some() {
                warn!(user_id, "delete rejected: user is a librarian");
                return Err(LibraryError::UserIsLibrarian(user_id));
            }

            sqlx::query("DELETE FROM Users WHERE user_id = ?")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            info!(user_id, "user deleted");
            Ok(true)
        })
        .await
    }

    /// Delete a book and its copies
    ///
    /// Rejected while any copy of the book has an open borrowing. On
    /// success the book's copies (and their closed borrowings) cascade away.
    pub async fn delete_book(&self, book_id: i64) -> Result<bool> {
        self.timed(async {
            let mut tx = self.db.pool().begin().await?;

            let exists: Option<i64> =
                sqlx::query_scalar("SELECT book_id FROM Books WHERE book_id = ?")
                    .bind(book_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if exists.is_none() {
                return Ok(false);
            }

            let open_loans: i64 = sqlx::query_scalar(
                r#"
                SELECT COUNT(*)
                FROM Borrowings b
                JOIN Copies c ON b.copy_id = c.copy_id
                WHERE c.book_id = ? AND b.return_date IS NULL
                "#,
            )
            .bind(book_id)
            .fetch_one(&mut *tx)
            .await?;
            if open_loans > 0 {
                warn!(book_id, open_loans, "delete rejected: book has open loans");
                return Err(LibraryError::BookHasOpenLoans {
                    book_id,
                    open: open_loans,
                });
            }

            sqlx::query("DELETE FROM Books WHERE book_id = ?")
                .bind(book_id)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            info!(book_id, "book deleted");
            Ok(true)
        })
        .await
    }

    // ========================================================================
    // STAFF
    // ========================================================================

    /// Attach a librarian profile to a user (one-to-one)
    pub async fn appoint_librarian(
        &self,
        user_id: i64,
        employment_date: NaiveDate,
        position: LibrarianPosition,
    ) -> Result<Librarian> {
        self.timed(async {
            let mut tx = self.db.pool().begin().await?;

            let exists: Option<i64> =
                sqlx::query_scalar("SELECT user_id FROM Users WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if exists.is_none() {
                return Err(LibraryError::not_found(format!("user {}", user_id)));
            }

            let current: Option<i64> =
                sqlx::query_scalar("SELECT librarian_id FROM Librarians WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if current.is_some() {
                return Err(LibraryError::AlreadyLibrarian(user_id));
            }

            let result = sqlx::query(
                "INSERT INTO Librarians (user_id, employment_date, position) VALUES (?, ?, ?)",
            )
            .bind(user_id)
            .bind(employment_date)
            .bind(position)
            .execute(&mut *tx)
            .await?;

            let librarian =
                sqlx::query_as::<_, Librarian>("SELECT * FROM Librarians WHERE librarian_id = ?")
                    .bind(result.last_insert_rowid())
                    .fetch_one(&mut *tx)
                    .await?;

            tx.commit().await?;
            info!(user_id, position = %librarian.position, "librarian appointed");
            Ok(librarian)
        })
        .await
    }

    // ========================================================================
    // VIEWS (pure reads, no transaction)
    // ========================================================================

    /// Books with at least one `Available` copy
    pub async fn list_available_books(&self) -> Result<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT DISTINCT b.*
            FROM Books b
            JOIN Copies c ON c.book_id = b.book_id
            WHERE c.status = 'Available'
            ORDER BY b.title
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(books)
    }

    /// The user's currently-borrowed books (open borrowings joined with
    /// copy and catalog data)
    pub async fn list_borrowed_books(&self, user_id: i64) -> Result<Vec<BorrowedBookRow>> {
        let rows = sqlx::query_as::<_, BorrowedBookRow>(
            r#"
            SELECT
                br.borrowing_id,
                c.copy_id,
                b.title,
                b.author,
                b.isbn,
                br.borrow_date,
                br.return_date
            FROM Borrowings br
            JOIN Copies c ON br.copy_id = c.copy_id
            JOIN Books b ON c.book_id = b.book_id
            WHERE br.user_id = ? AND br.return_date IS NULL
            ORDER BY br.borrow_date
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    /// All currently open borrowings
    pub async fn list_open_loans(&self) -> Result<Vec<Borrowing>> {
        self.borrowings.list_open().await
    }

    /// Copies of a book that may currently be lent out
    pub async fn count_available_copies(&self, book_id: i64) -> Result<i64> {
        self.copies.count_by_status(book_id, CopyStatus::Available).await
    }
}

/// Field validation for registration and admin add-user paths
fn validate_new_user(new: &NewUser) -> Result<()> {
    if new.name.trim().is_empty() {
        return Err(LibraryError::MissingRequiredField("name".to_string()));
    }
    if new.email.trim().is_empty() {
        return Err(LibraryError::MissingRequiredField("email".to_string()));
    }
    if !new.email.contains('@') {
        return Err(LibraryError::invalid_input(format!(
            "email '{}' is not a valid address",
            new.email
        )));
    }
    Ok(())
}
