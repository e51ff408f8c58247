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


//! Database migrations
//!
//! Schema creation and migrations, executed as runtime SQL so the crate
//! works without a build-time database connection. Applied migrations are
//! tracked in the `_migrations` table.

use crate::error::Result;
use sqlx::{Executor, SqlitePool};

/// Run all database migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    create_migrations_table(pool).await?;

    run_migration(pool, 1, "initial_schema", create_initial_schema(pool)).await?;

    Ok(())
}

/// Create migrations tracking table
async fn create_migrations_table(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .await?;

    Ok(())
}

/// Run a single migration if it hasn't been applied yet
async fn run_migration(
    pool: &SqlitePool,
    id: i32,
    name: &str,
    migration_fn: impl std::future::Future<Output = Result<()>>,
) -> Result<()> {
    let applied: Option<i32> = sqlx::query_scalar("SELECT id FROM _migrations WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    if applied.is_some() {
        return Ok(());
    }

    migration_fn.await?;

    sqlx::query("INSERT INTO _migrations (id, name) VALUES (?, ?)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Create initial database schema
///
/// Six tables: Users, Publishers, Books, Copies, Borrowings, Librarians.
/// Copies and Borrowings cascade away with their Book; Users are protected
/// by RESTRICT-style guards in the service layer and by foreign keys here.
async fn create_initial_schema(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
-- ============================================================================
-- MAIN ENTITIES
-- ============================================================================

-- Users: library members (and, via Librarians, staff)
CREATE TABLE IF NOT EXISTS Users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    phone TEXT NOT NULL DEFAULT '',
    address TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- Publishers: publishing houses referenced by catalog records
CREATE TABLE IF NOT EXISTS Publishers (
    publisher_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    address TEXT NOT NULL DEFAULT '',
    phone TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- Books: catalog records; the lendable unit is a Copy
CREATE TABLE IF NOT EXISTS Books (
    book_id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    publisher_id INTEGER NOT NULL,
    publication_year INTEGER NOT NULL,
    isbn TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (publisher_id) REFERENCES Publishers(publisher_id) ON DELETE RESTRICT
);

-- Copies: physical instances of a book
-- Status is a closed set; the lifecycle is Available -> Borrowed -> Available
CREATE TABLE IF NOT EXISTS Copies (
    copy_id INTEGER PRIMARY KEY AUTOINCREMENT,
    book_id INTEGER NOT NULL,
    copy_number INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'Available'
        CHECK (status IN ('Available', 'Borrowed', 'Damaged', 'Lost')),
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (book_id) REFERENCES Books(book_id) ON DELETE CASCADE
);

-- Borrowings: loan history; return_date IS NULL means the copy is still out
CREATE TABLE IF NOT EXISTS Borrowings (
    borrowing_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    copy_id INTEGER NOT NULL,
    borrow_date TEXT NOT NULL,  -- ISO 8601 date (YYYY-MM-DD)
    return_date TEXT,           -- NULL while the borrowing is open
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (user_id) REFERENCES Users(user_id) ON DELETE RESTRICT,
    FOREIGN KEY (copy_id) REFERENCES Copies(copy_id) ON DELETE CASCADE
);

-- Librarians: one-to-one staff profile for a user
CREATE TABLE IF NOT EXISTS Librarians (
    librarian_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL UNIQUE,
    employment_date TEXT NOT NULL,  -- ISO 8601 date (YYYY-MM-DD)
    position TEXT NOT NULL
        CHECK (position IN ('Assistant', 'Librarian', 'HeadLibrarian')),
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (user_id) REFERENCES Users(user_id) ON DELETE RESTRICT
);

-- ============================================================================
-- INDEXES
-- ============================================================================

CREATE INDEX IF NOT EXISTS idx_books_publisher ON Books(publisher_id);
CREATE INDEX IF NOT EXISTS idx_books_title ON Books(title);
CREATE INDEX IF NOT EXISTS idx_books_isbn ON Books(isbn);

CREATE INDEX IF NOT EXISTS idx_copies_book ON Copies(book_id);
CREATE INDEX IF NOT EXISTS idx_copies_status ON Copies(status);

CREATE INDEX IF NOT EXISTS idx_borrowings_user ON Borrowings(user_id);
CREATE INDEX IF NOT EXISTS idx_borrowings_copy ON Borrowings(copy_id);
-- Open-loan lookups back both the borrow guard and the book-deletion guard
CREATE INDEX IF NOT EXISTS idx_borrowings_open ON Borrowings(copy_id)
    WHERE return_date IS NULL;

CREATE INDEX IF NOT EXISTS idx_librarians_user ON Librarians(user_id);

-- ============================================================================
-- TRIGGERS for Automatic Timestamp Updates
-- ============================================================================

CREATE TRIGGER IF NOT EXISTS update_users_timestamp
AFTER UPDATE ON Users
FOR EACH ROW
BEGIN
    UPDATE Users SET updated_at = CURRENT_TIMESTAMP WHERE user_id = NEW.user_id;
END;

CREATE TRIGGER IF NOT EXISTS update_books_timestamp
AFTER UPDATE ON Books
FOR EACH ROW
BEGIN
    UPDATE Books SET updated_at = CURRENT_TIMESTAMP WHERE book_id = NEW.book_id;
END;

CREATE TRIGGER IF NOT EXISTS update_copies_timestamp
AFTER UPDATE ON Copies
FOR EACH ROW
BEGIN
    UPDATE Copies SET updated_at = CURRENT_TIMESTAMP WHERE copy_id = NEW.copy_id;
END;

CREATE TRIGGER IF NOT EXISTS update_borrowings_timestamp
AFTER UPDATE ON Borrowings
FOR EACH ROW
BEGIN
    UPDATE Borrowings SET updated_at = CURRENT_TIMESTAMP WHERE borrowing_id = NEW.borrowing_id;
END;
        "#,
    )
    .await?;

    Ok(())
}
