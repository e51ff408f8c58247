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


//! Database storage and models
//!
//! This module handles all database operations using SQLite.
//!
//! # Database Schema
//! - Users: library members
//! - Publishers: publishing houses
//! - Books: catalog records (title, author, year, ISBN)
//! - Copies: physical, lendable instances of a book
//! - Borrowings: loan history linking users and copies
//! - Librarians: one-to-one staff profiles for users
//!
//! # Usage Example
//! ```no_run
//! use bibliotek_core::storage::{Database, NewUser, Repository, UserRepo};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new("./library.db").await?;
//!
//! let users = UserRepo::new(db.pool());
//! let user = users
//!     .create(&NewUser::new("Mat Doe", "mat@example.com", "555-1234", "123 Main St."))
//!     .await?;
//!
//! let found = users.get_by_id(user.user_id).await?;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod migrations;
pub mod models;
pub mod repo;

// Re-export commonly used types
pub use database::Database;
pub use models::{
    Book, BorrowedBookRow, Borrowing, Copy, CopyStatus, Librarian, LibrarianPosition, NewBook,
    NewBorrowing, NewCopy, NewLibrarian, NewPublisher, NewUser, Publisher, User,
};
pub use repo::{
    BookRepo, BorrowingRepo, CopyRepo, LibrarianRepo, PublisherRepo, Repository, UserRepo,
};
