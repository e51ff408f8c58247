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


//! Repositories: one per entity type, all satisfying the same CRUD contract
//!
//! Every mutating call opens its own transaction and commits before
//! returning; dropping the transaction on an error path rolls it back, so
//! a failed call leaves no partial writes. Reads go straight to the pool.
//!
//! Repositories carry no business rules. Lifecycle guards (copy
//! availability, deletion preconditions) live in [`crate::service`], which
//! re-checks them inside its own transactions.

mod books;
mod borrowings;
mod copies;
mod librarians;
mod publishers;
mod users;

pub use books::BookRepo;
pub use borrowings::BorrowingRepo;
pub use copies::CopyRepo;
pub use librarians::LibrarianRepo;
pub use publishers::PublisherRepo;
pub use users::UserRepo;

use crate::error::Result;
use async_trait::async_trait;

/// Uniform CRUD contract implemented by every entity repository
///
/// Semantics shared by all implementations:
/// - `create` assigns a new identity and returns the stored row
/// - `get_by_id` / `get_all` are pure reads and never open a transaction
/// - `update` replaces the row matching the entity's id; updating a row
///   that does not exist is a `RecordNotFound` error
/// - `delete` is idempotent: removing an absent id succeeds and returns
///   `false`, removing an existing row returns `true`
#[async_trait]
pub trait Repository {
    type Entity;
    type New;

    /// Persist a new row inside a fresh transaction
    async fn create(&self, new: &Self::New) -> Result<Self::Entity>;

    /// Fetch a row by primary key, `None` if absent
    async fn get_by_id(&self, id: i64) -> Result<Option<Self::Entity>>;

    /// Fetch every row of the entity's table
    async fn get_all(&self) -> Result<Vec<Self::Entity>>;

    /// Merge the given field values into the existing row
    async fn update(&self, entity: &Self::Entity) -> Result<()>;

    /// Remove a row by primary key; `false` if it was already gone
    async fn delete(&self, id: i64) -> Result<bool>;
}
