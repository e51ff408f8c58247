//! Bibliotek: library-management core
//!
//! Entities, per-entity repositories satisfying a uniform CRUD contract,
//! and a service layer enforcing the borrowing lifecycle, all backed by
//! SQLite. The GUI/CLI front end is a separate collaborator; this crate is
//! the persistence core it calls into.

pub mod config;
pub mod error;
pub mod service;
pub mod storage;

pub use config::LibraryConfig;
pub use error::{LibraryError, Result};
pub use service::LibraryService;
