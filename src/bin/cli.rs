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


use anyhow::Context;
use bibliotek_core::service::parse_iso_date;
use bibliotek_core::storage::{
    Database, LibrarianPosition, NewBook, NewCopy, NewPublisher, NewUser, Repository,
};
use bibliotek_core::{LibraryConfig, LibraryService};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bibliotek")]
#[command(about = "Bibliotek - library management admin tool", long_about = None)]
struct Cli {
    /// Path to the SQLite database (defaults to the platform data directory)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and run migrations
    Init,
    /// Populate the database with sample data
    Seed,
    /// Register a new user
    Register {
        name: String,
        email: String,
        #[arg(default_value = "")]
        phone: String,
        #[arg(default_value = "")]
        address: String,
    },
    /// Add a publisher
    AddPublisher {
        name: String,
        #[arg(default_value = "")]
        address: String,
        #[arg(default_value = "")]
        phone: String,
    },
    /// Add a book to the catalog
    AddBook {
        title: String,
        author: String,
        publisher_id: i64,
        publication_year: i32,
        isbn: String,
    },
    /// Add a physical copy of a book
    AddCopy { book_id: i64, copy_number: i32 },
    /// Appoint a user as librarian
    Appoint {
        user_id: i64,
        /// Employment date (yyyy-MM-dd), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Position: Assistant, Librarian or HeadLibrarian
        #[arg(long, default_value = "Assistant")]
        position: String,
    },
    /// Borrow a copy for a user
    Borrow {
        user_id: i64,
        copy_id: i64,
        /// Borrow date (yyyy-MM-dd), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Return a borrowed copy
    Return {
        borrowing_id: i64,
        /// Return date (yyyy-MM-dd), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete a user (rejected while they have borrowings or staff status)
    DeleteUser { user_id: i64 },
    /// Delete a book and its copies (rejected while a copy is out on loan)
    DeleteBook { book_id: i64 },
    /// Delete a closed borrowing record
    DeleteBorrowing { borrowing_id: i64 },
    /// List all catalog records
    Books,
    /// List books with at least one available copy
    Available,
    /// List the books a user currently has out
    Borrowed { user_id: i64 },
    /// List all users
    Users,
    /// List all open loans
    Loans,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bibliotek_core=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = LibraryConfig::default();
    let db_path = cli.database.unwrap_or(config.database_path.clone());
    let db = Database::new(&db_path)
        .await
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    let service = LibraryService::with_timeout(db, config.operation_timeout());

    match cli.command {
        Commands::Init => {
            println!("Database ready at {}", db_path.display());
        }
        Commands::Seed => {
            seed(&service).await?;
            println!("Sample data created");
        }
        Commands::Register {
            name,
            email,
            phone,
            address,
        } => {
            let user = service
                .register_user(&NewUser::new(&name, &email, &phone, &address))
                .await?;
            println!("Registered user {} ({})", user.user_id, user.email);
        }
        Commands::AddPublisher {
            name,
            address,
            phone,
        } => {
            let publisher = service
                .publishers()
                .create(&NewPublisher::new(&name, &address, &phone))
                .await?;
            println!("Added publisher {} ({})", publisher.publisher_id, publisher.name);
        }
        Commands::AddBook {
            title,
            author,
            publisher_id,
            publication_year,
            isbn,
        } => {
            let book = service
                .books()
                .create(&NewBook::new(&title, &author, publisher_id, publication_year, &isbn))
                .await?;
            println!("Added book {} ({})", book.book_id, book.title);
        }
        Commands::AddCopy {
            book_id,
            copy_number,
        } => {
            let copy = service
                .copies()
                .create(&NewCopy::new(book_id, copy_number))
                .await?;
            println!("Added copy {} of book {}", copy.copy_id, copy.book_id);
        }
        Commands::Appoint {
            user_id,
            date,
            position,
        } => {
            let position: LibrarianPosition = position.parse()?;
            let librarian = service
                .appoint_librarian(user_id, parse_date_or_today(date.as_deref())?, position)
                .await?;
            println!(
                "Appointed user {} as {} (librarian {})",
                user_id, librarian.position, librarian.librarian_id
            );
        }
        Commands::Borrow {
            user_id,
            copy_id,
            date,
        } => {
            let borrowing = service
                .borrow_copy(user_id, copy_id, parse_date_or_today(date.as_deref())?)
                .await?;
            println!(
                "Borrowing {} created: user {} has copy {}",
                borrowing.borrowing_id, user_id, copy_id
            );
        }
        Commands::Return {
            borrowing_id,
            date,
        } => {
            let borrowing = service
                .return_copy(borrowing_id, parse_date_or_today(date.as_deref())?)
                .await?;
            println!(
                "Borrowing {} closed on {}",
                borrowing.borrowing_id,
                borrowing.return_date.expect("closed borrowing has a return date")
            );
        }
        Commands::DeleteUser { user_id } => {
            if service.delete_user(user_id).await? {
                println!("User {} deleted", user_id);
            } else {
                println!("User {} not found (nothing to delete)", user_id);
            }
        }
        Commands::DeleteBook { book_id } => {
            if service.delete_book(book_id).await? {
                println!("Book {} deleted", book_id);
            } else {
                println!("Book {} not found (nothing to delete)", book_id);
            }
        }
        Commands::DeleteBorrowing { borrowing_id } => {
            if service.delete_borrowing(borrowing_id).await? {
                println!("Borrowing {} deleted", borrowing_id);
            } else {
                println!("Borrowing {} not found (nothing to delete)", borrowing_id);
            }
        }
        Commands::Books => {
            for book in service.books().get_all().await? {
                println!(
                    "{:>4}  {} by {} ({}, ISBN {})",
                    book.book_id, book.title, book.author, book.publication_year, book.isbn
                );
            }
        }
        Commands::Available => {
            for book in service.list_available_books().await? {
                let copies = service.count_available_copies(book.book_id).await?;
                println!("{:>4}  {} by {} ({} available)", book.book_id, book.title, book.author, copies);
            }
        }
        Commands::Borrowed { user_id } => {
            for row in service.list_borrowed_books(user_id).await? {
                println!(
                    "{:>4}  {} by {} (copy {}, since {})",
                    row.borrowing_id, row.title, row.author, row.copy_id, row.borrow_date
                );
            }
        }
        Commands::Users => {
            for user in service.users().get_all().await? {
                println!("{:>4}  {} <{}>", user.user_id, user.name, user.email);
            }
        }
        Commands::Loans => {
            for loan in service.list_open_loans().await? {
                println!(
                    "{:>4}  user {} has copy {} since {}",
                    loan.borrowing_id, loan.user_id, loan.copy_id, loan.borrow_date
                );
            }
        }
    }

    Ok(())
}

fn parse_date_or_today(value: Option<&str>) -> anyhow::Result<chrono::NaiveDate> {
    match value {
        Some(s) => Ok(parse_iso_date(s)?),
        None => Ok(Local::now().date_naive()),
    }
}

/// Create a handful of publishers, books, users, copies and borrowings
async fn seed(service: &LibraryService) -> anyhow::Result<()> {
    let penguin = service
        .publishers()
        .create(&NewPublisher::new("Penguin Books", "123 Penguin St.", "555-1322"))
        .await?;
    let orbit = service
        .publishers()
        .create(&NewPublisher::new("Orbit", "456 Orbit Rd.", "555-3243"))
        .await?;

    let gatsby = service
        .books()
        .create(&NewBook::new(
            "The Great Gatsby",
            "F. Scott Fitzgerald",
            penguin.publisher_id,
            1925,
            "978-0743273565",
        ))
        .await?;
    let nineteen84 = service
        .books()
        .create(&NewBook::new(
            "1984",
            "George Orwell",
            orbit.publisher_id,
            1949,
            "978-0451524935",
        ))
        .await?;

    let mat = service
        .register_user(&NewUser::new("Mat Doe", "mat@example.com", "555-1234", "123 Main St."))
        .await?;
    let kale = service
        .register_user(&NewUser::new("Kale Smith", "kale@example.com", "555-5678", "456 Elm St."))
        .await?;

    let gatsby_copy = service.copies().create(&NewCopy::new(gatsby.book_id, 1)).await?;
    service.copies().create(&NewCopy::new(gatsby.book_id, 2)).await?;
    let orwell_copy = service.copies().create(&NewCopy::new(nineteen84.book_id, 1)).await?;

    // Kale has 1984 out; Mat already brought Gatsby back
    let today = Local::now().date_naive();
    service
        .borrow_copy(kale.user_id, orwell_copy.copy_id, today)
        .await?;
    let returned = service
        .borrow_copy(mat.user_id, gatsby_copy.copy_id, today - chrono::Duration::days(14))
        .await?;
    service.return_copy(returned.borrowing_id, today).await?;

    service
        .appoint_librarian(mat.user_id, today, LibrarianPosition::HeadLibrarian)
        .await?;

    Ok(())
}
