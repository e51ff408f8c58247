//! Book repository

use crate::error::{LibraryError, Result};
use crate::storage::models::{Book, NewBook};
use crate::storage::repo::Repository;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// CRUD operations for the Books table
#[derive(Debug, Clone)]
pub struct BookRepo {
    pool: SqlitePool,
}

impl BookRepo {
    pub fn new(pool: &SqlitePool) -> Self {
        Self { pool: pool.clone() }
    }

    /// Find a catalog record by ISBN
    pub async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM Books WHERE isbn = ?")
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    /// List every book published by the given publisher
    pub async fn list_by_publisher(&self, publisher_id: i64) -> Result<Vec<Book>> {
        let books =
            sqlx::query_as::<_, Book>("SELECT * FROM Books WHERE publisher_id = ? ORDER BY title")
                .bind(publisher_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(books)
    }

    /// Search books by title substring
    pub async fn search_by_title(&self, query: &str, limit: i64) -> Result<Vec<Book>> {
        let pattern = format!("%{}%", query);
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM Books WHERE title LIKE ? ORDER BY title LIMIT ?",
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }
}

#[async_trait]
impl Repository for BookRepo {
    type Entity = Book;
    type New = NewBook;

    async fn create(&self, new: &NewBook) -> Result<Book> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO Books (title, author, publisher_id, publication_year, isbn)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.title)
        .bind(&new.author)
        .bind(new.publisher_id)
        .bind(new.publication_year)
        .bind(&new.isbn)
        .execute(&mut *tx)
        .await?;

        let book = sqlx::query_as::<_, Book>("SELECT * FROM Books WHERE book_id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(book)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM Books WHERE book_id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    async fn get_all(&self) -> Result<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM Books")
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    async fn update(&self, book: &Book) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE Books SET
                title = ?, author = ?, publisher_id = ?, publication_year = ?, isbn = ?
            WHERE book_id = ?
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.publisher_id)
        .bind(book.publication_year)
        .bind(&book.isbn)
        .bind(book.book_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found(format!("book {}", book.book_id)));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM Books WHERE book_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::Database;
    use crate::storage::models::{NewCopy, NewPublisher};
    use crate::storage::repo::{CopyRepo, PublisherRepo};

    async fn setup() -> (Database, i64) {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        let publisher = PublisherRepo::new(db.pool())
            .create(&NewPublisher::new("Orbit", "1 Orbit Way", "555-0000"))
            .await
            .expect("Failed to create publisher");
        (db, publisher.publisher_id)
    }

    #[tokio::test]
    async fn test_book_crud_round_trip() {
        let (db, publisher_id) = setup().await;
        let repo = BookRepo::new(db.pool());

        let created = repo
            .create(&NewBook::new("The Great Gatsby", "F. Scott Fitzgerald", publisher_id, 1925, "978-0743273565"))
            .await
            .expect("Failed to create book");
        assert!(created.book_id > 0);
        assert_eq!(created.publication_year, 1925);

        let mut fetched = repo
            .get_by_id(created.book_id)
            .await
            .expect("Query failed")
            .expect("Book not found");
        assert_eq!(fetched.title, "The Great Gatsby");

        fetched.title = "The Great Gatsby (Annotated)".to_string();
        repo.update(&fetched).await.expect("Update failed");
        let updated = repo
            .get_by_id(created.book_id)
            .await
            .expect("Query failed")
            .expect("Book not found");
        assert_eq!(updated.title, "The Great Gatsby (Annotated)");

        assert!(repo.delete(created.book_id).await.expect("Delete failed"));
        assert!(repo.get_by_id(created.book_id).await.expect("Query failed").is_none());
        assert!(!repo.delete(created.book_id).await.expect("Delete failed"));
    }

    #[tokio::test]
    async fn test_find_by_isbn_and_search() {
        let (db, publisher_id) = setup().await;
        let repo = BookRepo::new(db.pool());

        repo.create(&NewBook::new("1984", "George Orwell", publisher_id, 1949, "978-0451524935"))
            .await
            .expect("Failed to create book");
        repo.create(&NewBook::new("Animal Farm", "George Orwell", publisher_id, 1945, "978-0452284241"))
            .await
            .expect("Failed to create book");

        let found = repo
            .find_by_isbn("978-0451524935")
            .await
            .expect("Query failed")
            .expect("Book not found");
        assert_eq!(found.title, "1984");

        let hits = repo.search_by_title("Farm", 10).await.expect("Search failed");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Animal Farm");

        let by_publisher = repo.list_by_publisher(publisher_id).await.expect("Query failed");
        assert_eq!(by_publisher.len(), 2);
    }

    #[tokio::test]
    async fn test_deleting_book_removes_its_copies() {
        let (db, publisher_id) = setup().await;
        let books = BookRepo::new(db.pool());
        let copies = CopyRepo::new(db.pool());

        let book = books
            .create(&NewBook::new("Neuromancer", "William Gibson", publisher_id, 1984, "978-0441569595"))
            .await
            .expect("Failed to create book");
        copies
            .create(&NewCopy::new(book.book_id, 1))
            .await
            .expect("Failed to create copy");

        assert!(books.delete(book.book_id).await.expect("Delete failed"));
        let remaining = copies.list_by_book(book.book_id).await.expect("Query failed");
        assert!(remaining.is_empty(), "Copies should cascade away with the book");
    }
}
