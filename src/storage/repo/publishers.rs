//! Publisher repository

use crate::error::{LibraryError, Result};
use crate::storage::models::{NewPublisher, Publisher};
use crate::storage::repo::Repository;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// CRUD operations for the Publishers table
#[derive(Debug, Clone)]
pub struct PublisherRepo {
    pool: SqlitePool,
}

impl PublisherRepo {
    pub fn new(pool: &SqlitePool) -> Self {
        Self { pool: pool.clone() }
    }
}

#[async_trait]
impl Repository for PublisherRepo {
    type Entity = Publisher;
    type New = NewPublisher;

    async fn create(&self, new: &NewPublisher) -> Result<Publisher> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO Publishers (name, address, phone) VALUES (?, ?, ?)",
        )
        .bind(&new.name)
        .bind(&new.address)
        .bind(&new.phone)
        .execute(&mut *tx)
        .await?;

        let publisher =
            sqlx::query_as::<_, Publisher>("SELECT * FROM Publishers WHERE publisher_id = ?")
                .bind(result.last_insert_rowid())
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(publisher)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Publisher>> {
        let publisher =
            sqlx::query_as::<_, Publisher>("SELECT * FROM Publishers WHERE publisher_id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(publisher)
    }

    async fn get_all(&self) -> Result<Vec<Publisher>> {
        let publishers = sqlx::query_as::<_, Publisher>("SELECT * FROM Publishers")
            .fetch_all(&self.pool)
            .await?;

        Ok(publishers)
    }

    async fn update(&self, publisher: &Publisher) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE Publishers SET name = ?, address = ?, phone = ? WHERE publisher_id = ?",
        )
        .bind(&publisher.name)
        .bind(&publisher.address)
        .bind(&publisher.phone)
        .bind(publisher.publisher_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found(format!(
                "publisher {}",
                publisher.publisher_id
            )));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM Publishers WHERE publisher_id = ?")
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
    use crate::storage::models::NewBook;
    use crate::storage::repo::BookRepo;

    #[tokio::test]
    async fn test_publisher_crud_round_trip() {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        let repo = PublisherRepo::new(db.pool());

        let created = repo
            .create(&NewPublisher::new("Penguin Books", "123 Penguin St.", "555-1234"))
            .await
            .expect("Failed to create publisher");

        let mut fetched = repo
            .get_by_id(created.publisher_id)
            .await
            .expect("Query failed")
            .expect("Publisher not found");
        assert_eq!(fetched.name, "Penguin Books");

        fetched.phone = "555-9999".to_string();
        repo.update(&fetched).await.expect("Update failed");

        let updated = repo
            .get_by_id(created.publisher_id)
            .await
            .expect("Query failed")
            .expect("Publisher not found");
        assert_eq!(updated.phone, "555-9999");

        assert!(repo.delete(created.publisher_id).await.expect("Delete failed"));
        assert!(repo
            .get_by_id(created.publisher_id)
            .await
            .expect("Query failed")
            .is_none());
    }

    #[tokio::test]
    async fn test_publisher_with_books_cannot_be_deleted() {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        let publishers = PublisherRepo::new(db.pool());
        let books = BookRepo::new(db.pool());

        let publisher = publishers
            .create(&NewPublisher::new("Orbit", "1 Orbit Way", "555-0000"))
            .await
            .expect("Failed to create publisher");
        books
            .create(&NewBook::new("Dune", "Frank Herbert", publisher.publisher_id, 1965, "978-0441172719"))
            .await
            .expect("Failed to create book");

        // RESTRICT foreign key: the storage engine rejects the delete
        let err = publishers
            .delete(publisher.publisher_id)
            .await
            .expect_err("Delete should fail");
        assert!(err.is_persistence());
    }
}
