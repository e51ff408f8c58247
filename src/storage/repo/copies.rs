//! Copy repository

use crate::error::{LibraryError, Result};
use crate::storage::models::{Copy, CopyStatus, NewCopy};
use crate::storage::repo::Repository;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// CRUD operations for the Copies table
#[derive(Debug, Clone)]
pub struct CopyRepo {
    pool: SqlitePool,
}

impl CopyRepo {
    pub fn new(pool: &SqlitePool) -> Self {
        Self { pool: pool.clone() }
    }

    /// List every physical copy of a book
    pub async fn list_by_book(&self, book_id: i64) -> Result<Vec<Copy>> {
        let copies = sqlx::query_as::<_, Copy>(
            "SELECT * FROM Copies WHERE book_id = ? ORDER BY copy_number",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(copies)
    }

    /// Count copies of a book currently in the given status
    pub async fn count_by_status(&self, book_id: i64, status: CopyStatus) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM Copies WHERE book_id = ? AND status = ?",
        )
        .bind(book_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

#[async_trait]
impl Repository for CopyRepo {
    type Entity = Copy;
    type New = NewCopy;

    async fn create(&self, new: &NewCopy) -> Result<Copy> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO Copies (book_id, copy_number, status) VALUES (?, ?, ?)",
        )
        .bind(new.book_id)
        .bind(new.copy_number)
        .bind(new.status)
        .execute(&mut *tx)
        .await?;

        let copy = sqlx::query_as::<_, Copy>("SELECT * FROM Copies WHERE copy_id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(copy)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Copy>> {
        let copy = sqlx::query_as::<_, Copy>("SELECT * FROM Copies WHERE copy_id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(copy)
    }

    async fn get_all(&self) -> Result<Vec<Copy>> {
        let copies = sqlx::query_as::<_, Copy>("SELECT * FROM Copies")
            .fetch_all(&self.pool)
            .await?;

        Ok(copies)
    }

    async fn update(&self, copy: &Copy) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE Copies SET book_id = ?, copy_number = ?, status = ? WHERE copy_id = ?",
        )
        .bind(copy.book_id)
        .bind(copy.copy_number)
        .bind(copy.status)
        .bind(copy.copy_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found(format!("copy {}", copy.copy_id)));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM Copies WHERE copy_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
