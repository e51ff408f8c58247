//! Librarian repository

use crate::error::{LibraryError, Result};
use crate::storage::models::{Librarian, NewLibrarian};
use crate::storage::repo::Repository;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// CRUD operations for the Librarians table
#[derive(Debug, Clone)]
pub struct LibrarianRepo {
    pool: SqlitePool,
}

impl LibrarianRepo {
    pub fn new(pool: &SqlitePool) -> Self {
        Self { pool: pool.clone() }
    }

    /// Find the staff profile of a user, if any (one-to-one relation)
    pub async fn find_by_user(&self, user_id: i64) -> Result<Option<Librarian>> {
        let librarian =
            sqlx::query_as::<_, Librarian>("SELECT * FROM Librarians WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(librarian)
    }
}

#[async_trait]
impl Repository for LibrarianRepo {
    type Entity = Librarian;
    type New = NewLibrarian;

    async fn create(&self, new: &NewLibrarian) -> Result<Librarian> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO Librarians (user_id, employment_date, position) VALUES (?, ?, ?)",
        )
        .bind(new.user_id)
        .bind(new.employment_date)
        .bind(new.position)
        .execute(&mut *tx)
        .await?;

        let librarian =
            sqlx::query_as::<_, Librarian>("SELECT * FROM Librarians WHERE librarian_id = ?")
                .bind(result.last_insert_rowid())
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(librarian)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Librarian>> {
        let librarian =
            sqlx::query_as::<_, Librarian>("SELECT * FROM Librarians WHERE librarian_id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(librarian)
    }

    async fn get_all(&self) -> Result<Vec<Librarian>> {
        let librarians = sqlx::query_as::<_, Librarian>("SELECT * FROM Librarians")
            .fetch_all(&self.pool)
            .await?;

        Ok(librarians)
    }

    async fn update(&self, librarian: &Librarian) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE Librarians SET user_id = ?, employment_date = ?, position = ?
            WHERE librarian_id = ?
            "#,
        )
        .bind(librarian.user_id)
        .bind(librarian.employment_date)
        .bind(librarian.position)
        .bind(librarian.librarian_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found(format!(
                "librarian {}",
                librarian.librarian_id
            )));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM Librarians WHERE librarian_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
