//! Borrowing repository
//!
//! Plain CRUD over the loan history. The availability guard and the status
//! flips that accompany borrow/return live in the service layer, where they
//! share a transaction with the statements here.

use crate::error::{LibraryError, Result};
use crate::storage::models::{Borrowing, NewBorrowing};
use crate::storage::repo::Repository;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// CRUD operations for the Borrowings table
#[derive(Debug, Clone)]
pub struct BorrowingRepo {
    pool: SqlitePool,
}

impl BorrowingRepo {
    pub fn new(pool: &SqlitePool) -> Self {
        Self { pool: pool.clone() }
    }

    /// Full loan history of a user, newest first
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Borrowing>> {
        let borrowings = sqlx::query_as::<_, Borrowing>(
            "SELECT * FROM Borrowings WHERE user_id = ? ORDER BY borrow_date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(borrowings)
    }

    /// Open borrowings (return_date IS NULL) against a copy
    ///
    /// The lifecycle invariant keeps this at zero or one row; a `Vec` is
    /// returned so corrupted data is visible rather than masked.
    pub async fn list_open_by_copy(&self, copy_id: i64) -> Result<Vec<Borrowing>> {
        let borrowings = sqlx::query_as::<_, Borrowing>(
            "SELECT * FROM Borrowings WHERE copy_id = ? AND return_date IS NULL",
        )
        .bind(copy_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(borrowings)
    }

    /// All currently open borrowings
    pub async fn list_open(&self) -> Result<Vec<Borrowing>> {
        let borrowings = sqlx::query_as::<_, Borrowing>(
            "SELECT * FROM Borrowings WHERE return_date IS NULL ORDER BY borrow_date",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(borrowings)
    }
}

#[async_trait]
impl Repository for BorrowingRepo {
    type Entity = Borrowing;
    type New = NewBorrowing;

    async fn create(&self, new: &NewBorrowing) -> Result<Borrowing> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO Borrowings (user_id, copy_id, borrow_date, return_date)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(new.user_id)
        .bind(new.copy_id)
        .bind(new.borrow_date)
        .bind(new.return_date)
        .execute(&mut *tx)
        .await?;

        let borrowing =
            sqlx::query_as::<_, Borrowing>("SELECT * FROM Borrowings WHERE borrowing_id = ?")
                .bind(result.last_insert_rowid())
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(borrowing)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Borrowing>> {
        let borrowing =
            sqlx::query_as::<_, Borrowing>("SELECT * FROM Borrowings WHERE borrowing_id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(borrowing)
    }

    async fn get_all(&self) -> Result<Vec<Borrowing>> {
        let borrowings = sqlx::query_as::<_, Borrowing>("SELECT * FROM Borrowings")
            .fetch_all(&self.pool)
            .await?;

        Ok(borrowings)
    }

    async fn update(&self, borrowing: &Borrowing) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE Borrowings SET
                user_id = ?, copy_id = ?, borrow_date = ?, return_date = ?
            WHERE borrowing_id = ?
            "#,
        )
        .bind(borrowing.user_id)
        .bind(borrowing.copy_id)
        .bind(borrowing.borrow_date)
        .bind(borrowing.return_date)
        .bind(borrowing.borrowing_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found(format!(
                "borrowing {}",
                borrowing.borrowing_id
            )));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM Borrowings WHERE borrowing_id = ?")
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
    use crate::storage::models::{NewBook, NewCopy, NewPublisher, NewUser};
    use crate::storage::repo::{BookRepo, CopyRepo, PublisherRepo, UserRepo};
    use chrono::NaiveDate;

    struct Fixture {
        db: Database,
        user_id: i64,
        copy_id: i64,
    }

    async fn setup() -> Fixture {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        let publisher = PublisherRepo::new(db.pool())
            .create(&NewPublisher::new("Gollancz", "50 Victoria Embankment", "555-2222"))
            .await
            .expect("Failed to create publisher");
        let book = BookRepo::new(db.pool())
            .create(&NewBook::new("The Dispossessed", "Ursula K. Le Guin", publisher.publisher_id, 1974, "978-0061054884"))
            .await
            .expect("Failed to create book");
        let copy = CopyRepo::new(db.pool())
            .create(&NewCopy::new(book.book_id, 1))
            .await
            .expect("Failed to create copy");
        let user = UserRepo::new(db.pool())
            .create(&NewUser::new("Mat Doe", "mat@example.com", "555-1234", "123 Main St."))
            .await
            .expect("Failed to create user");

        Fixture {
            db,
            user_id: user.user_id,
            copy_id: copy.copy_id,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_borrowing_round_trip_with_open_loan() {
        let fx = setup().await;
        let repo = BorrowingRepo::new(fx.db.pool());

        let created = repo
            .create(&NewBorrowing {
                user_id: fx.user_id,
                copy_id: fx.copy_id,
                borrow_date: date(2025, 3, 1),
                return_date: None,
            })
            .await
            .expect("Failed to create borrowing");

        assert!(created.is_open());

        let fetched = repo
            .get_by_id(created.borrowing_id)
            .await
            .expect("Query failed")
            .expect("Borrowing not found");
        assert_eq!(fetched.borrow_date, date(2025, 3, 1));
        assert!(fetched.return_date.is_none());
    }

    #[tokio::test]
    async fn test_update_sets_return_date() {
        let fx = setup().await;
        let repo = BorrowingRepo::new(fx.db.pool());

        let mut borrowing = repo
            .create(&NewBorrowing {
                user_id: fx.user_id,
                copy_id: fx.copy_id,
                borrow_date: date(2025, 3, 1),
                return_date: None,
            })
            .await
            .expect("Failed to create borrowing");

        borrowing.return_date = Some(date(2025, 3, 15));
        repo.update(&borrowing).await.expect("Update failed");

        let fetched = repo
            .get_by_id(borrowing.borrowing_id)
            .await
            .expect("Query failed")
            .expect("Borrowing not found");
        assert_eq!(fetched.return_date, Some(date(2025, 3, 15)));
        assert!(!fetched.is_open());
    }

    #[tokio::test]
    async fn test_open_loan_queries() {
        let fx = setup().await;
        let repo = BorrowingRepo::new(fx.db.pool());

        let open = repo
            .create(&NewBorrowing {
                user_id: fx.user_id,
                copy_id: fx.copy_id,
                borrow_date: date(2025, 1, 10),
                return_date: None,
            })
            .await
            .expect("create failed");
        repo.create(&NewBorrowing {
            user_id: fx.user_id,
            copy_id: fx.copy_id,
            borrow_date: date(2024, 6, 1),
            return_date: Some(date(2024, 6, 20)),
        })
        .await
        .expect("create failed");

        let open_for_copy = repo.list_open_by_copy(fx.copy_id).await.expect("query failed");
        assert_eq!(open_for_copy.len(), 1);
        assert_eq!(open_for_copy[0].borrowing_id, open.borrowing_id);

        let history = repo.list_by_user(fx.user_id).await.expect("query failed");
        assert_eq!(history.len(), 2);

        let all_open = repo.list_open().await.expect("query failed");
        assert_eq!(all_open.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_borrowing() {
        let fx = setup().await;
        let repo = BorrowingRepo::new(fx.db.pool());

        let borrowing = repo
            .create(&NewBorrowing {
                user_id: fx.user_id,
                copy_id: fx.copy_id,
                borrow_date: date(2025, 3, 1),
                return_date: Some(date(2025, 3, 10)),
            })
            .await
            .expect("Failed to create borrowing");

        assert!(repo.delete(borrowing.borrowing_id).await.expect("Delete failed"));
        assert!(repo
            .get_by_id(borrowing.borrowing_id)
            .await
            .expect("Query failed")
            .is_none());
        assert!(!repo.delete(borrowing.borrowing_id).await.expect("Delete failed"));
    }
}
