//! Integration test for the full borrowing lifecycle
//!
//! Walks the complete flow against a real (in-memory) database: build the
//! catalog, lend a copy out, watch the deletion guards hold, return the
//! copy, and tear everything down in the permitted order.

use bibliotek_core::storage::{
    CopyStatus, Database, NewBook, NewCopy, NewPublisher, NewUser, Repository,
};
use bibliotek_core::{LibraryError, LibraryService};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_end_to_end_borrowing_lifecycle() {
    let db = Database::new_in_memory()
        .await
        .expect("Failed to create database");
    let service = LibraryService::new(db);

    // Build the catalog: publisher -> book -> copy
    let publisher = service
        .publishers()
        .create(&NewPublisher::new("Penguin Books", "123 Penguin St.", "555-1322"))
        .await
        .expect("Failed to create publisher");

    let book = service
        .books()
        .create(&NewBook::new(
            "The Great Gatsby",
            "F. Scott Fitzgerald",
            publisher.publisher_id,
            1925,
            "978-0743273565",
        ))
        .await
        .expect("Failed to create book");

    let copy = service
        .copies()
        .create(&NewCopy::new(book.book_id, 1))
        .await
        .expect("Failed to create copy");
    assert_eq!(copy.status, CopyStatus::Available);

    let user = service
        .register_user(&NewUser::new("Mat Doe", "mat@example.com", "555-1234", "123 Main St."))
        .await
        .expect("Failed to register user");

    // Borrowing the copy flips it to Borrowed in the same transaction
    let borrowing = service
        .borrow_copy(user.user_id, copy.copy_id, date(2025, 3, 1))
        .await
        .expect("Borrow failed");
    assert!(borrowing.is_open());

    let copy_after_borrow = service
        .copies()
        .get_by_id(copy.copy_id)
        .await
        .expect("Query failed")
        .expect("Copy not found");
    assert_eq!(copy_after_borrow.status, CopyStatus::Borrowed);

    // With the copy out, the book cannot be deleted
    let err = service
        .delete_book(book.book_id)
        .await
        .expect_err("Delete should fail while the copy is out");
    assert!(matches!(err, LibraryError::BookHasOpenLoans { .. }));
    assert!(service
        .books()
        .get_by_id(book.book_id)
        .await
        .expect("Query failed")
        .is_some());

    // Neither can the borrower
    let err = service
        .delete_user(user.user_id)
        .await
        .expect_err("Delete should fail while the user has a borrowing");
    assert!(matches!(err, LibraryError::UserHasBorrowings { .. }));

    // Nor the open borrowing record itself
    let err = service
        .delete_borrowing(borrowing.borrowing_id)
        .await
        .expect_err("Delete should fail while the borrowing is open");
    assert!(matches!(err, LibraryError::BorrowingStillOpen(_)));

    // Returning the copy closes the borrowing and frees the copy
    let closed = service
        .return_copy(borrowing.borrowing_id, date(2025, 3, 15))
        .await
        .expect("Return failed");
    assert_eq!(closed.return_date, Some(date(2025, 3, 15)));

    let copy_after_return = service
        .copies()
        .get_by_id(copy.copy_id)
        .await
        .expect("Query failed")
        .expect("Copy not found");
    assert_eq!(copy_after_return.status, CopyStatus::Available);

    // The closed borrowing can now be deleted
    assert!(service
        .delete_borrowing(borrowing.borrowing_id)
        .await
        .expect("Delete failed"));
    assert!(service
        .borrowings()
        .get_by_id(borrowing.borrowing_id)
        .await
        .expect("Query failed")
        .is_none());

    // And the book follows, taking its copies with it
    assert!(service.delete_book(book.book_id).await.expect("Delete failed"));
    assert!(service
        .copies()
        .get_by_id(copy.copy_id)
        .await
        .expect("Query failed")
        .is_none());

    // With the borrowing history gone, the user can finally leave too
    assert!(service.delete_user(user.user_id).await.expect("Delete failed"));
}

#[tokio::test]
async fn test_two_users_one_copy() {
    let db = Database::new_in_memory()
        .await
        .expect("Failed to create database");
    let service = LibraryService::new(db);

    let publisher = service
        .publishers()
        .create(&NewPublisher::new("Orbit", "456 Orbit Rd.", "555-3243"))
        .await
        .expect("Failed to create publisher");
    let book = service
        .books()
        .create(&NewBook::new("1984", "George Orwell", publisher.publisher_id, 1949, "978-0451524935"))
        .await
        .expect("Failed to create book");
    let copy = service
        .copies()
        .create(&NewCopy::new(book.book_id, 1))
        .await
        .expect("Failed to create copy");

    let mat = service
        .register_user(&NewUser::new("Mat Doe", "mat@example.com", "555-1234", "123 Main St."))
        .await
        .expect("Failed to register user");
    let kale = service
        .register_user(&NewUser::new("Kale Smith", "kale@example.com", "555-5678", "456 Elm St."))
        .await
        .expect("Failed to register user");

    let first = service
        .borrow_copy(mat.user_id, copy.copy_id, date(2025, 1, 10))
        .await
        .expect("First borrow failed");

    // The second reader has to wait for the copy to come back
    let err = service
        .borrow_copy(kale.user_id, copy.copy_id, date(2025, 1, 11))
        .await
        .expect_err("Second borrow should fail");
    assert!(matches!(err, LibraryError::CopyNotAvailable { .. }));

    service
        .return_copy(first.borrowing_id, date(2025, 1, 24))
        .await
        .expect("Return failed");

    let second = service
        .borrow_copy(kale.user_id, copy.copy_id, date(2025, 1, 25))
        .await
        .expect("Borrow after return failed");
    assert!(second.is_open());

    // Loan history survives the second lending cycle
    let history = service
        .borrowings()
        .list_by_user(mat.user_id)
        .await
        .expect("Query failed");
    assert_eq!(history.len(), 1);
    assert!(!history[0].is_open());
}
