// Biblioteca Core - Library Management System
// Copyright (C) 2025 Biblioteca Core contributors
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


//! End-to-end loan lifecycle against a real on-disk database

use biblioteca_core::storage::{books, loans, stats, users, Database};
use biblioteca_core::{auth, LibraryError, LoanStatus, NewBook, NewLoan, NewUser, UserRole};
use chrono::{Duration, Local};

async fn stock_of(db: &Database, book_id: i64) -> i64 {
    books::find_book_by_id(db.pool(), book_id)
        .await
        .unwrap()
        .unwrap()
        .stock
}

#[tokio::test]
async fn test_full_library_workflow_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path().join("library.db")).await.unwrap();

    // Staff and a reader
    let mut librarian = NewUser::new("Marta", "Vidal", "marta_v", "staff_pw_1");
    librarian.role = UserRole::Librarian;
    users::insert_user(db.pool(), &librarian).await.unwrap();

    let mut reader = NewUser::new("Ana", "Torres", "ana_t", "lectora99");
    reader.email = "ana@example.com".to_string();
    let reader_id = users::insert_user(db.pool(), &reader).await.unwrap();

    let staff = auth::authenticate(db.pool(), "marta_v", "staff_pw_1")
        .await
        .expect("Failed to authenticate librarian");
    assert_eq!(staff.role(), UserRole::Librarian);

    // Single-copy book
    let mut book = NewBook::new("El nombre del viento", "Patrick Rothfuss", "9788401352836");
    book.stock = 1;
    book.publication_year = 2007;
    book.category = "Fantasy".to_string();
    let book_id = books::insert_book(db.pool(), &book).await.unwrap();

    // Issue consumes the only copy
    let loan_id = loans::issue_loan(db.pool(), &NewLoan::new(reader_id, book_id, 14))
        .await
        .unwrap();
    assert_eq!(stock_of(&db, book_id).await, 0);
    assert!(!books::find_book_by_id(db.pool(), book_id)
        .await
        .unwrap()
        .unwrap()
        .is_available());

    // A second issue is rejected while the copy is out
    let err = loans::issue_loan(db.pool(), &NewLoan::new(reader_id, book_id, 14))
        .await
        .unwrap_err();
    assert!(matches!(err, LibraryError::OutOfStock { .. }));

    // Renewal pushes the due date, return frees the copy
    loans::renew_loan(db.pool(), loan_id, 7).await.unwrap();
    let loan = loans::find_loan_by_id(db.pool(), loan_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loan.status(), LoanStatus::Renewed);
    assert_eq!(
        loan.due_date,
        Local::now().date_naive() + Duration::days(14 + 7)
    );

    loans::return_loan(db.pool(), loan_id).await.unwrap();
    assert_eq!(stock_of(&db, book_id).await, 1);

    let returned = loans::find_loan_by_id(db.pool(), loan_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(returned.status(), LoanStatus::Returned);
    assert_eq!(returned.return_date, Some(Local::now().date_naive()));

    // The copy can circulate again
    let second = loans::issue_loan(db.pool(), &NewLoan::new(reader_id, book_id, 14))
        .await
        .unwrap();
    assert_ne!(second, loan_id);
    assert_eq!(stock_of(&db, book_id).await, 0);

    let summary = stats::library_summary(db.pool()).await.unwrap();
    assert_eq!(summary.total_books, 1);
    assert_eq!(summary.active_users, 2);
    assert_eq!(summary.active_loans, 1);
    assert_eq!(summary.overdue_loans, 0);

    db.close().await.unwrap();
}

#[tokio::test]
async fn test_overdue_refresh_and_report_flow() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path().join("library.db")).await.unwrap();

    let reader_id = users::insert_user(
        db.pool(),
        &NewUser::new("Luis", "Pardo", "luis_p", "lector_pw"),
    )
    .await
    .unwrap();

    let mut book = NewBook::new("Rayuela", "Julio Cortázar", "9788437604572");
    book.stock = 2;
    let book_id = books::insert_book(db.pool(), &book).await.unwrap();

    let late = loans::issue_loan(db.pool(), &NewLoan::new(reader_id, book_id, 14))
        .await
        .unwrap();
    loans::issue_loan(db.pool(), &NewLoan::new(reader_id, book_id, 14))
        .await
        .unwrap();

    // Backdate one loan past its due date
    let last_week = Local::now().date_naive() - Duration::days(7);
    sqlx::query("UPDATE loans SET due_date = ? WHERE id = ?")
        .bind(last_week)
        .bind(late)
        .execute(db.pool())
        .await
        .unwrap();

    // Past-due loans show as overdue in listings even before the refresh
    let listed = loans::list_overdue_loans(db.pool()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, late);
    assert_eq!(listed[0].days_overdue(), 7);

    assert_eq!(loans::refresh_overdue(db.pool()).await.unwrap(), 1);
    assert_eq!(loans::refresh_overdue(db.pool()).await.unwrap(), 0);

    let marked = loans::find_loan_by_id(db.pool(), late).await.unwrap().unwrap();
    assert_eq!(marked.status(), LoanStatus::Overdue);
    assert!(marked.days_remaining() < 0);

    // The overdue report reflects the refreshed state
    let report = biblioteca_core::reports::overdue_loans_report(db.pool(), dir.path())
        .await
        .unwrap();
    assert_eq!(report.rows, 1);
    let content = std::fs::read_to_string(&report.path).unwrap();
    assert!(content.contains("Luis Pardo"));
    assert!(content.contains("7 days"));

    // Returning an overdue loan still restores stock
    loans::return_loan(db.pool(), late).await.unwrap();
    assert_eq!(stock_of(&db, book_id).await, 1);

    db.close().await.unwrap();
}

#[tokio::test]
async fn test_referential_integrity_guards() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path().join("library.db")).await.unwrap();

    let reader_id = users::insert_user(
        db.pool(),
        &NewUser::new("Ana", "Torres", "ana_t", "lectora99"),
    )
    .await
    .unwrap();
    let book_id = books::insert_book(
        db.pool(),
        &NewBook::new("Ficciones", "Jorge Luis Borges", "9780802130303"),
    )
    .await
    .unwrap();

    loans::issue_loan(db.pool(), &NewLoan::new(reader_id, book_id, 14))
        .await
        .unwrap();

    // Neither side of a live loan can be deleted
    let err = books::delete_book(db.pool(), book_id).await.unwrap_err();
    assert!(err.is_conflict());
    let err = users::delete_user(db.pool(), reader_id).await.unwrap_err();
    assert!(err.is_conflict());

    assert!(loans::user_has_active_loans(db.pool(), reader_id)
        .await
        .unwrap());

    db.close().await.unwrap();
}
