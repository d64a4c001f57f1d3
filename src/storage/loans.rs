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


//! Loan lifecycle and inventory consistency
//!
//! The loan state machine: `Pending` (initial) and `Renewed` are live states,
//! `Overdue` is assigned by the bulk refresh, `Returned` is terminal.
//!
//! The original schema adjusted `books.stock` with database triggers fired
//! implicitly by loan INSERT/UPDATE; the application never touched stock
//! itself. Here the adjustment is explicit and transactional:
//!
//! - [`issue_loan`] decrements stock and inserts the loan row in one
//!   transaction; a guarded `stock > 0` UPDATE keeps stock non-negative
//!   without a read-check-write race.
//! - [`return_loan`] marks the loan returned and increments stock in one
//!   transaction.
//!
//! Either both effects commit or neither does, and the adjustment lives in
//! exactly one place.

use crate::error::{LibraryError, Result};
use crate::storage::models::{Loan, LoanDetails, LoanStatus, NewLoan};
use chrono::{Duration, Local};
use sqlx::SqlitePool;
use tracing::info;

/// Columns selected for the joined [`LoanDetails`] read model
const DETAILS_SELECT: &str = r#"
    SELECT l.id, l.user_id, l.book_id, l.loan_date, l.due_date,
           l.return_date, l.status, l.notes,
           u.first_name || ' ' || u.last_name AS user_name,
           b.title AS book_title
    FROM loans l
    INNER JOIN users u ON l.user_id = u.id
    INNER JOIN books b ON l.book_id = b.id
"#;

/// Issue a new loan, decrementing the book's stock in the same transaction
///
/// The loan starts `Pending` with loan date = today and due date =
/// today + `days` (1-90). Returns the new loan id.
///
/// # Errors
/// - `InvalidInput` if `days` is outside 1-90
/// - `NotFound` if the book or user does not exist
/// - `OutOfStock` if the book has no available copies
pub async fn issue_loan(pool: &SqlitePool, new_loan: &NewLoan) -> Result<i64> {
    if !(1..=90).contains(&new_loan.days) {
        return Err(LibraryError::invalid_input(format!(
            "loan period must be between 1 and 90 days, got {}",
            new_loan.days
        )));
    }

    let today = Local::now().date_naive();
    let due_date = today + Duration::days(new_loan.days);

    let mut tx = pool.begin().await?;

    // Guarded decrement: zero rows means no stock or no such book
    let decremented = sqlx::query("UPDATE books SET stock = stock - 1 WHERE id = ? AND stock > 0")
        .bind(new_loan.book_id)
        .execute(&mut *tx)
        .await?;

    if decremented.rows_affected() == 0 {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE id = ?")
            .bind(new_loan.book_id)
            .fetch_one(&mut *tx)
            .await?;
        return if exists > 0 {
            Err(LibraryError::OutOfStock {
                book_id: new_loan.book_id,
            })
        } else {
            Err(LibraryError::not_found(format!("book {}", new_loan.book_id)))
        };
    }

    let result = sqlx::query(
        r#"
        INSERT INTO loans (user_id, book_id, loan_date, due_date, status, notes)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new_loan.user_id)
    .bind(new_loan.book_id)
    .bind(today)
    .bind(due_date)
    .bind(LoanStatus::Pending.as_str())
    .bind(&new_loan.notes)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let id = result.last_insert_rowid();
    info!(
        loan_id = id,
        user_id = new_loan.user_id,
        book_id = new_loan.book_id,
        %due_date,
        "loan issued"
    );
    Ok(id)
}

/// Record a return, incrementing the book's stock in the same transaction
///
/// Allowed from any non-terminal state (Pending, Renewed or Overdue). Sets
/// return date = today and status = Returned.
///
/// # Errors
/// - `NotFound` if the loan does not exist
/// - `InvalidState` if the loan was already returned
pub async fn return_loan(pool: &SqlitePool, loan_id: i64) -> Result<()> {
    let today = Local::now().date_naive();

    let mut tx = pool.begin().await?;

    let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = ?")
        .bind(loan_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| LibraryError::not_found(format!("loan {}", loan_id)))?;

    if loan.status() == LoanStatus::Returned {
        return Err(LibraryError::InvalidState(format!(
            "loan {} was already returned",
            loan_id
        )));
    }

    sqlx::query("UPDATE loans SET return_date = ?, status = ? WHERE id = ?")
        .bind(today)
        .bind(LoanStatus::Returned.as_str())
        .bind(loan_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE books SET stock = stock + 1 WHERE id = ?")
        .bind(loan.book_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(loan_id, book_id = loan.book_id, "loan returned");
    Ok(())
}

/// Renew a loan, extending its due date by `days` (1-30)
///
/// Sets status = Renewed. Matching the original system, renewal does NOT
/// re-derive the status from the new due date: a loan that was already
/// Overdue comes out Renewed even if the extended due date is still in the
/// past. See DESIGN.md for the open question around this behavior.
///
/// # Errors
/// - `InvalidInput` if `days` is outside 1-30
/// - `NotFound` if the loan does not exist
/// - `InvalidState` if the loan was already returned
pub async fn renew_loan(pool: &SqlitePool, loan_id: i64, days: i64) -> Result<()> {
    if !(1..=30).contains(&days) {
        return Err(LibraryError::invalid_input(format!(
            "renewal must be between 1 and 30 days, got {}",
            days
        )));
    }

    let loan = find_loan_by_id(pool, loan_id)
        .await?
        .ok_or_else(|| LibraryError::not_found(format!("loan {}", loan_id)))?;

    if loan.status() == LoanStatus::Returned {
        return Err(LibraryError::InvalidState(format!(
            "loan {} was already returned",
            loan_id
        )));
    }

    let new_due_date = loan.due_date + Duration::days(days);

    sqlx::query("UPDATE loans SET due_date = ?, status = ? WHERE id = ?")
        .bind(new_due_date)
        .bind(LoanStatus::Renewed.as_str())
        .bind(loan_id)
        .execute(pool)
        .await?;

    info!(loan_id, days, %new_due_date, "loan renewed");
    Ok(())
}

/// Bulk-transition live loans past their due date to Overdue
///
/// Replaces the original's stored procedure. Returns the number of loans
/// transitioned; running it again with no intervening changes affects zero
/// rows, so the operation is idempotent.
pub async fn refresh_overdue(pool: &SqlitePool) -> Result<u64> {
    let today = Local::now().date_naive();

    let result = sqlx::query(
        "UPDATE loans SET status = ? WHERE status IN (?, ?) AND due_date < ?",
    )
    .bind(LoanStatus::Overdue.as_str())
    .bind(LoanStatus::Pending.as_str())
    .bind(LoanStatus::Renewed.as_str())
    .bind(today)
    .execute(pool)
    .await?;

    let updated = result.rows_affected();
    if updated > 0 {
        info!(updated, "loans marked overdue");
    }
    Ok(updated)
}

/// Update a loan record wholesale
///
/// Administrative edit of dates, notes and status; does not touch stock.
pub async fn update_loan(pool: &SqlitePool, loan: &Loan) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE loans SET
            user_id = ?, book_id = ?, loan_date = ?, due_date = ?,
            return_date = ?, status = ?, notes = ?
        WHERE id = ?
        "#,
    )
    .bind(loan.user_id)
    .bind(loan.book_id)
    .bind(loan.loan_date)
    .bind(loan.due_date)
    .bind(loan.return_date)
    .bind(&loan.status)
    .bind(&loan.notes)
    .bind(loan.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(LibraryError::not_found(format!("loan {}", loan.id)));
    }

    info!(loan_id = loan.id, "loan updated");
    Ok(())
}

/// Delete a loan record
///
/// Does not restore stock; deleting live loans is an administrative
/// correction, not a return.
pub async fn delete_loan(pool: &SqlitePool, loan_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM loans WHERE id = ?")
        .bind(loan_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(LibraryError::not_found(format!("loan {}", loan_id)));
    }

    info!(loan_id, "loan deleted");
    Ok(())
}

/// Find loan by id
pub async fn find_loan_by_id(pool: &SqlitePool, loan_id: i64) -> Result<Option<Loan>> {
    let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = ?")
        .bind(loan_id)
        .fetch_optional(pool)
        .await?;

    Ok(loan)
}

/// Find loan by id with borrower name and book title joined in
pub async fn find_loan_details(pool: &SqlitePool, loan_id: i64) -> Result<Option<LoanDetails>> {
    let sql = format!("{DETAILS_SELECT} WHERE l.id = ?");
    let loan = sqlx::query_as::<_, LoanDetails>(&sql)
        .bind(loan_id)
        .fetch_optional(pool)
        .await?;

    Ok(loan)
}

/// List all loans, most recent first
pub async fn list_loans(pool: &SqlitePool) -> Result<Vec<LoanDetails>> {
    let sql = format!("{DETAILS_SELECT} ORDER BY l.loan_date DESC, l.id DESC");
    let loans = sqlx::query_as::<_, LoanDetails>(&sql).fetch_all(pool).await?;

    Ok(loans)
}

/// List live loans (Pending, Overdue or Renewed), soonest due first
pub async fn list_active_loans(pool: &SqlitePool) -> Result<Vec<LoanDetails>> {
    let sql = format!(
        "{DETAILS_SELECT} WHERE l.status IN ('PENDING', 'OVERDUE', 'RENEWED') ORDER BY l.due_date ASC"
    );
    let loans = sqlx::query_as::<_, LoanDetails>(&sql).fetch_all(pool).await?;

    Ok(loans)
}

/// List overdue loans
///
/// Includes loans already marked Overdue and live loans whose due date has
/// passed but which the bulk refresh has not yet caught.
pub async fn list_overdue_loans(pool: &SqlitePool) -> Result<Vec<LoanDetails>> {
    let sql = format!(
        "{DETAILS_SELECT} \
         WHERE l.status = 'OVERDUE' \
            OR (l.status IN ('PENDING', 'RENEWED') AND l.due_date < ?) \
         ORDER BY l.due_date ASC"
    );
    let loans = sqlx::query_as::<_, LoanDetails>(&sql)
        .bind(Local::now().date_naive())
        .fetch_all(pool)
        .await?;

    Ok(loans)
}

/// List a user's loans, most recent first
pub async fn list_loans_by_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<LoanDetails>> {
    let sql = format!("{DETAILS_SELECT} WHERE l.user_id = ? ORDER BY l.loan_date DESC, l.id DESC");
    let loans = sqlx::query_as::<_, LoanDetails>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(loans)
}

/// List a book's loans, most recent first
pub async fn list_loans_by_book(pool: &SqlitePool, book_id: i64) -> Result<Vec<LoanDetails>> {
    let sql = format!("{DETAILS_SELECT} WHERE l.book_id = ? ORDER BY l.loan_date DESC, l.id DESC");
    let loans = sqlx::query_as::<_, LoanDetails>(&sql)
        .bind(book_id)
        .fetch_all(pool)
        .await?;

    Ok(loans)
}

/// Whether a user has any live loan
pub async fn user_has_active_loans(pool: &SqlitePool, user_id: i64) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM loans WHERE user_id = ? AND status IN ('PENDING', 'OVERDUE', 'RENEWED')",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// Count loans in a given status
pub async fn count_loans_by_status(pool: &SqlitePool, status: LoanStatus) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE status = ?")
        .bind(status.as_str())
        .fetch_one(pool)
        .await?;

    Ok(count)
}
