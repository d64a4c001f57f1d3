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


//! Dashboard counts

use crate::error::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Headline numbers for the dashboard view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibrarySummary {
    pub total_books: i64,
    pub active_users: i64,
    pub active_loans: i64,
    pub overdue_loans: i64,
}

/// Gather the dashboard summary in one pass
///
/// `overdue_loans` counts past-due live loans as well as loans already
/// marked OVERDUE, so the number is correct even if the bulk refresh has
/// not run today.
pub async fn library_summary(pool: &SqlitePool) -> Result<LibrarySummary> {
    let total_books: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
        .fetch_one(pool)
        .await?;

    let active_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active = 1")
        .fetch_one(pool)
        .await?;

    let active_loans: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM loans WHERE status IN ('PENDING', 'OVERDUE', 'RENEWED')",
    )
    .fetch_one(pool)
    .await?;

    let overdue_loans: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM loans \
         WHERE status = 'OVERDUE' \
            OR (status IN ('PENDING', 'RENEWED') AND due_date < date('now', 'localtime'))",
    )
    .fetch_one(pool)
    .await?;

    Ok(LibrarySummary {
        total_books,
        active_users,
        active_loans,
        overdue_loans,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::books::insert_book;
    use crate::storage::database::Database;
    use crate::storage::loans::{issue_loan, return_loan};
    use crate::storage::models::{NewBook, NewLoan, NewUser};
    use crate::storage::users::{insert_user, set_user_active};

    #[tokio::test]
    async fn test_summary_counts() {
        let db = Database::new_in_memory().await.unwrap();

        let mut book = NewBook::new("Cien años de soledad", "Gabriel García Márquez", "9780060883287");
        book.stock = 5;
        let book_id = insert_book(db.pool(), &book).await.unwrap();

        let reader = insert_user(
            db.pool(),
            &NewUser::new("Aureliano", "Buendía", "aureliano", "macondo1"),
        )
        .await
        .unwrap();
        let inactive = insert_user(
            db.pool(),
            &NewUser::new("Remedios", "Moscote", "remedios", "macondo2"),
        )
        .await
        .unwrap();
        set_user_active(db.pool(), inactive, false).await.unwrap();

        let loan = issue_loan(db.pool(), &NewLoan::new(reader, book_id, 14))
            .await
            .unwrap();
        issue_loan(db.pool(), &NewLoan::new(reader, book_id, 14))
            .await
            .unwrap();
        return_loan(db.pool(), loan).await.unwrap();

        let summary = library_summary(db.pool()).await.unwrap();
        assert_eq!(summary.total_books, 1);
        assert_eq!(summary.active_users, 1);
        assert_eq!(summary.active_loans, 1);
        assert_eq!(summary.overdue_loans, 0);
    }
}
