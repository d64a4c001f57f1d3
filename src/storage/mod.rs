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


//! Database storage and models
//!
//! This module handles all database operations using SQLite. It replaces the
//! original desktop application's DAO classes and its singleton JDBC
//! connection with repository functions over an explicitly passed
//! [`sqlx::SqlitePool`].
//!
//! # Database Schema
//! - books: catalog entries with stock counts
//! - users: library members and staff with credentials
//! - loans: one user borrowing one book for a bounded period
//!
//! Stock adjustment is NOT performed by database triggers as it was in the
//! original schema. Issuing and returning loans run explicit transactions in
//! [`loans`] that mutate `books.stock` and the loan row together.
//!
//! # Usage Example
//! ```no_run
//! use biblioteca_core::storage::{books, loans, Database, NewBook, NewLoan};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new("./library.db").await?;
//!
//! let book = NewBook::new("The Hobbit", "J. R. R. Tolkien", "9780261102217");
//! let book_id = books::insert_book(db.pool(), &book).await?;
//!
//! // Issue a 14-day loan to user 1; stock is decremented in the same
//! // transaction that inserts the loan row.
//! let loan_id = loans::issue_loan(db.pool(), &NewLoan::new(1, book_id, 14)).await?;
//! loans::return_loan(db.pool(), loan_id).await?;
//! # Ok(())
//! # }
//! ```

pub mod books;
pub mod database;
pub mod loans;
pub mod migrations;
pub mod models;
pub mod stats;
pub mod users;

// Re-export commonly used types
pub use database::Database;
pub use models::{
    Book, Loan, LoanDetails, LoanStatus, NewBook, NewLoan, NewUser, User, UserRole,
};
pub use stats::LibrarySummary;
