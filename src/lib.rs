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


//! # Biblioteca Core
//!
//! Storage and domain core for a library-management system: catalog,
//! members, credentials and the loan lifecycle over SQLite. Front ends
//! (desktop GUI, CLI) call the repository functions in [`storage`]; this
//! crate owns the schema, the transactions and the invariants.
//!
//! ```no_run
//! use biblioteca_core::storage::{books, loans, Database, NewBook, NewLoan};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(Database::get_default_path()).await?;
//!
//! let book_id = books::insert_book(
//!     db.pool(),
//!     &NewBook::new("The Hobbit", "J. R. R. Tolkien", "9780261102217"),
//! )
//! .await?;
//!
//! let loan_id = loans::issue_loan(db.pool(), &NewLoan::new(1, book_id, 14)).await?;
//! loans::return_loan(db.pool(), loan_id).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod error;
pub mod reports;
pub mod storage;
pub mod validate;

pub use error::{LibraryError, Result};
pub use storage::{
    Book, Database, LibrarySummary, Loan, LoanDetails, LoanStatus, NewBook, NewLoan, NewUser,
    User, UserRole,
};
