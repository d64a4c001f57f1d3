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


//! Database migrations
//!
//! Runtime migrations tracked in a `_migrations` table, so the schema can be
//! applied against whatever file the application is pointed at.
//!
//! The original MySQL schema adjusted `books.stock` with INSERT/UPDATE
//! triggers on `loans` and refreshed overdue loans with a stored procedure.
//! Neither is recreated here: stock moves inside explicit transactions in
//! `storage::loans`, and the overdue refresh is a plain bulk UPDATE. Keeping
//! the side effects out of the schema means they cannot double-fire when the
//! application also performs them.

use crate::error::Result;
use sqlx::{Executor, SqlitePool};

/// Run all database migrations
///
/// Creates the schema and applies any pending migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    create_migrations_table(pool).await?;

    run_migration(pool, 1, "initial_schema", create_initial_schema(pool)).await?;

    Ok(())
}

/// Create migrations tracking table
async fn create_migrations_table(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .await?;

    Ok(())
}

/// Run a single migration if it hasn't been applied yet
async fn run_migration(
    pool: &SqlitePool,
    id: i32,
    name: &str,
    migration_fn: impl std::future::Future<Output = Result<()>>,
) -> Result<()> {
    let applied: Option<i32> = sqlx::query_scalar("SELECT id FROM _migrations WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    if applied.is_some() {
        return Ok(());
    }

    migration_fn.await?;

    sqlx::query("INSERT INTO _migrations (id, name) VALUES (?, ?)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Create initial database schema
///
/// Three tables related by foreign keys, with the uniqueness rules the
/// application previously enforced only by advisory read-then-write checks
/// now also backed by UNIQUE constraints.
async fn create_initial_schema(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
-- Books: one catalog entry per title, stock counts available copies
CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT '',
    stock INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
    publication_year INTEGER NOT NULL DEFAULT 0,
    isbn TEXT NOT NULL UNIQUE,
    publisher TEXT NOT NULL DEFAULT ''
);

-- Users: members and staff; uniqueness spans active and inactive rows
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'READER',  -- UserRole enum as TEXT
    email TEXT NOT NULL DEFAULT '',
    phone TEXT,
    address TEXT,
    registered_on TEXT NOT NULL,  -- ISO 8601 date (YYYY-MM-DD)
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,  -- salt$digest, never plaintext
    is_active INTEGER NOT NULL DEFAULT 1
);

-- Loans: one user borrowing one book for a bounded period
-- Deleting a book or user with loan history is refused (RESTRICT):
-- loan rows are the audit trail for stock movements.
CREATE TABLE IF NOT EXISTS loans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    book_id INTEGER NOT NULL,
    loan_date TEXT NOT NULL,       -- ISO 8601 date
    due_date TEXT NOT NULL,        -- ISO 8601 date
    return_date TEXT,              -- set iff status = 'RETURNED'
    status TEXT NOT NULL DEFAULT 'PENDING',  -- LoanStatus enum as TEXT
    notes TEXT,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE RESTRICT,
    FOREIGN KEY (book_id) REFERENCES books(id) ON DELETE RESTRICT
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_books_title ON books(title);
CREATE INDEX IF NOT EXISTS idx_books_author ON books(author);
CREATE INDEX IF NOT EXISTS idx_books_category ON books(category);
CREATE INDEX IF NOT EXISTS idx_users_name ON users(first_name, last_name);
-- Email is optional; uniqueness only binds once one is set
CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email) WHERE email != '';
CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);
CREATE INDEX IF NOT EXISTS idx_loans_user ON loans(user_id);
CREATE INDEX IF NOT EXISTS idx_loans_book ON loans(book_id);
CREATE INDEX IF NOT EXISTS idx_loans_status ON loans(status);
CREATE INDEX IF NOT EXISTS idx_loans_due_date ON loans(due_date);
        "#,
    )
    .await?;

    Ok(())
}
