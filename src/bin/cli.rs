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


use anyhow::Context;
use biblioteca_core::storage::{books, loans, stats, users, Database, NewBook, NewLoan, NewUser};
use biblioteca_core::{auth, reports, validate, UserRole};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "biblioteca-cli")]
#[command(about = "Biblioteca Core CLI - library management from the terminal", long_about = None)]
struct Cli {
    /// Database file (defaults to the per-user data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a book to the catalog
    AddBook {
        title: String,
        author: String,
        isbn: String,
        #[arg(long, default_value_t = 1)]
        stock: i64,
        #[arg(long, default_value_t = 2000)]
        year: i32,
        #[arg(long, default_value = "")]
        category: String,
    },
    /// List or search the catalog
    Books {
        /// Filter by partial title
        #[arg(long)]
        title: Option<String>,
    },
    /// Register a library user
    AddUser {
        first_name: String,
        last_name: String,
        username: String,
        password: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long)]
        admin: bool,
    },
    /// Check a username/password pair
    Login { username: String, password: String },
    /// Issue a loan
    Issue {
        user_id: i64,
        book_id: i64,
        #[arg(long, default_value_t = 14)]
        days: i64,
    },
    /// Record a return
    Return { loan_id: i64 },
    /// Extend a loan's due date
    Renew {
        loan_id: i64,
        #[arg(long, default_value_t = 7)]
        days: i64,
    },
    /// Mark past-due loans overdue
    RefreshOverdue,
    /// List live loans
    Loans {
        /// Only overdue loans
        #[arg(long)]
        overdue: bool,
    },
    /// Dashboard counts
    Summary,
    /// Write a plain-text report
    Report {
        /// One of: books, users, active-loans, overdue-loans
        kind: String,
        /// Output directory (defaults to the desktop)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "biblioteca_core=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let db_path = cli.db.unwrap_or_else(Database::get_default_path);
    let db = Database::new(&db_path)
        .await
        .with_context(|| format!("cannot open database at {}", db_path.display()))?;
    let pool = db.pool();

    match cli.command {
        Commands::AddBook {
            title,
            author,
            isbn,
            stock,
            year,
            category,
        } => {
            let mut book = NewBook::new(&title, &author, &isbn);
            book.stock = stock;
            book.publication_year = year;
            book.category = category;
            validate::validate_new_book(&book)?;
            let id = books::insert_book(pool, &book).await?;
            println!("Book {} added: {} ({})", id, title, book.isbn);
        }
        Commands::Books { title } => {
            let list = match title {
                Some(t) => books::search_books_by_title(pool, &t).await?,
                None => books::list_books(pool).await?,
            };
            for book in &list {
                println!(
                    "{:>4}  {:<40} {:<25} stock {}",
                    book.id, book.title, book.author, book.stock
                );
            }
            println!("{} book(s)", list.len());
        }
        Commands::AddUser {
            first_name,
            last_name,
            username,
            password,
            email,
            admin,
        } => {
            let mut user = NewUser::new(&first_name, &last_name, &username, &password);
            user.email = email;
            if admin {
                user.role = UserRole::Admin;
            }
            validate::validate_new_user(&user)?;
            let id = users::insert_user(pool, &user).await?;
            println!("User {} registered: {}", id, username);
        }
        Commands::Login { username, password } => {
            let user = auth::authenticate(pool, &username, &password).await?;
            println!("Welcome, {} ({})", user.full_name(), user.role().label());
        }
        Commands::Issue {
            user_id,
            book_id,
            days,
        } => {
            let id = loans::issue_loan(pool, &NewLoan::new(user_id, book_id, days)).await?;
            let loan = loans::find_loan_details(pool, id)
                .await?
                .context("loan vanished")?;
            println!(
                "Loan {} issued: '{}' to {}, due {}",
                id, loan.book_title, loan.user_name, loan.due_date
            );
        }
        Commands::Return { loan_id } => {
            loans::return_loan(pool, loan_id).await?;
            println!("Loan {} returned", loan_id);
        }
        Commands::Renew { loan_id, days } => {
            loans::renew_loan(pool, loan_id, days).await?;
            let loan = loans::find_loan_by_id(pool, loan_id)
                .await?
                .context("loan vanished")?;
            println!("Loan {} renewed, now due {}", loan_id, loan.due_date);
        }
        Commands::RefreshOverdue => {
            let updated = loans::refresh_overdue(pool).await?;
            println!("{} loan(s) marked overdue", updated);
        }
        Commands::Loans { overdue } => {
            let list = if overdue {
                loans::list_overdue_loans(pool).await?
            } else {
                loans::list_active_loans(pool).await?
            };
            for loan in &list {
                println!(
                    "{:>4}  {:<25} {:<35} due {}  {}",
                    loan.id,
                    loan.user_name,
                    loan.book_title,
                    loan.due_date,
                    loan.status().label()
                );
            }
            println!("{} loan(s)", list.len());
        }
        Commands::Summary => {
            let summary = stats::library_summary(pool).await?;
            println!("Books:         {}", summary.total_books);
            println!("Active users:  {}", summary.active_users);
            println!("Active loans:  {}", summary.active_loans);
            println!("Overdue loans: {}", summary.overdue_loans);
        }
        Commands::Report { kind, dir } => {
            let dir = dir.unwrap_or_else(reports::desktop_dir);
            let report = match kind.as_str() {
                "books" => reports::books_report(pool, &dir).await?,
                "users" => reports::users_report(pool, &dir).await?,
                "active-loans" => reports::active_loans_report(pool, &dir).await?,
                "overdue-loans" => reports::overdue_loans_report(pool, &dir).await?,
                other => anyhow::bail!(
                    "unknown report '{}': expected books, users, active-loans or overdue-loans",
                    other
                ),
            };
            println!("{} row(s) written to {}", report.rows, report.path.display());
        }
    }

    db.close().await?;
    Ok(())
}
