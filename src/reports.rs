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


//! Plain-text report files
//!
//! Four reports: books, users, active loans, overdue loans. Each is a
//! fixed-width text table with a header band, generation timestamp and row
//! count, written to `<dir>/<Prefix>_<yyyymmdd_HHMMSS>.txt`. The caller picks
//! the directory; [`desktop_dir`] gives the conventional default. Opening
//! the file afterward is the caller's business.

use crate::error::{LibraryError, Result};
use crate::storage::{books, loans, users};
use chrono::Local;
use sqlx::SqlitePool;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

const HEAVY_BAND: &str =
    "═══════════════════════════════════════════════════════════════";
const LIGHT_BAND: &str =
    "───────────────────────────────────────────────────────────────";

/// Outcome of a report run
#[derive(Debug, Clone)]
pub struct ReportFile {
    pub path: PathBuf,
    pub rows: usize,
}

/// The user's desktop directory, the conventional place for report output
pub fn desktop_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join("Desktop")
}

fn report_filename(prefix: &str) -> String {
    format!("{}_{}.txt", prefix, Local::now().format("%Y%m%d_%H%M%S"))
}

/// Truncate to `max` characters, marking the cut with an ellipsis
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn header(out: &mut String, title: &str, count_line: &str) {
    let _ = writeln!(out, "{}", HEAVY_BAND);
    let _ = writeln!(out, "           BIBLIOTECA CORE 1.0 - {}", title);
    let _ = writeln!(out, "{}", HEAVY_BAND);
    let _ = writeln!(
        out,
        "Generated: {}",
        Local::now().format("%d/%m/%Y %H:%M:%S")
    );
    let _ = writeln!(out, "{}", count_line);
}

fn footer(out: &mut String) {
    let _ = writeln!(out, "{}", HEAVY_BAND);
    let _ = writeln!(out, "End of report");
}

fn write_report(dir: &Path, prefix: &str, content: &str, rows: usize) -> Result<ReportFile> {
    std::fs::create_dir_all(dir)
        .map_err(|e| LibraryError::FileIoError(format!("cannot create {}: {}", dir.display(), e)))?;
    let path = dir.join(report_filename(prefix));
    std::fs::write(&path, content)
        .map_err(|e| LibraryError::FileIoError(format!("cannot write {}: {}", path.display(), e)))?;

    info!(path = %path.display(), rows, "report written");
    Ok(ReportFile { path, rows })
}

/// Full catalog report
pub async fn books_report(pool: &SqlitePool, dir: &Path) -> Result<ReportFile> {
    let rows = books::list_books(pool).await?;

    let mut out = String::new();
    header(&mut out, "BOOKS REPORT", &format!("Total books: {}", rows.len()));
    let _ = writeln!(out, "{}", HEAVY_BAND);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<5} {:<35} {:<25} {:<15} {:<6} {:<6}",
        "ID", "TITLE", "AUTHOR", "CATEGORY", "YEAR", "STOCK"
    );
    let _ = writeln!(out, "{}", LIGHT_BAND);

    for book in &rows {
        let _ = writeln!(
            out,
            "{:<5} {:<35} {:<25} {:<15} {:<6} {:<6}",
            book.id,
            truncate(&book.title, 35),
            truncate(&book.author, 25),
            truncate(&book.category, 15),
            book.publication_year,
            book.stock
        );
    }
    footer(&mut out);

    write_report(dir, "Report_Books", &out, rows.len())
}

/// All registered users with role and account state
pub async fn users_report(pool: &SqlitePool, dir: &Path) -> Result<ReportFile> {
    let rows = users::list_users(pool).await?;

    let mut out = String::new();
    header(&mut out, "USERS REPORT", &format!("Total users: {}", rows.len()));
    let _ = writeln!(out, "{}", HEAVY_BAND);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<5} {:<30} {:<20} {:<30} {:<10}",
        "ID", "FULL NAME", "ROLE", "EMAIL", "STATE"
    );
    let _ = writeln!(out, "{}", LIGHT_BAND);

    for user in &rows {
        let _ = writeln!(
            out,
            "{:<5} {:<30} {:<20} {:<30} {:<10}",
            user.id,
            truncate(&user.full_name(), 30),
            user.role().label(),
            truncate(&user.email, 30),
            if user.is_active { "ACTIVE" } else { "INACTIVE" }
        );
    }
    footer(&mut out);

    write_report(dir, "Report_Users", &out, rows.len())
}

/// Live loans with borrower, title and due date
pub async fn active_loans_report(pool: &SqlitePool, dir: &Path) -> Result<ReportFile> {
    let rows = loans::list_active_loans(pool).await?;

    let mut out = String::new();
    header(
        &mut out,
        "ACTIVE LOANS",
        &format!("Total active loans: {}", rows.len()),
    );
    let _ = writeln!(out, "{}", HEAVY_BAND);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<5} {:<25} {:<25} {:<12} {:<12} {:<10}",
        "ID", "USER", "BOOK", "ISSUED", "DUE", "STATUS"
    );
    let _ = writeln!(out, "{}", LIGHT_BAND);

    for loan in &rows {
        let _ = writeln!(
            out,
            "{:<5} {:<25} {:<25} {:<12} {:<12} {:<10}",
            loan.id,
            truncate(&loan.user_name, 25),
            truncate(&loan.book_title, 25),
            loan.loan_date,
            loan.due_date,
            loan.status().label()
        );
    }
    footer(&mut out);

    write_report(dir, "Report_Active_Loans", &out, rows.len())
}

/// Overdue loans with days of delay
///
/// Runs the bulk overdue refresh first so the statuses in the file match
/// what it claims, as the original did before printing this report.
pub async fn overdue_loans_report(pool: &SqlitePool, dir: &Path) -> Result<ReportFile> {
    loans::refresh_overdue(pool).await?;
    let rows = loans::list_overdue_loans(pool).await?;

    let mut out = String::new();
    header(
        &mut out,
        "OVERDUE LOANS",
        &format!("Total overdue loans: {}", rows.len()),
    );
    let _ = writeln!(out, "ATTENTION: these loans need urgent follow-up");
    let _ = writeln!(out, "{}", HEAVY_BAND);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<5} {:<25} {:<25} {:<12} {:<12} {:<10}",
        "ID", "USER", "BOOK", "ISSUED", "WAS DUE", "DELAY"
    );
    let _ = writeln!(out, "{}", LIGHT_BAND);

    for loan in &rows {
        let _ = writeln!(
            out,
            "{:<5} {:<25} {:<25} {:<12} {:<12} {} days",
            loan.id,
            truncate(&loan.user_name, 25),
            truncate(&loan.book_title, 25),
            loan.loan_date,
            loan.due_date,
            loan.days_overdue()
        );
    }
    footer(&mut out);

    write_report(dir, "Report_Overdue_Loans", &out, rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::books::insert_book;
    use crate::storage::database::Database;
    use crate::storage::loans::issue_loan;
    use crate::storage::models::{NewBook, NewLoan, NewUser};
    use crate::storage::users::insert_user;
    use chrono::Duration;

    async fn seeded_db() -> (Database, i64) {
        let db = Database::new_in_memory().await.unwrap();

        let mut book = NewBook::new(
            "An Extremely Long Book Title That Will Not Fit In The Column",
            "Author",
            "9780441013593",
        );
        book.stock = 3;
        let book_id = insert_book(db.pool(), &book).await.unwrap();

        let user_id = insert_user(
            db.pool(),
            &NewUser::new("Ana", "Torres", "ana_t", "lectora99"),
        )
        .await
        .unwrap();

        let loan_id = issue_loan(db.pool(), &NewLoan::new(user_id, book_id, 14))
            .await
            .unwrap();
        (db, loan_id)
    }

    #[test]
    fn test_truncate_marks_cut() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly-10", 10), "exactly-10");
        assert_eq!(truncate("much too long for this", 10), "much to...");
    }

    #[test]
    fn test_filename_shape() {
        let name = report_filename("Report_Books");
        // Report_Books_yyyymmdd_HHMMSS.txt
        assert!(name.starts_with("Report_Books_"));
        assert!(name.ends_with(".txt"));
        assert_eq!(name.len(), "Report_Books_".len() + 15 + 4);
    }

    #[tokio::test]
    async fn test_books_report_layout() {
        let (db, _) = seeded_db().await;
        let dir = tempfile::tempdir().unwrap();

        let report = books_report(db.pool(), dir.path()).await.unwrap();
        assert_eq!(report.rows, 1);

        let content = std::fs::read_to_string(&report.path).unwrap();
        assert!(content.contains("BOOKS REPORT"));
        assert!(content.contains("Total books: 1"));
        assert!(content.contains(HEAVY_BAND));
        assert!(content.contains(LIGHT_BAND));
        assert!(content.ends_with("End of report\n"));
        // Long titles stay inside their column
        assert!(content.contains("An Extremely Long Book Title Tha..."));
    }

    #[tokio::test]
    async fn test_overdue_report_refreshes_first() {
        let (db, loan_id) = seeded_db().await;
        let dir = tempfile::tempdir().unwrap();

        let yesterday = Local::now().date_naive() - Duration::days(1);
        sqlx::query("UPDATE loans SET due_date = ? WHERE id = ?")
            .bind(yesterday)
            .bind(loan_id)
            .execute(db.pool())
            .await
            .unwrap();

        let report = overdue_loans_report(db.pool(), dir.path()).await.unwrap();
        assert_eq!(report.rows, 1);

        let content = std::fs::read_to_string(&report.path).unwrap();
        assert!(content.contains("OVERDUE LOANS"));
        assert!(content.contains("1 days"));

        // The refresh ran: the loan is now marked OVERDUE in the database
        let loan = loans::find_loan_by_id(db.pool(), loan_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loan.status(), crate::storage::models::LoanStatus::Overdue);
    }

    #[tokio::test]
    async fn test_users_and_active_loans_reports() {
        let (db, _) = seeded_db().await;
        let dir = tempfile::tempdir().unwrap();

        let users = users_report(db.pool(), dir.path()).await.unwrap();
        let content = std::fs::read_to_string(&users.path).unwrap();
        assert!(content.contains("Ana Torres"));
        assert!(content.contains("ACTIVE"));

        let active = active_loans_report(db.pool(), dir.path()).await.unwrap();
        assert_eq!(active.rows, 1);
        let content = std::fs::read_to_string(&active.path).unwrap();
        assert!(content.contains("Ana Torres"));
        assert!(content.contains("Pending"));
    }
}
