//! Database entity models
//!
//! Plain data records for the three tables plus the enums persisted as TEXT.
//!
//! # SQLite Adaptations
//! - Enums (`LoanStatus`, `UserRole`) stored as uppercase TEXT
//! - Dates stored as TEXT in ISO 8601 format (lexical order == date order)
//! - Derived facts (overdue, days remaining, availability) are methods, not
//!   columns

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// ENUMS
// ============================================================================

/// Lifecycle state of a loan.
///
/// `Pending` is the initial state, `Returned` is terminal. `Overdue` is
/// assigned by the bulk refresh in [`crate::storage::loans::refresh_overdue`],
/// never by an explicit per-loan transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    Pending,
    Returned,
    Overdue,
    Renewed,
}

impl LoanStatus {
    /// TEXT representation persisted in the `loans.status` column
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "PENDING",
            LoanStatus::Returned => "RETURNED",
            LoanStatus::Overdue => "OVERDUE",
            LoanStatus::Renewed => "RENEWED",
        }
    }

    /// Parse the persisted TEXT value; unknown values fall back to Pending
    pub fn from_str_or_default(value: &str) -> Self {
        match value {
            "RETURNED" => LoanStatus::Returned,
            "OVERDUE" => LoanStatus::Overdue,
            "RENEWED" => LoanStatus::Renewed,
            _ => LoanStatus::Pending,
        }
    }

    /// Human-readable label for table views and reports
    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "Pending",
            LoanStatus::Returned => "Returned",
            LoanStatus::Overdue => "Overdue",
            LoanStatus::Renewed => "Renewed",
        }
    }
}

/// Role of a library user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    Librarian,
    Reader,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Librarian => "LIBRARIAN",
            UserRole::Reader => "READER",
        }
    }

    pub fn from_str_or_default(value: &str) -> Self {
        match value {
            "ADMIN" => UserRole::Admin,
            "LIBRARIAN" => UserRole::Librarian,
            _ => UserRole::Reader,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UserRole::Admin => "Administrator",
            UserRole::Librarian => "Librarian",
            UserRole::Reader => "Reader",
        }
    }
}

// ============================================================================
// MAIN ENTITIES
// ============================================================================

/// Book entity - one catalog entry with its inventory count
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Book {
    /// Primary key (auto-increment)
    pub id: i64,
    pub title: String,
    pub author: String,
    pub category: String,
    /// Copies available for loan; kept non-negative by a CHECK constraint
    /// and by the guarded decrement in loan issue
    pub stock: i64,
    pub publication_year: i32,
    /// Unique, stored without hyphens (10 or 13 digits)
    pub isbn: String,
    pub publisher: String,
}

impl Book {
    /// A book can be loaned while at least one copy remains
    pub fn is_available(&self) -> bool {
        self.stock > 0
    }
}

/// User entity - library member or staff
///
/// `password_hash` holds a `salt$digest` pair produced by
/// [`crate::auth::hash_password`]; the plaintext never reaches storage.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub role: String, // UserRole as TEXT
    pub email: String,
    #[sqlx(default)]
    pub phone: Option<String>,
    #[sqlx(default)]
    pub address: Option<String>,
    pub registered_on: NaiveDate,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
}

impl User {
    pub fn role(&self) -> UserRole {
        UserRole::from_str_or_default(&self.role)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Loan entity - one user borrowing one book for a bounded period
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Loan {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    /// Set if and only if status is Returned
    #[sqlx(default)]
    pub return_date: Option<NaiveDate>,
    pub status: String, // LoanStatus as TEXT
    #[sqlx(default)]
    pub notes: Option<String>,
}

impl Loan {
    pub fn status(&self) -> LoanStatus {
        LoanStatus::from_str_or_default(&self.status)
    }

    /// A loan is overdue when it has not been returned and today is past the
    /// due date, regardless of whether the bulk refresh has run yet.
    pub fn is_overdue(&self) -> bool {
        self.status() != LoanStatus::Returned && Local::now().date_naive() > self.due_date
    }

    /// Days until the due date; negative when overdue, 0 once returned
    pub fn days_remaining(&self) -> i64 {
        if self.status() == LoanStatus::Returned {
            return 0;
        }
        (self.due_date - Local::now().date_naive()).num_days()
    }

    /// Days past the due date; 0 when not overdue
    pub fn days_overdue(&self) -> i64 {
        if !self.is_overdue() {
            return 0;
        }
        (Local::now().date_naive() - self.due_date).num_days()
    }
}

/// Loan row joined with the borrower's name and the book's title.
///
/// The original DAO joined these display fields into every loan query; table
/// views and reports need them without a second round trip.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LoanDetails {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    #[sqlx(default)]
    pub return_date: Option<NaiveDate>,
    pub status: String,
    #[sqlx(default)]
    pub notes: Option<String>,
    pub user_name: String,
    pub book_title: String,
}

impl LoanDetails {
    pub fn status(&self) -> LoanStatus {
        LoanStatus::from_str_or_default(&self.status)
    }

    pub fn is_overdue(&self) -> bool {
        self.status() != LoanStatus::Returned && Local::now().date_naive() > self.due_date
    }

    pub fn days_remaining(&self) -> i64 {
        if self.status() == LoanStatus::Returned {
            return 0;
        }
        (self.due_date - Local::now().date_naive()).num_days()
    }

    pub fn days_overdue(&self) -> i64 {
        if !self.is_overdue() {
            return 0;
        }
        (Local::now().date_naive() - self.due_date).num_days()
    }
}

// ============================================================================
// NEW RECORD STRUCTS (for inserts)
// ============================================================================

/// New book record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub category: String,
    pub stock: i64,
    pub publication_year: i32,
    pub isbn: String,
    pub publisher: String,
}

impl NewBook {
    pub fn new(title: &str, author: &str, isbn: &str) -> Self {
        Self {
            title: title.to_string(),
            author: author.to_string(),
            category: String::new(),
            stock: 1,
            publication_year: 0,
            isbn: isbn.replace('-', ""),
            publisher: String::new(),
        }
    }
}

/// New user record for insertion.
///
/// Carries the plaintext password; it is hashed at insert time and only the
/// `salt$digest` string is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub username: String,
    pub password: String,
}

impl NewUser {
    pub fn new(first_name: &str, last_name: &str, username: &str, password: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            role: UserRole::Reader,
            email: String::new(),
            phone: None,
            address: None,
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

/// New loan record: loan date is today, due date is today + `days`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLoan {
    pub user_id: i64,
    pub book_id: i64,
    /// Loan period in days, 1-90 (desktop form offered 1-90, default 14)
    pub days: i64,
    pub notes: Option<String>,
}

impl NewLoan {
    pub fn new(user_id: i64, book_id: i64, days: i64) -> Self {
        Self {
            user_id,
            book_id,
            days,
            notes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn loan_due_in(days: i64, status: LoanStatus) -> Loan {
        let today = Local::now().date_naive();
        Loan {
            id: 1,
            user_id: 1,
            book_id: 1,
            loan_date: today - Duration::days(14),
            due_date: today + Duration::days(days),
            return_date: if status == LoanStatus::Returned {
                Some(today)
            } else {
                None
            },
            status: status.as_str().to_string(),
            notes: None,
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            LoanStatus::Pending,
            LoanStatus::Returned,
            LoanStatus::Overdue,
            LoanStatus::Renewed,
        ] {
            assert_eq!(LoanStatus::from_str_or_default(status.as_str()), status);
        }
        assert_eq!(
            LoanStatus::from_str_or_default("garbage"),
            LoanStatus::Pending
        );
    }

    #[test]
    fn test_overdue_derivation() {
        let overdue = loan_due_in(-3, LoanStatus::Pending);
        assert!(overdue.is_overdue());
        assert_eq!(overdue.days_remaining(), -3);
        assert_eq!(overdue.days_overdue(), 3);

        let current = loan_due_in(5, LoanStatus::Pending);
        assert!(!current.is_overdue());
        assert_eq!(current.days_remaining(), 5);
        assert_eq!(current.days_overdue(), 0);
    }

    #[test]
    fn test_returned_loan_never_overdue() {
        let returned = loan_due_in(-10, LoanStatus::Returned);
        assert!(!returned.is_overdue());
        assert_eq!(returned.days_remaining(), 0);
        assert_eq!(returned.days_overdue(), 0);
    }

    #[test]
    fn test_new_book_strips_isbn_hyphens() {
        let book = NewBook::new("Title", "Author", "978-0-261-10221-7");
        assert_eq!(book.isbn, "9780261102217");
    }
}
