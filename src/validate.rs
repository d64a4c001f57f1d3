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


//! Input validation for books, users and loan periods
//!
//! All checks return `InvalidInput` with a message suitable for showing to
//! the operator. Callers run these before touching the repositories; the
//! database constraints are the backstop, not the front line.

use crate::error::{LibraryError, Result};
use crate::storage::models::{NewBook, NewUser};
use regex::Regex;
use std::sync::OnceLock;

const MIN_PASSWORD_LEN: usize = 6;
const MIN_PUBLICATION_YEAR: i32 = 1000;
const MAX_PUBLICATION_YEAR: i32 = 2100;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9+_.-]+@(.+)$").unwrap())
}

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").unwrap())
}

/// ISBN must be 10 or 13 digits once hyphens are stripped
pub fn validate_isbn(isbn: &str) -> Result<()> {
    let digits: String = isbn.chars().filter(|c| *c != '-').collect();
    if digits.is_empty() {
        return Err(LibraryError::invalid_input("ISBN is required"));
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) || !(digits.len() == 10 || digits.len() == 13) {
        return Err(LibraryError::invalid_input(format!(
            "ISBN must be 10 or 13 digits, got '{}'",
            isbn
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Err(LibraryError::invalid_input("email is required"));
    }
    if !email_regex().is_match(email) {
        return Err(LibraryError::invalid_input(format!(
            "'{}' is not a valid email address",
            email
        )));
    }
    Ok(())
}

/// Usernames are letters, digits and underscores only
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(LibraryError::invalid_input("username is required"));
    }
    if !username_regex().is_match(username) {
        return Err(LibraryError::invalid_input(format!(
            "username '{}' may only contain letters, digits and underscores",
            username
        )));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(LibraryError::invalid_input(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub fn validate_publication_year(year: i32) -> Result<()> {
    if !(MIN_PUBLICATION_YEAR..=MAX_PUBLICATION_YEAR).contains(&year) {
        return Err(LibraryError::invalid_input(format!(
            "publication year {} is out of range ({}-{})",
            year, MIN_PUBLICATION_YEAR, MAX_PUBLICATION_YEAR
        )));
    }
    Ok(())
}

pub fn validate_loan_days(days: i64) -> Result<()> {
    if !(1..=90).contains(&days) {
        return Err(LibraryError::invalid_input(format!(
            "loan period must be between 1 and 90 days, got {}",
            days
        )));
    }
    Ok(())
}

pub fn validate_renewal_days(days: i64) -> Result<()> {
    if !(1..=30).contains(&days) {
        return Err(LibraryError::invalid_input(format!(
            "renewal must be between 1 and 30 days, got {}",
            days
        )));
    }
    Ok(())
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LibraryError::invalid_input(format!("{} is required", field)));
    }
    Ok(())
}

/// Validate all fields of a book before insert or update
pub fn validate_new_book(book: &NewBook) -> Result<()> {
    require(&book.title, "title")?;
    require(&book.author, "author")?;
    validate_isbn(&book.isbn)?;
    validate_publication_year(book.publication_year)?;
    if book.stock < 0 {
        return Err(LibraryError::invalid_input("stock cannot be negative"));
    }
    Ok(())
}

/// Validate all fields of a user before insert
pub fn validate_new_user(user: &NewUser) -> Result<()> {
    require(&user.first_name, "first name")?;
    require(&user.last_name, "last name")?;
    validate_username(&user.username)?;
    validate_password(&user.password)?;
    if !user.email.is_empty() {
        validate_email(&user.email)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isbn_lengths_and_hyphens() {
        assert!(validate_isbn("9780261102217").is_ok());
        assert!(validate_isbn("978-0-261-10221-7").is_ok());
        assert!(validate_isbn("0261102214").is_ok());
        assert!(validate_isbn("").is_err());
        assert!(validate_isbn("12345").is_err());
        assert!(validate_isbn("97802611022170").is_err());
        assert!(validate_isbn("97802611022X7").is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("a+b.c_d-e@sub.example.org").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@nothing-before").is_err());
    }

    #[test]
    fn test_username_and_password() {
        assert!(validate_username("ana_torres99").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("ana torres").is_err());
        assert!(validate_username("ana-torres").is_err());

        assert!(validate_password("abc123").is_ok());
        assert!(validate_password("abc12").is_err());
    }

    #[test]
    fn test_loan_and_renewal_bounds() {
        assert!(validate_loan_days(1).is_ok());
        assert!(validate_loan_days(90).is_ok());
        assert!(validate_loan_days(0).is_err());
        assert!(validate_loan_days(91).is_err());

        assert!(validate_renewal_days(30).is_ok());
        assert!(validate_renewal_days(31).is_err());
    }

    #[test]
    fn test_composite_validators() {
        let mut book = NewBook::new("The Hobbit", "J. R. R. Tolkien", "9780261102217");
        book.publication_year = 1937;
        assert!(validate_new_book(&book).is_ok());

        let mut bad = book.clone();
        bad.title = "  ".to_string();
        assert!(validate_new_book(&bad).is_err());

        let mut bad = book;
        bad.publication_year = 42;
        assert!(validate_new_book(&bad).is_err());

        let user = NewUser::new("Ana", "Torres", "ana_t", "lectora99");
        assert!(validate_new_user(&user).is_ok());

        let mut bad = user.clone();
        bad.password = "ab".to_string();
        assert!(validate_new_user(&bad).is_err());

        // Email is optional but validated when present
        let mut bad = user;
        bad.email = "broken".to_string();
        assert!(validate_new_user(&bad).is_err());
    }
}
