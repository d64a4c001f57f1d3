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


//! Book catalog queries
//!
//! Repository functions for the `books` table. Uniqueness of the ISBN is
//! checked before insert/update (excluding the row's own id on update) and
//! is additionally backed by the UNIQUE constraint, so a concurrent insert
//! surfaces as [`crate::error::LibraryError::Conflict`] rather than silently
//! winning the race.
//!
//! Stock is never written here except through full-record updates; loan issue
//! and return adjust it transactionally in [`crate::storage::loans`].

use crate::error::{LibraryError, Result};
use crate::storage::models::{Book, NewBook};
use sqlx::SqlitePool;
use tracing::info;

/// Insert a new book
///
/// Returns the id of the inserted book. Fails with `Conflict` if a book with
/// the same ISBN already exists.
pub async fn insert_book(pool: &SqlitePool, book: &NewBook) -> Result<i64> {
    if isbn_exists(pool, &book.isbn, None).await? {
        return Err(LibraryError::conflict(format!(
            "a book with ISBN {} already exists",
            book.isbn
        )));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO books (title, author, category, stock, publication_year, isbn, publisher)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&book.title)
    .bind(&book.author)
    .bind(&book.category)
    .bind(book.stock)
    .bind(book.publication_year)
    .bind(&book.isbn)
    .bind(&book.publisher)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    info!(book_id = id, title = %book.title, "book added to catalog");
    Ok(id)
}

/// Update an existing book
///
/// Fails with `NotFound` if the id does not exist and with `Conflict` if the
/// new ISBN belongs to a different book.
pub async fn update_book(pool: &SqlitePool, book: &Book) -> Result<()> {
    if isbn_exists(pool, &book.isbn, Some(book.id)).await? {
        return Err(LibraryError::conflict(format!(
            "a different book with ISBN {} already exists",
            book.isbn
        )));
    }

    let result = sqlx::query(
        r#"
        UPDATE books SET
            title = ?, author = ?, category = ?, stock = ?,
            publication_year = ?, isbn = ?, publisher = ?
        WHERE id = ?
        "#,
    )
    .bind(&book.title)
    .bind(&book.author)
    .bind(&book.category)
    .bind(book.stock)
    .bind(book.publication_year)
    .bind(&book.isbn)
    .bind(&book.publisher)
    .bind(book.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(LibraryError::not_found(format!("book {}", book.id)));
    }

    info!(book_id = book.id, "book updated");
    Ok(())
}

/// Delete a book
///
/// Refused with `Conflict` while loan history references it (RESTRICT FK).
pub async fn delete_book(pool: &SqlitePool, book_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM books WHERE id = ?")
        .bind(book_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(LibraryError::not_found(format!("book {}", book_id)));
    }

    info!(book_id, "book deleted");
    Ok(())
}

/// Find book by id
pub async fn find_book_by_id(pool: &SqlitePool, book_id: i64) -> Result<Option<Book>> {
    let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = ?")
        .bind(book_id)
        .fetch_optional(pool)
        .await?;

    Ok(book)
}

/// Find book by ISBN (hyphens ignored)
pub async fn find_book_by_isbn(pool: &SqlitePool, isbn: &str) -> Result<Option<Book>> {
    let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE isbn = ?")
        .bind(isbn.replace('-', ""))
        .fetch_optional(pool)
        .await?;

    Ok(book)
}

/// List all books ordered by title
pub async fn list_books(pool: &SqlitePool) -> Result<Vec<Book>> {
    let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY title")
        .fetch_all(pool)
        .await?;

    Ok(books)
}

/// Search books by partial title match
pub async fn search_books_by_title(pool: &SqlitePool, title: &str) -> Result<Vec<Book>> {
    let pattern = format!("%{}%", title);
    let books =
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE title LIKE ? ORDER BY title")
            .bind(&pattern)
            .fetch_all(pool)
            .await?;

    Ok(books)
}

/// Search books by partial author match
pub async fn search_books_by_author(pool: &SqlitePool, author: &str) -> Result<Vec<Book>> {
    let pattern = format!("%{}%", author);
    let books =
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE author LIKE ? ORDER BY title")
            .bind(&pattern)
            .fetch_all(pool)
            .await?;

    Ok(books)
}

/// List books in an exact category
pub async fn list_books_by_category(pool: &SqlitePool, category: &str) -> Result<Vec<Book>> {
    let books =
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE category = ? ORDER BY title")
            .bind(category)
            .fetch_all(pool)
            .await?;

    Ok(books)
}

/// List books with two or fewer copies left, scarcest first
pub async fn list_low_stock_books(pool: &SqlitePool) -> Result<Vec<Book>> {
    let books = sqlx::query_as::<_, Book>(
        "SELECT * FROM books WHERE stock <= 2 ORDER BY stock, title",
    )
    .fetch_all(pool)
    .await?;

    Ok(books)
}

/// Distinct categories in the catalog
pub async fn list_categories(pool: &SqlitePool) -> Result<Vec<String>> {
    let categories: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT category FROM books WHERE category != '' ORDER BY category",
    )
    .fetch_all(pool)
    .await?;

    Ok(categories)
}

/// Check whether an ISBN is already taken, optionally excluding one book id
/// (the row being edited, so a book does not collide with itself on update)
pub async fn isbn_exists(
    pool: &SqlitePool,
    isbn: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE isbn = ? AND id != ?")
            .bind(isbn.replace('-', ""))
            .bind(exclude_id.unwrap_or(-1))
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

/// Count all books in the catalog
pub async fn count_books(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::Database;

    fn sample_book(isbn: &str) -> NewBook {
        NewBook {
            title: "The Name of the Rose".to_string(),
            author: "Umberto Eco".to_string(),
            category: "Mystery".to_string(),
            stock: 3,
            publication_year: 1980,
            isbn: isbn.to_string(),
            publisher: "Bompiani".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_book() {
        let db = Database::new_in_memory().await.unwrap();

        let book_id = insert_book(db.pool(), &sample_book("9788845203435"))
            .await
            .expect("Failed to insert book");
        assert!(book_id > 0);

        let found = find_book_by_id(db.pool(), book_id)
            .await
            .unwrap()
            .expect("Book not found");
        assert_eq!(found.title, "The Name of the Rose");
        assert_eq!(found.stock, 3);
        assert!(found.is_available());

        let by_isbn = find_book_by_isbn(db.pool(), "978-88-452-0343-5")
            .await
            .unwrap();
        assert_eq!(by_isbn.unwrap().id, book_id);
    }

    #[tokio::test]
    async fn test_duplicate_isbn_rejected() {
        let db = Database::new_in_memory().await.unwrap();

        insert_book(db.pool(), &sample_book("9788845203435"))
            .await
            .unwrap();

        let err = insert_book(db.pool(), &sample_book("9788845203435"))
            .await
            .expect_err("Duplicate ISBN must be rejected");
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_isbn_check_excludes_own_row_on_update() {
        let db = Database::new_in_memory().await.unwrap();

        let book_id = insert_book(db.pool(), &sample_book("9788845203435"))
            .await
            .unwrap();

        // Updating a book without changing its ISBN must not self-conflict
        let mut book = find_book_by_id(db.pool(), book_id).await.unwrap().unwrap();
        book.stock = 5;
        update_book(db.pool(), &book).await.expect("Update failed");

        // But stealing another book's ISBN must conflict
        let other_id = insert_book(db.pool(), &sample_book("9780156001311"))
            .await
            .unwrap();
        let mut other = find_book_by_id(db.pool(), other_id).await.unwrap().unwrap();
        other.isbn = "9788845203435".to_string();
        let err = update_book(db.pool(), &other).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_search_and_categories() {
        let db = Database::new_in_memory().await.unwrap();

        insert_book(db.pool(), &sample_book("9788845203435"))
            .await
            .unwrap();
        let mut second = sample_book("9780156001311");
        second.title = "Foucault's Pendulum".to_string();
        second.category = "Fiction".to_string();
        insert_book(db.pool(), &second).await.unwrap();

        let by_title = search_books_by_title(db.pool(), "rose").await.unwrap();
        assert_eq!(by_title.len(), 1);

        let by_author = search_books_by_author(db.pool(), "eco").await.unwrap();
        assert_eq!(by_author.len(), 2);

        let categories = list_categories(db.pool()).await.unwrap();
        assert_eq!(categories, vec!["Fiction", "Mystery"]);

        assert_eq!(count_books(db.pool()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_low_stock_listing() {
        let db = Database::new_in_memory().await.unwrap();

        let mut scarce = sample_book("9788845203435");
        scarce.stock = 1;
        insert_book(db.pool(), &scarce).await.unwrap();

        let mut plentiful = sample_book("9780156001311");
        plentiful.stock = 10;
        insert_book(db.pool(), &plentiful).await.unwrap();

        let low = list_low_stock_books(db.pool()).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].stock, 1);
    }

    #[tokio::test]
    async fn test_delete_missing_book_is_not_found() {
        let db = Database::new_in_memory().await.unwrap();

        let err = delete_book(db.pool(), 999).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
