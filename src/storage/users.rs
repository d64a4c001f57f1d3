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


//! User account queries
//!
//! Repository functions for the `users` table. Username and email uniqueness
//! is checked across active AND inactive users, with the row's own id
//! excluded on update, and is backed by UNIQUE constraints.
//!
//! Passwords are hashed at insert/update time; authentication lives in
//! [`crate::auth`].

use crate::auth;
use crate::error::{LibraryError, Result};
use crate::storage::models::{NewUser, User, UserRole};
use chrono::Local;
use sqlx::SqlitePool;
use tracing::info;

/// Insert a new user
///
/// The plaintext password in `NewUser` is hashed before it reaches storage.
/// Fails with `Conflict` when the username or email is taken.
pub async fn insert_user(pool: &SqlitePool, user: &NewUser) -> Result<i64> {
    if username_exists(pool, &user.username, None).await? {
        return Err(LibraryError::conflict(format!(
            "username '{}' is already taken",
            user.username
        )));
    }
    if email_exists(pool, &user.email, None).await? {
        return Err(LibraryError::conflict(format!(
            "email '{}' is already registered",
            user.email
        )));
    }

    let password_hash = auth::hash_password(&user.password);

    let result = sqlx::query(
        r#"
        INSERT INTO users (
            first_name, last_name, role, email, phone, address,
            registered_on, username, password_hash, is_active
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1)
        "#,
    )
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(user.role.as_str())
    .bind(&user.email)
    .bind(&user.phone)
    .bind(&user.address)
    .bind(Local::now().date_naive())
    .bind(&user.username)
    .bind(&password_hash)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    info!(user_id = id, username = %user.username, "user registered");
    Ok(id)
}

/// Update an existing user
///
/// `user.password_hash` is written as-is; use [`change_password`] to set a
/// new password from plaintext.
pub async fn update_user(pool: &SqlitePool, user: &User) -> Result<()> {
    if username_exists(pool, &user.username, Some(user.id)).await? {
        return Err(LibraryError::conflict(format!(
            "username '{}' is already taken",
            user.username
        )));
    }
    if email_exists(pool, &user.email, Some(user.id)).await? {
        return Err(LibraryError::conflict(format!(
            "email '{}' is already registered",
            user.email
        )));
    }

    let result = sqlx::query(
        r#"
        UPDATE users SET
            first_name = ?, last_name = ?, role = ?, email = ?,
            phone = ?, address = ?, username = ?, password_hash = ?, is_active = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.role)
    .bind(&user.email)
    .bind(&user.phone)
    .bind(&user.address)
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(user.is_active)
    .bind(user.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(LibraryError::not_found(format!("user {}", user.id)));
    }

    info!(user_id = user.id, "user updated");
    Ok(())
}

/// Delete a user
///
/// Refused with `Conflict` while loan history references them (RESTRICT FK);
/// prefer [`set_user_active`] for members who should merely lose access.
pub async fn delete_user(pool: &SqlitePool, user_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(LibraryError::not_found(format!("user {}", user_id)));
    }

    info!(user_id, "user deleted");
    Ok(())
}

/// Find user by id
pub async fn find_user_by_id(pool: &SqlitePool, user_id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Find user by username (active or not)
pub async fn find_user_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// List all users ordered by name
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let users =
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY first_name, last_name")
            .fetch_all(pool)
            .await?;

    Ok(users)
}

/// Search users by partial first or last name match
pub async fn search_users_by_name(pool: &SqlitePool, text: &str) -> Result<Vec<User>> {
    let pattern = format!("%{}%", text);
    let users = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE first_name LIKE ? OR last_name LIKE ? ORDER BY first_name, last_name",
    )
    .bind(&pattern)
    .bind(&pattern)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// List users with a given role
pub async fn list_users_by_role(pool: &SqlitePool, role: UserRole) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE role = ? ORDER BY first_name, last_name",
    )
    .bind(role.as_str())
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Activate or deactivate a user without deleting their history
pub async fn set_user_active(pool: &SqlitePool, user_id: i64, active: bool) -> Result<()> {
    let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
        .bind(active)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(LibraryError::not_found(format!("user {}", user_id)));
    }

    info!(user_id, active, "user active flag changed");
    Ok(())
}

/// Replace a user's password with the hash of `new_password`
pub async fn change_password(
    pool: &SqlitePool,
    user_id: i64,
    new_password: &str,
) -> Result<()> {
    let password_hash = auth::hash_password(new_password);

    let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(&password_hash)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(LibraryError::not_found(format!("user {}", user_id)));
    }

    info!(user_id, "password changed");
    Ok(())
}

/// Check whether a username is taken, optionally excluding one user id
pub async fn username_exists(
    pool: &SqlitePool,
    username: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ? AND id != ?")
            .bind(username)
            .bind(exclude_id.unwrap_or(-1))
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

/// Check whether an email is registered, optionally excluding one user id
///
/// Email is an optional field; an empty string never counts as taken.
pub async fn email_exists(
    pool: &SqlitePool,
    email: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    if email.is_empty() {
        return Ok(false);
    }
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ? AND id != ?")
            .bind(email)
            .bind(exclude_id.unwrap_or(-1))
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

/// Count users whose active flag is set
pub async fn count_active_users(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active = 1")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
