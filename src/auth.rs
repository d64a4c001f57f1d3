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


//! Password hashing and credential checks
//!
//! Stored format is `hex(salt)$hex(sha256(salt || password))` with a random
//! 16-byte salt per password. Verification re-derives the digest and compares
//! in constant time.

use crate::error::{LibraryError, Result};
use crate::storage::models::User;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::{info, warn};

const SALT_LEN: usize = 16;

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();

    format!("{}${}", hex::encode(salt), hex::encode(digest))
}

/// Check a password against a stored `salt$digest` hash
///
/// Returns false for malformed stored hashes rather than erroring; a
/// corrupted hash should never let anyone in.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    let Ok(expected) = hex::decode(digest_hex) else {
        return false;
    };

    let mut hasher = Sha256::new();
    hasher.update(&salt);
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();

    constant_time_eq(&digest, &expected)
}

/// Compare two byte slices without short-circuiting on the first mismatch
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Authenticate by username and password
///
/// Only active accounts may log in. Unknown username, wrong password and
/// deactivated account all collapse into `AuthenticationFailed` so callers
/// cannot probe which usernames exist.
pub async fn authenticate(pool: &SqlitePool, username: &str, password: &str) -> Result<User> {
    let user = crate::storage::users::find_user_by_username(pool, username).await?;

    let Some(user) = user else {
        warn!(username, "login attempt for unknown username");
        return Err(LibraryError::AuthenticationFailed);
    };

    if !user.is_active {
        warn!(username, "login attempt for deactivated account");
        return Err(LibraryError::AuthenticationFailed);
    }

    if !verify_password(password, &user.password_hash) {
        warn!(username, "login attempt with wrong password");
        return Err(LibraryError::AuthenticationFailed);
    }

    info!(username, role = %user.role, "login succeeded");
    Ok(user)
}
