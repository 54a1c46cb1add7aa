// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password checks and account seeding.
//!
//! Stored hashes are Argon2id PHC strings with a random salt per password,
//! so the algorithm parameters travel with the hash.

use crate::db::{Db, FieldFilter};
use crate::error::AppError;
use crate::models::user::{modules, ALL_MODULES};
use crate::models::{User, UserRole};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Hash a password with Argon2id and a fresh salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC hash. An unparsable hash never
/// matches.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        tracing::warn!("Stored password hash is not a PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub async fn find_user(db: &Db, username: &str) -> Result<Option<User>, AppError> {
    let users = db
        .repo::<User>()
        .list_where(&[FieldFilter::eq("username", username)])
        .await?;
    Ok(users.into_iter().next())
}

/// Check credentials. `None` for an unknown user or a wrong password.
pub async fn authenticate(
    db: &Db,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    let Some(user) = find_user(db, username.trim()).await? else {
        return Ok(None);
    };

    let password = password.to_string();
    let stored_hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password check panicked: {}", e)))?;

    Ok(matches.then_some(user))
}

/// Create the demo accounts if no user exists yet. Returns how many were
/// created.
pub async fn seed_demo_users(db: &Db) -> Result<usize, AppError> {
    let repo = db.repo::<User>();
    if !repo.list().await?.is_empty() {
        return Ok(0);
    }

    let demo = [
        ("admin", "admin", UserRole::Admin, vec![ALL_MODULES]),
        (
            "field",
            "123",
            UserRole::FieldOfficer,
            vec![modules::SERVICE, modules::LEDGER],
        ),
    ];

    for (username, password, role, allowed) in &demo {
        repo.put(&User {
            id: format!("user_{}", username),
            username: username.to_string(),
            password_hash: hash_password(password)?,
            role: *role,
            allowed_modules: allowed.iter().map(|m| m.to_string()).collect(),
        })
        .await?;
    }

    tracing::info!(count = demo.len(), "Seeded demo users");
    Ok(demo.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("secret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("secret", &hash));
        assert!(!verify_password("Secret", &hash));
        assert!(!verify_password("secret", "not-a-phc-string"));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let first = hash_password("123").unwrap();
        let second = hash_password("123").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("123", &first));
        assert!(verify_password("123", &second));
    }

    #[tokio::test]
    async fn test_seed_then_authenticate() {
        let db = Db::in_memory();
        assert_eq!(seed_demo_users(&db).await.unwrap(), 2);
        assert_eq!(seed_demo_users(&db).await.unwrap(), 0);

        let admin = authenticate(&db, "admin", "admin")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert!(admin.can_access("bycell"));

        let field = authenticate(&db, " field ", "123")
            .await
            .unwrap()
            .unwrap();
        assert!(!field.can_access("bycell"));

        assert!(authenticate(&db, "admin", "wrong")
            .await
            .unwrap()
            .is_none());
        assert!(authenticate(&db, "nobody", "x")
            .await
            .unwrap()
            .is_none());
    }
}
