// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication tests.
//!
//! These tests verify that JWT tokens created on login can be decoded with
//! the claims layout the auth middleware expects.

use farm_ledger::middleware::auth::{create_jwt, SESSION_TTL_SECS};
use farm_ledger::models::{User, UserRole};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims structure that must match what the middleware expects.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    username: String,
    role: String,
    modules: Vec<String>,
    exp: usize,
    iat: usize,
}

fn field_officer() -> User {
    User {
        id: "user_field".to_string(),
        username: "field".to_string(),
        password_hash: "ignored".to_string(),
        role: UserRole::FieldOfficer,
        allowed_modules: vec!["service".to_string(), "ledger".to_string()],
    }
}

#[test]
fn test_jwt_roundtrip() {
    let signing_key = b"test_signing_key_32_bytes_long!!";

    let token = create_jwt(&field_officer(), signing_key).expect("Failed to create JWT");

    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);
    let token_data = decode::<Claims>(&token, &key, &validation).expect("Failed to decode JWT");

    assert_eq!(token_data.claims.sub, "user_field");
    assert_eq!(token_data.claims.username, "field");
    assert_eq!(token_data.claims.role, "FIELD_OFFICER");
    assert_eq!(token_data.claims.modules, vec!["service", "ledger"]);
    assert_eq!(
        token_data.claims.exp - token_data.claims.iat,
        SESSION_TTL_SECS
    );
}

#[test]
fn test_jwt_wrong_key_fails() {
    let token = create_jwt(&field_officer(), b"correct_key_32_bytes_long_here!!").unwrap();

    let key = DecodingKey::from_secret(b"wrong_key_32_bytes_long_here!!!!");
    let validation = Validation::new(Algorithm::HS256);

    assert!(decode::<Claims>(&token, &key, &validation).is_err());
}

#[test]
fn test_jwt_carries_no_password_hash() {
    let token = create_jwt(&field_officer(), b"test_signing_key_32_bytes_long!!").unwrap();

    let payload = token.split('.').nth(1).unwrap();
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    let json = String::from_utf8(URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
    assert!(!json.contains("ignored"));
    assert!(!json.contains("password"));
}
