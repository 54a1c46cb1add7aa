// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use farm_ledger::config::Config;
use farm_ledger::db::{Db, FirestoreDb};
use farm_ledger::middleware::auth::create_jwt;
use farm_ledger::models::{User, UserRole};
use farm_ledger::routes::create_router;
use farm_ledger::services::auth::seed_demo_users;
use farm_ledger::AppState;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app over the in-memory store, with the demo users seeded.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default()).await
}

#[allow(dead_code)]
pub async fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let db = Db::in_memory();
    seed_demo_users(&db)
        .await
        .expect("seed demo users");

    let state = Arc::new(AppState::new(config, db).expect("built-in templates"));
    (create_router(state.clone()), state)
}

/// Session token for one of the seeded demo users (`admin` or `field`).
#[allow(dead_code)]
pub fn demo_token(state: &AppState, username: &str) -> String {
    let user = User {
        id: format!("user_{}", username),
        username: username.to_string(),
        password_hash: String::new(),
        role: if username == "admin" {
            UserRole::Admin
        } else {
            UserRole::FieldOfficer
        },
        allowed_modules: if username == "admin" {
            vec!["all".to_string()]
        } else {
            vec!["service".to_string(), "ledger".to_string()]
        },
    };
    create_jwt(&user, &state.config.jwt_signing_key).expect("create jwt")
}

/// Send one request with a bearer token and optional JSON body.
#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
