// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use farm_ledger::error::AppError;
use farm_ledger::services::WorkingSetError;

async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_client_errors_carry_details() {
    let (status, body) = body_json(AppError::NotFound("farmer f1".to_string())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["details"], "farmer f1");

    let (status, body) = body_json(AppError::Forbidden("no access to bycell".to_string())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_server_errors_hide_details() {
    let (status, body) = body_json(AppError::Database("connection reset".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());

    let (status, body) = body_json(AppError::Internal(anyhow::anyhow!("boom"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("details").is_none());
}

#[test]
fn test_working_set_errors_map_to_client_errors() {
    let err: AppError = WorkingSetError::RecordNotFound("CA_p1_9".to_string()).into();
    assert!(matches!(err, AppError::NotFound(_)));

    let err: AppError = WorkingSetError::InvalidDate("tomorrow".to_string()).into();
    assert!(matches!(err, AppError::BadRequest(_)));
}
