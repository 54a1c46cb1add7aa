// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed document store.
//!
//! Documents are written as plain JSON objects. Document ids are
//! percent-encoded so that free-text ids never contain a path separator.

use super::{DocumentStore, FieldFilter};
use crate::error::AppError;
use async_trait::async_trait;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashSet;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator takes an unauthenticated connection
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. Every operation returns an error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }
}

fn doc_id(id: &str) -> Cow<'_, str> {
    urlencoding::encode(id)
}

fn stored_id(doc: &Value) -> Option<&str> {
    doc.get("id").and_then(Value::as_str)
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj::<Value>()
            .one(doc_id(id).as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list(
        &self,
        collection: &str,
        filters: &[FieldFilter],
    ) -> Result<Vec<Value>, AppError> {
        let filters = filters.to_vec();
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| {
                q.for_all(
                    filters
                        .iter()
                        .map(|f| q.field(f.field.as_str()).eq(f.value.clone())),
                )
            })
            .obj::<Value>()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn put(&self, collection: &str, id: &str, doc: Value) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(doc_id(id).as_ref())
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(doc_id(id).as_ref())
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Deletes the stale documents and writes the new set in one
    /// transaction. Documents kept across the replace are written once,
    /// never deleted and re-created in the same commit.
    async fn replace_where(
        &self,
        collection: &str,
        filter: &FieldFilter,
        docs: Vec<(String, Value)>,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        let existing = self.list(collection, std::slice::from_ref(filter)).await?;
        let keep: HashSet<&str> = docs.iter().map(|(id, _)| id.as_str()).collect();
        let stale: Vec<&str> = existing
            .iter()
            .filter_map(stored_id)
            .filter(|id| !keep.contains(id))
            .collect();

        let writes = stale.len() + docs.len();
        if writes > BATCH_SIZE {
            return Err(AppError::Database(format!(
                "Replace of {} documents in {} exceeds the transaction limit",
                writes, collection
            )));
        }

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for id in &stale {
            client
                .fluent()
                .delete()
                .from(collection)
                .document_id(doc_id(id).as_ref())
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!(
                        "Failed to add deletion to transaction for {}: {}",
                        collection, e
                    ))
                })?;
        }

        for (id, doc) in &docs {
            client
                .fluent()
                .update()
                .in_col(collection)
                .document_id(doc_id(id).as_ref())
                .object(doc)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!(
                        "Failed to add write to transaction for {}: {}",
                        collection, e
                    ))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(
            collection,
            deleted = stale.len(),
            written = docs.len(),
            "Replaced documents atomically"
        );
        Ok(())
    }
}
