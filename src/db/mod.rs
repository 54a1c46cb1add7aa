// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Documents are stored as JSON objects in named collections. The
//! [`DocumentStore`] trait is implemented by Firestore for deployments and by
//! an in-memory store for local runs and tests. Typed access goes through
//! [`Repository`] and, for activity records, [`RecordRepository`].

pub mod firestore;
pub mod memory;
pub mod records;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;
pub use records::RecordRepository;

use crate::error::AppError;
use crate::models::ScheduleKind;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const FARMERS: &str = "farmers";
    pub const PLANTATIONS: &str = "plantations";
    /// Bycell dose application headers (one per farmer)
    pub const DOSE_APPLICATIONS: &str = "dose_applications";
    /// Crop activity records, keyed `CA_<plantation>_<n>`
    pub const CROP_ACTIVITIES: &str = "crop_activities";
    /// Dose activity records, keyed `BA_<dose application>_<n>`
    pub const DOSE_ACTIVITIES: &str = "dose_activities";
    pub const SOIL_TESTS: &str = "soil_tests";
    pub const PRODUCTS: &str = "products";
    pub const SALES: &str = "sales";
    pub const EXPENDITURES: &str = "expenditures";
}

/// Equality condition on a top-level string field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: String,
    pub value: String,
}

impl FieldFilter {
    pub fn eq(field: &str, value: &str) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// Whether a stored document satisfies this filter.
    pub fn matches(&self, doc: &Value) -> bool {
        doc.get(&self.field).and_then(Value::as_str) == Some(self.value.as_str())
    }
}

/// Key-value document storage, one namespace per collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError>;

    /// Every document of the collection matching all filters.
    async fn list(&self, collection: &str, filters: &[FieldFilter])
        -> Result<Vec<Value>, AppError>;

    /// Create or overwrite a document.
    async fn put(&self, collection: &str, id: &str, doc: Value) -> Result<(), AppError>;

    /// Delete a document. Deleting a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError>;

    /// Atomically make `docs` the complete set of documents matching
    /// `filter`: matching documents absent from `docs` are removed, the rest
    /// are written. Either every change lands or none does.
    async fn replace_where(
        &self,
        collection: &str,
        filter: &FieldFilter,
        docs: Vec<(String, Value)>,
    ) -> Result<(), AppError>;
}

/// A model stored as one document in a fixed collection.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
}

/// Typed view over one collection.
pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    pub async fn get(&self, id: &str) -> Result<Option<T>, AppError> {
        match self.store.get(T::COLLECTION, id).await? {
            Some(doc) => Ok(decode(T::COLLECTION, doc)),
            None => Ok(None),
        }
    }

    /// Every document of the collection. Documents that fail to decode are
    /// skipped with a warning.
    pub async fn list(&self) -> Result<Vec<T>, AppError> {
        self.list_where(&[]).await
    }

    pub async fn list_where(&self, filters: &[FieldFilter]) -> Result<Vec<T>, AppError> {
        let docs = self.store.list(T::COLLECTION, filters).await?;
        Ok(docs
            .into_iter()
            .filter_map(|doc| decode(T::COLLECTION, doc))
            .collect())
    }

    pub async fn put(&self, item: &T) -> Result<(), AppError> {
        let doc = encode(item)?;
        self.store.put(T::COLLECTION, item.id(), doc).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.store.delete(T::COLLECTION, id).await
    }
}

pub(crate) fn encode<T: Serialize>(item: &T) -> Result<Value, AppError> {
    serde_json::to_value(item)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode document: {}", e)))
}

pub(crate) fn decode<T: DeserializeOwned>(collection: &str, doc: Value) -> Option<T> {
    let id = doc
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    match serde_json::from_value(doc) {
        Ok(item) => Some(item),
        Err(e) => {
            tracing::warn!(collection, id = %id, error = %e, "Skipping malformed document");
            None
        }
    }
}

/// Handle to the configured document store.
#[derive(Clone)]
pub struct Db {
    store: Arc<dyn DocumentStore>,
}

impl Db {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Process-local store, empty at start.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    pub fn repo<T: Document>(&self) -> Repository<T> {
        Repository::new(self.store.clone())
    }

    /// Activity records of one schedule kind.
    pub fn records(&self, kind: ScheduleKind) -> RecordRepository {
        RecordRepository::new(self.store.clone(), kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Farmer;

    #[test]
    fn test_field_filter_matches_strings_only() {
        let filter = FieldFilter::eq("farmer_id", "f1");
        assert!(filter.matches(&serde_json::json!({"farmer_id": "f1"})));
        assert!(!filter.matches(&serde_json::json!({"farmer_id": "f2"})));
        assert!(!filter.matches(&serde_json::json!({"farmer_id": 1})));
        assert!(!filter.matches(&serde_json::json!({})));
    }

    #[tokio::test]
    async fn test_repository_skips_malformed() {
        let db = Db::in_memory();
        let store = db.store();
        store
            .put(
                collections::FARMERS,
                "good",
                serde_json::json!({"id": "good", "name": "Ravi"}),
            )
            .await
            .unwrap();
        store
            .put(
                collections::FARMERS,
                "bad",
                serde_json::json!({"id": "bad", "name": 42}),
            )
            .await
            .unwrap();

        let farmers = db.repo::<Farmer>().list().await.unwrap();

        assert_eq!(farmers.len(), 1);
        assert_eq!(farmers[0].name, "Ravi");
        assert!(db.repo::<Farmer>().get("bad").await.unwrap().is_none());
    }
}
