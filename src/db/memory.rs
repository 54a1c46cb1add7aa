// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory document store.
//!
//! Each collection is a sorted map guarded by its own shard lock, so a
//! `replace_where` on one collection is atomic with respect to every other
//! operation on it.

use super::{DocumentStore, FieldFilter};
use crate::error::AppError;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Default)]
pub struct MemoryStore {
    collections: DashMap<String, BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id).cloned()))
    }

    async fn list(
        &self,
        collection: &str,
        filters: &[FieldFilter],
    ) -> Result<Vec<Value>, AppError> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .values()
            .filter(|doc| filters.iter().all(|f| f.matches(doc)))
            .cloned()
            .collect())
    }

    async fn put(&self, collection: &str, id: &str, doc: Value) -> Result<(), AppError> {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        if let Some(mut docs) = self.collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn replace_where(
        &self,
        collection: &str,
        filter: &FieldFilter,
        docs: Vec<(String, Value)>,
    ) -> Result<(), AppError> {
        let mut stored = self.collections.entry(collection.to_string()).or_default();
        stored.retain(|_, doc| !filter.matches(doc));
        for (id, doc) in docs {
            stored.insert(id, doc);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        store.put("c", "a", json!({"id": "a"})).await.unwrap();

        assert_eq!(store.get("c", "a").await.unwrap(), Some(json!({"id": "a"})));
        assert_eq!(store.get("c", "b").await.unwrap(), None);
        assert_eq!(store.get("other", "a").await.unwrap(), None);

        store.delete("c", "a").await.unwrap();
        store.delete("c", "a").await.unwrap();
        assert_eq!(store.count("c"), 0);
    }

    #[tokio::test]
    async fn test_replace_where_only_touches_matching() {
        let store = MemoryStore::new();
        store
            .put("c", "p1_0", json!({"id": "p1_0", "parent_id": "p1"}))
            .await
            .unwrap();
        store
            .put("c", "p1_1", json!({"id": "p1_1", "parent_id": "p1"}))
            .await
            .unwrap();
        store
            .put("c", "p2_0", json!({"id": "p2_0", "parent_id": "p2"}))
            .await
            .unwrap();

        store
            .replace_where(
                "c",
                &FieldFilter::eq("parent_id", "p1"),
                vec![("p1_9".to_string(), json!({"id": "p1_9", "parent_id": "p1"}))],
            )
            .await
            .unwrap();

        let p1 = store
            .list("c", &[FieldFilter::eq("parent_id", "p1")])
            .await
            .unwrap();
        assert_eq!(p1, vec![json!({"id": "p1_9", "parent_id": "p1"})]);
        assert_eq!(store.count("c"), 2);
    }
}
