// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity record storage for one schedule kind.

use super::{decode, encode, DocumentStore, FieldFilter};
use crate::error::AppError;
use crate::models::{ActivityRecord, ScheduleKind};
use futures_util::{stream, StreamExt};
use std::sync::Arc;

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Field linking a record to its plantation or dose application.
const PARENT_FIELD: &str = "parent_id";

#[derive(Clone)]
pub struct RecordRepository {
    store: Arc<dyn DocumentStore>,
    kind: ScheduleKind,
}

impl RecordRepository {
    pub fn new(store: Arc<dyn DocumentStore>, kind: ScheduleKind) -> Self {
        Self { store, kind }
    }

    pub fn kind(&self) -> ScheduleKind {
        self.kind
    }

    fn collection(&self) -> &'static str {
        self.kind.collection()
    }

    /// Stored records of a parent, in no particular order.
    pub async fn list_records(&self, parent_id: &str) -> Result<Vec<ActivityRecord>, AppError> {
        let docs = self
            .store
            .list(self.collection(), &[FieldFilter::eq(PARENT_FIELD, parent_id)])
            .await?;
        Ok(docs
            .into_iter()
            .filter_map(|doc| decode(self.collection(), doc))
            .collect())
    }

    /// Make `records` the complete stored set for `parent_id`.
    pub async fn replace_all_records(
        &self,
        parent_id: &str,
        records: &[ActivityRecord],
    ) -> Result<(), AppError> {
        let docs = records
            .iter()
            .map(|record| {
                check_parent(record, parent_id)?;
                Ok((record.id.clone(), encode(record)?))
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        self.store
            .replace_where(
                self.collection(),
                &FieldFilter::eq(PARENT_FIELD, parent_id),
                docs,
            )
            .await?;

        tracing::debug!(
            kind = %self.kind,
            parent_id,
            count = records.len(),
            "Replaced activity records"
        );
        Ok(())
    }

    pub async fn upsert_record(&self, record: &ActivityRecord) -> Result<(), AppError> {
        check_keys(record)?;
        self.store
            .put(self.collection(), &record.id, encode(record)?)
            .await
    }

    /// Upsert every record, a bounded number at a time.
    pub async fn upsert_records(&self, records: &[ActivityRecord]) -> Result<(), AppError> {
        let docs = records
            .iter()
            .map(|record| {
                check_keys(record)?;
                Ok((record.id.clone(), encode(record)?))
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        let collection = self.collection();
        let store = self.store.clone();
        stream::iter(docs)
            .map(|(id, doc)| {
                let store = store.clone();
                async move { store.put(collection, &id, doc).await }
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        tracing::debug!(kind = %self.kind, count = records.len(), "Upserted activity records");
        Ok(())
    }

    pub async fn delete_record(&self, record_id: &str) -> Result<(), AppError> {
        self.store.delete(self.collection(), record_id).await
    }

    /// Remove every stored record of a parent. Returns how many were removed.
    pub async fn delete_records(&self, parent_id: &str) -> Result<usize, AppError> {
        let filter = FieldFilter::eq(PARENT_FIELD, parent_id);
        let count = self.store.list(self.collection(), &[filter.clone()]).await?.len();
        self.store
            .replace_where(self.collection(), &filter, Vec::new())
            .await?;

        tracing::debug!(kind = %self.kind, parent_id, count, "Deleted activity records");
        Ok(count)
    }
}

fn check_keys(record: &ActivityRecord) -> Result<(), AppError> {
    if record.id.is_empty() || record.parent_id.is_empty() {
        return Err(AppError::BadRequest(
            "Activity record needs an id and a parent".to_string(),
        ));
    }
    Ok(())
}

fn check_parent(record: &ActivityRecord, parent_id: &str) -> Result<(), AppError> {
    if record.parent_id != parent_id {
        return Err(AppError::BadRequest(format!(
            "Record {} belongs to {}, not {}",
            record.id, record.parent_id, parent_id
        )));
    }
    Ok(())
}
