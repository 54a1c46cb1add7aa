// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user working-set sessions and their commit to storage.
//!
//! Each user holds at most one working copy per `(kind, parent)`. Opening a
//! parent reloads it from storage; edits stay in the copy until commit. A
//! failed commit leaves the copy in place so it can be retried.
//!
//! Copies untouched for longer than the idle TTL are evicted, whether or not
//! they were committed. Eviction runs on every open and from a periodic sweep.

use crate::db::Db;
use crate::error::AppError;
use crate::models::activity::WritePolicy;
use crate::models::{DoseApplication, Farmer, Plantation, ScheduleKind};
use crate::services::schedule::ScheduleSynthesizer;
use crate::services::working_set::{FieldEdit, WorkingSet, WorkingSetError};
use crate::time_utils::{format_date, local_now};
use chrono::NaiveDate;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Default time an untouched working set stays open.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(8 * 60 * 60);

/// How often the server sweeps idle working sets.
pub const IDLE_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SessionKey {
    user_id: String,
    kind: ScheduleKind,
    parent_id: String,
}

impl SessionKey {
    fn new(user_id: &str, kind: ScheduleKind, parent_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind,
            parent_id: parent_id.to_string(),
        }
    }
}

impl From<WorkingSetError> for AppError {
    fn from(err: WorkingSetError) -> Self {
        match err {
            WorkingSetError::RecordNotFound(_) => AppError::NotFound(err.to_string()),
            _ => AppError::BadRequest(err.to_string()),
        }
    }
}

/// A working set and when its owner last used it.
struct OpenSession {
    ws: WorkingSet,
    touched: Instant,
}

impl OpenSession {
    fn new(ws: WorkingSet) -> Self {
        Self {
            ws,
            touched: Instant::now(),
        }
    }
}

/// Parent context a schedule is opened with.
struct ParentContext {
    acreage: String,
    start_date: Option<NaiveDate>,
}

/// Owns the synthesizers and every open working set.
pub struct ScheduleService {
    db: Db,
    crop: ScheduleSynthesizer,
    dose: ScheduleSynthesizer,
    sessions: DashMap<SessionKey, OpenSession>,
    max_photo_bytes: usize,
    idle_ttl: Duration,
}

impl ScheduleService {
    pub fn new(
        db: Db,
        crop: ScheduleSynthesizer,
        dose: ScheduleSynthesizer,
        max_photo_bytes: usize,
    ) -> Self {
        Self {
            db,
            crop,
            dose,
            sessions: DashMap::new(),
            max_photo_bytes,
            idle_ttl: DEFAULT_IDLE_TTL,
        }
    }

    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    pub fn synthesizer(&self, kind: ScheduleKind) -> &ScheduleSynthesizer {
        match kind {
            ScheduleKind::Crop => &self.crop,
            ScheduleKind::Dose => &self.dose,
        }
    }

    /// Number of open working sets across all users.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Open (or reopen) a parent's schedule for `user_id`, replacing any
    /// uncommitted copy. `acreage` overrides the parent's stored acreage.
    pub async fn get_working_set(
        &self,
        user_id: &str,
        kind: ScheduleKind,
        parent_id: &str,
        acreage: Option<&str>,
    ) -> Result<WorkingSet, AppError> {
        let parent = self.load_parent(kind, parent_id).await?;
        let acreage = acreage.unwrap_or(&parent.acreage);
        let persisted = self.db.records(kind).list_records(parent_id).await?;

        let ws = WorkingSet::open(
            self.synthesizer(kind),
            parent_id,
            &persisted,
            acreage,
            parent.start_date,
        );

        tracing::debug!(
            user_id,
            kind = %kind,
            parent_id,
            persisted = persisted.len(),
            records = ws.records.len(),
            "Opened working set"
        );

        self.evict_idle(Instant::now());
        self.sessions.insert(
            SessionKey::new(user_id, kind, parent_id),
            OpenSession::new(ws.clone()),
        );
        Ok(ws)
    }

    pub fn set_field_value(
        &self,
        user_id: &str,
        kind: ScheduleKind,
        parent_id: &str,
        record_id: &str,
        edit: FieldEdit,
    ) -> Result<WorkingSet, AppError> {
        self.with_session(user_id, kind, parent_id, |ws| {
            ws.set_field_value(
                self.synthesizer(kind),
                record_id,
                edit,
                local_now(),
                self.max_photo_bytes,
            )
        })
    }

    pub fn set_acreage(
        &self,
        user_id: &str,
        kind: ScheduleKind,
        parent_id: &str,
        acreage: &str,
    ) -> Result<WorkingSet, AppError> {
        self.with_session(user_id, kind, parent_id, |ws| {
            ws.set_acreage(self.synthesizer(kind), acreage);
            Ok(())
        })
    }

    pub fn add_row(
        &self,
        user_id: &str,
        kind: ScheduleKind,
        parent_id: &str,
        day_offset: Option<i64>,
    ) -> Result<WorkingSet, AppError> {
        self.with_session(user_id, kind, parent_id, |ws| {
            ws.add_row(day_offset);
            Ok(())
        })
    }

    pub fn remove_row(
        &self,
        user_id: &str,
        kind: ScheduleKind,
        parent_id: &str,
        record_id: &str,
    ) -> Result<WorkingSet, AppError> {
        self.with_session(user_id, kind, parent_id, |ws| {
            ws.remove_row(record_id).map(|_| ())
        })
    }

    /// Write the working copy with the kind's write policy.
    pub async fn commit(
        &self,
        user_id: &str,
        kind: ScheduleKind,
        parent_id: &str,
    ) -> Result<WorkingSet, AppError> {
        let key = SessionKey::new(user_id, kind, parent_id);
        let snapshot = self
            .sessions
            .get(&key)
            .map(|open| open.ws.clone())
            .ok_or_else(no_session)?;

        if let Err(e) = self.write(&snapshot).await {
            tracing::warn!(
                user_id,
                kind = %kind,
                parent_id,
                error = %e,
                "Commit failed, keeping working set"
            );
            return Err(e);
        }

        let mut open = self.sessions.get_mut(&key).ok_or_else(no_session)?;
        open.touched = Instant::now();
        open.ws.mark_committed(snapshot.revision());
        tracing::info!(
            user_id,
            kind = %kind,
            parent_id,
            records = snapshot.records.len(),
            "Committed working set"
        );
        Ok(open.ws.clone())
    }

    /// Drop the working copy without writing it.
    pub fn discard(&self, user_id: &str, kind: ScheduleKind, parent_id: &str) -> bool {
        self.sessions
            .remove(&SessionKey::new(user_id, kind, parent_id))
            .is_some()
    }

    /// Drop every user's copy of a parent, after the parent is deleted.
    pub fn forget_parent(&self, kind: ScheduleKind, parent_id: &str) {
        self.sessions
            .retain(|key, _| !(key.kind == kind && key.parent_id == parent_id));
    }

    /// Apply a parent's new stored acreage to every open copy of it.
    /// Returns how many copies were updated.
    pub fn refresh_acreage(&self, kind: ScheduleKind, parent_id: &str, acreage: &str) -> usize {
        let synth = self.synthesizer(kind);
        let mut updated = 0;
        for mut entry in self.sessions.iter_mut() {
            if entry.key().kind != kind || entry.key().parent_id != parent_id {
                continue;
            }
            if entry.ws.acreage != acreage {
                entry.ws.set_acreage(synth, acreage);
                updated += 1;
            }
        }
        if updated > 0 {
            tracing::debug!(kind = %kind, parent_id, updated, "Refreshed open working sets");
        }
        updated
    }

    /// Drop working sets untouched for longer than the idle TTL as of `now`.
    /// Returns how many were dropped.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let before = self.sessions.len();
        let mut dirty = 0;
        self.sessions.retain(|_, open| {
            let keep = now.saturating_duration_since(open.touched) <= self.idle_ttl;
            if !keep && open.ws.dirty {
                dirty += 1;
            }
            keep
        });
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            tracing::info!(evicted, dirty, "Evicted idle working sets");
        }
        evicted
    }

    fn with_session<F>(
        &self,
        user_id: &str,
        kind: ScheduleKind,
        parent_id: &str,
        edit: F,
    ) -> Result<WorkingSet, AppError>
    where
        F: FnOnce(&mut WorkingSet) -> Result<(), WorkingSetError>,
    {
        let mut open = self
            .sessions
            .get_mut(&SessionKey::new(user_id, kind, parent_id))
            .ok_or_else(no_session)?;
        open.touched = Instant::now();
        edit(&mut open.ws)?;
        Ok(open.ws.clone())
    }

    async fn load_parent(
        &self,
        kind: ScheduleKind,
        parent_id: &str,
    ) -> Result<ParentContext, AppError> {
        match kind {
            ScheduleKind::Crop => {
                let plantation = self
                    .db
                    .repo::<Plantation>()
                    .get(parent_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("plantation {}", parent_id)))?;
                Ok(ParentContext {
                    acreage: plantation.land_area.clone(),
                    start_date: plantation.start_date(),
                })
            }
            ScheduleKind::Dose => {
                if let Some(header) = self.db.repo::<DoseApplication>().get(parent_id).await? {
                    return Ok(ParentContext {
                        acreage: header.acres,
                        start_date: None,
                    });
                }
                // A farmer's dose application exists implicitly until first saved
                let farmer_id = DoseApplication::farmer_for_id(parent_id).ok_or_else(|| {
                    AppError::NotFound(format!("dose application {}", parent_id))
                })?;
                self.db
                    .repo::<Farmer>()
                    .get(farmer_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("farmer {}", farmer_id)))?;
                Ok(ParentContext {
                    acreage: String::new(),
                    start_date: None,
                })
            }
        }
    }

    async fn write(&self, ws: &WorkingSet) -> Result<(), AppError> {
        let records = self.db.records(ws.kind);
        match ws.kind.write_policy() {
            WritePolicy::ReplaceAll => {
                records
                    .replace_all_records(&ws.parent_id, &ws.records)
                    .await?
            }
            WritePolicy::Upsert => {
                records.upsert_records(&ws.records).await?;
                for id in ws.removed() {
                    records.delete_record(id).await?;
                }
            }
        }

        if ws.kind == ScheduleKind::Dose {
            self.save_dose_header(ws).await?;
        }
        Ok(())
    }

    /// Keep the dose application header in step with the committed set.
    async fn save_dose_header(&self, ws: &WorkingSet) -> Result<(), AppError> {
        let repo = self.db.repo::<DoseApplication>();
        let mut header = match repo.get(&ws.parent_id).await? {
            Some(header) => header,
            None => {
                let farmer_id = DoseApplication::farmer_for_id(&ws.parent_id).ok_or_else(|| {
                    AppError::NotFound(format!("dose application {}", ws.parent_id))
                })?;
                DoseApplication::new(farmer_id)
            }
        };
        header.acres = ws.acreage.clone();
        if header.date.is_empty() {
            header.date = format_date(local_now().date());
        }
        repo.put(&header).await
    }
}

fn no_session() -> AppError {
    AppError::NotFound("No open working set for this schedule".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DocumentStore, FieldFilter, MemoryStore};
    use crate::models::ScheduleTemplate;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Memory store whose writes fail while `down` is set.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        down: AtomicBool,
    }

    impl FlakyStore {
        fn check(&self) -> Result<(), AppError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(AppError::Database("down".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError> {
            self.inner.get(collection, id).await
        }

        async fn list(
            &self,
            collection: &str,
            filters: &[FieldFilter],
        ) -> Result<Vec<Value>, AppError> {
            self.inner.list(collection, filters).await
        }

        async fn put(&self, collection: &str, id: &str, doc: Value) -> Result<(), AppError> {
            self.check()?;
            self.inner.put(collection, id, doc).await
        }

        async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
            self.check()?;
            self.inner.delete(collection, id).await
        }

        async fn replace_where(
            &self,
            collection: &str,
            filter: &FieldFilter,
            docs: Vec<(String, Value)>,
        ) -> Result<(), AppError> {
            self.check()?;
            self.inner.replace_where(collection, filter, docs).await
        }
    }

    fn service(db: &Db) -> ScheduleService {
        ScheduleService::new(
            db.clone(),
            ScheduleSynthesizer::new(ScheduleKind::Crop, ScheduleTemplate::default_crop()),
            ScheduleSynthesizer::new(ScheduleKind::Dose, ScheduleTemplate::default_dose()),
            1024,
        )
    }

    async fn seed_plantation(db: &Db) {
        db.repo::<Plantation>()
            .put(&Plantation {
                id: "p1".to_string(),
                farmer_id: "f1".to_string(),
                land_area: "2".to_string(),
                plantation_date: "2024-01-01".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sessions_are_per_user() {
        let db = Db::in_memory();
        seed_plantation(&db).await;
        let svc = service(&db);

        svc.get_working_set("u1", ScheduleKind::Crop, "p1", None)
            .await
            .unwrap();
        let err = svc
            .add_row("u2", ScheduleKind::Crop, "p1", None)
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let ws = svc.add_row("u1", ScheduleKind::Crop, "p1", None).unwrap();
        assert_eq!(ws.records.len(), 11);
        assert!(svc.discard("u1", ScheduleKind::Crop, "p1"));
        assert_eq!(svc.session_count(), 0);
    }

    #[tokio::test]
    async fn test_crop_commit_upserts_and_deletes_removed() {
        let db = Db::in_memory();
        seed_plantation(&db).await;
        let svc = service(&db);

        svc.get_working_set("u1", ScheduleKind::Crop, "p1", None)
            .await
            .unwrap();
        svc.commit("u1", ScheduleKind::Crop, "p1").await.unwrap();
        assert_eq!(
            db.records(ScheduleKind::Crop)
                .list_records("p1")
                .await
                .unwrap()
                .len(),
            10
        );

        svc.remove_row("u1", ScheduleKind::Crop, "p1", "CA_p1_0")
            .unwrap();
        let ws = svc.commit("u1", ScheduleKind::Crop, "p1").await.unwrap();
        assert!(!ws.dirty);

        let stored = db
            .records(ScheduleKind::Crop)
            .list_records("p1")
            .await
            .unwrap();
        assert_eq!(stored.len(), 9);
        assert!(stored.iter().all(|r| r.id != "CA_p1_0"));
    }

    #[tokio::test]
    async fn test_dose_commit_creates_header() {
        let db = Db::in_memory();
        db.repo::<Farmer>()
            .put(&Farmer {
                id: "f1".to_string(),
                name: "Ravi".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let svc = service(&db);

        let ws = svc
            .get_working_set("u1", ScheduleKind::Dose, "f1_bycell", Some("2"))
            .await
            .unwrap();
        assert_eq!(ws.records[1].applied_bags, "6");

        svc.commit("u1", ScheduleKind::Dose, "f1_bycell")
            .await
            .unwrap();

        let header = db
            .repo::<DoseApplication>()
            .get("f1_bycell")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(header.farmer_id, "f1");
        assert_eq!(header.acres, "2");
        assert!(!header.date.is_empty());
    }

    #[tokio::test]
    async fn test_open_unknown_parent() {
        let db = Db::in_memory();
        let svc = service(&db);

        let err = svc
            .get_working_set("u1", ScheduleKind::Crop, "nope", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = svc
            .get_working_set("u1", ScheduleKind::Dose, "nope_bycell", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_working_set_for_retry() {
        let store = Arc::new(FlakyStore::default());
        let db = Db::new(store.clone());
        seed_plantation(&db).await;
        let svc = service(&db);

        svc.get_working_set("u1", ScheduleKind::Crop, "p1", None)
            .await
            .unwrap();
        svc.set_field_value(
            "u1",
            ScheduleKind::Crop,
            "p1",
            "CA_p1_3",
            FieldEdit::IsDone(true),
        )
        .unwrap();

        store.down.store(true, Ordering::SeqCst);
        let err = svc.commit("u1", ScheduleKind::Crop, "p1").await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(svc.session_count(), 1);
        assert!(db
            .records(ScheduleKind::Crop)
            .list_records("p1")
            .await
            .unwrap()
            .is_empty());

        store.down.store(false, Ordering::SeqCst);
        let ws = svc.commit("u1", ScheduleKind::Crop, "p1").await.unwrap();
        assert!(!ws.dirty);

        let stored = db
            .records(ScheduleKind::Crop)
            .list_records("p1")
            .await
            .unwrap();
        assert_eq!(stored.len(), 10);
        assert!(stored.iter().any(|r| r.id == "CA_p1_3" && r.is_done));
    }

    #[tokio::test]
    async fn test_idle_working_sets_are_evicted() {
        let db = Db::in_memory();
        let svc = service(&db).with_idle_ttl(Duration::from_secs(60));

        for i in 0..50 {
            let id = format!("p{}", i);
            db.repo::<Plantation>()
                .put(&Plantation {
                    id: id.clone(),
                    farmer_id: "f1".to_string(),
                    land_area: "1".to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
            svc.get_working_set("u1", ScheduleKind::Crop, &id, None)
                .await
                .unwrap();
            svc.commit("u1", ScheduleKind::Crop, &id).await.unwrap();
        }
        assert_eq!(svc.session_count(), 50);

        assert_eq!(svc.evict_idle(Instant::now()), 0);
        assert_eq!(
            svc.evict_idle(Instant::now() + Duration::from_secs(61)),
            50
        );
        assert_eq!(svc.session_count(), 0);
    }

    #[tokio::test]
    async fn test_opening_sweeps_expired_sessions() {
        let db = Db::in_memory();
        seed_plantation(&db).await;
        let svc = service(&db).with_idle_ttl(Duration::ZERO);

        svc.get_working_set("u1", ScheduleKind::Crop, "p1", None)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        svc.get_working_set("u2", ScheduleKind::Crop, "p1", None)
            .await
            .unwrap();

        assert_eq!(svc.session_count(), 1);
        let err = svc
            .add_row("u1", ScheduleKind::Crop, "p1", None)
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_refresh_acreage_updates_every_open_copy() {
        let db = Db::in_memory();
        seed_plantation(&db).await;
        let svc = service(&db);

        for user in ["u1", "u2"] {
            svc.get_working_set(user, ScheduleKind::Crop, "p1", None)
                .await
                .unwrap();
        }
        assert_eq!(svc.refresh_acreage(ScheduleKind::Crop, "p1", "4"), 2);
        assert_eq!(svc.refresh_acreage(ScheduleKind::Crop, "p1", "4"), 0);
        assert_eq!(svc.refresh_acreage(ScheduleKind::Crop, "p2", "4"), 0);

        let ws = svc.add_row("u2", ScheduleKind::Crop, "p1", None).unwrap();
        assert_eq!(ws.acreage, "4");
        let urea = ws.records.iter().find(|r| r.id == "CA_p1_2").unwrap();
        assert_eq!(urea.applied_quantity, "200 KG");
    }
}
