// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! A user's in-memory working copy of one parent's activity records.
//!
//! Edits apply to the copy only; nothing reaches storage until the copy is
//! committed. Derived quantities stay in step with every edit.

use crate::models::{ActivityRecord, ScheduleKind};
use crate::services::photo::{self, PhotoError};
use crate::services::schedule::{self, ScheduleSynthesizer};
use crate::time_utils::{format_date, parse_date};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A single-field edit of one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldEdit {
    DayOffset(i64),
    ActivityType(String),
    ActivityName(String),
    QuantitySpec(String),
    IsDone(bool),
    /// Correct the completion date of a done record
    DoneDate(String),
    /// Data URL of the photo, or empty to remove it
    EvidencePhoto(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WorkingSetError {
    #[error("No activity record {0} in this schedule")]
    RecordNotFound(String),

    #[error("Invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Record {0} is not done")]
    NotDone(String),

    #[error("Record {0} is done; mark it pending to clear the date")]
    DoneDateRequired(String),

    #[error(transparent)]
    Photo(#[from] PhotoError),
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkingSet {
    pub kind: ScheduleKind,
    pub parent_id: String,
    /// Acreage text the derived quantities are computed from
    pub acreage: String,
    /// Date day offsets count from, if this schedule is dated
    pub start_date: Option<NaiveDate>,
    pub records: Vec<ActivityRecord>,
    /// Whether the copy has edits not yet committed
    pub dirty: bool,
    /// Ids removed since the last commit
    #[serde(skip)]
    removed: Vec<String>,
    /// Bumped on every edit
    #[serde(skip)]
    revision: u64,
}

impl WorkingSet {
    /// A clean copy, as just loaded.
    pub fn new(
        kind: ScheduleKind,
        parent_id: &str,
        acreage: &str,
        start_date: Option<NaiveDate>,
        records: Vec<ActivityRecord>,
    ) -> Self {
        Self {
            kind,
            parent_id: parent_id.to_string(),
            acreage: acreage.to_string(),
            start_date,
            records,
            dirty: false,
            removed: Vec::new(),
            revision: 0,
        }
    }

    /// Open a parent: saved records if any, otherwise the template.
    pub fn open(
        synth: &ScheduleSynthesizer,
        parent_id: &str,
        persisted: &[ActivityRecord],
        acreage: &str,
        start_date: Option<NaiveDate>,
    ) -> Self {
        let records = synth.synthesize(parent_id, persisted, acreage, start_date);
        Self::new(synth.kind(), parent_id, acreage, start_date, records)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn removed(&self) -> &[String] {
        &self.removed
    }

    pub fn record(&self, record_id: &str) -> Option<&ActivityRecord> {
        self.records.iter().find(|r| r.id == record_id)
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }

    /// Apply one field edit. Quantity spec edits recompute the row's derived
    /// fields; day offset edits re-date and re-sort the set.
    pub fn set_field_value(
        &mut self,
        synth: &ScheduleSynthesizer,
        record_id: &str,
        edit: FieldEdit,
        now: NaiveDateTime,
        max_photo_bytes: usize,
    ) -> Result<(), WorkingSetError> {
        let start_date = self.start_date;
        let acreage = self.acreage.clone();
        let idx = self
            .records
            .iter()
            .position(|r| r.id == record_id)
            .ok_or_else(|| WorkingSetError::RecordNotFound(record_id.to_string()))?;
        let record = &mut self.records[idx];

        let mut resort = false;
        match edit {
            FieldEdit::DayOffset(day_offset) => {
                record.day_offset = day_offset;
                if start_date.is_some() {
                    record.scheduled_date = start_date
                        .and_then(|d| d.checked_add_signed(chrono::Duration::try_days(day_offset)?))
                        .map(format_date);
                }
                resort = true;
            }
            FieldEdit::ActivityType(value) => record.activity_type = value,
            FieldEdit::ActivityName(value) => record.activity_name = value,
            FieldEdit::QuantitySpec(value) => {
                record.quantity_spec = value;
                synth.refresh_derived(record, &acreage);
            }
            FieldEdit::IsDone(done) => {
                *record = synth.toggle_completion(record, done, now);
            }
            FieldEdit::DoneDate(value) => {
                let value = value.trim().to_string();
                if !record.is_done {
                    return Err(WorkingSetError::NotDone(record_id.to_string()));
                }
                if value.is_empty() {
                    return Err(WorkingSetError::DoneDateRequired(record_id.to_string()));
                }
                let date = parse_date(&value).ok_or(WorkingSetError::InvalidDate(value))?;
                record.done_date = format_date(date);
            }
            FieldEdit::EvidencePhoto(value) => {
                photo::validate_data_url(&value, max_photo_bytes)?;
                record.evidence_photo = value;
            }
        }

        if resort {
            schedule::sort_records(&mut self.records);
        }
        self.touch();
        Ok(())
    }

    /// Change the acreage and recompute every row's derived fields.
    pub fn set_acreage(&mut self, synth: &ScheduleSynthesizer, acreage: &str) {
        self.acreage = acreage.to_string();
        self.records = synth.apply_acreage_change(&self.records, acreage);
        self.touch();
    }

    /// Append a blank row after the last one. Returns the new row's id.
    pub fn add_row(&mut self, day_offset: Option<i64>) -> String {
        let day_offset = day_offset
            .or_else(|| self.records.last().map(|r| r.day_offset))
            .unwrap_or(0);
        let position = self
            .records
            .iter()
            .map(|r| r.position + 1)
            .max()
            .unwrap_or(0);

        let mut idx = self.records.len() + self.removed.len();
        let id = loop {
            let candidate = schedule::record_id(self.kind, &self.parent_id, idx);
            if self.record(&candidate).is_none() && !self.removed.contains(&candidate) {
                break candidate;
            }
            idx += 1;
        };

        let scheduled_date = self
            .start_date
            .and_then(|d| d.checked_add_signed(chrono::Duration::try_days(day_offset)?))
            .map(format_date);

        self.records.push(ActivityRecord {
            id: id.clone(),
            parent_id: self.parent_id.clone(),
            day_offset,
            position,
            scheduled_date,
            ..Default::default()
        });
        schedule::sort_records(&mut self.records);
        self.touch();
        id
    }

    pub fn remove_row(&mut self, record_id: &str) -> Result<ActivityRecord, WorkingSetError> {
        let idx = self
            .records
            .iter()
            .position(|r| r.id == record_id)
            .ok_or_else(|| WorkingSetError::RecordNotFound(record_id.to_string()))?;
        let removed = self.records.remove(idx);
        self.removed.push(removed.id.clone());
        self.touch();
        Ok(removed)
    }

    /// Mark clean after a commit of `revision`. Later edits keep the copy dirty.
    pub fn mark_committed(&mut self, revision: u64) {
        if self.revision == revision {
            self.dirty = false;
            self.removed.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityTemplateEntry, ScheduleTemplate};

    fn synth() -> ScheduleSynthesizer {
        ScheduleSynthesizer::new(
            ScheduleKind::Crop,
            ScheduleTemplate::new(vec![
                ActivityTemplateEntry {
                    day_offset: 1,
                    activity_type: "DRENCHING".to_string(),
                    activity_name: "BAVISTIN".to_string(),
                    quantity_spec: "250 G".to_string(),
                },
                ActivityTemplateEntry {
                    day_offset: 60,
                    activity_type: "SOIL APPLICATION".to_string(),
                    activity_name: "UREA".to_string(),
                    quantity_spec: "50 KG - 1 BAG".to_string(),
                },
            ]),
        )
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn open() -> WorkingSet {
        WorkingSet::open(
            &synth(),
            "p1",
            &[],
            "2",
            NaiveDate::from_ymd_opt(2024, 1, 1),
        )
    }

    #[test]
    fn test_quantity_edit_recomputes_row() {
        let synth = synth();
        let mut ws = open();

        ws.set_field_value(
            &synth,
            "CA_p1_0",
            FieldEdit::QuantitySpec("1 L".to_string()),
            now(),
            1024,
        )
        .unwrap();

        assert_eq!(ws.records[0].applied_quantity, "2 L");
        assert_eq!(ws.records[1].applied_quantity, "100 KG");
        assert!(ws.dirty);
    }

    #[test]
    fn test_day_offset_edit_resorts_and_redates() {
        let synth = synth();
        let mut ws = open();

        ws.set_field_value(&synth, "CA_p1_0", FieldEdit::DayOffset(90), now(), 1024)
            .unwrap();

        assert_eq!(ws.records[0].id, "CA_p1_1");
        assert_eq!(ws.records[1].id, "CA_p1_0");
        assert_eq!(ws.records[1].scheduled_date.as_deref(), Some("2024-03-31"));
    }

    #[test]
    fn test_done_date_rules() {
        let synth = synth();
        let mut ws = open();

        let err = ws
            .set_field_value(
                &synth,
                "CA_p1_0",
                FieldEdit::DoneDate("2024-02-01".to_string()),
                now(),
                1024,
            )
            .unwrap_err();
        assert!(matches!(err, WorkingSetError::NotDone(_)));

        ws.set_field_value(&synth, "CA_p1_0", FieldEdit::IsDone(true), now(), 1024)
            .unwrap();
        assert_eq!(ws.records[0].done_date, "2024-02-10");

        let err = ws
            .set_field_value(
                &synth,
                "CA_p1_0",
                FieldEdit::DoneDate("10/02/2024".to_string()),
                now(),
                1024,
            )
            .unwrap_err();
        assert!(matches!(err, WorkingSetError::InvalidDate(_)));

        ws.set_field_value(
            &synth,
            "CA_p1_0",
            FieldEdit::DoneDate("2024-02-01".to_string()),
            now(),
            1024,
        )
        .unwrap();
        assert_eq!(ws.records[0].done_date, "2024-02-01");
    }

    #[test]
    fn test_acreage_change_keeps_completion() {
        let synth = synth();
        let mut ws = open();
        ws.set_field_value(&synth, "CA_p1_1", FieldEdit::IsDone(true), now(), 1024)
            .unwrap();

        ws.set_acreage(&synth, "");

        assert!(ws.records[1].is_done);
        assert!(ws.records.iter().all(|r| r.applied_quantity == "-"));
        assert!(ws.records.iter().all(|r| r.applied_bags == "-"));
    }

    #[test]
    fn test_add_and_remove_rows() {
        let mut ws = open();

        let id = ws.add_row(None);
        assert_eq!(id, "CA_p1_2");
        let row = ws.record(&id).unwrap();
        assert_eq!(row.day_offset, 60);
        assert_eq!(row.position, 2);
        assert_eq!(row.applied_quantity, "-");

        ws.remove_row("CA_p1_0").unwrap();
        assert_eq!(ws.removed(), ["CA_p1_0".to_string()]);

        // Ids of removed rows are not reused before the commit
        let next = ws.add_row(Some(5));
        assert_ne!(next, "CA_p1_0");
        assert_eq!(ws.records[0].id, next);

        assert!(matches!(
            ws.remove_row("missing"),
            Err(WorkingSetError::RecordNotFound(_))
        ));
    }

    #[test]
    fn test_mark_committed_respects_later_edits() {
        let mut ws = open();
        ws.add_row(None);
        let revision = ws.revision();
        ws.add_row(None);

        ws.mark_committed(revision);
        assert!(ws.dirty);

        ws.mark_committed(ws.revision());
        assert!(!ws.dirty);
        assert!(ws.removed().is_empty());
    }

    #[test]
    fn test_field_edit_wire_format() {
        let edit: FieldEdit =
            serde_json::from_str(r#"{"field": "is_done", "value": true}"#).unwrap();
        assert_eq!(edit, FieldEdit::IsDone(true));

        let edit: FieldEdit =
            serde_json::from_str(r#"{"field": "quantity_spec", "value": "1 KG"}"#).unwrap();
        assert_eq!(edit, FieldEdit::QuantitySpec("1 KG".to_string()));
    }
}
