// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Schedule synthesizer: builds a parent's working list of activity records
//! from its template and whatever was saved before.
//!
//! All functions here are pure. Timestamps are passed in by the caller.

use crate::models::{ActivityRecord, ScheduleKind, ScheduleTemplate};
use crate::services::dose;
use crate::time_utils::{format_date, format_time};
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Synthesizes activity records of one kind from one template.
#[derive(Debug, Clone)]
pub struct ScheduleSynthesizer {
    kind: ScheduleKind,
    template: ScheduleTemplate,
}

impl ScheduleSynthesizer {
    pub fn new(kind: ScheduleKind, template: ScheduleTemplate) -> Self {
        Self { kind, template }
    }

    pub fn kind(&self) -> ScheduleKind {
        self.kind
    }

    pub fn template(&self) -> &ScheduleTemplate {
        &self.template
    }

    /// Working set for `parent_id`.
    ///
    /// Saved records of the parent win over the template: they are returned
    /// with their derived quantities recomputed from `acreage` and every
    /// other field untouched. Without saved records, one fresh record per
    /// template entry is generated. `start_date` dates the records
    /// (`start_date + day_offset`); it only fills a missing scheduled date
    /// on saved records.
    pub fn synthesize(
        &self,
        parent_id: &str,
        persisted: &[ActivityRecord],
        acreage: &str,
        start_date: Option<NaiveDate>,
    ) -> Vec<ActivityRecord> {
        let mut saved: Vec<ActivityRecord> = persisted
            .iter()
            .filter(|r| r.parent_id == parent_id)
            .cloned()
            .collect();

        if saved.is_empty() {
            return self.generate(parent_id, acreage, start_date);
        }

        for record in &mut saved {
            self.refresh_derived(record, acreage);
            if record.scheduled_date.is_none() {
                record.scheduled_date = scheduled_date(start_date, record.day_offset);
            }
        }
        sort_records(&mut saved);
        saved
    }

    /// Fresh records for every template entry, in template order.
    pub fn generate(
        &self,
        parent_id: &str,
        acreage: &str,
        start_date: Option<NaiveDate>,
    ) -> Vec<ActivityRecord> {
        self.template
            .entries()
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                let mut record = ActivityRecord {
                    id: record_id(self.kind, parent_id, idx),
                    parent_id: parent_id.to_string(),
                    day_offset: entry.day_offset,
                    position: idx as u32,
                    activity_type: entry.activity_type.clone(),
                    activity_name: entry.activity_name.clone(),
                    quantity_spec: entry.quantity_spec.clone(),
                    scheduled_date: scheduled_date(start_date, entry.day_offset),
                    ..Default::default()
                };
                self.refresh_derived(&mut record, acreage);
                record
            })
            .collect()
    }

    /// Recompute the derived quantities of every record for a new acreage.
    pub fn apply_acreage_change(
        &self,
        records: &[ActivityRecord],
        acreage: &str,
    ) -> Vec<ActivityRecord> {
        records
            .iter()
            .cloned()
            .map(|mut record| {
                self.refresh_derived(&mut record, acreage);
                record
            })
            .collect()
    }

    /// Mark a record done (stamping the date, and the time where this kind
    /// records it) or pending (clearing both).
    pub fn toggle_completion(
        &self,
        record: &ActivityRecord,
        done: bool,
        now: NaiveDateTime,
    ) -> ActivityRecord {
        toggle_completion(record, done, now, self.kind.records_time())
    }

    /// Recompute `applied_quantity` and `applied_bags` in place.
    pub fn refresh_derived(&self, record: &mut ActivityRecord, acreage: &str) {
        let applied = dose::compute(&record.quantity_spec, acreage, self.kind.quantity_style());
        record.applied_quantity = applied.applied_quantity;
        record.applied_bags = applied.applied_bags;
    }
}

/// Completion toggle. Marking a done record done again keeps its original
/// stamp; marking a pending record pending is a no-op.
pub fn toggle_completion(
    record: &ActivityRecord,
    done: bool,
    now: NaiveDateTime,
    records_time: bool,
) -> ActivityRecord {
    let mut updated = record.clone();
    if done == record.is_done {
        return updated;
    }

    updated.is_done = done;
    if done {
        updated.done_date = format_date(now.date());
        if records_time {
            updated.done_time = format_time(now);
        }
    } else {
        updated.done_date.clear();
        updated.done_time.clear();
    }
    updated
}

/// Ascending day offset, then template position, then the numeric id
/// suffix, then id. Records stored without a position all read as 0, and
/// their id suffix still carries the template order.
pub fn sort_records(records: &mut [ActivityRecord]) {
    records.sort_by(|a, b| {
        a.day_offset
            .cmp(&b.day_offset)
            .then(a.position.cmp(&b.position))
            .then_with(|| id_index(&a.id).cmp(&id_index(&b.id)))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Trailing `_<n>` of a record id.
fn id_index(id: &str) -> Option<u64> {
    id.rsplit_once('_')?.1.parse().ok()
}

/// Deterministic id of the `idx`-th template record of a parent.
pub fn record_id(kind: ScheduleKind, parent_id: &str, idx: usize) -> String {
    format!("{}_{}_{}", kind.id_prefix(), parent_id, idx)
}

fn scheduled_date(start_date: Option<NaiveDate>, day_offset: i64) -> Option<String> {
    let date = start_date?.checked_add_signed(Duration::try_days(day_offset)?)?;
    Some(format_date(date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityTemplateEntry;

    fn entry(day: i64, name: &str, qty: &str) -> ActivityTemplateEntry {
        ActivityTemplateEntry {
            day_offset: day,
            activity_type: "DRIP".to_string(),
            activity_name: name.to_string(),
            quantity_spec: qty.to_string(),
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_generate_ids_positions_and_dates() {
        let synth = ScheduleSynthesizer::new(
            ScheduleKind::Crop,
            ScheduleTemplate::new(vec![entry(1, "a", "250 G"), entry(30, "b", "500 ML")]),
        );
        let start = NaiveDate::from_ymd_opt(2024, 1, 31);

        let records = synth.synthesize("p1", &[], "2", start);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "CA_p1_0");
        assert_eq!(records[1].id, "CA_p1_1");
        assert_eq!(records[1].position, 1);
        assert_eq!(records[0].scheduled_date.as_deref(), Some("2024-02-01"));
        assert_eq!(records[1].scheduled_date.as_deref(), Some("2024-03-01"));
        assert_eq!(records[0].applied_quantity, "500 G");
        assert_eq!(records[1].applied_quantity, "1000 ML");
        assert!(records.iter().all(|r| !r.is_done && r.done_date.is_empty()));
    }

    #[test]
    fn test_day_number_mode_has_no_dates() {
        let synth = ScheduleSynthesizer::new(ScheduleKind::Dose, ScheduleTemplate::default_dose());
        let records = synth.synthesize("f1_bycell", &[], "", None);

        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.scheduled_date.is_none()));
        assert!(records.iter().all(|r| r.applied_quantity == "-"));
        assert!(records.iter().all(|r| r.applied_bags == "-"));
        assert_eq!(records[0].id, "BA_f1_bycell_0");
    }

    #[test]
    fn test_persisted_records_of_other_parents_ignored() {
        let synth = ScheduleSynthesizer::new(
            ScheduleKind::Crop,
            ScheduleTemplate::new(vec![entry(1, "a", "1 KG")]),
        );
        let foreign = ActivityRecord {
            id: "CA_other_0".to_string(),
            parent_id: "other".to_string(),
            is_done: true,
            ..Default::default()
        };

        let records = synth.synthesize("p1", &[foreign], "1", None);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "CA_p1_0");
        assert!(!records[0].is_done);
    }

    #[test]
    fn test_toggle_stamps_and_clears() {
        let record = ActivityRecord::default();

        let done = toggle_completion(&record, true, now(), true);
        assert!(done.is_done);
        assert_eq!(done.done_date, "2024-06-15");
        assert_eq!(done.done_time, "18:30:00");

        let crop_done = toggle_completion(&record, true, now(), false);
        assert_eq!(crop_done.done_time, "");

        let pending = toggle_completion(&done, false, now(), true);
        assert!(!pending.is_done);
        assert_eq!(pending.done_date, "");
        assert_eq!(pending.done_time, "");
    }

    #[test]
    fn test_toggle_done_again_keeps_stamp() {
        let record = ActivityRecord {
            is_done: true,
            done_date: "2024-01-01".to_string(),
            ..Default::default()
        };

        let again = toggle_completion(&record, true, now(), false);
        assert_eq!(again.done_date, "2024-01-01");
    }

    #[test]
    fn test_sort_records_breaks_ties_by_position() {
        let mut records: Vec<ActivityRecord> = [(149, 3), (1, 2), (152, 4), (1, 0), (1, 1)]
            .into_iter()
            .map(|(day, pos)| ActivityRecord {
                id: format!("r{}", pos),
                day_offset: day,
                position: pos,
                ..Default::default()
            })
            .collect();

        sort_records(&mut records);

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r0", "r1", "r2", "r3", "r4"]);
    }

    #[test]
    fn test_scheduled_date_overflow_is_none() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert_eq!(scheduled_date(start, i64::MAX), None);
        assert_eq!(scheduled_date(None, 5), None);
    }

    #[test]
    fn test_sort_legacy_records_by_id_number() {
        let mut records: Vec<ActivityRecord> = [10, 2, 1, 0]
            .iter()
            .map(|n| ActivityRecord {
                id: format!("CA_p_{}", n),
                parent_id: "p".to_string(),
                day_offset: 5,
                ..Default::default()
            })
            .collect();

        sort_records(&mut records);

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["CA_p_0", "CA_p_1", "CA_p_2", "CA_p_10"]);
    }
}
