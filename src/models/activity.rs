// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Scheduled activity records and the schedule kinds that own them.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Placeholder shown for a derived quantity that cannot be computed.
pub const NOT_APPLICABLE: &str = "-";

/// Which flow a set of activity records belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ScheduleKind {
    /// Crop activity log, owned by a plantation.
    Crop,
    /// Bycell dose application, owned by a dose application.
    Dose,
}

/// How a committed working set reaches storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Each record is written by id; records not in the set are left alone.
    Upsert,
    /// Every stored record of the parent is deleted, then the set is inserted.
    ReplaceAll,
}

/// How the applied quantity is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityStyle {
    /// Number only (`"125"`).
    Bare,
    /// Number followed by the captured unit (`"125 KG"`).
    WithUnit,
}

impl ScheduleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleKind::Crop => "crop",
            ScheduleKind::Dose => "dose",
        }
    }

    /// Prefix of record ids generated from the template.
    pub fn id_prefix(self) -> &'static str {
        match self {
            ScheduleKind::Crop => "CA",
            ScheduleKind::Dose => "BA",
        }
    }

    /// Storage collection for this kind's records.
    pub fn collection(self) -> &'static str {
        match self {
            ScheduleKind::Crop => crate::db::collections::CROP_ACTIVITIES,
            ScheduleKind::Dose => crate::db::collections::DOSE_ACTIVITIES,
        }
    }

    pub fn write_policy(self) -> WritePolicy {
        match self {
            ScheduleKind::Crop => WritePolicy::Upsert,
            ScheduleKind::Dose => WritePolicy::ReplaceAll,
        }
    }

    pub fn quantity_style(self) -> QuantityStyle {
        match self {
            ScheduleKind::Crop => QuantityStyle::WithUnit,
            ScheduleKind::Dose => QuantityStyle::Bare,
        }
    }

    /// Whether completing a record also stamps the time of day.
    pub fn records_time(self) -> bool {
        matches!(self, ScheduleKind::Dose)
    }

    /// Access module required to edit this kind of schedule.
    pub fn module(self) -> &'static str {
        match self {
            ScheduleKind::Crop => crate::models::user::modules::SERVICE,
            ScheduleKind::Dose => crate::models::user::modules::BYCELL,
        }
    }
}

impl std::fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One activity of a schedule, as stored and as shown in the working set.
///
/// `applied_quantity` and `applied_bags` are derived from `quantity_spec`
/// and the parent's acreage. Stored values are never trusted; they are
/// recomputed whenever a record is loaded or either input changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityRecord {
    pub id: String,
    /// Plantation id (crop) or dose application id (dose)
    pub parent_id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub day_offset: i64,
    /// Template position, breaks ties between equal day offsets
    pub position: u32,
    pub activity_type: String,
    pub activity_name: String,
    /// Free-text per-acre quantity, e.g. `"50 KG - 1 BAG"`
    pub quantity_spec: String,
    pub applied_quantity: String,
    pub applied_bags: String,
    pub is_done: bool,
    /// Completion date (`YYYY-MM-DD`), empty while pending
    pub done_date: String,
    /// Completion time of day, only stamped by dose applications
    pub done_time: String,
    /// Base64 data URL of the evidence photo, empty if none
    pub evidence_photo: String,
    /// Calendar date of the activity (crop schedules only)
    pub scheduled_date: Option<String>,
}

impl Default for ActivityRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            parent_id: String::new(),
            day_offset: 0,
            position: 0,
            activity_type: String::new(),
            activity_name: String::new(),
            quantity_spec: String::new(),
            applied_quantity: NOT_APPLICABLE.to_string(),
            applied_bags: NOT_APPLICABLE.to_string(),
            is_done: false,
            done_date: String::new(),
            done_time: String::new(),
            evidence_photo: String::new(),
            scheduled_date: None,
        }
    }
}

/// Completion state of a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    Pending,
    Done,
}

impl ActivityRecord {
    pub fn status(&self) -> CompletionStatus {
        if self.is_done {
            CompletionStatus::Done
        } else {
            CompletionStatus::Pending
        }
    }
}
