// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity templates: the fixed, ordered list of activities a schedule is
//! generated from.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One row of a schedule template. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityTemplateEntry {
    pub day_offset: i64,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub activity_name: String,
    #[serde(default)]
    pub quantity_spec: String,
}

impl ActivityTemplateEntry {
    fn new(day_offset: i64, activity_type: &str, activity_name: &str, quantity_spec: &str) -> Self {
        Self {
            day_offset,
            activity_type: activity_type.to_string(),
            activity_name: activity_name.to_string(),
            quantity_spec: quantity_spec.to_string(),
        }
    }
}

/// An ordered template, sorted by ascending day offset.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleTemplate {
    entries: Vec<ActivityTemplateEntry>,
}

impl ScheduleTemplate {
    /// Build a template from entries. Entries are stably sorted by day
    /// offset, so rows sharing an offset keep their given order.
    pub fn new(mut entries: Vec<ActivityTemplateEntry>) -> Self {
        entries.sort_by_key(|e| e.day_offset);
        Self { entries }
    }

    /// Load a template from a JSON file holding an array of entries.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, TemplateError> {
        let json_data =
            fs::read_to_string(path.as_ref()).map_err(|e| TemplateError::IoError(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    /// Load a template from a JSON string.
    pub fn load_from_json(json_data: &str) -> Result<Self, TemplateError> {
        let entries: Vec<ActivityTemplateEntry> = serde_json::from_str(json_data)
            .map_err(|e| TemplateError::ParseError(e.to_string()))?;

        if entries.is_empty() {
            return Err(TemplateError::Empty);
        }

        tracing::info!(count = entries.len(), "Loaded schedule template");
        Ok(Self::new(entries))
    }

    /// Default crop activity schedule, offsets counted from the plantation date.
    pub fn default_crop() -> Self {
        Self::new(vec![
            ActivityTemplateEntry::new(1, "DRENCHING", "BAVISTIN", "250 G"),
            ActivityTemplateEntry::new(30, "DRENCHING", "HUMIC ACID", "500 ML"),
            ActivityTemplateEntry::new(60, "SOIL APPLICATION", "UREA", "50 KG - 1 BAG"),
            ActivityTemplateEntry::new(90, "SPRAY", "ZINC + BORON", "1 KG"),
            ActivityTemplateEntry::new(149, "DRIP IRRIGATION", "CN + BORON", "3 KG"),
            ActivityTemplateEntry::new(152, "DRIP IRRIGATION", "CN + BORON", "1 KG"),
            ActivityTemplateEntry::new(173, "DRIP IRRIGATION", "KMS", "5 KG"),
            ActivityTemplateEntry::new(201, "SPRAY", "BASTA (HERBICIDE)", "1 L"),
            ActivityTemplateEntry::new(203, "DRIP IRRIGATION", "15:5:30 + FERTISOL", "1 KG"),
            ActivityTemplateEntry::new(221, "DRIP IRRIGATION", "15:5:30 + FERTISOL", "1 KG"),
        ])
    }

    /// Default bycell dose application, offsets are plain day numbers.
    pub fn default_dose() -> Self {
        Self::new(vec![
            ActivityTemplateEntry::new(1, "DRENCHING", "ICU POLYSULPHATE", "50 KG - 1 BAG"),
            ActivityTemplateEntry::new(
                1,
                "DRENCHING",
                "SSP (SINGLE SUPER PHOSPHATE)",
                "50 KG - 3 BAGS",
            ),
            ActivityTemplateEntry::new(1, "DRENCHING", "UREA", "45 KG - 1 BAG"),
            ActivityTemplateEntry::new(1, "DRENCHING", "PLANTO GR (ORGANIC)", "50 KG - 1 BAG"),
        ])
    }

    pub fn entries(&self) -> &[ActivityTemplateEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Errors from template loading.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Failed to read file: {0}")]
    IoError(String),

    #[error("Failed to parse template JSON: {0}")]
    ParseError(String),

    #[error("Template has no entries")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_sorts_by_offset_and_keeps_ties() {
        let json = r#"[
            {"day_offset": 152, "type": "DRIP", "activity_name": "late", "quantity_spec": "1 KG"},
            {"day_offset": 1, "type": "DRENCHING", "activity_name": "a", "quantity_spec": "250 G"},
            {"day_offset": 1, "type": "DRENCHING", "activity_name": "b"},
            {"day_offset": 149, "type": "DRIP", "activity_name": "mid", "quantity_spec": "3 KG"}
        ]"#;

        let template = ScheduleTemplate::load_from_json(json).unwrap();
        let names: Vec<&str> = template
            .entries()
            .iter()
            .map(|e| e.activity_name.as_str())
            .collect();

        assert_eq!(names, vec!["a", "b", "mid", "late"]);
        assert_eq!(template.entries()[1].quantity_spec, "");
    }

    #[test]
    fn test_empty_template_rejected() {
        assert!(matches!(
            ScheduleTemplate::load_from_json("[]"),
            Err(TemplateError::Empty)
        ));
        assert!(matches!(
            ScheduleTemplate::load_from_json("{not json"),
            Err(TemplateError::ParseError(_))
        ));
    }

    #[test]
    fn test_default_templates() {
        assert_eq!(ScheduleTemplate::default_crop().len(), 10);
        let dose = ScheduleTemplate::default_dose();
        assert_eq!(dose.len(), 4);
        assert_eq!(dose.entries()[1].quantity_spec, "50 KG - 3 BAGS");
    }
}
