// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Plantation records. A plantation owns its crop activity schedule.

use crate::db::{collections, Document};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlantationStatus {
    #[default]
    Active,
    Harvested,
}

/// A crop planted on a farmer's land.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Plantation {
    pub id: String,
    #[validate(length(min = 1))]
    pub farmer_id: String,
    /// Acreage as entered; parsed defensively when scaling doses
    pub land_area: String,
    /// Plantation date (`YYYY-MM-DD`), start of the crop schedule
    pub plantation_date: String,
    pub last_harvest_date: String,
    pub variety: String,
    pub plant_to_plant_distance: String,
    pub line_to_line_distance: String,
    #[validate(length(min = 1, max = 100))]
    pub crop_name: String,
    pub status: PlantationStatus,
}

impl Default for Plantation {
    fn default() -> Self {
        Self {
            id: String::new(),
            farmer_id: String::new(),
            land_area: String::new(),
            plantation_date: String::new(),
            last_harvest_date: String::new(),
            variety: String::new(),
            plant_to_plant_distance: String::new(),
            line_to_line_distance: String::new(),
            crop_name: "Sugarcane".to_string(),
            status: PlantationStatus::Active,
        }
    }
}

impl Plantation {
    /// Parsed plantation date, if one was entered.
    pub fn start_date(&self) -> Option<NaiveDate> {
        crate::time_utils::parse_date(&self.plantation_date)
    }
}

impl Document for Plantation {
    const COLLECTION: &'static str = collections::PLANTATIONS;

    fn id(&self) -> &str {
        &self.id
    }
}
