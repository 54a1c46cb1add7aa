// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Farmer registration record.

use crate::db::{collections, Document};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Registered farmer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Farmer {
    pub id: String,
    /// Registration serial number
    #[validate(length(max = 50))]
    pub serial_number: String,
    pub nsl_code: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 14))]
    pub aadhar: String,
    #[validate(length(max = 15))]
    pub phone: String,
    /// Total land holding in acres (free text, as entered)
    pub total_land: String,
    pub survey_no: String,
    pub village: String,
    pub hobli: String,
    pub taluka: String,
}

impl Farmer {
    /// Case-insensitive match on name, phone or serial number.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query)
            || self.phone.contains(&query)
            || self.serial_number.to_lowercase().contains(&query)
    }
}

impl Document for Farmer {
    const COLLECTION: &'static str = collections::FARMERS;

    fn id(&self) -> &str {
        &self.id
    }
}
