// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Bycell dose application header. Its activities are stored as
//! [`ActivityRecord`](crate::models::ActivityRecord)s of kind `dose`.

use crate::db::{collections, Document};
use serde::{Deserialize, Serialize};

/// Suffix of a farmer's dose application id.
const DOSE_ID_SUFFIX: &str = "_bycell";

/// A farmer's dose application. One per farmer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoseApplication {
    pub id: String,
    pub farmer_id: String,
    /// Acreage the doses are scaled to (free text, as entered)
    pub acres: String,
    pub remarks: String,
    /// Date of the first save (`YYYY-MM-DD`)
    pub date: String,
}

impl DoseApplication {
    /// Id of the dose application owned by `farmer_id`.
    pub fn id_for_farmer(farmer_id: &str) -> String {
        format!("{}{}", farmer_id, DOSE_ID_SUFFIX)
    }

    /// Farmer owning the dose application `id`, if it is a dose id.
    pub fn farmer_for_id(id: &str) -> Option<&str> {
        id.strip_suffix(DOSE_ID_SUFFIX).filter(|f| !f.is_empty())
    }

    pub fn new(farmer_id: &str) -> Self {
        Self {
            id: Self::id_for_farmer(farmer_id),
            farmer_id: farmer_id.to_string(),
            ..Default::default()
        }
    }
}

impl Document for DoseApplication {
    const COLLECTION: &'static str = collections::DOSE_APPLICATIONS;

    fn id(&self) -> &str {
        &self.id
    }
}
