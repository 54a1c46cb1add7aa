// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Soil health test results.

use crate::db::{collections, Document};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Lab results for one soil sample. Values are kept as entered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SoilTest {
    pub id: String,
    #[validate(length(min = 1))]
    pub farmer_id: String,
    #[validate(length(min = 1, max = 50))]
    pub sample_number: String,
    pub date: String,
    pub water_source: String,
    pub soil_texture: String,
    pub lime_test: String,
    pub ph: String,
    pub organic_carbon: String,
    pub nitrate_nitrogen: String,
    pub ammoniacal_nitrogen: String,
    pub phosphorus: String,
    pub potassium: String,
    pub sulphur: String,
    pub zinc: String,
    pub iron: String,
    pub boron: String,
    pub remark: String,
    pub recommendation: String,
}

impl Document for SoilTest {
    const COLLECTION: &'static str = collections::SOIL_TESTS;

    fn id(&self) -> &str {
        &self.id
    }
}
