// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Product catalog entries.

use crate::db::{collections, Document};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Product {
    pub id: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub company: String,
    /// Unit price
    #[validate(range(min = 0.0))]
    pub rate: f64,
}

impl Document for Product {
    const COLLECTION: &'static str = collections::PRODUCTS;

    fn id(&self) -> &str {
        &self.id
    }
}
