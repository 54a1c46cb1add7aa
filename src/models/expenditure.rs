// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Business expenditures.

use crate::db::{collections, Document};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentType {
    #[default]
    Cash,
    Cheque,
    Online,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Expenditure {
    pub id: String,
    /// Expense head (category)
    #[validate(length(min = 1, max = 100))]
    pub head_name: String,
    pub particulars: String,
    /// Expense date (`YYYY-MM-DD`)
    pub date: String,
    #[validate(range(min = 0.0))]
    pub amount: f64,
    pub payment_type: PaymentType,
}

impl Document for Expenditure {
    const COLLECTION: &'static str = collections::EXPENDITURES;

    fn id(&self) -> &str {
        &self.id
    }
}
