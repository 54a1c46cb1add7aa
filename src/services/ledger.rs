// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-only reports: a farmer's ledger and the expenditure summary.

use crate::db::{Db, FieldFilter};
use crate::error::AppError;
use crate::models::sale::round_currency;
use crate::models::{
    ActivityRecord, Expenditure, Farmer, PaymentType, Plantation, Sale, ScheduleKind,
};
use crate::services::schedule::ScheduleSynthesizer;
use crate::time_utils::parse_date;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything recorded against one farmer.
#[derive(Debug, Serialize)]
pub struct FarmerLedger {
    pub farmer: Farmer,
    pub plantations: Vec<Plantation>,
    /// Completed crop activities across all plantations, by done date
    pub completed_activities: Vec<ActivityRecord>,
    pub purchases: Vec<Sale>,
    pub total_purchases: f64,
}

/// Build a farmer's ledger. Derived quantities are recomputed from each
/// plantation's acreage.
pub async fn farmer_ledger(
    db: &Db,
    crop: &ScheduleSynthesizer,
    farmer_id: &str,
) -> Result<FarmerLedger, AppError> {
    let farmer = db
        .repo::<Farmer>()
        .get(farmer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("farmer {}", farmer_id)))?;

    let by_farmer = [FieldFilter::eq("farmer_id", farmer_id)];
    let plantations = db.repo::<Plantation>().list_where(&by_farmer).await?;

    let records = db.records(ScheduleKind::Crop);
    let mut completed_activities = Vec::new();
    for plantation in &plantations {
        let stored = records.list_records(&plantation.id).await?;
        completed_activities.extend(
            crop.apply_acreage_change(&stored, &plantation.land_area)
                .into_iter()
                .filter(|r| r.is_done),
        );
    }
    completed_activities.sort_by(|a, b| {
        a.done_date
            .cmp(&b.done_date)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut purchases = db.repo::<Sale>().list_where(&by_farmer).await?;
    purchases.sort_by(|a, b| a.invoice_date.cmp(&b.invoice_date));
    let total_purchases = round_currency(purchases.iter().map(|s| s.total_amount).sum());

    Ok(FarmerLedger {
        farmer,
        plantations,
        completed_activities,
        purchases,
        total_purchases,
    })
}

/// Expenditure totals over a date range.
#[derive(Debug, Serialize, PartialEq)]
pub struct ExpenditureReport {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub entries: Vec<Expenditure>,
    pub total: f64,
    pub by_head: BTreeMap<String, f64>,
    pub by_payment_type: BTreeMap<String, f64>,
}

/// Summarize expenditures dated within `[from, to]` (both inclusive).
/// Entries with an unreadable date are only included when no bound is set.
pub fn expenditure_report(
    mut expenditures: Vec<Expenditure>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> ExpenditureReport {
    expenditures.retain(|e| {
        if from.is_none() && to.is_none() {
            return true;
        }
        match parse_date(&e.date) {
            Some(date) => from.map_or(true, |f| date >= f) && to.map_or(true, |t| date <= t),
            None => false,
        }
    });
    expenditures.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

    let mut by_head = BTreeMap::new();
    let mut by_payment_type = BTreeMap::new();
    for e in &expenditures {
        *by_head.entry(e.head_name.clone()).or_insert(0.0) += e.amount;
        *by_payment_type
            .entry(payment_label(e.payment_type).to_string())
            .or_insert(0.0) += e.amount;
    }
    by_head.values_mut().for_each(|v| *v = round_currency(*v));
    by_payment_type
        .values_mut()
        .for_each(|v| *v = round_currency(*v));

    let total = round_currency(expenditures.iter().map(|e| e.amount).sum());

    ExpenditureReport {
        from,
        to,
        entries: expenditures,
        total,
        by_head,
        by_payment_type,
    }
}

fn payment_label(payment_type: PaymentType) -> &'static str {
    match payment_type {
        PaymentType::Cash => "Cash",
        PaymentType::Cheque => "Cheque",
        PaymentType::Online => "Online",
    }
}
