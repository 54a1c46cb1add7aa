// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dose calculator: scales per-acre quantities to a plantation's acreage.
//!
//! A quantity spec is free text entered per acre. The grammar is
//!
//! ```text
//! spec  := ws? magnitude ws? unit? rest
//! rest  := anything, searched for  bags := number ws? "BAG" "S"?
//! unit  := [A-Za-z%]+
//! ```
//!
//! Parsing falls back in this order: leading magnitude with optional unit,
//! then the whole string as a plain number, then "not applicable". The bag
//! clause is searched anywhere in the text, case-insensitively.
//!
//! Nothing here fails: unparsable input yields the `"-"` placeholder.

use crate::models::activity::{QuantityStyle, NOT_APPLICABLE};
use regex::Regex;
use std::sync::LazyLock;

static LEADING_QUANTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)?)\s*([A-Za-z%]+)?").expect("valid regex"));

static BAG_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*BAGS?").expect("valid regex"));

/// Leading decimal prefix, the way free-text number fields are read.
static NUMBER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)").expect("valid regex"));

/// A parsed quantity spec.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantitySpec {
    /// Per-acre magnitude
    pub magnitude: Option<f64>,
    /// Unit token following the magnitude, as written
    pub unit: Option<String>,
    /// Per-acre bag count from a `<n> BAG(S)` clause
    pub bags: Option<f64>,
}

impl QuantitySpec {
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();

        let (magnitude, unit) = match LEADING_QUANTITY.captures(trimmed) {
            Some(caps) => (
                caps.get(1).and_then(|m| parse_finite(m.as_str())),
                caps.get(2).map(|m| m.as_str().to_string()),
            ),
            None => (parse_finite(trimmed), None),
        };

        let bags = BAG_COUNT
            .captures(trimmed)
            .and_then(|caps| caps.get(1))
            .and_then(|m| parse_finite(m.as_str()));

        Self {
            magnitude,
            unit,
            bags,
        }
    }
}

/// Derived quantities for one activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedDose {
    pub applied_quantity: String,
    pub applied_bags: String,
}

impl AppliedDose {
    pub fn not_applicable() -> Self {
        Self {
            applied_quantity: NOT_APPLICABLE.to_string(),
            applied_bags: NOT_APPLICABLE.to_string(),
        }
    }
}

/// Parse acreage text. `None` for blank, non-numeric or non-positive values.
pub fn parse_acreage(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let value = parse_finite(trimmed).or_else(|| {
        NUMBER_PREFIX
            .find(trimmed)
            .and_then(|m| parse_finite(m.as_str()))
    })?;
    (value > 0.0).then_some(value)
}

/// Applied total quantity, number only: `("50 KG - 1 BAG", "2")` gives `"100"`.
pub fn compute_applied_quantity(quantity_spec: &str, acreage: &str) -> String {
    applied_quantity(quantity_spec, acreage, QuantityStyle::Bare)
}

/// Applied total quantity keeping the unit: `("250 G", "2")` gives `"500 G"`.
pub fn compute_applied_quantity_with_unit(quantity_spec: &str, acreage: &str) -> String {
    applied_quantity(quantity_spec, acreage, QuantityStyle::WithUnit)
}

/// Applied bag count: `("50 KG - 3 BAGS", "1.5")` gives `"4.5"`.
pub fn compute_applied_bags(quantity_spec: &str, acreage: &str) -> String {
    let Some(acres) = parse_acreage(acreage) else {
        return NOT_APPLICABLE.to_string();
    };

    match QuantitySpec::parse(quantity_spec).bags {
        Some(bags) => format_bags(bags * acres),
        None => NOT_APPLICABLE.to_string(),
    }
}

/// Both derived fields at once, in the given rendering style.
pub fn compute(quantity_spec: &str, acreage: &str, style: QuantityStyle) -> AppliedDose {
    AppliedDose {
        applied_quantity: applied_quantity(quantity_spec, acreage, style),
        applied_bags: compute_applied_bags(quantity_spec, acreage),
    }
}

fn applied_quantity(quantity_spec: &str, acreage: &str, style: QuantityStyle) -> String {
    let Some(acres) = parse_acreage(acreage) else {
        return NOT_APPLICABLE.to_string();
    };
    if quantity_spec.trim().is_empty() {
        return NOT_APPLICABLE.to_string();
    }

    let spec = QuantitySpec::parse(quantity_spec);
    let Some(magnitude) = spec.magnitude else {
        return NOT_APPLICABLE.to_string();
    };

    let total = format_quantity(magnitude * acres);
    match (style, spec.unit) {
        (QuantityStyle::WithUnit, Some(unit)) => format!("{} {}", total, unit),
        _ => total,
    }
}

/// Round to `decimals` places with ties going away from zero.
///
/// `format!` alone rounds exact ties (`0.125`, `1.25`) to even.
fn round_half_up(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Two decimals, with a trailing `.00` dropped.
fn format_quantity(value: f64) -> String {
    let formatted = format!("{:.2}", round_half_up(value, 2));
    match formatted.strip_suffix(".00") {
        Some(whole) if whole == "-0" => "0".to_string(),
        Some(whole) => whole.to_string(),
        None => formatted,
    }
}

/// Whole numbers without decimals, anything else with one.
fn format_bags(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", round_half_up(value, 1))
    }
}

fn parse_finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}
