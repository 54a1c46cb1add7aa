// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Sales invoices for inputs bought by farmers.

use crate::db::{collections, Document};
use crate::models::Product;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMode {
    #[default]
    Cash,
    Credit,
    #[serde(rename = "UPI")]
    Upi,
}

/// One priced line of an invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaleItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: f64,
    pub rate: f64,
    pub amount: f64,
}

impl SaleItem {
    /// Price `quantity` units of `product` at its catalog rate.
    pub fn priced(product: &Product, quantity: f64) -> Self {
        Self {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity,
            rate: product.rate,
            amount: round_currency(product.rate * quantity),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sale {
    pub id: String,
    pub farmer_id: String,
    /// Invoice date (`YYYY-MM-DD`)
    pub invoice_date: String,
    pub items: Vec<SaleItem>,
    pub total_amount: f64,
    pub payment_mode: PaymentMode,
}

impl Sale {
    /// Build an invoice from priced lines; the total is the sum of line amounts.
    pub fn new(
        id: String,
        farmer_id: String,
        invoice_date: String,
        items: Vec<SaleItem>,
        payment_mode: PaymentMode,
    ) -> Self {
        let total_amount = round_currency(items.iter().map(|i| i.amount).sum());
        Self {
            id,
            farmer_id,
            invoice_date,
            items,
            total_amount,
            payment_mode,
        }
    }
}

impl Document for Sale {
    const COLLECTION: &'static str = collections::SALES;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Round to two decimal places.
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, rate: f64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            company: "Acme Agro".to_string(),
            rate,
        }
    }

    #[test]
    fn test_sale_totals_line_amounts() {
        let items = vec![
            SaleItem::priced(&product("p1", 450.0), 2.0),
            SaleItem::priced(&product("p2", 12.5), 3.0),
        ];
        let sale = Sale::new(
            "s1".to_string(),
            "f1".to_string(),
            "2024-06-01".to_string(),
            items,
            PaymentMode::Upi,
        );

        assert_eq!(sale.items[0].amount, 900.0);
        assert_eq!(sale.items[1].amount, 37.5);
        assert_eq!(sale.total_amount, 937.5);
        assert_eq!(
            serde_json::to_value(sale.payment_mode).unwrap(),
            serde_json::json!("UPI")
        );
    }

    #[test]
    fn test_round_currency() {
        assert_eq!(round_currency(0.1 + 0.2), 0.3);
        assert_eq!(round_currency(10.004), 10.0);
    }
}
