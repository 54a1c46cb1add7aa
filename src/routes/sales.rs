// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sales invoices, priced on the server from the product catalog.

use crate::db::FieldFilter;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::user::modules;
use crate::models::{Farmer, PaymentMode, Product, Sale, SaleItem};
use crate::routes::new_id;
use crate::time_utils::{format_date, local_now, parse_date};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/sales", get(list_sales).post(create_sale))
}

#[derive(Deserialize)]
struct SalesQuery {
    farmer_id: Option<String>,
}

async fn list_sales(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SalesQuery>,
) -> Result<Json<Vec<Sale>>> {
    let repo = state.db.repo::<Sale>();
    let mut sales = match params.farmer_id.as_deref() {
        Some(farmer_id) => {
            repo.list_where(&[FieldFilter::eq("farmer_id", farmer_id)])
                .await?
        }
        None => repo.list().await?,
    };
    sales.sort_by(|a, b| {
        b.invoice_date
            .cmp(&a.invoice_date)
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(Json(sales))
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SaleLineRequest {
    #[validate(length(min = 1))]
    pub product_id: String,
    #[validate(range(exclusive_min = 0.0))]
    pub quantity: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSaleRequest {
    #[validate(length(min = 1))]
    pub farmer_id: String,
    #[serde(default)]
    pub payment_mode: PaymentMode,
    /// Defaults to today
    pub invoice_date: Option<String>,
    #[validate(length(min = 1), nested)]
    pub items: Vec<SaleLineRequest>,
}

/// Price each line from the catalog and store the invoice.
async fn create_sale(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateSaleRequest>,
) -> Result<Json<Sale>> {
    user.require_module(modules::SALES)?;
    payload.validate()?;

    if state
        .db
        .repo::<Farmer>()
        .get(&payload.farmer_id)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest(format!(
            "unknown farmer {}",
            payload.farmer_id
        )));
    }

    let invoice_date = match payload.invoice_date.as_deref().map(str::trim) {
        None | Some("") => format_date(local_now().date()),
        Some(text) => parse_date(text)
            .map(format_date)
            .ok_or_else(|| AppError::BadRequest(format!("invalid invoice date {:?}", text)))?,
    };

    let catalog: HashMap<String, Product> = state
        .db
        .repo::<Product>()
        .list()
        .await?
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();

    let items = payload
        .items
        .iter()
        .map(|line| {
            let product = catalog.get(&line.product_id).ok_or_else(|| {
                AppError::BadRequest(format!("unknown product {}", line.product_id))
            })?;
            Ok(SaleItem::priced(product, line.quantity))
        })
        .collect::<Result<Vec<_>>>()?;

    let sale = Sale::new(
        new_id(),
        payload.farmer_id,
        invoice_date,
        items,
        payload.payment_mode,
    );
    state.db.repo::<Sale>().put(&sale).await?;

    tracing::info!(
        sale_id = %sale.id,
        farmer_id = %sale.farmer_id,
        total = sale.total_amount,
        user = %user.username,
        "Created sale"
    );
    Ok(Json(sale))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(quantity: f64) -> CreateSaleRequest {
        CreateSaleRequest {
            farmer_id: "f1".to_string(),
            payment_mode: PaymentMode::default(),
            invoice_date: None,
            items: vec![SaleLineRequest {
                product_id: "urea".to_string(),
                quantity,
            }],
        }
    }

    #[test]
    fn test_sale_lines_are_validated() {
        assert!(request(2.0).validate().is_ok());

        let errors = request(0.0).validate().unwrap_err();
        assert!(errors.errors().contains_key("items"));

        let mut empty = request(1.0);
        empty.items.clear();
        assert!(empty.validate().is_err());
    }
}
