// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod dose;
pub mod expenditure;
pub mod farmer;
pub mod plantation;
pub mod product;
pub mod sale;
pub mod soil;
pub mod template;
pub mod user;

pub use activity::{ActivityRecord, CompletionStatus, ScheduleKind, NOT_APPLICABLE};
pub use dose::DoseApplication;
pub use expenditure::{Expenditure, PaymentType};
pub use farmer::Farmer;
pub use plantation::{Plantation, PlantationStatus};
pub use product::Product;
pub use sale::{PaymentMode, Sale, SaleItem};
pub use soil::SoilTest;
pub use template::{ActivityTemplateEntry, ScheduleTemplate};
pub use user::{User, UserRole};
