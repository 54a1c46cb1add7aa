// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User model for storage and API.

use crate::db::{collections, Document};
use serde::{Deserialize, Serialize};

/// Module name that grants access to every module.
pub const ALL_MODULES: &str = "all";

/// Module names checked before writes.
pub mod modules {
    pub const FARMERS: &str = "farmers";
    pub const PLANTATION: &str = "plantation";
    pub const SOIL: &str = "soil";
    /// Crop service schedule
    pub const SERVICE: &str = "service";
    /// Bycell dose application
    pub const BYCELL: &str = "bycell";
    pub const LEDGER: &str = "ledger";
    pub const PRODUCTS: &str = "products";
    pub const SALES: &str = "sales";
    pub const EXPENDITURE: &str = "expenditure";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    FieldOfficer,
    Staff,
}

/// User account stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    /// HMAC-SHA256 of the password (hex)
    pub password_hash: String,
    pub role: UserRole,
    /// Modules this user may edit (`"all"` for every module)
    #[serde(default)]
    pub allowed_modules: Vec<String>,
}

impl User {
    pub fn can_access(&self, module: &str) -> bool {
        modules_allow(&self.allowed_modules, module)
    }
}

/// Whether a module list grants `module`.
pub fn modules_allow(allowed: &[String], module: &str) -> bool {
    allowed.iter().any(|m| m == ALL_MODULES || m == module)
}

impl Document for User {
    const COLLECTION: &'static str = collections::USERS;

    fn id(&self) -> &str {
        &self.id
    }
}
