// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod dose;
pub mod ledger;
pub mod photo;
pub mod schedule;
pub mod sessions;
pub mod working_set;

pub use schedule::ScheduleSynthesizer;
pub use sessions::ScheduleService;
pub use working_set::{FieldEdit, WorkingSet, WorkingSetError};
