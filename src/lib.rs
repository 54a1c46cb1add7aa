// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Farm-Ledger: crop service schedules and dose applications for
//! contract farming field offices.
//!
//! This crate provides the backend API: farmer and plantation records,
//! activity schedules generated from templates with doses scaled to each
//! plantation's acreage, and the sales and expenditure ledgers.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Db;
use models::template::TemplateError;
use models::{ScheduleKind, ScheduleTemplate};
use services::{ScheduleService, ScheduleSynthesizer};
use std::path::Path;
use std::time::Duration;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub schedules: ScheduleService,
}

impl AppState {
    /// Build the state, loading templates from the configured files or
    /// falling back to the built-in ones.
    pub fn new(config: Config, db: Db) -> Result<Self, TemplateError> {
        let crop = load_template(
            config.crop_template_path.as_deref(),
            ScheduleTemplate::default_crop,
        )?;
        let dose = load_template(
            config.dose_template_path.as_deref(),
            ScheduleTemplate::default_dose,
        )?;

        let schedules = ScheduleService::new(
            db.clone(),
            ScheduleSynthesizer::new(ScheduleKind::Crop, crop),
            ScheduleSynthesizer::new(ScheduleKind::Dose, dose),
            config.max_photo_bytes,
        )
        .with_idle_ttl(Duration::from_secs(config.session_idle_secs));

        Ok(Self {
            config,
            db,
            schedules,
        })
    }
}

fn load_template(
    path: Option<&Path>,
    builtin: fn() -> ScheduleTemplate,
) -> Result<ScheduleTemplate, TemplateError> {
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading schedule template");
            ScheduleTemplate::load_from_file(path)
        }
        None => Ok(builtin()),
    }
}
