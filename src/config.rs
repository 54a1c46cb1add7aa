// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is read first when present.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Where documents are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Google Cloud Firestore (or its emulator)
    Firestore,
    /// Process-local maps, lost on restart
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StorageBackend::Firestore),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::Invalid("STORAGE_BACKEND", other.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    pub storage_backend: StorageBackend,
    /// JSON file overriding the built-in crop template
    pub crop_template_path: Option<PathBuf>,
    /// JSON file overriding the built-in dose template
    pub dose_template_path: Option<PathBuf>,
    /// Create the demo accounts when the user table is empty
    pub seed_demo_users: bool,
    /// Largest accepted evidence photo, in decoded bytes
    pub max_photo_bytes: usize,
    /// Seconds an untouched working set stays open
    pub session_idle_secs: u64,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: parse_var("PORT", 8080)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            storage_backend: parse_var("STORAGE_BACKEND", StorageBackend::Firestore)?,
            crop_template_path: optional_path("CROP_TEMPLATE_PATH"),
            dose_template_path: optional_path("DOSE_TEMPLATE_PATH"),
            seed_demo_users: parse_var("SEED_DEMO_USERS", true)?,
            max_photo_bytes: parse_var("MAX_PHOTO_BYTES", 2 * 1024 * 1024)?,
            session_idle_secs: parse_var("SESSION_IDLE_SECS", 8 * 60 * 60)?,

            jwt_signing_key: secret("JWT_SIGNING_KEY")?,
        })
    }

    /// Config for tests: in-memory storage, fixed keys.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            storage_backend: StorageBackend::Memory,
            crop_template_path: None,
            dose_template_path: None,
            seed_demo_users: true,
            max_photo_bytes: 64 * 1024,
            session_idle_secs: 8 * 60 * 60,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, value)),
        _ => Ok(default),
    }
}

fn optional_path(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

fn secret(name: &'static str) -> Result<Vec<u8>, ConfigError> {
    let value = env::var(name).map_err(|_| ConfigError::Missing(name))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Missing(name));
    }
    Ok(value.as_bytes().to_vec())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
