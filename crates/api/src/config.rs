// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Runtime configuration.
//!
//! Loaded from a JSON file; every field is optional.

use std::path::{Path, PathBuf};

use patrol_domain::ShiftCalendar;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, translate_domain_error};

/// Default start of the first export: 2025-12-25 00:00 at +08:00.
pub const DEFAULT_EXPORT_START_MS: i64 = 1_766_592_000_000;

pub const DEFAULT_WINDOWS_PER_SHEET: usize = 3;

/// Runtime settings shared by the boundary operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolConfig {
    /// IANA zone name or fixed `±HH:MM` offset.
    pub timezone: String,
    /// Passphrase keying the export seal. Empty disables sealing.
    pub export_passphrase: String,
    pub export_dir: PathBuf,
    /// Start of the first export when none has been confirmed yet.
    pub default_export_start_ms: i64,
    pub windows_per_sheet: usize,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            timezone: String::from("+08:00"),
            export_passphrase: String::from("patrol-export"),
            export_dir: PathBuf::from("./exports"),
            default_export_start_ms: DEFAULT_EXPORT_START_MS,
            windows_per_sheet: DEFAULT_WINDOWS_PER_SHEET,
        }
    }
}

impl PatrolConfig {
    /// Parses a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON for this type or
    /// names an unusable timezone.
    pub fn from_json(json: &str) -> Result<Self, ApiError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ApiError::InvalidInput {
            field: String::from("config"),
            message: e.to_string(),
        })?;
        config.calendar()?;
        if config.windows_per_sheet == 0 {
            return Err(ApiError::InvalidInput {
                field: String::from("windows_per_sheet"),
                message: String::from("must be at least 1"),
            });
        }
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ApiError> {
        let json: String = std::fs::read_to_string(path).map_err(|e| ApiError::InvalidInput {
            field: String::from("config"),
            message: format!("{}: {e}", path.display()),
        })?;
        let config: Self = Self::from_json(&json)?;
        info!(path = %path.display(), timezone = %config.timezone, "Loaded configuration");
        Ok(config)
    }

    /// The shift calendar for the configured timezone.
    ///
    /// # Errors
    ///
    /// Returns an error if the timezone is unknown or observes DST.
    pub fn calendar(&self) -> Result<ShiftCalendar, ApiError> {
        ShiftCalendar::from_zone(&self.timezone).map_err(translate_domain_error)
    }
}
