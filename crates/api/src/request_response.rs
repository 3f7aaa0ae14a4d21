// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Requests that map one-to-one onto core inputs (`SubmissionRequest`,
//! `CorrectionRequest`) are used directly; the types here cover the rest.

use std::path::PathBuf;

use patrol::{ExportMark, PurgeSummary};
use serde::{Deserialize, Serialize};

/// API request to start an inspection round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub route_id: String,
    pub operator_id: String,
}

/// API request to resolve a scanned tag within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub session_id: i64,
    /// The tag identifier as read by the scanner.
    pub tag: String,
}

/// API request to delete all inspection data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearDataRequest {
    /// Route of the fresh session started after the clear.
    pub route_id: String,
    pub operator_id: String,
    /// Must be exactly `DELETE`.
    pub confirmation: String,
}

/// API request to purge records dated after the device clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeRequest {
    /// The session the purge marker is attributed to.
    pub session_id: i64,
}

/// API request to generate an export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Limits the export to one route; all routes when absent.
    #[serde(default)]
    pub route_id: Option<String>,
}

/// API request to confirm that an export was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmExportRequest {
    pub range_start_ms: i64,
    pub range_end_ms: i64,
    pub operator_id: String,
}

/// API request to import reference data from a directory of CSV files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRequest {
    pub dir: PathBuf,
}

/// API response describing the device clock against stored records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockStatusResponse {
    /// Whether the newest stored record is later than `now_ms`.
    pub regressed: bool,
    pub latest_record_ms: Option<i64>,
    pub now_ms: i64,
}

/// API response for a purge of future-dated records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeResponse {
    pub records_removed: usize,
    pub items_removed: usize,
    /// The system audit record left in place of the purged records.
    pub audit_record_id: i64,
    pub message: String,
}

impl From<PurgeSummary> for PurgeResponse {
    fn from(summary: PurgeSummary) -> Self {
        Self {
            records_removed: summary.records_removed,
            items_removed: summary.items_removed,
            audit_record_id: summary.audit_record_id,
            message: format!(
                "Purged {} future-dated record(s) with {} item(s)",
                summary.records_removed, summary.items_removed
            ),
        }
    }
}

/// API response for a generated export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResponse {
    pub range_start_ms: i64,
    pub range_end_ms: i64,
    pub files: Vec<PathBuf>,
    pub seal: Option<PathBuf>,
    pub sheets: usize,
    pub rows: usize,
}

/// API response for a confirmed export range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMarkResponse {
    pub mark_id: i64,
    pub range_start_ms: i64,
    pub range_end_ms: i64,
    pub confirmed_at_ms: i64,
    /// Where the next export will start.
    pub next_export_start_ms: i64,
}

impl ExportMarkResponse {
    #[must_use]
    pub const fn new(mark_id: i64, mark: &ExportMark) -> Self {
        Self {
            mark_id,
            range_start_ms: mark.range_start_ms,
            range_end_ms: mark.range_end_ms,
            confirmed_at_ms: mark.confirmed_at_ms,
            next_export_start_ms: mark.range_end_ms,
        }
    }
}

/// API response for a reference-data import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResponse {
    pub routes: usize,
    pub checkpoints: usize,
    pub equipment: usize,
    pub check_items: usize,
    pub operators: usize,
    /// The audit event recording the import.
    pub event_id: i64,
}
