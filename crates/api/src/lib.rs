// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Operator-facing boundary of the patrol inspection system.
//!
//! Handlers wrap the engine components with the concrete [`Persistence`]
//! store, translate engine errors into [`ApiError`], and own the parts
//! of the system that touch the filesystem: CSV reference-data import and
//! report export.
//!
//! [`Persistence`]: patrol_persistence::Persistence

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod config;
mod csv_import;
mod error;
mod handlers;
mod passphrase;
mod report_writer;
mod request_response;

#[cfg(test)]
mod tests;

pub use config::{DEFAULT_EXPORT_START_MS, DEFAULT_WINDOWS_PER_SHEET, PatrolConfig};
pub use csv_import::{
    CHECK_ITEMS_FILE, CHECKPOINTS_FILE, EQUIPMENT_FILE, OPERATORS_FILE, ROUTES_FILE,
    load_reference_data,
};
pub use error::{ApiError, translate_core_error, translate_domain_error, translate_store_error};
pub use handlers::{
    PreparedExport, check_clock, clear_all_data, confirm_export, correct_record_item,
    export_report, import_reference_data, next_export_start, open_report_sink, prepare_export,
    purge_future_records, review_point, route_status, scan_tag, start_session, submit_inspection,
    write_export,
};
pub use passphrase::{PassphraseError, PassphrasePolicy};
pub use report_writer::{
    CsvReportSink, ExportError, ReportSink, WrittenReport, report_file_stem, seal_digest,
};
pub use request_response::{
    ClearDataRequest, ClockStatusResponse, ConfirmExportRequest, ExportMarkResponse,
    ExportRequest, ExportResponse, ImportRequest, ImportResponse, PurgeRequest, PurgeResponse,
    ScanRequest, StartSessionRequest,
};
