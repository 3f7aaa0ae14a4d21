// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for the operator screens.
//!
//! Every handler takes the persistence layer explicitly plus the current
//! instant, so callers (and tests) control the clock.

use patrol::{
    ClockGuard, CoreError, CorrectionReceipt, CorrectionRequest, ExportMark, InspectionStore,
    InspectionFlow, PointReview, RecordAggregator, ReferenceData, ReportGrid, ReportGridBuilder,
    ReportSheet, ReportSubject, RouteStatus, ScanResult, SessionManager, SubmissionReceipt,
    SubmissionRequest, load_subjects,
};
use patrol_audit::{Action, Actor, AuditAction, AuditEvent, Cause};
use patrol_domain::{InspectionSession, ShiftCalendar};
use patrol_persistence::Persistence;
use tracing::{info, warn};

use crate::config::PatrolConfig;
use crate::csv_import::load_reference_data;
use crate::error::{ApiError, translate_core_error, translate_store_error};
use crate::report_writer::{CsvReportSink, ReportSink, WrittenReport, report_file_stem};
use crate::request_response::{
    ClearDataRequest, ClockStatusResponse, ConfirmExportRequest, ExportMarkResponse,
    ExportRequest, ExportResponse, ImportRequest, ImportResponse, PurgeRequest, PurgeResponse,
    ScanRequest, StartSessionRequest,
};

/// Imports reference data from a directory of CSV files.
///
/// Every file is parsed and validated first; the rows are then upserted in
/// a single transaction.
///
/// # Errors
///
/// Returns `InvalidCsvFormat` if any file or row is invalid, or an internal
/// error if the upsert fails. Nothing is written in either case.
pub fn import_reference_data(
    persistence: &mut Persistence,
    request: &ImportRequest,
    now_ms: i64,
) -> Result<ImportResponse, ApiError> {
    let data: ReferenceData = load_reference_data(&request.dir)?;
    persistence
        .upsert_reference_data(&data)
        .map_err(translate_store_error)?;

    let summary: String = format!(
        "routes={} checkpoints={} equipment={} check_items={} operators={}",
        data.routes.len(),
        data.checkpoints.len(),
        data.equipment.len(),
        data.check_items.len(),
        data.operators.len()
    );
    let event: AuditEvent = AuditEvent::new(
        Actor::system(),
        Cause::new(
            String::from("reference-import"),
            format!("Imported reference data from {}", request.dir.display()),
        ),
        Action::of(AuditAction::ReferenceDataImported, Some(summary)),
        now_ms,
    );
    let event_id: i64 = persistence
        .append_audit_event(&event)
        .map_err(translate_store_error)?;
    info!(event_id, rows = data.len(), "Imported reference data");

    Ok(ImportResponse {
        routes: data.routes.len(),
        checkpoints: data.checkpoints.len(),
        equipment: data.equipment.len(),
        check_items: data.check_items.len(),
        operators: data.operators.len(),
        event_id,
    })
}

/// Starts an inspection round on a route.
///
/// # Errors
///
/// Returns `ResourceNotFound` for an unknown route or operator.
pub fn start_session(
    persistence: &mut Persistence,
    calendar: ShiftCalendar,
    request: &StartSessionRequest,
    now_ms: i64,
) -> Result<InspectionSession, ApiError> {
    SessionManager::new(persistence, calendar)
        .start_session(&request.route_id, &request.operator_id, now_ms)
        .map_err(translate_core_error)
}

/// Resolves a scanned tag and prepares the inspection form.
///
/// When the current slot is already inspected the result carries
/// `already_inspected` and an empty form; the caller shows the review.
///
/// # Errors
///
/// Returns an error if the clock has regressed, the tag matches no
/// checkpoint, or the checkpoint is not on the session's route.
pub fn scan_tag(
    persistence: &mut Persistence,
    calendar: ShiftCalendar,
    request: &ScanRequest,
    now_ms: i64,
) -> Result<ScanResult, ApiError> {
    InspectionFlow::new(persistence, calendar)
        .scan(request.session_id, &request.tag, now_ms)
        .map_err(translate_core_error)
}

/// Validates and stores one checkpoint visit.
///
/// # Errors
///
/// Returns `MissingRequiredFields` listing every empty required value,
/// remark or state, a `duplicate_slot` violation if the slot is already
/// inspected, or the translated error of any other failed check.
pub fn submit_inspection(
    persistence: &mut Persistence,
    calendar: ShiftCalendar,
    request: &SubmissionRequest,
    now_ms: i64,
) -> Result<SubmissionReceipt, ApiError> {
    InspectionFlow::new(persistence, calendar)
        .submit(request, now_ms)
        .map_err(translate_core_error)
}

/// Slot completion of every checkpoint on a route for the current shift.
///
/// # Errors
///
/// Returns `ResourceNotFound` for an unknown route.
pub fn route_status(
    persistence: &mut Persistence,
    calendar: ShiftCalendar,
    route_id: &str,
    now_ms: i64,
) -> Result<RouteStatus, ApiError> {
    RecordAggregator::new(persistence, calendar)
        .route_status(route_id, now_ms)
        .map_err(translate_core_error)
}

/// The current shift's records at one checkpoint, with corrections applied.
///
/// # Errors
///
/// Returns `ResourceNotFound` for an unknown checkpoint.
pub fn review_point(
    persistence: &mut Persistence,
    calendar: ShiftCalendar,
    checkpoint_id: &str,
    now_ms: i64,
) -> Result<PointReview, ApiError> {
    patrol::review_point(persistence, &calendar, checkpoint_id, now_ms)
        .map_err(translate_core_error)
}

/// Appends a correction to a stored record item.
///
/// # Errors
///
/// Returns `ResourceNotFound` for an unknown entry or operator, a
/// `correctable_entry` violation for markers, or an input error if the new
/// value does not fit the item.
pub fn correct_record_item(
    persistence: &mut Persistence,
    request: &CorrectionRequest,
    now_ms: i64,
) -> Result<CorrectionReceipt, ApiError> {
    patrol::correct_record_item(persistence, request, now_ms).map_err(translate_core_error)
}

/// Compares the device clock with the newest stored record.
///
/// A regression is reported in the response rather than as an error so
/// the caller can offer the purge.
///
/// # Errors
///
/// Returns an internal error if the store cannot be read.
pub fn check_clock(
    persistence: &mut Persistence,
    calendar: ShiftCalendar,
    now_ms: i64,
) -> Result<ClockStatusResponse, ApiError> {
    let latest_record_ms: Option<i64> = persistence
        .latest_record_timestamp()
        .map_err(translate_store_error)?;
    let regressed: bool = match ClockGuard::new(persistence, calendar).check(now_ms) {
        Ok(()) => false,
        Err(CoreError::ClockRegression { .. }) => true,
        Err(err) => return Err(translate_core_error(err)),
    };

    Ok(ClockStatusResponse {
        regressed,
        latest_record_ms,
        now_ms,
    })
}

/// Deletes every record dated at or after `now_ms`.
///
/// # Errors
///
/// Returns `ResourceNotFound` for an unknown session.
pub fn purge_future_records(
    persistence: &mut Persistence,
    calendar: ShiftCalendar,
    request: &PurgeRequest,
    now_ms: i64,
) -> Result<PurgeResponse, ApiError> {
    ClockGuard::new(persistence, calendar)
        .purge_future_records(request.session_id, now_ms)
        .map(PurgeResponse::from)
        .map_err(translate_core_error)
}

/// Deletes all inspection data and starts a fresh session.
///
/// # Errors
///
/// Returns an `InvalidInput` error for `confirmation` unless it is exactly
/// `DELETE`; nothing is deleted then.
pub fn clear_all_data(
    persistence: &mut Persistence,
    calendar: ShiftCalendar,
    request: &ClearDataRequest,
    now_ms: i64,
) -> Result<InspectionSession, ApiError> {
    SessionManager::new(persistence, calendar)
        .clear_all_data(
            &request.route_id,
            &request.operator_id,
            &request.confirmation,
            now_ms,
        )
        .map_err(translate_core_error)
}

/// Opens the CSV sink configured for exports.
///
/// An empty passphrase disables the seal file.
///
/// # Errors
///
/// Returns `ExportFailed` with `encryption_setup` set if the passphrase
/// fails the passphrase policy, before any file is written.
pub fn open_report_sink(config: &PatrolConfig) -> Result<CsvReportSink, ApiError> {
    let passphrase: Option<&str> =
        Some(config.export_passphrase.as_str()).filter(|p| !p.is_empty());
    CsvReportSink::new(&config.export_dir, passphrase).map_err(ApiError::from)
}

/// A report built from one consistent read of the store, not yet written.
///
/// Produced by [`prepare_export`] while the store is borrowed and handed to
/// [`write_export`] afterwards, so file I/O does not hold the store.
#[derive(Debug, Clone)]
pub struct PreparedExport {
    pub range_start_ms: i64,
    pub range_end_ms: i64,
    pub file_stem: String,
    pub sheets: Vec<ReportSheet>,
    pub rows: usize,
}

/// Start of the next export: the end of the last confirmed range, or the
/// configured default when nothing has been confirmed.
///
/// # Errors
///
/// Returns an internal error if the export marks cannot be read.
pub fn next_export_start(
    persistence: &mut Persistence,
    config: &PatrolConfig,
) -> Result<i64, ApiError> {
    Ok(persistence
        .last_export_mark()
        .map_err(translate_store_error)?
        .map_or(config.default_export_start_ms, |mark| mark.range_end_ms))
}

/// Builds the report for everything since the last confirmed export.
///
/// The range is `[next export start, now)`. Building a report does not move
/// the next start; see [`confirm_export`].
///
/// # Errors
///
/// Returns an error if the range is empty or the grid cannot be built.
pub fn prepare_export(
    persistence: &mut Persistence,
    config: &PatrolConfig,
    calendar: ShiftCalendar,
    request: &ExportRequest,
    now_ms: i64,
) -> Result<PreparedExport, ApiError> {
    let range_start_ms: i64 = next_export_start(persistence, config)?;
    if range_start_ms >= now_ms {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from("export_range"),
            message: format!(
                "nothing to export: range starts at {range_start_ms}, now is {now_ms}"
            ),
        });
    }

    let route_filter: Option<&str> = request.route_id.as_deref();
    let subjects: Vec<ReportSubject> =
        load_subjects(persistence, route_filter).map_err(translate_core_error)?;
    let grid: ReportGrid = ReportGridBuilder::new(persistence, calendar)
        .build_grid(&subjects, range_start_ms, now_ms)
        .map_err(translate_core_error)?;

    Ok(PreparedExport {
        range_start_ms,
        range_end_ms: now_ms,
        file_stem: report_file_stem(
            &calendar,
            route_filter.unwrap_or("all"),
            range_start_ms,
            now_ms,
        ),
        sheets: grid.sheets(config.windows_per_sheet),
        rows: grid.rows.len(),
    })
}

/// Hands a prepared report to `sink`.
///
/// # Errors
///
/// Returns `ExportFailed` if the sink cannot write every sheet.
pub fn write_export(
    prepared: &PreparedExport,
    sink: &mut dyn ReportSink,
) -> Result<ExportResponse, ApiError> {
    let written: WrittenReport = sink
        .write_report(&prepared.file_stem, &prepared.sheets)
        .inspect_err(|err| {
            warn!(stem = %prepared.file_stem, error = %err, "Export failed");
        })?;
    info!(
        range_start_ms = prepared.range_start_ms,
        range_end_ms = prepared.range_end_ms,
        sheets = prepared.sheets.len(),
        rows = prepared.rows,
        "Generated export"
    );

    Ok(ExportResponse {
        range_start_ms: prepared.range_start_ms,
        range_end_ms: prepared.range_end_ms,
        files: written.files,
        seal: written.seal,
        sheets: prepared.sheets.len(),
        rows: prepared.rows,
    })
}

/// Builds and writes the report in one call.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `config` - Export start default and sheet size
/// * `calendar` - The shift calendar
/// * `request` - Optional route filter
/// * `sink` - Destination of the sheets
/// * `now_ms` - End of the range
///
/// # Errors
///
/// Returns an error if the range is empty, the route is unknown, or the
/// sink fails.
pub fn export_report(
    persistence: &mut Persistence,
    config: &PatrolConfig,
    calendar: ShiftCalendar,
    request: &ExportRequest,
    sink: &mut dyn ReportSink,
    now_ms: i64,
) -> Result<ExportResponse, ApiError> {
    let prepared: PreparedExport = prepare_export(persistence, config, calendar, request, now_ms)?;
    write_export(&prepared, sink)
}

/// Records that an export range was taken, advancing the next export start.
///
/// The range must start where the next export starts and must not end after
/// `now_ms`.
///
/// # Errors
///
/// Returns `InvalidInput` if the range is reversed, ends in the future or
/// does not start at the next export start, and `ResourceNotFound` for an
/// unknown operator.
pub fn confirm_export(
    persistence: &mut Persistence,
    config: &PatrolConfig,
    request: &ConfirmExportRequest,
    now_ms: i64,
) -> Result<ExportMarkResponse, ApiError> {
    if request.range_end_ms < request.range_start_ms {
        return Err(ApiError::InvalidInput {
            field: String::from("range_end_ms"),
            message: String::from("must not be earlier than range_start_ms"),
        });
    }
    if request.range_end_ms > now_ms {
        return Err(ApiError::InvalidInput {
            field: String::from("range_end_ms"),
            message: format!("{} is later than now ({now_ms})", request.range_end_ms),
        });
    }
    let expected_start_ms: i64 = next_export_start(persistence, config)?;
    if request.range_start_ms != expected_start_ms {
        return Err(ApiError::InvalidInput {
            field: String::from("range_start_ms"),
            message: format!(
                "{} does not match the next export start {expected_start_ms}",
                request.range_start_ms
            ),
        });
    }
    if persistence
        .operator(&request.operator_id)
        .map_err(translate_store_error)?
        .is_none()
    {
        return Err(translate_core_error(CoreError::OperatorNotFound(
            request.operator_id.clone(),
        )));
    }

    let mark: ExportMark = ExportMark {
        range_start_ms: request.range_start_ms,
        range_end_ms: request.range_end_ms,
        confirmed_at_ms: now_ms,
    };
    let event: AuditEvent = AuditEvent::new(
        Actor::operator(&request.operator_id),
        Cause::new(
            String::from("export"),
            String::from("Operator confirmed an export"),
        ),
        Action::of(
            AuditAction::ExportConfirmed,
            Some(format!(
                "range={}..{}",
                request.range_start_ms, request.range_end_ms
            )),
        ),
        now_ms,
    );
    let mark_id: i64 = persistence
        .record_export_mark(&mark, &event)
        .map_err(translate_store_error)?;
    info!(mark_id, range_end_ms = mark.range_end_ms, "Confirmed export");

    Ok(ExportMarkResponse::new(mark_id, &mark))
}
