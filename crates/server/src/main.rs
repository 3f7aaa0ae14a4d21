// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use axum::{
    Json, Router,
    extract::{Path, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use patrol::{
    CorrectionReceipt, CorrectionRequest, PointReview, RouteStatus, ScanResult, SubmissionReceipt,
    SubmissionRequest,
};
use patrol_api::{
    ApiError, ClearDataRequest, ClockStatusResponse, ConfirmExportRequest, ExportMarkResponse,
    ExportRequest, ExportResponse, ImportRequest, ImportResponse, PatrolConfig, PreparedExport,
    PurgeRequest, PurgeResponse, ScanRequest, StartSessionRequest, check_clock, clear_all_data,
    confirm_export, correct_record_item, import_reference_data, open_report_sink, prepare_export,
    purge_future_records, review_point, route_status, scan_tag, start_session, submit_inspection,
    write_export,
};
use patrol_domain::{InspectionSession, ShiftCalendar};
use patrol_persistence::{Persistence, PersistenceError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// SafePatrol Server - local HTTP surface for the inspection rounds
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Path to a JSON runtime configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for generated reports, overriding the configuration
    #[arg(long)]
    export_dir: Option<PathBuf>,
}

/// Source of the current instant in epoch milliseconds.
type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

fn system_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().timestamp_millis())
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    persistence: Arc<Mutex<Persistence>>,
    config: Arc<PatrolConfig>,
    calendar: ShiftCalendar,
    clock: Clock,
}

impl AppState {
    fn now_ms(&self) -> i64 {
        (self.clock)()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HealthResponse {
    status: String,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
    /// Every missing field, for incomplete submissions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    fields: Vec<String>,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    status: StatusCode,
    message: String,
    fields: Vec<String>,
}

impl HttpError {
    const fn new(status: StatusCode, message: String) -> Self {
        Self {
            status,
            message,
            fields: Vec::new(),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
            fields: self.fields,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let message: String = err.to_string();
        match err {
            ApiError::DomainRuleViolation { ref rule, .. }
                if rule == "duplicate_slot" || rule == "clock_regression" =>
            {
                Self::new(StatusCode::CONFLICT, message)
            }
            ApiError::DomainRuleViolation { .. } => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
            }
            ApiError::InvalidInput { .. } | ApiError::InvalidCsvFormat { .. } => {
                Self::new(StatusCode::BAD_REQUEST, message)
            }
            ApiError::MissingRequiredFields { fields } => Self {
                status: StatusCode::BAD_REQUEST,
                message,
                fields,
            },
            ApiError::ResourceNotFound { .. } => Self::new(StatusCode::NOT_FOUND, message),
            ApiError::ExportFailed {
                encryption_setup: true,
                ..
            } => Self::new(StatusCode::UNPROCESSABLE_ENTITY, message),
            ApiError::ExportFailed { .. } | ApiError::Internal { .. } => {
                error!(error = %message, "Request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        }
    }
}

impl From<PersistenceError> for HttpError {
    fn from(err: PersistenceError) -> Self {
        error!(error = %err, "Persistence error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Persistence error: {err}"),
        )
    }
}

/// Handler for GET `/health` endpoint.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: String::from("ok"),
    })
}

/// Handler for POST `/sessions` endpoint.
///
/// Starts an inspection round for the current shift.
async fn handle_start_session(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> Result<Json<InspectionSession>, HttpError> {
    info!(
        route_id = %req.route_id,
        operator_id = %req.operator_id,
        "Handling start session request"
    );

    let now_ms: i64 = app_state.now_ms();
    let mut persistence = app_state.persistence.lock().await;
    let session: InspectionSession =
        start_session(&mut persistence, app_state.calendar, &req, now_ms)?;

    Ok(Json(session))
}

/// Handler for POST `/scan` endpoint.
async fn handle_scan(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<ScanRequest>,
) -> Result<Json<ScanResult>, HttpError> {
    info!(session_id = req.session_id, tag = %req.tag, "Handling scan request");

    let now_ms: i64 = app_state.now_ms();
    let mut persistence = app_state.persistence.lock().await;
    let result: ScanResult = scan_tag(&mut persistence, app_state.calendar, &req, now_ms)?;

    Ok(Json(result))
}

/// Handler for POST `/inspections` endpoint.
async fn handle_submit_inspection(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<SubmissionRequest>,
) -> Result<Json<SubmissionReceipt>, HttpError> {
    info!(
        session_id = req.session_id,
        checkpoint_id = %req.checkpoint_id,
        entries = req.entries.len(),
        "Handling inspection submission"
    );

    let now_ms: i64 = app_state.now_ms();
    let mut persistence = app_state.persistence.lock().await;
    let receipt: SubmissionReceipt =
        submit_inspection(&mut persistence, app_state.calendar, &req, now_ms)?;

    Ok(Json(receipt))
}

/// Handler for GET `/routes/{route_id}/status` endpoint.
///
/// The dashboard: slot completion of every checkpoint on the route.
async fn handle_route_status(
    AxumState(app_state): AxumState<AppState>,
    Path(route_id): Path<String>,
) -> Result<Json<RouteStatus>, HttpError> {
    let now_ms: i64 = app_state.now_ms();
    let mut persistence = app_state.persistence.lock().await;
    let status: RouteStatus =
        route_status(&mut persistence, app_state.calendar, &route_id, now_ms)?;

    Ok(Json(status))
}

/// Handler for GET `/checkpoints/{checkpoint_id}/review` endpoint.
async fn handle_review_point(
    AxumState(app_state): AxumState<AppState>,
    Path(checkpoint_id): Path<String>,
) -> Result<Json<PointReview>, HttpError> {
    let now_ms: i64 = app_state.now_ms();
    let mut persistence = app_state.persistence.lock().await;
    let review: PointReview =
        review_point(&mut persistence, app_state.calendar, &checkpoint_id, now_ms)?;

    Ok(Json(review))
}

/// Handler for POST `/corrections` endpoint.
async fn handle_correction(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<CorrectionRequest>,
) -> Result<Json<CorrectionReceipt>, HttpError> {
    info!(
        entry_id = req.entry_id,
        operator_id = %req.operator_id,
        "Handling correction request"
    );

    let now_ms: i64 = app_state.now_ms();
    let mut persistence = app_state.persistence.lock().await;
    let receipt: CorrectionReceipt = correct_record_item(&mut persistence, &req, now_ms)?;

    Ok(Json(receipt))
}

/// Handler for GET `/clock` endpoint.
async fn handle_check_clock(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<ClockStatusResponse>, HttpError> {
    let now_ms: i64 = app_state.now_ms();
    let mut persistence = app_state.persistence.lock().await;
    let status: ClockStatusResponse = check_clock(&mut persistence, app_state.calendar, now_ms)?;

    Ok(Json(status))
}

/// Handler for POST `/clock/purge` endpoint.
async fn handle_purge(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<PurgeRequest>,
) -> Result<Json<PurgeResponse>, HttpError> {
    warn!(session_id = req.session_id, "Handling purge of future-dated records");

    let now_ms: i64 = app_state.now_ms();
    let mut persistence = app_state.persistence.lock().await;
    let response: PurgeResponse =
        purge_future_records(&mut persistence, app_state.calendar, &req, now_ms)?;

    Ok(Json(response))
}

/// Handler for POST `/data/clear` endpoint.
async fn handle_clear_data(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<ClearDataRequest>,
) -> Result<Json<InspectionSession>, HttpError> {
    warn!(
        route_id = %req.route_id,
        operator_id = %req.operator_id,
        "Handling clear of all inspection data"
    );

    let now_ms: i64 = app_state.now_ms();
    let mut persistence = app_state.persistence.lock().await;
    let session: InspectionSession =
        clear_all_data(&mut persistence, app_state.calendar, &req, now_ms)?;

    Ok(Json(session))
}

/// Handler for POST `/export` endpoint.
///
/// Runs on the blocking pool. The store is locked only while the grid is
/// built; writing the files happens after the lock is released.
async fn handle_export(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<ExportRequest>,
) -> Result<Json<ExportResponse>, HttpError> {
    info!(route_id = ?req.route_id, "Handling export request");

    let now_ms: i64 = app_state.now_ms();
    let response: ExportResponse = tokio::task::spawn_blocking(move || {
        let mut sink = open_report_sink(&app_state.config)?;
        let prepared: PreparedExport = {
            let mut persistence = app_state.persistence.blocking_lock();
            prepare_export(
                &mut persistence,
                &app_state.config,
                app_state.calendar,
                &req,
                now_ms,
            )?
        };
        write_export(&prepared, &mut sink)
    })
    .await
    .map_err(|e| {
        HttpError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Export task failed: {e}"),
        )
    })??;

    Ok(Json(response))
}

/// Handler for POST `/export/confirm` endpoint.
async fn handle_confirm_export(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<ConfirmExportRequest>,
) -> Result<Json<ExportMarkResponse>, HttpError> {
    info!(
        range_start_ms = req.range_start_ms,
        range_end_ms = req.range_end_ms,
        operator_id = %req.operator_id,
        "Handling export confirmation"
    );

    let now_ms: i64 = app_state.now_ms();
    let mut persistence = app_state.persistence.lock().await;
    let response: ExportMarkResponse =
        confirm_export(&mut persistence, &app_state.config, &req, now_ms)?;

    Ok(Json(response))
}

/// Handler for POST `/import` endpoint.
async fn handle_import(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, HttpError> {
    info!(dir = %req.dir.display(), "Handling reference data import");

    let now_ms: i64 = app_state.now_ms();
    let mut persistence = app_state.persistence.lock().await;
    let response: ImportResponse = import_reference_data(&mut persistence, &req, now_ms)?;

    Ok(Json(response))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/sessions", post(handle_start_session))
        .route("/scan", post(handle_scan))
        .route("/inspections", post(handle_submit_inspection))
        .route("/routes/{route_id}/status", get(handle_route_status))
        .route("/checkpoints/{checkpoint_id}/review", get(handle_review_point))
        .route("/corrections", post(handle_correction))
        .route("/clock", get(handle_check_clock))
        .route("/clock/purge", post(handle_purge))
        .route("/data/clear", post(handle_clear_data))
        .route("/export", post(handle_export))
        .route("/export/confirm", post(handle_confirm_export))
        .route("/import", post(handle_import))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing SafePatrol Server");

    let mut config: PatrolConfig = match &args.config {
        Some(path) => PatrolConfig::load(path)?,
        None => PatrolConfig::default(),
    };
    if let Some(export_dir) = args.export_dir {
        config.export_dir = export_dir;
    }
    let calendar: ShiftCalendar = config.calendar()?;

    // Initialize persistence (in-memory or file-based based on CLI argument)
    let persistence: Persistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    };

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        config: Arc::new(config),
        calendar,
        clock: system_clock(),
    };

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests;
