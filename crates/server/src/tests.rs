// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode as HttpStatusCode},
};
use serde::de::DeserializeOwned;
use std::fs;
use std::sync::atomic::{AtomicI64, Ordering};
use tempfile::TempDir;
use tower::ServiceExt;

/// Start of the Night window on 2026-03-02 (+08:00).
const NIGHT_START_MS: i64 = 1_772_382_600_000;

const MINUTE_MS: i64 = 60_000;

struct TestServer {
    app: Router,
    now: Arc<AtomicI64>,
    reference_dir: TempDir,
    export_dir: TempDir,
}

impl TestServer {
    fn new() -> Self {
        let reference_dir: TempDir = tempfile::tempdir().unwrap();
        write_reference_csv(&reference_dir);
        let export_dir: TempDir = tempfile::tempdir().unwrap();
        let config: PatrolConfig = PatrolConfig {
            export_dir: export_dir.path().to_path_buf(),
            default_export_start_ms: NIGHT_START_MS,
            ..PatrolConfig::default()
        };

        let now: Arc<AtomicI64> = Arc::new(AtomicI64::new(NIGHT_START_MS + 10 * MINUTE_MS));
        let reader: Arc<AtomicI64> = Arc::clone(&now);
        let app_state: AppState = AppState {
            persistence: Arc::new(Mutex::new(
                Persistence::new_in_memory().expect("Failed to create in-memory persistence"),
            )),
            calendar: config.calendar().unwrap(),
            config: Arc::new(config),
            clock: Arc::new(move || reader.load(Ordering::SeqCst)),
        };

        Self {
            app: build_router(app_state),
            now,
            reference_dir,
            export_dir,
        }
    }

    fn set_now(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    async fn send(&self, method: &str, uri: &str, body: Option<serde_json::Value>) -> Response {
        let body: Body = body.map_or_else(Body::empty, |json| Body::from(json.to_string()));
        self.app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn seeded() -> Self {
        let server: Self = Self::new();
        let dir: String = server.reference_dir.path().display().to_string();
        let response: Response = server
            .send("POST", "/import", Some(serde_json::json!({ "dir": dir })))
            .await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        server
    }

    async fn start_session(&self) -> i64 {
        let response: Response = self
            .send(
                "POST",
                "/sessions",
                Some(serde_json::json!({ "route_id": "R1", "operator_id": "op-1" })),
            )
            .await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let session: InspectionSession = read_json(response).await;
        session.session_id.unwrap()
    }
}

fn write_reference_csv(dir: &TempDir) {
    let files: [(&str, &str); 5] = [
        ("routes.csv", "route_id,name\nR1,North loop\n"),
        (
            "checkpoints.csv",
            "checkpoint_id,name,location,route_id,tag_uid\nCP-1,Boiler feed,Boiler house,R1,0A1B\n",
        ),
        (
            "equipment.csv",
            "equipment_id,name,checkpoint_id,status_required\nV-1,Feed valve,CP-1,NO\n",
        ),
        (
            "check_items.csv",
            "item_id,equipment_id,name,value_kind,frequency_hours,required\n\
             I-LEAK,V-1,No leakage,BOOLEAN,8,YES\n",
        ),
        ("operators.csv", "operator_id,name\nop-1,Avery\n"),
    ];
    for (name, contents) in files {
        fs::write(dir.path().join(name), contents).unwrap();
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> T {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}

fn visit(session_id: i64, leak_free: &str) -> serde_json::Value {
    serde_json::json!({
        "session_id": session_id,
        "checkpoint_id": "CP-1",
        "equipment_states": {},
        "entries": [{ "check_item_id": "I-LEAK", "value": leak_free, "remark": null }]
    })
}

#[tokio::test]
async fn test_health_reports_ok() {
    let server: TestServer = TestServer::new();

    let response: Response = server.send("GET", "/health", None).await;

    assert_eq!(response.status(), HttpStatusCode::OK);
    let health: HealthResponse = read_json(response).await;
    assert_eq!(health.status, "ok");
}

#[tokio::test]
async fn test_round_trip_from_scan_to_dashboard() {
    let server: TestServer = TestServer::seeded().await;
    let session_id: i64 = server.start_session().await;

    let scan: Response = server
        .send(
            "POST",
            "/scan",
            Some(serde_json::json!({ "session_id": session_id, "tag": "0a1b" })),
        )
        .await;
    assert_eq!(scan.status(), HttpStatusCode::OK);
    let scan: serde_json::Value = read_json(scan).await;
    assert_eq!(scan["checkpoint"]["checkpoint_id"], "CP-1");
    assert_eq!(scan["already_inspected"], false);

    let submitted: Response = server
        .send("POST", "/inspections", Some(visit(session_id, "TRUE")))
        .await;
    assert_eq!(submitted.status(), HttpStatusCode::OK);

    let duplicate: Response = server
        .send("POST", "/inspections", Some(visit(session_id, "TRUE")))
        .await;
    assert_eq!(duplicate.status(), HttpStatusCode::CONFLICT);

    let status: Response = server.send("GET", "/routes/R1/status", None).await;
    assert_eq!(status.status(), HttpStatusCode::OK);
    let status: serde_json::Value = read_json(status).await;
    assert_eq!(status["checkpoints"][0]["slots"][0]["slot_index"], 1);
    assert!(status["checkpoints"][0]["slots"][0]["completed_at_ms"].is_i64());
}

#[tokio::test]
async fn test_missing_remark_lists_the_field() {
    let server: TestServer = TestServer::seeded().await;
    let session_id: i64 = server.start_session().await;

    let response: Response = server
        .send("POST", "/inspections", Some(visit(session_id, "FALSE")))
        .await;

    assert_eq!(response.status(), HttpStatusCode::BAD_REQUEST);
    let error: ErrorResponse = read_json(response).await;
    assert!(error.error);
    assert_eq!(error.fields, vec![String::from("I-LEAK.remark")]);
}

#[tokio::test]
async fn test_unknown_checkpoint_review_is_not_found() {
    let server: TestServer = TestServer::seeded().await;

    let response: Response = server.send("GET", "/checkpoints/CP-404/review", None).await;

    assert_eq!(response.status(), HttpStatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clock_regression_is_reported_and_purged() {
    let server: TestServer = TestServer::seeded().await;
    let session_id: i64 = server.start_session().await;
    server
        .send("POST", "/inspections", Some(visit(session_id, "TRUE")))
        .await;
    server.set_now(NIGHT_START_MS + 5 * MINUTE_MS);

    let clock: ClockStatusResponse = read_json(server.send("GET", "/clock", None).await).await;
    assert!(clock.regressed);

    let blocked: Response = server
        .send(
            "POST",
            "/scan",
            Some(serde_json::json!({ "session_id": session_id, "tag": "0A1B" })),
        )
        .await;
    assert_eq!(blocked.status(), HttpStatusCode::CONFLICT);

    let purged: Response = server
        .send(
            "POST",
            "/clock/purge",
            Some(serde_json::json!({ "session_id": session_id })),
        )
        .await;
    assert_eq!(purged.status(), HttpStatusCode::OK);
    let purged: PurgeResponse = read_json(purged).await;
    assert_eq!(purged.records_removed, 1);

    server.set_now(NIGHT_START_MS + 6 * MINUTE_MS);
    let clock: ClockStatusResponse = read_json(server.send("GET", "/clock", None).await).await;
    assert!(!clock.regressed);
}

#[tokio::test]
async fn test_clear_needs_the_confirmation_phrase() {
    let server: TestServer = TestServer::seeded().await;
    server.start_session().await;

    let refused: Response = server
        .send(
            "POST",
            "/data/clear",
            Some(serde_json::json!({
                "route_id": "R1",
                "operator_id": "op-1",
                "confirmation": "yes"
            })),
        )
        .await;
    let cleared: Response = server
        .send(
            "POST",
            "/data/clear",
            Some(serde_json::json!({
                "route_id": "R1",
                "operator_id": "op-1",
                "confirmation": "DELETE"
            })),
        )
        .await;

    assert_eq!(refused.status(), HttpStatusCode::BAD_REQUEST);
    assert_eq!(cleared.status(), HttpStatusCode::OK);
}

#[tokio::test]
async fn test_export_then_confirm_advances_the_range() {
    let server: TestServer = TestServer::seeded().await;
    let session_id: i64 = server.start_session().await;
    server
        .send("POST", "/inspections", Some(visit(session_id, "TRUE")))
        .await;
    server.set_now(NIGHT_START_MS + 60 * MINUTE_MS);

    let export: Response = server
        .send("POST", "/export", Some(serde_json::json!({})))
        .await;
    assert_eq!(export.status(), HttpStatusCode::OK);
    let export: ExportResponse = read_json(export).await;
    assert_eq!(export.range_start_ms, NIGHT_START_MS);
    assert!(export.files.iter().all(|f| f.starts_with(server.export_dir.path())));
    assert!(export.files.iter().all(|f| f.exists()));

    let confirmed: Response = server
        .send(
            "POST",
            "/export/confirm",
            Some(serde_json::json!({
                "range_start_ms": export.range_start_ms,
                "range_end_ms": export.range_end_ms,
                "operator_id": "op-1"
            })),
        )
        .await;
    assert_eq!(confirmed.status(), HttpStatusCode::OK);

    server.set_now(NIGHT_START_MS + 90 * MINUTE_MS);
    let next: ExportResponse = read_json(
        server
            .send("POST", "/export", Some(serde_json::json!({})))
            .await,
    )
    .await;
    assert_eq!(next.range_start_ms, export.range_end_ms);
}

#[tokio::test]
async fn test_confirming_a_future_range_is_a_bad_request() {
    let server: TestServer = TestServer::seeded().await;
    server.set_now(NIGHT_START_MS + 60 * MINUTE_MS);

    let confirmed: Response = server
        .send(
            "POST",
            "/export/confirm",
            Some(serde_json::json!({
                "range_start_ms": NIGHT_START_MS,
                "range_end_ms": NIGHT_START_MS + 24 * 60 * MINUTE_MS,
                "operator_id": "op-1"
            })),
        )
        .await;
    assert_eq!(confirmed.status(), HttpStatusCode::BAD_REQUEST);

    let export: Response = server
        .send("POST", "/export", Some(serde_json::json!({})))
        .await;
    assert_eq!(export.status(), HttpStatusCode::OK);
}

#[tokio::test]
async fn test_malformed_import_is_a_bad_request() {
    let server: TestServer = TestServer::new();
    fs::remove_file(server.reference_dir.path().join("operators.csv")).unwrap();
    let dir: String = server.reference_dir.path().display().to_string();

    let response: Response = server
        .send("POST", "/import", Some(serde_json::json!({ "dir": dir })))
        .await;

    assert_eq!(response.status(), HttpStatusCode::BAD_REQUEST);
}
