// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use patrol::{
    CorrectionReceipt, CorrectionRequest, FormItem, PointReview, ReviewCell, ReviewRow,
    RouteStatus, ScanResult, SubmissionReceipt, SubmissionRequest,
};
use patrol_persistence::Persistence;

use super::helpers::{
    HOUR_MS, MINUTE_MS, NIGHT_START_MS, calendar, first_slot_visit, open_session,
    seeded_persistence,
};
use crate::{
    ApiError, ScanRequest, StartSessionRequest, correct_record_item, review_point, route_status,
    scan_tag, start_session, submit_inspection,
};

fn scan(
    persistence: &mut Persistence,
    session_id: i64,
    tag: &str,
    at_ms: i64,
) -> Result<ScanResult, ApiError> {
    scan_tag(
        persistence,
        calendar(),
        &ScanRequest {
            session_id,
            tag: tag.to_string(),
        },
        at_ms,
    )
}

fn pressure_cell(review: &PointReview, slot_index: u32) -> ReviewCell {
    let row: &ReviewRow = review
        .rows
        .iter()
        .find(|r| r.item.item_id == "I-PRESSURE")
        .unwrap();
    row.cells
        .iter()
        .find(|c| c.slot_index == slot_index)
        .cloned()
        .unwrap()
}

#[test]
fn test_start_session_rejects_unknown_route() {
    let mut persistence: Persistence = seeded_persistence();

    let err: ApiError = start_session(
        &mut persistence,
        calendar(),
        &StartSessionRequest {
            route_id: String::from("R9"),
            operator_id: String::from("op-1"),
        },
        NIGHT_START_MS,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        ApiError::ResourceNotFound { ref resource_type, .. } if resource_type == "Route"
    ));
}

#[test]
fn test_scan_then_submit_then_rescan_redirects_to_review() {
    let mut persistence: Persistence = seeded_persistence();
    let session_id: i64 = open_session(&mut persistence, NIGHT_START_MS + 5 * MINUTE_MS);

    let first: ScanResult =
        scan(&mut persistence, session_id, "0a:1b", NIGHT_START_MS + 10 * MINUTE_MS).unwrap();
    assert_eq!(first.checkpoint.checkpoint_id, "CP-1");
    assert_eq!(first.slot_index, 1);
    assert!(!first.already_inspected);
    assert_eq!(first.form.len(), 2);

    let receipt: SubmissionReceipt = submit_inspection(
        &mut persistence,
        calendar(),
        &first_slot_visit(session_id),
        NIGHT_START_MS + 15 * MINUTE_MS,
    )
    .unwrap();
    assert_eq!(receipt.slot_index, 1);
    assert_eq!(receipt.entries_written, 2);
    assert!(receipt.abnormal_items.is_empty());

    let again: ScanResult =
        scan(&mut persistence, session_id, "0A1B", NIGHT_START_MS + 20 * MINUTE_MS).unwrap();
    assert!(again.already_inspected);
    assert!(again.form.is_empty());
}

#[test]
fn test_second_submission_for_the_same_slot_is_a_duplicate() {
    let mut persistence: Persistence = seeded_persistence();
    let session_id: i64 = open_session(&mut persistence, NIGHT_START_MS);
    let visit: SubmissionRequest = first_slot_visit(session_id);
    submit_inspection(&mut persistence, calendar(), &visit, NIGHT_START_MS + 10 * MINUTE_MS)
        .unwrap();

    let err: ApiError =
        submit_inspection(&mut persistence, calendar(), &visit, NIGHT_START_MS + 40 * MINUTE_MS)
            .unwrap_err();

    assert!(matches!(
        err,
        ApiError::DomainRuleViolation { ref rule, .. } if rule == "duplicate_slot"
    ));
}

#[test]
fn test_missing_values_and_state_are_listed_together() {
    let mut persistence: Persistence = seeded_persistence();
    let session_id: i64 = open_session(&mut persistence, NIGHT_START_MS);
    let mut visit: SubmissionRequest = first_slot_visit(session_id);
    visit.equipment_states.clear();
    visit.entries.clear();

    let err: ApiError =
        submit_inspection(&mut persistence, calendar(), &visit, NIGHT_START_MS + 10 * MINUTE_MS)
            .unwrap_err();

    let ApiError::MissingRequiredFields { fields } = err else {
        panic!("expected MissingRequiredFields, got {err:?}");
    };
    assert!(fields.contains(&String::from("P-1.state")));
    assert!(fields.contains(&String::from("I-PRESSURE")));
    assert!(fields.contains(&String::from("I-LEAK")));
}

#[test]
fn test_tags_are_resolved_against_the_session_route() {
    let mut persistence: Persistence = seeded_persistence();
    let session_id: i64 = open_session(&mut persistence, NIGHT_START_MS);

    let other_route: ApiError =
        scan(&mut persistence, session_id, "0C0D", NIGHT_START_MS + MINUTE_MS).unwrap_err();
    let unknown: ApiError =
        scan(&mut persistence, session_id, "FFFF", NIGHT_START_MS + MINUTE_MS).unwrap_err();

    assert!(matches!(
        other_route,
        ApiError::DomainRuleViolation { ref rule, .. } if rule == "tag_not_on_active_route"
    ));
    assert!(matches!(
        unknown,
        ApiError::ResourceNotFound { ref resource_type, .. } if resource_type == "Tag"
    ));
}

#[test]
fn test_next_slot_form_is_prefilled_with_the_last_value() {
    let mut persistence: Persistence = seeded_persistence();
    let session_id: i64 = open_session(&mut persistence, NIGHT_START_MS);
    submit_inspection(
        &mut persistence,
        calendar(),
        &first_slot_visit(session_id),
        NIGHT_START_MS + 10 * MINUTE_MS,
    )
    .unwrap();

    let next: ScanResult = scan(
        &mut persistence,
        session_id,
        "0A1B",
        NIGHT_START_MS + 2 * HOUR_MS + 10 * MINUTE_MS,
    )
    .unwrap();

    assert_eq!(next.slot_index, 2);
    let pressure: &FormItem = next
        .form
        .iter()
        .flat_map(|e| e.items.iter())
        .find(|i| i.item.item_id == "I-PRESSURE")
        .unwrap();
    assert_eq!(pressure.default_value.as_deref(), Some("3.2"));
    assert!(
        next.form
            .iter()
            .flat_map(|e| e.items.iter())
            .all(|i| i.item.item_id != "I-LEAK")
    );
}

#[test]
fn test_route_status_marks_the_inspected_slot() {
    let mut persistence: Persistence = seeded_persistence();
    let session_id: i64 = open_session(&mut persistence, NIGHT_START_MS);
    submit_inspection(
        &mut persistence,
        calendar(),
        &first_slot_visit(session_id),
        NIGHT_START_MS + 10 * MINUTE_MS,
    )
    .unwrap();

    let status: RouteStatus =
        route_status(&mut persistence, calendar(), "R1", NIGHT_START_MS + HOUR_MS).unwrap();

    assert_eq!(status.window.start_ms, NIGHT_START_MS);
    assert_eq!(status.checkpoints.len(), 1);
    assert_eq!(status.checkpoints[0].slots.len(), 4);
    assert_eq!(status.checkpoints[0].completed(), 1);
    assert!(status.checkpoints[0].slots[0].is_complete());
}

#[test]
fn test_correction_shows_in_review_without_touching_the_original() {
    let mut persistence: Persistence = seeded_persistence();
    let session_id: i64 = open_session(&mut persistence, NIGHT_START_MS);
    submit_inspection(
        &mut persistence,
        calendar(),
        &first_slot_visit(session_id),
        NIGHT_START_MS + 10 * MINUTE_MS,
    )
    .unwrap();
    let before: PointReview =
        review_point(&mut persistence, calendar(), "CP-1", NIGHT_START_MS + HOUR_MS).unwrap();
    let cell: ReviewCell = pressure_cell(&before, 1);
    assert_eq!(cell.value.as_deref(), Some("3.2"));
    assert!(!cell.corrected);

    let receipt: CorrectionReceipt = correct_record_item(
        &mut persistence,
        &CorrectionRequest {
            entry_id: cell.entry_id.unwrap(),
            value: String::from("7.5"),
            remark: Some(String::from("gauge re-read")),
            operator_id: String::from("op-2"),
        },
        NIGHT_START_MS + HOUR_MS,
    )
    .unwrap();
    assert_eq!(receipt.previous_value, "3.2");
    assert_eq!(receipt.new_value, "7.5");
    assert!(receipt.abnormal);

    let after: PointReview =
        review_point(&mut persistence, calendar(), "CP-1", NIGHT_START_MS + HOUR_MS).unwrap();
    let corrected: ReviewCell = pressure_cell(&after, 1);
    assert_eq!(corrected.value.as_deref(), Some("7.5"));
    assert!(corrected.corrected);
    assert_eq!(corrected.entry_id, cell.entry_id);
}

#[test]
fn test_next_slot_form_is_prefilled_with_the_corrected_value() {
    let mut persistence: Persistence = seeded_persistence();
    let session_id: i64 = open_session(&mut persistence, NIGHT_START_MS);
    submit_inspection(
        &mut persistence,
        calendar(),
        &first_slot_visit(session_id),
        NIGHT_START_MS + 10 * MINUTE_MS,
    )
    .unwrap();
    let review: PointReview =
        review_point(&mut persistence, calendar(), "CP-1", NIGHT_START_MS + HOUR_MS).unwrap();
    correct_record_item(
        &mut persistence,
        &CorrectionRequest {
            entry_id: pressure_cell(&review, 1).entry_id.unwrap(),
            value: String::from("4.1"),
            remark: None,
            operator_id: String::from("op-2"),
        },
        NIGHT_START_MS + HOUR_MS,
    )
    .unwrap();

    let next: ScanResult = scan(
        &mut persistence,
        session_id,
        "0A1B",
        NIGHT_START_MS + 2 * HOUR_MS + 10 * MINUTE_MS,
    )
    .unwrap();

    let pressure: &FormItem = next
        .form
        .iter()
        .flat_map(|e| e.items.iter())
        .find(|i| i.item.item_id == "I-PRESSURE")
        .unwrap();
    assert_eq!(pressure.default_value.as_deref(), Some("4.1"));
}
