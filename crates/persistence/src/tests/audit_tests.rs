// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use patrol::{ExportMark, InspectionStore};
use patrol_audit::{AuditAction, AuditEvent};

use super::{WINDOW_START_MS, audit_event, seeded_persistence, start_session};
use crate::{Persistence, PersistenceError};

#[test]
fn test_audit_event_round_trips_through_json_columns() {
    let mut persistence: Persistence = seeded_persistence();
    let mut event: AuditEvent = audit_event(AuditAction::ExportConfirmed, WINDOW_START_MS);
    event.action.details = Some(String::from("range 1 to 2"));

    let event_id: i64 = persistence.append_audit_event(&event).unwrap();
    let stored: AuditEvent = persistence.audit_event(event_id).unwrap();

    assert_eq!(stored, event.with_id(event_id));
}

#[test]
fn test_missing_audit_event_is_not_found() {
    let mut persistence: Persistence = seeded_persistence();

    assert!(matches!(
        persistence.audit_event(42),
        Err(PersistenceError::NotFound(_))
    ));
}

#[test]
fn test_session_start_is_audited() {
    let mut persistence: Persistence = seeded_persistence();
    start_session(&mut persistence, WINDOW_START_MS);

    let events: Vec<AuditEvent> = persistence.audit_events().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action.name, "SessionStarted");
    assert_eq!(events[0].actor.id, "op-1");
}

#[test]
fn test_last_export_mark_is_the_most_recent() {
    let mut persistence: Persistence = seeded_persistence();
    assert!(persistence.last_export_mark().unwrap().is_none());

    let marks: [ExportMark; 2] = [
        ExportMark {
            range_start_ms: 1_000,
            range_end_ms: 2_000,
            confirmed_at_ms: 2_500,
        },
        ExportMark {
            range_start_ms: 2_000,
            range_end_ms: 3_000,
            confirmed_at_ms: 3_500,
        },
    ];
    for mark in &marks {
        persistence
            .record_export_mark(
                mark,
                &audit_event(AuditAction::ExportConfirmed, mark.confirmed_at_ms),
            )
            .unwrap();
    }

    assert_eq!(persistence.last_export_mark().unwrap(), Some(marks[1]));
    assert_eq!(persistence.audit_events().unwrap().len(), 2);
}
