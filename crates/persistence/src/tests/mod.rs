// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod audit_tests;

use patrol::{InspectionStore, NewInspection, ReferenceData};
use patrol_audit::{Action, Actor, AuditAction, AuditEvent, Cause};
use patrol_domain::{
    CheckItem, Checkpoint, Equipment, Frequency, InspectionRecord, InspectionRecordItem,
    InspectionSession, Operator, Route, ValueKind,
};

use crate::Persistence;

/// Start of the Night window on 2026-03-02 (+08:00).
pub const WINDOW_START_MS: i64 = 1_772_382_600_000;

pub const HOUR_MS: i64 = 3_600_000;

pub fn audit_event(kind: AuditAction, at_ms: i64) -> AuditEvent {
    AuditEvent::new(
        Actor::operator("op-1"),
        Cause::new(String::from("test"), String::from("Test operation")),
        Action::of(kind, None),
        at_ms,
    )
}

pub fn reference_data() -> ReferenceData {
    ReferenceData {
        routes: vec![Route {
            route_id: String::from("R1"),
            name: String::from("North loop"),
            description: Some(String::from("Boiler house and cooling towers")),
        }],
        checkpoints: vec![Checkpoint {
            checkpoint_id: String::from("CP-1"),
            name: String::from("Boiler feed"),
            location: String::from("Boiler house"),
            route_id: String::from("R1"),
            tag_uid: String::from("0A1B"),
        }],
        equipment: vec![
            Equipment {
                equipment_id: String::from("P-1"),
                name: String::from("Feed pump"),
                checkpoint_id: String::from("CP-1"),
                status_required: true,
            },
            Equipment {
                equipment_id: String::from("V-1"),
                name: String::from("Feed valve"),
                checkpoint_id: String::from("CP-1"),
                status_required: false,
            },
        ],
        check_items: vec![
            CheckItem {
                item_id: String::from("I-PRESSURE"),
                equipment_id: String::from("P-1"),
                name: String::from("Discharge pressure"),
                kind: ValueKind::Numeric,
                unit: Some(String::from("bar")),
                required: true,
                required_in_standby: true,
                min: Some(1.0),
                max: Some(5.0),
                frequency: Frequency::TwoHours,
            },
            CheckItem {
                item_id: String::from("I-LEAK"),
                equipment_id: String::from("V-1"),
                name: String::from("No leakage"),
                kind: ValueKind::Boolean,
                unit: None,
                required: true,
                required_in_standby: false,
                min: None,
                max: None,
                frequency: Frequency::EightHours,
            },
        ],
        operators: vec![Operator {
            operator_id: String::from("op-1"),
            name: String::from("Avery"),
        }],
    }
}

/// An in-memory store seeded with [`reference_data`].
pub fn seeded_persistence() -> Persistence {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    persistence.upsert_reference_data(&reference_data()).unwrap();
    persistence
}

pub fn start_session(persistence: &mut Persistence, at_ms: i64) -> i64 {
    let session: InspectionSession = InspectionSession {
        session_id: None,
        route_id: String::from("R1"),
        route_name: String::from("North loop"),
        operator_id: String::from("op-1"),
        shift_id: String::from("S3"),
        started_at_ms: at_ms,
    };
    persistence
        .insert_session(&session, &audit_event(AuditAction::SessionStarted, at_ms))
        .unwrap()
}

pub fn inspection(
    session_id: i64,
    checkpoint_id: &str,
    slot_index: u32,
    recorded_at_ms: i64,
    items: &[(&str, Option<&str>, &str)],
) -> NewInspection {
    NewInspection {
        record: InspectionRecord {
            record_id: None,
            session_id,
            checkpoint_id: checkpoint_id.to_string(),
            slot_index,
            frequency: Frequency::TwoHours,
            window_start_ms: WINDOW_START_MS,
            recorded_at_ms,
        },
        items: items
            .iter()
            .map(|(equipment_id, check_item_id, value)| InspectionRecordItem {
                entry_id: None,
                record_id: None,
                equipment_id: (*equipment_id).to_string(),
                check_item_id: check_item_id.map(str::to_string),
                slot_index,
                value: (*value).to_string(),
                remark: None,
                abnormal: false,
            })
            .collect(),
        equipment_states: Vec::new(),
        event: audit_event(AuditAction::InspectionSubmitted, recorded_at_ms),
    }
}
