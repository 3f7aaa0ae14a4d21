// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use patrol::{EntryInput, SubmissionRequest};
use patrol_domain::{OperationalState, ShiftCalendar};
use patrol_persistence::Persistence;
use tempfile::TempDir;

use crate::{ImportRequest, StartSessionRequest, import_reference_data, start_session};

/// Start of the Night window on 2026-03-02 (+08:00).
pub const NIGHT_START_MS: i64 = 1_772_382_600_000;

pub const HOUR_MS: i64 = 3_600_000;

pub const MINUTE_MS: i64 = 60_000;

pub fn calendar() -> ShiftCalendar {
    ShiftCalendar::default()
}

pub fn write_reference_csv(dir: &Path) {
    fs::write(
        dir.join("routes.csv"),
        "route_id,name,description\nR1,North loop,Boiler house\nR2,South loop,\n",
    )
    .unwrap();
    fs::write(
        dir.join("checkpoints.csv"),
        "checkpoint_id,name,location,route_id,tag_uid\n\
         CP-1,Boiler feed,Boiler house,R1,0A1B\n\
         CP-2,Cooling tower,Yard,R2,0C0D\n",
    )
    .unwrap();
    fs::write(
        dir.join("equipment.csv"),
        "equipment_id,name,checkpoint_id,status_required\n\
         P-1,Feed pump,CP-1,YES\n\
         V-1,Feed valve,CP-1,NO\n\
         F-1,Tower fan,CP-2,NO\n",
    )
    .unwrap();
    fs::write(
        dir.join("check_items.csv"),
        "item_id,equipment_id,name,value_kind,frequency_hours,unit,required,required_in_standby,min,max\n\
         I-PRESSURE,P-1,Discharge pressure,NUMBER,2,bar,YES,YES,1,5\n\
         I-LEAK,V-1,No leakage,BOOLEAN,8,,YES,NO,,\n\
         I-FAN,F-1,Fan running,BOOLEAN,8,,YES,NO,,\n",
    )
    .unwrap();
    fs::write(
        dir.join("operators.csv"),
        "operator_id,name\nop-1,Avery\nop-2,Jordan\n",
    )
    .unwrap();
}

/// An in-memory store loaded through the CSV import.
pub fn seeded_persistence() -> Persistence {
    let dir: TempDir = tempfile::tempdir().unwrap();
    write_reference_csv(dir.path());
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    import_reference_data(
        &mut persistence,
        &ImportRequest {
            dir: dir.path().to_path_buf(),
        },
        NIGHT_START_MS - HOUR_MS,
    )
    .unwrap();
    persistence
}

pub fn open_session(persistence: &mut Persistence, at_ms: i64) -> i64 {
    start_session(
        persistence,
        calendar(),
        &StartSessionRequest {
            route_id: String::from("R1"),
            operator_id: String::from("op-1"),
        },
        at_ms,
    )
    .unwrap()
    .session_id
    .unwrap()
}

pub fn entry(check_item_id: &str, value: &str) -> EntryInput {
    EntryInput {
        check_item_id: check_item_id.to_string(),
        value: Some(value.to_string()),
        remark: None,
    }
}

/// A complete first-slot visit of CP-1 with the pump running.
pub fn first_slot_visit(session_id: i64) -> SubmissionRequest {
    let mut equipment_states: BTreeMap<String, OperationalState> = BTreeMap::new();
    equipment_states.insert(String::from("P-1"), OperationalState::Running);
    SubmissionRequest {
        session_id,
        checkpoint_id: String::from("CP-1"),
        equipment_states,
        entries: vec![entry("I-PRESSURE", "3.2"), entry("I-LEAK", "TRUE")],
    }
}
