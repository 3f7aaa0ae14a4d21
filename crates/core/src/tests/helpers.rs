// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    CoreError, ExportMark, InspectionStore, NewInspection, PurgeSummary, ReferenceData,
    StoreError,
};
use chrono::NaiveDate;
use patrol_audit::AuditEvent;
use patrol_domain::{
    CheckItem, Checkpoint, Equipment, Frequency, InspectionRecord, InspectionRecordItem,
    InspectionSession, OperationalState, Operator, RecordItemCorrection, Route,
    ShiftCalendar, ValueKind,
};
use std::collections::BTreeMap;

/// In-memory store with the same ordering and uniqueness rules as the
/// SQLite implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub data: ReferenceData,
    pub states: BTreeMap<String, OperationalState>,
    pub sessions: Vec<InspectionSession>,
    pub records: Vec<InspectionRecord>,
    pub items: Vec<InspectionRecordItem>,
    pub corrections: Vec<RecordItemCorrection>,
    pub events: Vec<AuditEvent>,
    pub export_marks: Vec<ExportMark>,
    next_id: i64,
}

impl MemoryStore {
    pub fn with_data(data: ReferenceData) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    const fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn write_inspection(&mut self, inspection: &NewInspection) -> Result<i64, StoreError> {
        let record = &inspection.record;
        if !record.is_system_audit()
            && self.records.iter().any(|r| {
                r.checkpoint_id == record.checkpoint_id
                    && r.slot_index == record.slot_index
                    && r.window_start_ms == record.window_start_ms
            })
        {
            return Err(StoreError::Conflict(format!(
                "inspection_records {} slot {}",
                record.checkpoint_id, record.slot_index
            )));
        }

        let record_id: i64 = self.next_id();
        let mut stored: InspectionRecord = record.clone();
        stored.record_id = Some(record_id);
        self.records.push(stored);

        for item in &inspection.items {
            let entry_id: i64 = self.next_id();
            let mut stored: InspectionRecordItem = item.clone();
            stored.entry_id = Some(entry_id);
            stored.record_id = Some(record_id);
            self.items.push(stored);
        }
        for (equipment_id, state) in &inspection.equipment_states {
            self.states.insert(equipment_id.clone(), *state);
        }
        self.push_event(&inspection.event);
        Ok(record_id)
    }

    fn push_event(&mut self, event: &AuditEvent) -> i64 {
        let event_id: i64 = self.next_id();
        self.events.push(event.clone().with_id(event_id));
        event_id
    }
}

fn sorted_records(mut records: Vec<InspectionRecord>) -> Vec<InspectionRecord> {
    records.sort_by_key(|r| (r.recorded_at_ms, r.record_id));
    records
}

impl InspectionStore for MemoryStore {
    fn upsert_reference_data(&mut self, data: &ReferenceData) -> Result<(), StoreError> {
        fn merge<T: Clone>(target: &mut Vec<T>, incoming: &[T], key: impl Fn(&T) -> &str) {
            for row in incoming {
                match target.iter_mut().find(|existing| key(existing) == key(row)) {
                    Some(existing) => *existing = row.clone(),
                    None => target.push(row.clone()),
                }
            }
        }
        merge(&mut self.data.routes, &data.routes, |r| &r.route_id);
        merge(&mut self.data.checkpoints, &data.checkpoints, |c| &c.checkpoint_id);
        merge(&mut self.data.equipment, &data.equipment, |e| &e.equipment_id);
        merge(&mut self.data.check_items, &data.check_items, |i| &i.item_id);
        merge(&mut self.data.operators, &data.operators, |o| &o.operator_id);
        Ok(())
    }

    fn routes(&mut self) -> Result<Vec<Route>, StoreError> {
        let mut routes: Vec<Route> = self.data.routes.clone();
        routes.sort_by(|a, b| a.route_id.cmp(&b.route_id));
        Ok(routes)
    }

    fn route(&mut self, route_id: &str) -> Result<Option<Route>, StoreError> {
        Ok(self.data.routes.iter().find(|r| r.route_id == route_id).cloned())
    }

    fn operator(&mut self, operator_id: &str) -> Result<Option<Operator>, StoreError> {
        Ok(self
            .data
            .operators
            .iter()
            .find(|o| o.operator_id == operator_id)
            .cloned())
    }

    fn checkpoint(&mut self, checkpoint_id: &str) -> Result<Option<Checkpoint>, StoreError> {
        Ok(self
            .data
            .checkpoints
            .iter()
            .find(|c| c.checkpoint_id == checkpoint_id)
            .cloned())
    }

    fn checkpoints_for_route(&mut self, route_id: &str) -> Result<Vec<Checkpoint>, StoreError> {
        let mut checkpoints: Vec<Checkpoint> = self
            .data
            .checkpoints
            .iter()
            .filter(|c| c.route_id == route_id)
            .cloned()
            .collect();
        checkpoints.sort_by(|a, b| a.checkpoint_id.cmp(&b.checkpoint_id));
        Ok(checkpoints)
    }

    fn checkpoints_by_tags(
        &mut self,
        tag_variants: &[String],
    ) -> Result<Vec<Checkpoint>, StoreError> {
        Ok(self
            .data
            .checkpoints
            .iter()
            .filter(|c| tag_variants.contains(&c.tag_uid))
            .cloned()
            .collect())
    }

    fn equipment_for_checkpoint(
        &mut self,
        checkpoint_id: &str,
    ) -> Result<Vec<Equipment>, StoreError> {
        let mut equipment: Vec<Equipment> = self
            .data
            .equipment
            .iter()
            .filter(|e| e.checkpoint_id == checkpoint_id)
            .cloned()
            .collect();
        equipment.sort_by(|a, b| a.equipment_id.cmp(&b.equipment_id));
        Ok(equipment)
    }

    fn check_items_for_equipment(
        &mut self,
        equipment_ids: &[String],
    ) -> Result<Vec<CheckItem>, StoreError> {
        let mut items: Vec<CheckItem> = self
            .data
            .check_items
            .iter()
            .filter(|i| equipment_ids.contains(&i.equipment_id))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.equipment_id
                .cmp(&b.equipment_id)
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        Ok(items)
    }

    fn check_item(&mut self, item_id: &str) -> Result<Option<CheckItem>, StoreError> {
        Ok(self
            .data
            .check_items
            .iter()
            .find(|i| i.item_id == item_id)
            .cloned())
    }

    fn equipment_states(
        &mut self,
        equipment_ids: &[String],
    ) -> Result<Vec<(String, OperationalState)>, StoreError> {
        Ok(self
            .states
            .iter()
            .filter(|(id, _)| equipment_ids.contains(id))
            .map(|(id, state)| (id.clone(), *state))
            .collect())
    }

    fn insert_session(
        &mut self,
        session: &InspectionSession,
        event: &AuditEvent,
    ) -> Result<i64, StoreError> {
        let session_id: i64 = self.next_id();
        let mut stored: InspectionSession = session.clone();
        stored.session_id = Some(session_id);
        self.sessions.push(stored);
        self.push_event(event);
        Ok(session_id)
    }

    fn session(&mut self, session_id: i64) -> Result<Option<InspectionSession>, StoreError> {
        Ok(self
            .sessions
            .iter()
            .find(|s| s.session_id == Some(session_id))
            .cloned())
    }

    fn sessions_by_ids(
        &mut self,
        session_ids: &[i64],
    ) -> Result<Vec<InspectionSession>, StoreError> {
        Ok(self
            .sessions
            .iter()
            .filter(|s| s.session_id.is_some_and(|id| session_ids.contains(&id)))
            .cloned()
            .collect())
    }

    fn insert_inspection(&mut self, inspection: &NewInspection) -> Result<i64, StoreError> {
        self.write_inspection(inspection)
    }

    fn record(&mut self, record_id: i64) -> Result<Option<InspectionRecord>, StoreError> {
        Ok(self
            .records
            .iter()
            .find(|r| r.record_id == Some(record_id))
            .cloned())
    }

    fn records_in_window(
        &mut self,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<InspectionRecord>, StoreError> {
        Ok(sorted_records(
            self.records
                .iter()
                .filter(|r| start_ms <= r.recorded_at_ms && r.recorded_at_ms < end_ms)
                .cloned()
                .collect(),
        ))
    }

    fn records_for_checkpoint_slot_in_window(
        &mut self,
        checkpoint_id: &str,
        slot_index: u32,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<InspectionRecord>, StoreError> {
        Ok(sorted_records(
            self.records
                .iter()
                .filter(|r| r.checkpoint_id == checkpoint_id && r.slot_index == slot_index)
                .filter(|r| start_ms <= r.recorded_at_ms && r.recorded_at_ms < end_ms)
                .cloned()
                .collect(),
        ))
    }

    fn items_for_record_ids(
        &mut self,
        record_ids: &[i64],
    ) -> Result<Vec<InspectionRecordItem>, StoreError> {
        Ok(self
            .items
            .iter()
            .filter(|i| i.record_id.is_some_and(|id| record_ids.contains(&id)))
            .cloned()
            .collect())
    }

    fn record_item(&mut self, entry_id: i64) -> Result<Option<InspectionRecordItem>, StoreError> {
        Ok(self
            .items
            .iter()
            .find(|i| i.entry_id == Some(entry_id))
            .cloned())
    }

    fn latest_value_for_item(&mut self, check_item_id: &str) -> Result<Option<String>, StoreError> {
        let newest = self
            .items
            .iter()
            .filter(|i| i.check_item_id.as_deref() == Some(check_item_id))
            .filter_map(|i| {
                let record = self.records.iter().find(|r| r.record_id == i.record_id)?;
                Some((record.recorded_at_ms, i.entry_id, i.value.clone()))
            })
            .max_by_key(|(at, id, _)| (*at, *id));
        Ok(newest.map(|(_, entry_id, value)| {
            self.corrections
                .iter()
                .filter(|c| Some(c.entry_id) == entry_id)
                .max_by_key(|c| (c.corrected_at_ms, c.correction_id))
                .map_or(value, |c| c.new_value.clone())
        }))
    }

    fn latest_record_timestamp(&mut self) -> Result<Option<i64>, StoreError> {
        Ok(self.records.iter().map(|r| r.recorded_at_ms).max())
    }

    fn append_correction(
        &mut self,
        correction: &RecordItemCorrection,
        event: &AuditEvent,
    ) -> Result<i64, StoreError> {
        if !self
            .items
            .iter()
            .any(|i| i.entry_id == Some(correction.entry_id))
        {
            return Err(StoreError::NotFound(format!(
                "record item {}",
                correction.entry_id
            )));
        }
        let correction_id: i64 = self.next_id();
        let mut stored: RecordItemCorrection = correction.clone();
        stored.correction_id = Some(correction_id);
        self.corrections.push(stored);
        self.push_event(event);
        Ok(correction_id)
    }

    fn corrections_for_items(
        &mut self,
        entry_ids: &[i64],
    ) -> Result<Vec<RecordItemCorrection>, StoreError> {
        let mut corrections: Vec<RecordItemCorrection> = self
            .corrections
            .iter()
            .filter(|c| entry_ids.contains(&c.entry_id))
            .cloned()
            .collect();
        corrections.sort_by_key(|c| (c.corrected_at_ms, c.correction_id));
        Ok(corrections)
    }

    fn clear_inspection_data(
        &mut self,
        replacement: &InspectionSession,
        event: &AuditEvent,
    ) -> Result<i64, StoreError> {
        self.corrections.clear();
        self.items.clear();
        self.records.clear();
        self.sessions.clear();
        self.insert_session(replacement, event)
    }

    fn purge_records_after(
        &mut self,
        cutoff_ms: i64,
        audit_record: &NewInspection,
    ) -> Result<PurgeSummary, StoreError> {
        let doomed: Vec<Option<i64>> = self
            .records
            .iter()
            .filter(|r| r.recorded_at_ms >= cutoff_ms)
            .map(|r| r.record_id)
            .collect();
        let items_before: usize = self.items.len();
        self.items.retain(|i| !doomed.contains(&i.record_id));
        let items_removed: usize = items_before - self.items.len();
        self.records.retain(|r| r.recorded_at_ms < cutoff_ms);

        let audit_record_id: i64 = self.write_inspection(audit_record)?;
        Ok(PurgeSummary {
            records_removed: doomed.len(),
            items_removed,
            audit_record_id,
        })
    }

    fn last_export_mark(&mut self) -> Result<Option<ExportMark>, StoreError> {
        Ok(self.export_marks.last().copied())
    }

    fn record_export_mark(
        &mut self,
        mark: &ExportMark,
        event: &AuditEvent,
    ) -> Result<i64, StoreError> {
        self.export_marks.push(*mark);
        Ok(self.push_event(event))
    }

    fn append_audit_event(&mut self, event: &AuditEvent) -> Result<i64, StoreError> {
        Ok(self.push_event(event))
    }
}

pub fn calendar() -> ShiftCalendar {
    ShiftCalendar::default()
}

/// Epoch milliseconds of a local (+08:00) wall-clock time.
pub fn local_ms(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> i64 {
    let local = NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap();
    calendar().instant_of(local)
}

pub fn route(route_id: &str, name: &str) -> Route {
    Route {
        route_id: route_id.to_string(),
        name: name.to_string(),
        description: None,
    }
}

pub fn checkpoint(checkpoint_id: &str, route_id: &str, tag_uid: &str) -> Checkpoint {
    Checkpoint {
        checkpoint_id: checkpoint_id.to_string(),
        name: format!("Checkpoint {checkpoint_id}"),
        location: String::from("Pump house"),
        route_id: route_id.to_string(),
        tag_uid: tag_uid.to_string(),
    }
}

pub fn equipment(equipment_id: &str, checkpoint_id: &str, status_required: bool) -> Equipment {
    Equipment {
        equipment_id: equipment_id.to_string(),
        name: format!("Equipment {equipment_id}"),
        checkpoint_id: checkpoint_id.to_string(),
        status_required,
    }
}

pub fn check_item(
    item_id: &str,
    equipment_id: &str,
    kind: ValueKind,
    frequency: Frequency,
) -> CheckItem {
    CheckItem {
        item_id: item_id.to_string(),
        equipment_id: equipment_id.to_string(),
        name: format!("Item {item_id}"),
        kind,
        unit: None,
        required: true,
        required_in_standby: false,
        min: None,
        max: None,
        frequency,
    }
}

/// Route R1 with checkpoint CP-1 carrying a 2h pressure reading and an 8h
/// leak check on pump P-1 and an optional 4h text note on valve V-1.
///
/// Tag `0A1B` is bound to CP-1 on R1 and, byte-reversed, to CP-9 on R2.
pub fn reference_data() -> ReferenceData {
    let mut pressure = check_item("I-PRESSURE", "P-1", ValueKind::Numeric, Frequency::TwoHours);
    pressure.min = Some(1.0);
    pressure.max = Some(5.0);
    pressure.required_in_standby = true;
    let leak = check_item("I-LEAK", "P-1", ValueKind::Boolean, Frequency::EightHours);
    let mut note = check_item("I-NOTE", "V-1", ValueKind::Text, Frequency::FourHours);
    note.required = false;

    ReferenceData {
        routes: vec![route("R1", "North loop"), route("R2", "South loop")],
        checkpoints: vec![
            checkpoint("CP-1", "R1", "0A1B"),
            checkpoint("CP-2", "R1", "C0FFEE"),
            checkpoint("CP-9", "R2", "1b0a"),
        ],
        equipment: vec![
            equipment("P-1", "CP-1", true),
            equipment("V-1", "CP-1", false),
            equipment("T-9", "CP-9", false),
        ],
        check_items: vec![
            pressure,
            leak,
            note,
            check_item("I-TEMP", "T-9", ValueKind::Numeric, Frequency::EightHours),
        ],
        operators: vec![Operator {
            operator_id: String::from("op-1"),
            name: String::from("Avery"),
        }],
    }
}

pub fn seeded_store() -> MemoryStore {
    MemoryStore::with_data(reference_data())
}

/// Inserts a session directly, returning its id.
pub fn insert_session(store: &mut MemoryStore, route_id: &str, started_at_ms: i64) -> i64 {
    let session = InspectionSession {
        session_id: None,
        route_id: route_id.to_string(),
        route_name: format!("Route {route_id}"),
        operator_id: String::from("op-1"),
        shift_id: String::from("S1"),
        started_at_ms,
    };
    store
        .insert_session(&session, &audit_event(started_at_ms))
        .unwrap()
}

pub fn audit_event(at_ms: i64) -> AuditEvent {
    AuditEvent::new(
        patrol_audit::Actor::operator("op-1"),
        patrol_audit::Cause::new(String::from("test"), String::from("Test setup")),
        patrol_audit::Action::new(String::from("TestSetup"), None),
        at_ms,
    )
}

/// Writes a record with the given entries directly, bypassing validation.
pub fn insert_record(
    store: &mut MemoryStore,
    session_id: i64,
    checkpoint_id: &str,
    frequency: Frequency,
    recorded_at_ms: i64,
    entries: &[(&str, Option<&str>, &str)],
) -> Result<i64, CoreError> {
    let window = calendar().resolve_shift(recorded_at_ms);
    let slot_index: u32 = patrol_domain::slot_in_window(&window, frequency.hours(), recorded_at_ms);
    let items: Vec<InspectionRecordItem> = entries
        .iter()
        .map(|(equipment_id, item_id, value)| InspectionRecordItem {
            entry_id: None,
            record_id: None,
            equipment_id: (*equipment_id).to_string(),
            check_item_id: item_id.map(str::to_string),
            slot_index,
            value: (*value).to_string(),
            remark: None,
            abnormal: false,
        })
        .collect();
    let inspection = NewInspection {
        record: InspectionRecord {
            record_id: None,
            session_id,
            checkpoint_id: checkpoint_id.to_string(),
            slot_index,
            frequency,
            window_start_ms: window.start_ms,
            recorded_at_ms,
        },
        items,
        equipment_states: Vec::new(),
        event: audit_event(recorded_at_ms),
    };
    Ok(store.insert_inspection(&inspection)?)
}
