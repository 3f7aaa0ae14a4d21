// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The scan and submission flow of one checkpoint visit.
//!
//! A scan resolves the tag, works out the slot the visit belongs to and
//! returns the items due now. A submission re-derives the same slot from
//! its own timestamp, refuses duplicates and validates every entry before
//! the record is written.

use crate::clock::ClockGuard;
use crate::duplicate_guard::DuplicateGuard;
use crate::error::{CoreError, StoreError};
use crate::store::{InspectionStore, NewInspection};
use crate::tag_resolver::{AmbiguousTagBinding, TagResolution, TagResolver};
use patrol_audit::{Action, Actor, AuditAction, AuditEvent, Cause};
use patrol_domain::{
    BOOLEAN_FALSE, BOOLEAN_TRUE, CheckItem, Checkpoint, DomainError, Equipment, Frequency,
    InspectionRecord, InspectionRecordItem, InspectionSession, OperationalState, ShiftCalendar,
    ShiftWindow, ValueKind, active_for_slot, classify, parse_numeric, slot_in_window,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// A value entered for one check item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInput {
    pub check_item_id: String,
    pub value: Option<String>,
    pub remark: Option<String>,
}

/// Everything entered during one checkpoint visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub session_id: i64,
    pub checkpoint_id: String,
    /// Operational state chosen per equipment id.
    #[serde(default)]
    pub equipment_states: BTreeMap<String, OperationalState>,
    #[serde(default)]
    pub entries: Vec<EntryInput>,
}

/// Result of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub record_id: i64,
    pub checkpoint_id: String,
    pub slot_index: u32,
    pub frequency: Frequency,
    pub window: ShiftWindow,
    pub entries_written: usize,
    /// Check items whose values were classified abnormal.
    pub abnormal_items: Vec<String>,
    /// Equipment skipped because of standby or maintenance.
    pub skipped_equipment: Vec<String>,
}

/// A check item presented on the form with its pre-filled value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormItem {
    pub item: CheckItem,
    pub default_value: Option<String>,
}

/// One equipment section of the form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormEquipment {
    pub equipment: Equipment,
    /// Last chosen operational state, `Running` if never chosen.
    pub last_state: OperationalState,
    pub items: Vec<FormItem>,
}

/// Outcome of a tag scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
    pub checkpoint: Checkpoint,
    pub ambiguity: Option<AmbiguousTagBinding>,
    pub window: ShiftWindow,
    pub finest_frequency: Frequency,
    pub slot_index: u32,
    /// Frequencies due in this slot.
    pub active_frequencies: Vec<Frequency>,
    /// The slot is already inspected; the caller should show the review.
    pub already_inspected: bool,
    /// Empty when `already_inspected` is set.
    pub form: Vec<FormEquipment>,
}

/// Equipment, items and slot of a visit at a given instant.
struct VisitPlan {
    equipment: Vec<Equipment>,
    items: Vec<CheckItem>,
    finest: Frequency,
    window: ShiftWindow,
    slot_index: u32,
    active: BTreeSet<Frequency>,
}

impl VisitPlan {
    fn items_of<'p>(&'p self, equipment_id: &'p str) -> impl Iterator<Item = &'p CheckItem> + 'p {
        self.items
            .iter()
            .filter(move |i| i.equipment_id == equipment_id)
            .filter(move |i| self.active.contains(&i.frequency))
    }
}

/// Validates a raw value for `item`, returning the stored value and its
/// abnormal flag.
///
/// Booleans are normalized to `TRUE`/`FALSE`; a `FALSE` reading needs a
/// remark.
///
/// # Errors
///
/// - `DomainViolation` if a boolean or number cannot be parsed
/// - `MissingRequiredField` if a `FALSE` reading has no remark
pub fn evaluate_entry(
    item: &CheckItem,
    raw_value: &str,
    remark: Option<&str>,
) -> Result<(String, bool), CoreError> {
    let value: &str = raw_value.trim();
    let normalized: String = match item.kind {
        ValueKind::Boolean => {
            let upper: String = value.to_ascii_uppercase();
            if upper != BOOLEAN_TRUE && upper != BOOLEAN_FALSE {
                return Err(DomainError::InvalidBoolean {
                    item_id: item.item_id.clone(),
                    value: value.to_string(),
                }
                .into());
            }
            if upper == BOOLEAN_FALSE && remark.is_none_or(|r| r.trim().is_empty()) {
                return Err(CoreError::MissingRequiredField {
                    fields: vec![format!("{}.remark", item.item_id)],
                });
            }
            upper
        }
        ValueKind::Numeric => {
            if parse_numeric(value).is_none() {
                return Err(DomainError::InvalidNumber {
                    item_id: item.item_id.clone(),
                    value: value.to_string(),
                }
                .into());
            }
            value.to_string()
        }
        ValueKind::Text => value.to_string(),
    };
    let abnormal: bool = classify(item, &normalized).is_abnormal();
    Ok((normalized, abnormal))
}

/// Drives scans and submissions against a store.
pub struct InspectionFlow<'a, S: InspectionStore + ?Sized> {
    store: &'a mut S,
    calendar: ShiftCalendar,
}

impl<'a, S: InspectionStore + ?Sized> InspectionFlow<'a, S> {
    pub const fn new(store: &'a mut S, calendar: ShiftCalendar) -> Self {
        Self { store, calendar }
    }

    fn load_session(&mut self, session_id: i64) -> Result<InspectionSession, CoreError> {
        self.store
            .session(session_id)?
            .ok_or(CoreError::SessionNotFound(session_id))
    }

    fn plan(&mut self, checkpoint_id: &str, now_ms: i64) -> Result<VisitPlan, CoreError> {
        let equipment: Vec<Equipment> = self.store.equipment_for_checkpoint(checkpoint_id)?;
        if equipment.is_empty() {
            return Err(CoreError::NoEquipmentConfigured {
                checkpoint_id: checkpoint_id.to_string(),
            });
        }
        let equipment_ids: Vec<String> =
            equipment.iter().map(|e| e.equipment_id.clone()).collect();
        let items: Vec<CheckItem> = self.store.check_items_for_equipment(&equipment_ids)?;

        let finest: Frequency = Frequency::finest(items.iter().map(|i| i.frequency));
        let window: ShiftWindow = self.calendar.resolve_shift(now_ms);
        let slot_index: u32 = slot_in_window(&window, finest.hours(), now_ms);
        let active: BTreeSet<Frequency> = active_for_slot(finest.hours(), slot_index);

        Ok(VisitPlan {
            equipment,
            items,
            finest,
            window,
            slot_index,
            active,
        })
    }

    /// Resolves a scanned tag for the session's route and prepares the form.
    ///
    /// # Errors
    ///
    /// - `ClockRegression` if stored records are later than `now_ms`
    /// - `SessionNotFound`, `NoMatchingTag`, `TagNotOnActiveRoute`
    /// - `NoEquipmentConfigured` if the checkpoint has no equipment
    pub fn scan(
        &mut self,
        session_id: i64,
        raw_tag: &str,
        now_ms: i64,
    ) -> Result<ScanResult, CoreError> {
        ClockGuard::new(&mut *self.store, self.calendar).check(now_ms)?;
        let session: InspectionSession = self.load_session(session_id)?;
        let resolution: TagResolution =
            TagResolver::new(&mut *self.store).resolve(raw_tag, &session.route_id)?;
        let checkpoint: Checkpoint = resolution.checkpoint;
        let plan: VisitPlan = self.plan(&checkpoint.checkpoint_id, now_ms)?;

        let already_inspected: bool = DuplicateGuard::new(&mut *self.store).has_existing(
            &checkpoint.checkpoint_id,
            plan.slot_index,
            plan.window.start_ms,
            plan.window.end_ms,
        )?;

        let form: Vec<FormEquipment> = if already_inspected {
            info!(
                checkpoint_id = %checkpoint.checkpoint_id,
                slot_index = plan.slot_index,
                "Slot already inspected, redirecting to review"
            );
            Vec::new()
        } else {
            self.build_form(&plan)?
        };

        Ok(ScanResult {
            checkpoint,
            ambiguity: resolution.ambiguity,
            window: plan.window,
            finest_frequency: plan.finest,
            slot_index: plan.slot_index,
            active_frequencies: plan.active.iter().copied().collect(),
            already_inspected,
            form,
        })
    }

    fn build_form(&mut self, plan: &VisitPlan) -> Result<Vec<FormEquipment>, CoreError> {
        let equipment_ids: Vec<String> = plan
            .equipment
            .iter()
            .map(|e| e.equipment_id.clone())
            .collect();
        let last_states: BTreeMap<String, OperationalState> = self
            .store
            .equipment_states(&equipment_ids)?
            .into_iter()
            .collect();

        let mut form: Vec<FormEquipment> = Vec::with_capacity(plan.equipment.len());
        for equipment in &plan.equipment {
            let mut items: Vec<FormItem> = Vec::new();
            for item in plan.items_of(&equipment.equipment_id) {
                let default_value: Option<String> =
                    match self.store.latest_value_for_item(&item.item_id)? {
                        Some(value) => Some(value),
                        None if item.kind == ValueKind::Numeric => {
                            item.min.map(|min| min.to_string())
                        }
                        None => None,
                    };
                items.push(FormItem {
                    item: item.clone(),
                    default_value,
                });
            }
            form.push(FormEquipment {
                equipment: equipment.clone(),
                last_state: last_states
                    .get(&equipment.equipment_id)
                    .copied()
                    .unwrap_or_default(),
                items,
            });
        }
        Ok(form)
    }

    /// Validates and stores one checkpoint visit.
    ///
    /// # Errors
    ///
    /// - `ClockRegression` if stored records are later than `now_ms`
    /// - `SessionNotFound`, `CheckpointNotFound`, `TagNotOnActiveRoute`
    /// - `DuplicateSlot` if the slot is already inspected in this shift
    /// - `UnexpectedEntry` for values of items not presented now
    /// - `MissingRequiredField` listing every missing value, remark or state
    /// - `DomainViolation` for unparsable values
    #[allow(clippy::too_many_lines)]
    pub fn submit(
        &mut self,
        request: &SubmissionRequest,
        now_ms: i64,
    ) -> Result<SubmissionReceipt, CoreError> {
        ClockGuard::new(&mut *self.store, self.calendar).check(now_ms)?;
        let session: InspectionSession = self.load_session(request.session_id)?;
        let checkpoint: Checkpoint = self
            .store
            .checkpoint(&request.checkpoint_id)?
            .ok_or_else(|| CoreError::CheckpointNotFound(request.checkpoint_id.clone()))?;
        if !checkpoint.is_on_route(&session.route_id) {
            return Err(CoreError::TagNotOnActiveRoute {
                tag: checkpoint.tag_uid.clone(),
                route_id: session.route_id.clone(),
                bound_routes: vec![checkpoint.route_id.clone()],
            });
        }

        let plan: VisitPlan = self.plan(&checkpoint.checkpoint_id, now_ms)?;
        DuplicateGuard::new(&mut *self.store).ensure_vacant(
            &checkpoint.checkpoint_id,
            plan.slot_index,
            plan.window.start_ms,
            plan.window.end_ms,
        )?;

        let inputs: BTreeMap<&str, &EntryInput> = request
            .entries
            .iter()
            .map(|e| (e.check_item_id.as_str(), e))
            .collect();
        let presented: BTreeSet<&str> = plan
            .equipment
            .iter()
            .flat_map(|e| {
                let state: OperationalState = request
                    .equipment_states
                    .get(&e.equipment_id)
                    .copied()
                    .unwrap_or_default();
                plan.items_of(&e.equipment_id)
                    .filter(move |i| state.presents(i))
                    .map(|i| i.item_id.as_str())
            })
            .collect();
        if let Some(unexpected) = inputs.keys().find(|id| !presented.contains(*id)) {
            return Err(CoreError::UnexpectedEntry {
                check_item_id: (*unexpected).to_string(),
            });
        }

        let mut missing: Vec<String> = Vec::new();
        let mut items: Vec<InspectionRecordItem> = Vec::new();
        let mut abnormal_items: Vec<String> = Vec::new();
        let mut skipped_equipment: Vec<String> = Vec::new();

        for equipment in &plan.equipment {
            let chosen: Option<OperationalState> =
                request.equipment_states.get(&equipment.equipment_id).copied();
            if equipment.status_required && chosen.is_none() {
                missing.push(format!("{}.state", equipment.equipment_id));
            }
            let state: OperationalState = chosen.unwrap_or_default();

            if state != OperationalState::Running {
                skipped_equipment.push(equipment.equipment_id.clone());
                items.push(InspectionRecordItem {
                    entry_id: None,
                    record_id: None,
                    equipment_id: equipment.equipment_id.clone(),
                    check_item_id: None,
                    slot_index: plan.slot_index,
                    value: state.label().to_string(),
                    remark: None,
                    abnormal: false,
                });
            }

            for item in plan.items_of(&equipment.equipment_id) {
                if !state.presents(item) {
                    continue;
                }
                let input: Option<&EntryInput> = inputs.get(item.item_id.as_str()).copied();
                let value: Option<&str> = input
                    .and_then(|i| i.value.as_deref())
                    .filter(|v| !v.trim().is_empty());
                let remark: Option<String> = input
                    .and_then(|i| i.remark.clone())
                    .filter(|r| !r.trim().is_empty());

                let Some(value) = value else {
                    if item.required {
                        missing.push(item.item_id.clone());
                    }
                    continue;
                };

                match evaluate_entry(item, value, remark.as_deref()) {
                    Ok((stored, abnormal)) => {
                        if abnormal {
                            abnormal_items.push(item.item_id.clone());
                        }
                        items.push(InspectionRecordItem {
                            entry_id: None,
                            record_id: None,
                            equipment_id: equipment.equipment_id.clone(),
                            check_item_id: Some(item.item_id.clone()),
                            slot_index: plan.slot_index,
                            value: stored,
                            remark,
                            abnormal,
                        });
                    }
                    Err(CoreError::MissingRequiredField { fields }) => missing.extend(fields),
                    Err(err) => return Err(err),
                }
            }
        }

        if !missing.is_empty() {
            debug!(checkpoint_id = %checkpoint.checkpoint_id, ?missing, "Submission incomplete");
            return Err(CoreError::MissingRequiredField { fields: missing });
        }

        let record = InspectionRecord {
            record_id: None,
            session_id: request.session_id,
            checkpoint_id: checkpoint.checkpoint_id.clone(),
            slot_index: plan.slot_index,
            frequency: plan.finest,
            window_start_ms: plan.window.start_ms,
            recorded_at_ms: now_ms,
        };
        let event = AuditEvent::new(
            Actor::operator(&session.operator_id),
            Cause::new(
                format!("session-{}", request.session_id),
                String::from("Checkpoint inspected"),
            ),
            Action::of(
                AuditAction::InspectionSubmitted,
                Some(format!(
                    "checkpoint={} slot={} shift={}",
                    checkpoint.checkpoint_id,
                    plan.slot_index,
                    plan.window.shift.id()
                )),
            ),
            now_ms,
        );
        let entries_written: usize = items.len();
        let inspection = NewInspection {
            record,
            items,
            equipment_states: request
                .equipment_states
                .iter()
                .map(|(id, state)| (id.clone(), *state))
                .collect(),
            event,
        };

        let record_id: i64 = match self.store.insert_inspection(&inspection) {
            Ok(id) => id,
            Err(StoreError::Conflict(_)) => {
                return Err(CoreError::DuplicateSlot {
                    checkpoint_id: checkpoint.checkpoint_id,
                    slot_index: plan.slot_index,
                    window_start_ms: plan.window.start_ms,
                });
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            record_id,
            checkpoint_id = %checkpoint.checkpoint_id,
            slot_index = plan.slot_index,
            entries_written,
            abnormal = abnormal_items.len(),
            "Inspection accepted"
        );

        Ok(SubmissionReceipt {
            record_id,
            checkpoint_id: checkpoint.checkpoint_id,
            slot_index: plan.slot_index,
            frequency: plan.finest,
            window: plan.window,
            entries_written,
            abnormal_items,
            skipped_equipment,
        })
    }
}
