// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Per-slot completion status of checkpoints in the current shift window.

use crate::error::CoreError;
use crate::store::InspectionStore;
use patrol_domain::{
    CheckItem, Checkpoint, Equipment, Frequency, InspectionRecord, RotationLabel, ShiftCalendar,
    ShiftWindow, slot_bounds, slot_in_window,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Completion of one slot at the checkpoint's finest frequency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotCompletion {
    pub slot_index: u32,
    pub slot_start_ms: i64,
    pub slot_end_ms: i64,
    /// Time of the newest record in this slot; `None` if incomplete.
    pub completed_at_ms: Option<i64>,
}

impl SlotCompletion {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.completed_at_ms.is_some()
    }
}

/// Slot completion map of one checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckpointStatus {
    pub checkpoint: Checkpoint,
    pub finest_frequency: Frequency,
    pub window: ShiftWindow,
    pub slots: Vec<SlotCompletion>,
}

impl CheckpointStatus {
    /// Number of completed slots.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.slots.iter().filter(|s| s.is_complete()).count()
    }
}

/// Status of every checkpoint on a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteStatus {
    pub route_id: String,
    pub window: ShiftWindow,
    pub rotation: RotationLabel,
    pub checkpoints: Vec<CheckpointStatus>,
}

/// Collapses stored records into per-slot completion maps. Read-only.
pub struct RecordAggregator<'a, S: InspectionStore + ?Sized> {
    store: &'a mut S,
    calendar: ShiftCalendar,
}

impl<'a, S: InspectionStore + ?Sized> RecordAggregator<'a, S> {
    pub const fn new(store: &'a mut S, calendar: ShiftCalendar) -> Self {
        Self { store, calendar }
    }

    /// The finest frequency among the check items at a checkpoint.
    fn finest_frequency(&mut self, checkpoint_id: &str) -> Result<Frequency, CoreError> {
        let equipment: Vec<Equipment> = self.store.equipment_for_checkpoint(checkpoint_id)?;
        if equipment.is_empty() {
            return Ok(Frequency::EightHours);
        }
        let ids: Vec<String> = equipment.into_iter().map(|e| e.equipment_id).collect();
        let items: Vec<CheckItem> = self.store.check_items_for_equipment(&ids)?;
        Ok(Frequency::finest(items.iter().map(|i| i.frequency)))
    }

    /// Slot completion of `checkpoint` inside `window`.
    ///
    /// # Errors
    ///
    /// Returns an error if a store query fails.
    pub fn status_for(
        &mut self,
        checkpoint: &Checkpoint,
        window: &ShiftWindow,
    ) -> Result<CheckpointStatus, CoreError> {
        let records: Vec<InspectionRecord> =
            self.store.records_in_window(window.start_ms, window.end_ms)?;
        self.status_from(checkpoint, window, &records)
    }

    fn status_from(
        &mut self,
        checkpoint: &Checkpoint,
        window: &ShiftWindow,
        records: &[InspectionRecord],
    ) -> Result<CheckpointStatus, CoreError> {
        let finest: Frequency = self.finest_frequency(&checkpoint.checkpoint_id)?;

        let mut completed: BTreeMap<u32, i64> = BTreeMap::new();
        for record in records
            .iter()
            .filter(|r| r.checkpoint_id == checkpoint.checkpoint_id)
            .filter(|r| window.contains(r.recorded_at_ms))
        {
            let slot: u32 = slot_in_window(window, finest.hours(), record.recorded_at_ms);
            completed
                .entry(slot)
                .and_modify(|at| *at = (*at).max(record.recorded_at_ms))
                .or_insert(record.recorded_at_ms);
        }

        let slots: Vec<SlotCompletion> = (1..=finest.slots_per_shift())
            .map(|slot_index| {
                let (slot_start_ms, slot_end_ms): (i64, i64) =
                    slot_bounds(window, finest.hours(), slot_index);
                SlotCompletion {
                    slot_index,
                    slot_start_ms,
                    slot_end_ms,
                    completed_at_ms: completed.get(&slot_index).copied(),
                }
            })
            .collect();

        debug!(
            checkpoint_id = %checkpoint.checkpoint_id,
            finest = %finest,
            completed = completed.len(),
            "Aggregated checkpoint status"
        );

        Ok(CheckpointStatus {
            checkpoint: checkpoint.clone(),
            finest_frequency: finest,
            window: *window,
            slots,
        })
    }

    /// Dashboard for every checkpoint on `route_id` in the shift containing
    /// `now_ms`.
    ///
    /// # Errors
    ///
    /// Returns an error if the route does not exist or a store query fails.
    pub fn route_status(&mut self, route_id: &str, now_ms: i64) -> Result<RouteStatus, CoreError> {
        if self.store.route(route_id)?.is_none() {
            return Err(CoreError::RouteNotFound(route_id.to_string()));
        }

        let window: ShiftWindow = self.calendar.resolve_shift(now_ms);
        let records: Vec<InspectionRecord> =
            self.store.records_in_window(window.start_ms, window.end_ms)?;
        let checkpoints: Vec<Checkpoint> = self.store.checkpoints_for_route(route_id)?;

        let mut statuses: Vec<CheckpointStatus> = Vec::with_capacity(checkpoints.len());
        for checkpoint in &checkpoints {
            statuses.push(self.status_from(checkpoint, &window, &records)?);
        }

        Ok(RouteStatus {
            route_id: route_id.to_string(),
            window,
            rotation: window.rotation_label(),
            checkpoints: statuses,
        })
    }
}
