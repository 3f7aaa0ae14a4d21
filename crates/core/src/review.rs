// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only review of a checkpoint's entries in the current shift.

use crate::error::CoreError;
use crate::report::ReportSubject;
use crate::store::InspectionStore;
use crate::visits::{Cell, Visit, covered_columns, find_cell, load_entries, visits_in};
use patrol_domain::{
    CheckItem, Checkpoint, Classification, Equipment, Frequency, InspectionRecord, ShiftCalendar,
    ShiftWindow, classify,
};
use serde::Serialize;

/// The merged cell of one item slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewCell {
    pub slot_index: u32,
    pub first_column: u32,
    pub merge_width: u32,
    /// Record item to target with a correction; `None` if nothing to correct.
    pub entry_id: Option<i64>,
    pub value: Option<String>,
    pub remark: Option<String>,
    pub classification: Option<Classification>,
    pub recorded_at_ms: Option<i64>,
    pub corrected: bool,
    /// The equipment was skipped in this slot.
    pub skipped: bool,
}

/// All slots of one check item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRow {
    pub item: CheckItem,
    pub cells: Vec<ReviewCell>,
}

/// A checkpoint's entries in one shift window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointReview {
    pub checkpoint: Checkpoint,
    pub window: ShiftWindow,
    pub finest_frequency: Frequency,
    pub rows: Vec<ReviewRow>,
}

fn review_cell(cell: Cell<'_>, item: &CheckItem, finest: Frequency, slot_index: u32) -> ReviewCell {
    let (first_column, _): (u32, u32) = covered_columns(item.frequency, finest, slot_index);
    let mut review = ReviewCell {
        slot_index,
        first_column,
        merge_width: item.frequency.merge_width(finest),
        entry_id: None,
        value: None,
        remark: None,
        classification: None,
        recorded_at_ms: None,
        corrected: false,
        skipped: false,
    };

    match cell {
        Cell::Value(visit, entry) => {
            review.entry_id = entry.entry.entry_id;
            review.value = Some(entry.value.clone());
            review.remark.clone_from(&entry.remark);
            review.classification = Some(classify(item, &entry.value));
            review.recorded_at_ms = Some(visit.record.recorded_at_ms);
            review.corrected = entry.corrected;
        }
        Cell::Skipped(visit, marker) => {
            review.value = Some(marker.value.clone());
            review.recorded_at_ms = Some(visit.record.recorded_at_ms);
            review.skipped = true;
        }
        Cell::Empty => {}
    }
    review
}

/// Loads the review of `checkpoint_id` for the shift containing `now_ms`.
///
/// # Errors
///
/// Returns `CheckpointNotFound` for an unknown checkpoint, or an error if a
/// store query fails.
pub fn review_point<S: InspectionStore + ?Sized>(
    store: &mut S,
    calendar: &ShiftCalendar,
    checkpoint_id: &str,
    now_ms: i64,
) -> Result<PointReview, CoreError> {
    let checkpoint: Checkpoint = store
        .checkpoint(checkpoint_id)?
        .ok_or_else(|| CoreError::CheckpointNotFound(checkpoint_id.to_string()))?;
    let equipment: Vec<Equipment> = store.equipment_for_checkpoint(checkpoint_id)?;
    let equipment_ids: Vec<String> = equipment.iter().map(|e| e.equipment_id.clone()).collect();
    let items: Vec<CheckItem> = if equipment_ids.is_empty() {
        Vec::new()
    } else {
        store.check_items_for_equipment(&equipment_ids)?
    };
    let subject = ReportSubject {
        checkpoint,
        route_name: String::new(),
        equipment,
        items,
    };

    let window: ShiftWindow = calendar.resolve_shift(now_ms);
    let finest: Frequency = subject.finest_frequency();
    let records: Vec<InspectionRecord> = store.records_in_window(window.start_ms, window.end_ms)?;
    let entries = load_entries(store, &records)?;
    let visits: Vec<Visit> = visits_in(
        &window,
        window.start_ms,
        window.end_ms,
        checkpoint_id,
        finest,
        &records,
        &entries,
    );

    let rows: Vec<ReviewRow> = subject
        .ordered_items()
        .into_iter()
        .map(|item| ReviewRow {
            cells: (1..=item.frequency.slots_per_shift())
                .map(|slot| review_cell(find_cell(&visits, item, finest, slot), item, finest, slot))
                .collect(),
            item: item.clone(),
        })
        .collect();

    Ok(PointReview {
        checkpoint: subject.checkpoint,
        window,
        finest_frequency: finest,
        rows,
    })
}
