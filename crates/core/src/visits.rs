// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Checkpoint visits within one shift window, with corrected values.
//!
//! Shared by the report grid and the point review, which both place the
//! newest entry for a check item into the merged cell covering its slot.

use crate::error::CoreError;
use crate::store::InspectionStore;
use patrol_domain::{
    CheckItem, Frequency, InspectionRecord, InspectionRecordItem, RecordItemCorrection,
    ShiftWindow, slot_in_window,
};
use std::collections::BTreeMap;

/// A record item with its latest correction applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveEntry {
    pub entry: InspectionRecordItem,
    pub value: String,
    pub remark: Option<String>,
    pub corrected: bool,
}

/// Applies corrections (oldest first) to items; the last correction wins.
#[must_use]
pub fn apply_corrections(
    items: Vec<InspectionRecordItem>,
    corrections: &[RecordItemCorrection],
) -> Vec<EffectiveEntry> {
    let mut latest: BTreeMap<i64, &RecordItemCorrection> = BTreeMap::new();
    for correction in corrections {
        latest.insert(correction.entry_id, correction);
    }

    items
        .into_iter()
        .map(|entry| {
            match entry
                .entry_id
                .and_then(|id| latest.get(&id).copied())
            {
                Some(correction) => EffectiveEntry {
                    value: correction.new_value.clone(),
                    remark: correction.remark.clone(),
                    corrected: true,
                    entry,
                },
                None => EffectiveEntry {
                    value: entry.value.clone(),
                    remark: entry.remark.clone(),
                    corrected: false,
                    entry,
                },
            }
        })
        .collect()
}

/// Loads the effective entries of `records`, grouped by record id.
///
/// # Errors
///
/// Returns an error if a store query fails.
pub fn load_entries<S: InspectionStore + ?Sized>(
    store: &mut S,
    records: &[InspectionRecord],
) -> Result<BTreeMap<i64, Vec<EffectiveEntry>>, CoreError> {
    let record_ids: Vec<i64> = records.iter().filter_map(|r| r.record_id).collect();
    if record_ids.is_empty() {
        return Ok(BTreeMap::new());
    }

    let items: Vec<InspectionRecordItem> = store.items_for_record_ids(&record_ids)?;
    let entry_ids: Vec<i64> = items.iter().filter_map(|i| i.entry_id).collect();
    let corrections: Vec<RecordItemCorrection> = if entry_ids.is_empty() {
        Vec::new()
    } else {
        store.corrections_for_items(&entry_ids)?
    };

    let mut grouped: BTreeMap<i64, Vec<EffectiveEntry>> = BTreeMap::new();
    for effective in apply_corrections(items, &corrections) {
        if let Some(record_id) = effective.entry.record_id {
            grouped.entry(record_id).or_default().push(effective);
        }
    }
    Ok(grouped)
}

/// One record of a checkpoint placed on the fine slot grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub record: InspectionRecord,
    /// Slot at the checkpoint's finest frequency, recomputed from the
    /// record timestamp.
    pub fine_slot: u32,
    pub entries: Vec<EffectiveEntry>,
}

/// The visits of `checkpoint_id` recorded in `[from_ms, to_ms)` inside
/// `window`, newest first.
#[must_use]
pub fn visits_in(
    window: &ShiftWindow,
    from_ms: i64,
    to_ms: i64,
    checkpoint_id: &str,
    finest: Frequency,
    records: &[InspectionRecord],
    entries: &BTreeMap<i64, Vec<EffectiveEntry>>,
) -> Vec<Visit> {
    let mut visits: Vec<Visit> = records
        .iter()
        .filter(|r| r.checkpoint_id == checkpoint_id)
        .filter(|r| from_ms <= r.recorded_at_ms && r.recorded_at_ms < to_ms)
        .map(|record| Visit {
            fine_slot: slot_in_window(window, finest.hours(), record.recorded_at_ms),
            entries: record
                .record_id
                .and_then(|id| entries.get(&id))
                .cloned()
                .unwrap_or_default(),
            record: record.clone(),
        })
        .collect();

    visits.sort_by(|a, b| {
        b.record
            .recorded_at_ms
            .cmp(&a.record.recorded_at_ms)
            .then_with(|| b.record.record_id.cmp(&a.record.record_id))
    });
    visits
}

/// What occupies the merged cell of one check item slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell<'v> {
    /// The newest entry for the item.
    Value(&'v Visit, &'v EffectiveEntry),
    /// The equipment was skipped because of its operational state.
    Skipped(&'v Visit, &'v EffectiveEntry),
    /// Nothing recorded.
    Empty,
}

/// First and last fine column (1-based, inclusive) covered by slot
/// `item_slot` of an item with frequency `item` on a `finest` grid.
#[must_use]
pub const fn covered_columns(item: Frequency, finest: Frequency, item_slot: u32) -> (u32, u32) {
    let width: u32 = item.merge_width(finest);
    let first: u32 = (item_slot.saturating_sub(1)) * width + 1;
    (first, first + width - 1)
}

/// Finds the newest visit covering `item_slot` that mentions `item` or
/// marks its equipment as skipped.
#[must_use]
pub fn find_cell<'v>(
    visits: &'v [Visit],
    item: &CheckItem,
    finest: Frequency,
    item_slot: u32,
) -> Cell<'v> {
    let (first, last): (u32, u32) = covered_columns(item.frequency, finest, item_slot);

    for visit in visits.iter().filter(|v| (first..=last).contains(&v.fine_slot)) {
        if let Some(entry) = visit
            .entries
            .iter()
            .find(|e| e.entry.check_item_id.as_deref() == Some(item.item_id.as_str()))
        {
            return Cell::Value(visit, entry);
        }
        if let Some(marker) = visit
            .entries
            .iter()
            .find(|e| e.entry.check_item_id.is_none() && e.entry.equipment_id == item.equipment_id)
        {
            return Cell::Skipped(visit, marker);
        }
    }
    Cell::Empty
}
