// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Report grid reconstruction over arbitrary multi-shift ranges.
//!
//! For every shift window intersecting the requested range the grid holds:
//!
//! 1. System audit rows (purges of future-dated records), chronologically
//! 2. For each checkpoint, one row per check item per item slot, where a
//!    slot of an item with frequency `F` spans `F / finest` fine columns
//!
//! Values are re-evaluated against the check item, so corrections made
//! after submission are reflected.

use crate::error::CoreError;
use crate::store::InspectionStore;
use crate::visits::{
    Cell, EffectiveEntry, Visit, covered_columns, find_cell, load_entries, visits_in,
};
use chrono::{NaiveDateTime, Timelike};
use patrol_domain::{
    CheckItem, Checkpoint, Classification, Equipment, Frequency, InspectionRecord,
    InspectionSession, RotationLabel, Shift, ShiftCalendar, ShiftWindow, classify,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Description used when a system audit record carries no text.
pub const PURGE_DESCRIPTION: &str = "Conflicting future-dated records purged";

/// Value shown for a slot with no record.
pub const NOT_INSPECTED: &str = "Not inspected";

/// Column headers, in row cell order.
pub const REPORT_HEADERS: [&str; 14] = [
    "Date",
    "Time",
    "Route",
    "Inspector",
    "Rotation",
    "Shift",
    "Checkpoint ID",
    "Checkpoint",
    "Equipment",
    "Check item",
    "Frequency (h)",
    "Slot",
    "Value",
    "Status",
];

/// A checkpoint with everything needed to lay out its rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSubject {
    pub checkpoint: Checkpoint,
    pub route_name: String,
    pub equipment: Vec<Equipment>,
    pub items: Vec<CheckItem>,
}

impl ReportSubject {
    /// The finest frequency among the items, eight hours if there are none.
    #[must_use]
    pub fn finest_frequency(&self) -> Frequency {
        Frequency::finest(self.items.iter().map(|i| i.frequency))
    }

    fn equipment_name(&self, equipment_id: &str) -> String {
        self.equipment
            .iter()
            .find(|e| e.equipment_id == equipment_id)
            .map_or_else(|| equipment_id.to_string(), |e| e.name.clone())
    }

    /// Items in equipment order, then item order.
    pub(crate) fn ordered_items(&self) -> Vec<&CheckItem> {
        let mut ordered: Vec<&CheckItem> = Vec::with_capacity(self.items.len());
        for equipment in &self.equipment {
            ordered.extend(
                self.items
                    .iter()
                    .filter(|i| i.equipment_id == equipment.equipment_id),
            );
        }
        ordered
    }
}

/// Loads report subjects for every checkpoint of `route_id`, or of every
/// route when `route_id` is `None`.
///
/// # Errors
///
/// Returns an error if the route does not exist or a store query fails.
pub fn load_subjects<S: InspectionStore + ?Sized>(
    store: &mut S,
    route_id: Option<&str>,
) -> Result<Vec<ReportSubject>, CoreError> {
    let routes = match route_id {
        Some(id) => vec![
            store
                .route(id)?
                .ok_or_else(|| CoreError::RouteNotFound(id.to_string()))?,
        ],
        None => store.routes()?,
    };

    let mut subjects: Vec<ReportSubject> = Vec::new();
    for route in routes {
        for checkpoint in store.checkpoints_for_route(&route.route_id)? {
            let equipment: Vec<Equipment> =
                store.equipment_for_checkpoint(&checkpoint.checkpoint_id)?;
            let equipment_ids: Vec<String> =
                equipment.iter().map(|e| e.equipment_id.clone()).collect();
            let items: Vec<CheckItem> = if equipment_ids.is_empty() {
                Vec::new()
            } else {
                store.check_items_for_equipment(&equipment_ids)?
            };
            subjects.push(ReportSubject {
                checkpoint,
                route_name: route.name.clone(),
                equipment,
                items,
            });
        }
    }
    Ok(subjects)
}

/// What a report row represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowKind {
    Inspection,
    NotInspected,
    EquipmentSkipped,
    SystemAudit,
}

/// One row of the report grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    /// Index into [`ReportGrid::windows`].
    pub window_index: usize,
    pub kind: RowKind,
    pub date: String,
    pub time: String,
    pub route_name: String,
    pub operator_id: String,
    pub rotation: RotationLabel,
    pub shift: Shift,
    pub checkpoint_id: String,
    pub checkpoint_name: String,
    pub equipment_name: String,
    pub check_item_id: String,
    pub check_item_name: String,
    pub frequency_hours: u32,
    /// Slot at the item's own frequency.
    pub slot_index: u32,
    /// First fine column covered by this row's merged cell (1-based).
    pub first_column: u32,
    /// Number of fine columns the merged cell spans.
    pub merge_width: u32,
    pub value: String,
    pub classification: Option<Classification>,
}

impl ReportRow {
    /// Cell values in [`REPORT_HEADERS`] order.
    #[must_use]
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.date.clone(),
            self.time.clone(),
            self.route_name.clone(),
            self.operator_id.clone(),
            self.rotation.as_str().to_string(),
            self.shift.name().to_string(),
            self.checkpoint_id.clone(),
            self.checkpoint_name.clone(),
            self.equipment_name.clone(),
            self.check_item_name.clone(),
            self.frequency_hours.to_string(),
            self.slot_index.to_string(),
            self.value.clone(),
            self.classification
                .map(|c| c.as_str().to_string())
                .unwrap_or_default(),
        ]
    }
}

/// A named group of consecutive windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSheet {
    pub name: String,
    pub rows: Vec<ReportRow>,
}

/// The reconstructed grid for a time range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportGrid {
    pub start_ms: i64,
    pub end_ms: i64,
    pub windows: Vec<ShiftWindow>,
    pub rows: Vec<ReportRow>,
}

impl ReportGrid {
    /// Splits the grid into sheets of at most `windows_per_sheet` windows.
    ///
    /// A grid with no windows yields a single empty sheet so that an export
    /// always produces a file.
    #[must_use]
    pub fn sheets(&self, windows_per_sheet: usize) -> Vec<ReportSheet> {
        let per_sheet: usize = windows_per_sheet.max(1);
        if self.windows.is_empty() {
            return vec![ReportSheet {
                name: String::from("empty"),
                rows: Vec::new(),
            }];
        }

        self.windows
            .chunks(per_sheet)
            .enumerate()
            .map(|(chunk_index, chunk)| {
                let first_index: usize = chunk_index * per_sheet;
                let range = first_index..first_index + chunk.len();
                ReportSheet {
                    name: sheet_name(chunk),
                    rows: self
                        .rows
                        .iter()
                        .filter(|row| range.contains(&row.window_index))
                        .cloned()
                        .collect(),
                }
            })
            .collect()
    }
}

fn sheet_name(windows: &[ShiftWindow]) -> String {
    let label = |w: &ShiftWindow| format!("{}-{}", w.date.format("%Y%m%d"), w.shift.id());
    match (windows.first(), windows.last()) {
        (Some(first), Some(last)) if first != last => format!("{}_{}", label(first), label(last)),
        (Some(only), _) => label(only),
        _ => String::from("empty"),
    }
}

/// Builds report grids from stored records.
pub struct ReportGridBuilder<'a, S: InspectionStore + ?Sized> {
    store: &'a mut S,
    calendar: ShiftCalendar,
}

impl<'a, S: InspectionStore + ?Sized> ReportGridBuilder<'a, S> {
    pub const fn new(store: &'a mut S, calendar: ShiftCalendar) -> Self {
        Self { store, calendar }
    }

    /// Builds the grid for `subjects` over `[start_ms, end_ms)`.
    ///
    /// All records in the range are read once up front, so the grid is
    /// built from a single consistent snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if a store query fails.
    pub fn build_grid(
        &mut self,
        subjects: &[ReportSubject],
        start_ms: i64,
        end_ms: i64,
    ) -> Result<ReportGrid, CoreError> {
        let windows: Vec<ShiftWindow> = self.calendar.windows_intersecting(start_ms, end_ms);
        let records: Vec<InspectionRecord> = self.store.records_in_window(start_ms, end_ms)?;
        let entries = load_entries(self.store, &records)?;

        let mut session_ids: Vec<i64> = records.iter().map(|r| r.session_id).collect();
        session_ids.sort_unstable();
        session_ids.dedup();
        let sessions: BTreeMap<i64, InspectionSession> = if session_ids.is_empty() {
            BTreeMap::new()
        } else {
            self.store
                .sessions_by_ids(&session_ids)?
                .into_iter()
                .filter_map(|s| s.session_id.map(|id| (id, s)))
                .collect()
        };

        info!(
            start_ms,
            end_ms,
            windows = windows.len(),
            records = records.len(),
            checkpoints = subjects.len(),
            "Building report grid"
        );

        let mut rows: Vec<ReportRow> = Vec::new();
        for (window_index, window) in windows.iter().enumerate() {
            let Some((from_ms, to_ms)) = window.clip(start_ms, end_ms) else {
                continue;
            };
            let layout = WindowLayout {
                calendar: &self.calendar,
                window,
                window_index,
                sessions: &sessions,
            };

            rows.extend(layout.audit_rows(&records, &entries, from_ms, to_ms));
            for subject in subjects {
                let finest: Frequency = subject.finest_frequency();
                let visits: Vec<Visit> = visits_in(
                    window,
                    from_ms,
                    to_ms,
                    &subject.checkpoint.checkpoint_id,
                    finest,
                    &records,
                    &entries,
                );
                rows.extend(layout.subject_rows(subject, finest, &visits));
            }
        }

        debug!(rows = rows.len(), "Report grid built");
        Ok(ReportGrid {
            start_ms,
            end_ms,
            windows,
            rows,
        })
    }
}

/// Row construction for one window.
struct WindowLayout<'w> {
    calendar: &'w ShiftCalendar,
    window: &'w ShiftWindow,
    window_index: usize,
    sessions: &'w BTreeMap<i64, InspectionSession>,
}

impl WindowLayout<'_> {
    fn blank_row(&self, kind: RowKind) -> ReportRow {
        ReportRow {
            window_index: self.window_index,
            kind,
            date: self.window.date.format("%Y-%m-%d").to_string(),
            time: String::new(),
            route_name: String::new(),
            operator_id: String::new(),
            rotation: self.window.rotation_label(),
            shift: self.window.shift,
            checkpoint_id: String::new(),
            checkpoint_name: String::new(),
            equipment_name: String::new(),
            check_item_id: String::new(),
            check_item_name: String::new(),
            frequency_hours: 0,
            slot_index: 0,
            first_column: 0,
            merge_width: 0,
            value: String::new(),
            classification: None,
        }
    }

    /// Stamps date, time, route and operator of a stored record.
    fn stamp(&self, row: &mut ReportRow, record: &InspectionRecord) {
        let (date, time): (String, String) =
            display_date_time(self.calendar, self.window, record.recorded_at_ms);
        row.date = date;
        row.time = time;
        if let Some(session) = self.sessions.get(&record.session_id) {
            row.route_name.clone_from(&session.route_name);
            row.operator_id.clone_from(&session.operator_id);
        }
    }

    fn audit_rows(
        &self,
        records: &[InspectionRecord],
        entries: &BTreeMap<i64, Vec<EffectiveEntry>>,
        from_ms: i64,
        to_ms: i64,
    ) -> Vec<ReportRow> {
        let mut audits: Vec<&InspectionRecord> = records
            .iter()
            .filter(|r| r.is_system_audit())
            .filter(|r| from_ms <= r.recorded_at_ms && r.recorded_at_ms < to_ms)
            .collect();
        audits.sort_by_key(|r| (r.recorded_at_ms, r.record_id));

        audits
            .into_iter()
            .map(|record| {
                let description: String = record
                    .record_id
                    .and_then(|id| entries.get(&id))
                    .and_then(|list| list.first())
                    .map_or_else(|| PURGE_DESCRIPTION.to_string(), |e| e.value.clone());

                let mut row: ReportRow = self.blank_row(RowKind::SystemAudit);
                self.stamp(&mut row, record);
                row.check_item_name.clone_from(&description);
                row.value = description;
                row
            })
            .collect()
    }

    fn subject_rows(
        &self,
        subject: &ReportSubject,
        finest: Frequency,
        visits: &[Visit],
    ) -> Vec<ReportRow> {
        let base = |kind: RowKind| {
            let mut row: ReportRow = self.blank_row(kind);
            row.route_name.clone_from(&subject.route_name);
            row.checkpoint_id.clone_from(&subject.checkpoint.checkpoint_id);
            row.checkpoint_name.clone_from(&subject.checkpoint.name);
            row
        };

        let items: Vec<&CheckItem> = subject.ordered_items();
        if items.is_empty() {
            // One eight-hour slot per shift keeps the checkpoint visible.
            let mut row: ReportRow = match visits.first() {
                Some(visit) => {
                    let mut row = base(RowKind::Inspection);
                    self.stamp(&mut row, &visit.record);
                    row
                }
                None => {
                    let mut row = base(RowKind::NotInspected);
                    row.value = NOT_INSPECTED.to_string();
                    row
                }
            };
            row.frequency_hours = finest.hours();
            row.slot_index = 1;
            row.first_column = 1;
            row.merge_width = 1;
            return vec![row];
        }

        let mut rows: Vec<ReportRow> = Vec::new();
        for item in items {
            for item_slot in 1..=item.frequency.slots_per_shift() {
                let (first_column, _): (u32, u32) =
                    covered_columns(item.frequency, finest, item_slot);

                let mut row: ReportRow = match find_cell(visits, item, finest, item_slot) {
                    Cell::Value(visit, entry) => {
                        let mut row = base(RowKind::Inspection);
                        self.stamp(&mut row, &visit.record);
                        row.value.clone_from(&entry.value);
                        row.classification = Some(classify(item, &entry.value));
                        row
                    }
                    Cell::Skipped(visit, marker) => {
                        let mut row = base(RowKind::EquipmentSkipped);
                        self.stamp(&mut row, &visit.record);
                        row.value.clone_from(&marker.value);
                        row
                    }
                    Cell::Empty => {
                        let mut row = base(RowKind::NotInspected);
                        row.value = NOT_INSPECTED.to_string();
                        row
                    }
                };

                row.equipment_name = subject.equipment_name(&item.equipment_id);
                row.check_item_id.clone_from(&item.item_id);
                row.check_item_name.clone_from(&item.name);
                row.frequency_hours = item.frequency.hours();
                row.slot_index = item_slot;
                row.first_column = first_column;
                row.merge_width = item.frequency.merge_width(finest);
                rows.push(row);
            }
        }
        rows
    }
}

/// Date and time of an instant as shown in the report.
///
/// Inside a window that spans midnight, instants between 00:00 and 00:30
/// are shown as `24:MM` on the window's start date so that rows stay in
/// chronological order within the window.
#[must_use]
pub fn display_date_time(
    calendar: &ShiftCalendar,
    window: &ShiftWindow,
    at_ms: i64,
) -> (String, String) {
    let local: NaiveDateTime = calendar.local_datetime(at_ms);
    if window.shift.spans_midnight()
        && local.date() > window.date
        && local.hour() == 0
        && local.minute() < 30
    {
        return (
            window.date.format("%Y-%m-%d").to_string(),
            format!("24:{:02}", local.minute()),
        );
    }
    (
        local.format("%Y-%m-%d").to_string(),
        local.format("%H:%M").to_string(),
    )
}
