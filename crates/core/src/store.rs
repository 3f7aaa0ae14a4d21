// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The persistence collaborator consumed by the engine.
//!
//! Every component receives the store explicitly at construction. Writes
//! that span several rows (an inspection with its items, a purge, a
//! destructive clear, a reference-data import) are single trait calls so
//! the implementation can run each of them inside one transaction.

use crate::error::StoreError;
use patrol_audit::AuditEvent;
use patrol_domain::{
    CheckItem, Checkpoint, Equipment, InspectionRecord, InspectionRecordItem, InspectionSession,
    OperationalState, Operator, RecordItemCorrection, Route,
};

/// Reference data loaded by a bulk import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceData {
    pub routes: Vec<Route>,
    pub checkpoints: Vec<Checkpoint>,
    pub equipment: Vec<Equipment>,
    pub check_items: Vec<CheckItem>,
    pub operators: Vec<Operator>,
}

impl ReferenceData {
    /// Total number of rows across all entity kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
            + self.checkpoints.len()
            + self.equipment.len()
            + self.check_items.len()
            + self.operators.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An inspection record with its entries, ready to be written atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInspection {
    pub record: InspectionRecord,
    pub items: Vec<InspectionRecordItem>,
    /// Operational states chosen during this visit.
    pub equipment_states: Vec<(String, OperationalState)>,
    pub event: AuditEvent,
}

/// Outcome of removing future-dated records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeSummary {
    pub records_removed: usize,
    pub items_removed: usize,
    /// The sentinel record describing the purge.
    pub audit_record_id: i64,
}

/// A confirmed export range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportMark {
    pub range_start_ms: i64,
    pub range_end_ms: i64,
    pub confirmed_at_ms: i64,
}

/// Storage operations required by the inspection engine.
///
/// Time ranges are half-open: `[start_ms, end_ms)`.
pub trait InspectionStore {
    /// Replaces reference data by key, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if any row cannot be written; nothing is written then.
    fn upsert_reference_data(&mut self, data: &ReferenceData) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn routes(&mut self) -> Result<Vec<Route>, StoreError>;

    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn route(&mut self, route_id: &str) -> Result<Option<Route>, StoreError>;

    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn operator(&mut self, operator_id: &str) -> Result<Option<Operator>, StoreError>;

    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn checkpoint(&mut self, checkpoint_id: &str) -> Result<Option<Checkpoint>, StoreError>;

    /// Checkpoints of a route, ordered by checkpoint id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn checkpoints_for_route(&mut self, route_id: &str) -> Result<Vec<Checkpoint>, StoreError>;

    /// Checkpoints whose stored tag equals any of `tag_variants` exactly.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn checkpoints_by_tags(&mut self, tag_variants: &[String])
    -> Result<Vec<Checkpoint>, StoreError>;

    /// Equipment at a checkpoint, ordered by equipment id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn equipment_for_checkpoint(&mut self, checkpoint_id: &str)
    -> Result<Vec<Equipment>, StoreError>;

    /// Check items of the given equipment, ordered by equipment then item id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn check_items_for_equipment(
        &mut self,
        equipment_ids: &[String],
    ) -> Result<Vec<CheckItem>, StoreError>;

    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn check_item(&mut self, item_id: &str) -> Result<Option<CheckItem>, StoreError>;

    /// Last chosen operational state per equipment, where known.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn equipment_states(
        &mut self,
        equipment_ids: &[String],
    ) -> Result<Vec<(String, OperationalState)>, StoreError>;

    /// Inserts a session and its audit event, returning the session id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    fn insert_session(
        &mut self,
        session: &InspectionSession,
        event: &AuditEvent,
    ) -> Result<i64, StoreError>;

    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn session(&mut self, session_id: i64) -> Result<Option<InspectionSession>, StoreError>;

    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn sessions_by_ids(&mut self, session_ids: &[i64])
    -> Result<Vec<InspectionSession>, StoreError>;

    /// Writes a record, its items, the chosen equipment states and the
    /// audit event atomically, returning the record id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if a record already exists for the
    /// same checkpoint, slot and shift window.
    fn insert_inspection(&mut self, inspection: &NewInspection) -> Result<i64, StoreError>;

    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn record(&mut self, record_id: i64) -> Result<Option<InspectionRecord>, StoreError>;

    /// Records in `[start_ms, end_ms)`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn records_in_window(
        &mut self,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<InspectionRecord>, StoreError>;

    /// Records of one checkpoint and slot in `[start_ms, end_ms)`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn records_for_checkpoint_slot_in_window(
        &mut self,
        checkpoint_id: &str,
        slot_index: u32,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<InspectionRecord>, StoreError>;

    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn items_for_record_ids(
        &mut self,
        record_ids: &[i64],
    ) -> Result<Vec<InspectionRecordItem>, StoreError>;

    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn record_item(&mut self, entry_id: i64) -> Result<Option<InspectionRecordItem>, StoreError>;

    /// The most recently recorded value for a check item, across all shifts.
    /// A corrected entry yields the value of its latest correction.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn latest_value_for_item(&mut self, check_item_id: &str) -> Result<Option<String>, StoreError>;

    /// Timestamp of the newest record, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn latest_record_timestamp(&mut self) -> Result<Option<i64>, StoreError>;

    /// Appends a correction and its audit event, returning the correction id.
    ///
    /// # Errors
    ///
    /// Returns an error if the referenced record item does not exist.
    fn append_correction(
        &mut self,
        correction: &RecordItemCorrection,
        event: &AuditEvent,
    ) -> Result<i64, StoreError>;

    /// Corrections of the given record items, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn corrections_for_items(
        &mut self,
        entry_ids: &[i64],
    ) -> Result<Vec<RecordItemCorrection>, StoreError>;

    /// Deletes every record item, correction, record and session, then
    /// inserts `replacement` and the audit event, all atomically.
    /// Returns the new session id.
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails; nothing is deleted then.
    fn clear_inspection_data(
        &mut self,
        replacement: &InspectionSession,
        event: &AuditEvent,
    ) -> Result<i64, StoreError>;

    /// Deletes records (and their items) recorded at or after `cutoff_ms`, then
    /// writes the sentinel `audit_record`, all atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails; nothing is deleted then.
    fn purge_records_after(
        &mut self,
        cutoff_ms: i64,
        audit_record: &NewInspection,
    ) -> Result<PurgeSummary, StoreError>;

    /// The most recently confirmed export, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn last_export_mark(&mut self) -> Result<Option<ExportMark>, StoreError>;

    /// Records a confirmed export range with its audit event.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    fn record_export_mark(&mut self, mark: &ExportMark, event: &AuditEvent)
    -> Result<i64, StoreError>;

    /// Persists an audit event, returning its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    fn append_audit_event(&mut self, event: &AuditEvent) -> Result<i64, StoreError>;
}
