// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! `SQLite` persistence for the patrol inspection engine.
//!
//! [`Persistence`] owns one Diesel connection and implements
//! [`InspectionStore`]. Reads and writes are split into `queries/` and
//! `mutations/`; every trait call that touches more than one row runs in
//! a single transaction.
//!
//! ## Schema
//!
//! Migrations live in `migrations/` and are embedded at compile time.
//! Inspection records carry a partial unique index over
//! `(checkpoint_id, slot_index, window_start_ms)` that excludes the system
//! audit checkpoint, so a duplicate visit that slips past the engine's own
//! check is still rejected and reported as [`StoreError::Conflict`].
//!
//! ## Testing
//!
//! [`Persistence::new_in_memory`] opens a uniquely named shared-cache
//! in-memory database per call so tests never see each other's rows.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

use diesel::{Connection, SqliteConnection};
use patrol::{ExportMark, InspectionStore, NewInspection, PurgeSummary, ReferenceData, StoreError};
use patrol_audit::AuditEvent;
use patrol_domain::{
    CheckItem, Checkpoint, Equipment, InspectionRecord, InspectionRecordItem, InspectionSession,
    OperationalState, Operator, RecordItemCorrection, Route,
};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

pub use error::PersistenceError;

/// Sequence for unique in-memory database names.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Persistence adapter backed by a single `SQLite` connection.
pub struct Persistence {
    conn: SqliteConnection,
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence").finish_non_exhaustive()
    }
}

impl Persistence {
    /// Creates a persistence adapter over a fresh in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String = format!("file:memdb_patrol_{db_id}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Creates a persistence adapter over a database file, creating it if
    /// needed.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;
        backend::sqlite::enable_wal_mode(&mut conn)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        info!(path = path_str, "Opened inspection database");
        Ok(Self { conn })
    }

    /// Verifies that foreign key enforcement is active on this connection.
    ///
    /// # Errors
    ///
    /// Returns an error if enforcement is off or the check fails.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        backend::sqlite::verify_foreign_key_enforcement(&mut self.conn)
    }

    /// Every stored audit event, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or stored JSON cannot be decoded.
    pub fn audit_events(&mut self) -> Result<Vec<AuditEvent>, PersistenceError> {
        queries::audit::list_audit_events(&mut self.conn)
    }

    /// Retrieves one audit event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event does not exist or cannot be decoded.
    pub fn audit_event(&mut self, event_id: i64) -> Result<AuditEvent, PersistenceError> {
        queries::audit::get_audit_event(&mut self.conn, event_id)
    }
}

impl InspectionStore for Persistence {
    fn upsert_reference_data(&mut self, data: &ReferenceData) -> Result<(), StoreError> {
        self.conn
            .transaction::<_, PersistenceError, _>(|conn| {
                mutations::reference::upsert_reference_data(conn, data)
            })?;
        info!(rows = data.len(), "Imported reference data");
        Ok(())
    }

    fn routes(&mut self) -> Result<Vec<Route>, StoreError> {
        Ok(queries::reference::list_routes(&mut self.conn)?)
    }

    fn route(&mut self, route_id: &str) -> Result<Option<Route>, StoreError> {
        Ok(queries::reference::get_route(&mut self.conn, route_id)?)
    }

    fn operator(&mut self, operator_id: &str) -> Result<Option<Operator>, StoreError> {
        Ok(queries::reference::get_operator(&mut self.conn, operator_id)?)
    }

    fn checkpoint(&mut self, checkpoint_id: &str) -> Result<Option<Checkpoint>, StoreError> {
        Ok(queries::reference::get_checkpoint(&mut self.conn, checkpoint_id)?)
    }

    fn checkpoints_for_route(&mut self, route_id: &str) -> Result<Vec<Checkpoint>, StoreError> {
        Ok(queries::reference::list_checkpoints_for_route(
            &mut self.conn,
            route_id,
        )?)
    }

    fn checkpoints_by_tags(
        &mut self,
        tag_variants: &[String],
    ) -> Result<Vec<Checkpoint>, StoreError> {
        Ok(queries::reference::find_checkpoints_by_tags(
            &mut self.conn,
            tag_variants,
        )?)
    }

    fn equipment_for_checkpoint(
        &mut self,
        checkpoint_id: &str,
    ) -> Result<Vec<Equipment>, StoreError> {
        Ok(queries::reference::list_equipment_for_checkpoint(
            &mut self.conn,
            checkpoint_id,
        )?)
    }

    fn check_items_for_equipment(
        &mut self,
        equipment_ids: &[String],
    ) -> Result<Vec<CheckItem>, StoreError> {
        Ok(queries::reference::list_check_items_for_equipment(
            &mut self.conn,
            equipment_ids,
        )?)
    }

    fn check_item(&mut self, item_id: &str) -> Result<Option<CheckItem>, StoreError> {
        Ok(queries::reference::get_check_item(&mut self.conn, item_id)?)
    }

    fn equipment_states(
        &mut self,
        equipment_ids: &[String],
    ) -> Result<Vec<(String, OperationalState)>, StoreError> {
        Ok(queries::reference::get_equipment_states(
            &mut self.conn,
            equipment_ids,
        )?)
    }

    fn insert_session(
        &mut self,
        session: &InspectionSession,
        event: &AuditEvent,
    ) -> Result<i64, StoreError> {
        Ok(self
            .conn
            .transaction::<_, PersistenceError, _>(|conn| {
                let session_id: i64 = mutations::inspections::insert_session(conn, session)?;
                mutations::audit::persist_audit_event(conn, event)?;
                Ok(session_id)
            })?)
    }

    fn session(&mut self, session_id: i64) -> Result<Option<InspectionSession>, StoreError> {
        Ok(queries::inspections::get_session(&mut self.conn, session_id)?)
    }

    fn sessions_by_ids(
        &mut self,
        session_ids: &[i64],
    ) -> Result<Vec<InspectionSession>, StoreError> {
        Ok(queries::inspections::list_sessions_by_ids(
            &mut self.conn,
            session_ids,
        )?)
    }

    fn insert_inspection(&mut self, inspection: &NewInspection) -> Result<i64, StoreError> {
        Ok(self
            .conn
            .transaction::<_, PersistenceError, _>(|conn| {
                let record_id: i64 = mutations::inspections::insert_inspection(conn, inspection)?;
                mutations::audit::persist_audit_event(conn, &inspection.event)?;
                Ok(record_id)
            })?)
    }

    fn record(&mut self, record_id: i64) -> Result<Option<InspectionRecord>, StoreError> {
        Ok(queries::inspections::get_record(&mut self.conn, record_id)?)
    }

    fn records_in_window(
        &mut self,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<InspectionRecord>, StoreError> {
        Ok(queries::inspections::list_records_in_window(
            &mut self.conn,
            start_ms,
            end_ms,
        )?)
    }

    fn records_for_checkpoint_slot_in_window(
        &mut self,
        checkpoint_id: &str,
        slot_index: u32,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<InspectionRecord>, StoreError> {
        let slot_index: i32 = mutations::to_signed(slot_index, "slot_index")?;
        Ok(queries::inspections::list_records_for_checkpoint_slot(
            &mut self.conn,
            checkpoint_id,
            slot_index,
            start_ms,
            end_ms,
        )?)
    }

    fn items_for_record_ids(
        &mut self,
        record_ids: &[i64],
    ) -> Result<Vec<InspectionRecordItem>, StoreError> {
        Ok(queries::inspections::list_items_for_records(
            &mut self.conn,
            record_ids,
        )?)
    }

    fn record_item(&mut self, entry_id: i64) -> Result<Option<InspectionRecordItem>, StoreError> {
        Ok(queries::inspections::get_record_item(&mut self.conn, entry_id)?)
    }

    fn latest_value_for_item(&mut self, check_item_id: &str) -> Result<Option<String>, StoreError> {
        Ok(queries::inspections::latest_value_for_item(
            &mut self.conn,
            check_item_id,
        )?)
    }

    fn latest_record_timestamp(&mut self) -> Result<Option<i64>, StoreError> {
        Ok(queries::inspections::latest_record_timestamp(&mut self.conn)?)
    }

    fn append_correction(
        &mut self,
        correction: &RecordItemCorrection,
        event: &AuditEvent,
    ) -> Result<i64, StoreError> {
        Ok(self
            .conn
            .transaction::<_, PersistenceError, _>(|conn| {
                let correction_id: i64 = mutations::inspections::insert_correction(conn, correction)?;
                mutations::audit::persist_audit_event(conn, event)?;
                Ok(correction_id)
            })?)
    }

    fn corrections_for_items(
        &mut self,
        entry_ids: &[i64],
    ) -> Result<Vec<RecordItemCorrection>, StoreError> {
        Ok(queries::inspections::list_corrections_for_items(
            &mut self.conn,
            entry_ids,
        )?)
    }

    fn clear_inspection_data(
        &mut self,
        replacement: &InspectionSession,
        event: &AuditEvent,
    ) -> Result<i64, StoreError> {
        let session_id: i64 = self
            .conn
            .transaction::<_, PersistenceError, _>(|conn| {
                mutations::inspections::delete_inspection_data(conn)?;
                let session_id: i64 = mutations::inspections::insert_session(conn, replacement)?;
                mutations::audit::persist_audit_event(conn, event)?;
                Ok(session_id)
            })?;
        warn!(session_id, "Cleared all inspection data");
        Ok(session_id)
    }

    fn purge_records_after(
        &mut self,
        cutoff_ms: i64,
        audit_record: &NewInspection,
    ) -> Result<PurgeSummary, StoreError> {
        let summary: PurgeSummary = self
            .conn
            .transaction::<_, PersistenceError, _>(|conn| {
                let (records_removed, items_removed) =
                    mutations::inspections::delete_records_from(conn, cutoff_ms)?;
                let audit_record_id: i64 =
                    mutations::inspections::insert_inspection(conn, audit_record)?;
                mutations::audit::persist_audit_event(conn, &audit_record.event)?;
                Ok(PurgeSummary {
                    records_removed,
                    items_removed,
                    audit_record_id,
                })
            })?;
        warn!(
            cutoff_ms,
            records_removed = summary.records_removed,
            items_removed = summary.items_removed,
            "Purged future-dated records"
        );
        Ok(summary)
    }

    fn last_export_mark(&mut self) -> Result<Option<ExportMark>, StoreError> {
        Ok(queries::audit::get_last_export_mark(&mut self.conn)?)
    }

    fn record_export_mark(
        &mut self,
        mark: &ExportMark,
        event: &AuditEvent,
    ) -> Result<i64, StoreError> {
        Ok(self
            .conn
            .transaction::<_, PersistenceError, _>(|conn| {
                let mark_id: i64 = mutations::audit::insert_export_mark(conn, mark)?;
                mutations::audit::persist_audit_event(conn, event)?;
                Ok(mark_id)
            })?)
    }

    fn append_audit_event(&mut self, event: &AuditEvent) -> Result<i64, StoreError> {
        Ok(mutations::audit::persist_audit_event(&mut self.conn, event)?)
    }
}
