// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Session, inspection record, correction, purge and clear writes.

use diesel::SqliteConnection;
use diesel::prelude::*;
use patrol::NewInspection;
use patrol_domain::{InspectionSession, RecordItemCorrection};
use tracing::{debug, info};

use crate::backend::sqlite::get_last_insert_rowid;
use crate::diesel_schema::{
    equipment_status, inspection_record_items, inspection_records, inspection_sessions,
    record_item_corrections,
};
use crate::error::PersistenceError;
use crate::mutations::to_signed;

/// Inserts a session row.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_session(
    conn: &mut SqliteConnection,
    session: &InspectionSession,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(inspection_sessions::table)
        .values((
            inspection_sessions::route_id.eq(&session.route_id),
            inspection_sessions::route_name.eq(&session.route_name),
            inspection_sessions::operator_id.eq(&session.operator_id),
            inspection_sessions::shift_id.eq(&session.shift_id),
            inspection_sessions::started_at_ms.eq(session.started_at_ms),
        ))
        .execute(conn)?;

    let session_id: i64 = get_last_insert_rowid(conn)?;
    info!(session_id, route_id = %session.route_id, "Inserted inspection session");
    Ok(session_id)
}

/// Inserts a record, its entries and the equipment states chosen during
/// the visit.
///
/// # Errors
///
/// Returns [`PersistenceError::UniqueViolation`] if the checkpoint already
/// has a record for the same slot and shift window.
pub fn insert_inspection(
    conn: &mut SqliteConnection,
    inspection: &NewInspection,
) -> Result<i64, PersistenceError> {
    let record = &inspection.record;
    diesel::insert_into(inspection_records::table)
        .values((
            inspection_records::session_id.eq(record.session_id),
            inspection_records::checkpoint_id.eq(&record.checkpoint_id),
            inspection_records::slot_index.eq(to_signed(
                record.slot_index,
                "inspection_records.slot_index",
            )?),
            inspection_records::frequency_hours.eq(to_signed(
                record.frequency.hours(),
                "inspection_records.frequency_hours",
            )?),
            inspection_records::window_start_ms.eq(record.window_start_ms),
            inspection_records::recorded_at_ms.eq(record.recorded_at_ms),
        ))
        .execute(conn)?;
    let record_id: i64 = get_last_insert_rowid(conn)?;

    for item in &inspection.items {
        diesel::insert_into(inspection_record_items::table)
            .values((
                inspection_record_items::record_id.eq(record_id),
                inspection_record_items::equipment_id.eq(&item.equipment_id),
                inspection_record_items::check_item_id.eq(&item.check_item_id),
                inspection_record_items::slot_index.eq(to_signed(
                    item.slot_index,
                    "inspection_record_items.slot_index",
                )?),
                inspection_record_items::value.eq(&item.value),
                inspection_record_items::remark.eq(&item.remark),
                inspection_record_items::abnormal.eq(i32::from(item.abnormal)),
            ))
            .execute(conn)?;
    }

    for (equipment_id, state) in &inspection.equipment_states {
        diesel::insert_into(equipment_status::table)
            .values((
                equipment_status::equipment_id.eq(equipment_id),
                equipment_status::state.eq(state.as_str()),
                equipment_status::updated_at_ms.eq(record.recorded_at_ms),
            ))
            .on_conflict(equipment_status::equipment_id)
            .do_update()
            .set((
                equipment_status::state.eq(state.as_str()),
                equipment_status::updated_at_ms.eq(record.recorded_at_ms),
            ))
            .execute(conn)?;
    }

    debug!(
        record_id,
        checkpoint_id = %record.checkpoint_id,
        slot_index = record.slot_index,
        items = inspection.items.len(),
        "Inserted inspection record"
    );
    Ok(record_id)
}

/// Appends a correction row.
///
/// # Errors
///
/// Returns [`PersistenceError::ForeignKeyViolation`] if the corrected entry
/// does not exist.
pub fn insert_correction(
    conn: &mut SqliteConnection,
    correction: &RecordItemCorrection,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(record_item_corrections::table)
        .values((
            record_item_corrections::entry_id.eq(correction.entry_id),
            record_item_corrections::previous_value.eq(&correction.previous_value),
            record_item_corrections::new_value.eq(&correction.new_value),
            record_item_corrections::remark.eq(&correction.remark),
            record_item_corrections::abnormal.eq(i32::from(correction.abnormal)),
            record_item_corrections::operator_id.eq(&correction.operator_id),
            record_item_corrections::corrected_at_ms.eq(correction.corrected_at_ms),
        ))
        .execute(conn)?;
    get_last_insert_rowid(conn)
}

/// Deletes records recorded at or after `cutoff_ms` together with their
/// entries and any corrections of those entries.
///
/// # Returns
///
/// The number of records and entries removed.
///
/// # Errors
///
/// Returns an error if a delete fails.
pub fn delete_records_from(
    conn: &mut SqliteConnection,
    cutoff_ms: i64,
) -> Result<(usize, usize), PersistenceError> {
    let record_ids: Vec<i64> = inspection_records::table
        .filter(inspection_records::recorded_at_ms.ge(cutoff_ms))
        .select(inspection_records::record_id)
        .load(conn)?;

    let entry_ids: Vec<i64> = inspection_record_items::table
        .filter(inspection_record_items::record_id.eq_any(&record_ids))
        .select(inspection_record_items::entry_id)
        .load(conn)?;

    diesel::delete(
        record_item_corrections::table
            .filter(record_item_corrections::entry_id.eq_any(&entry_ids)),
    )
    .execute(conn)?;
    let items_removed: usize = diesel::delete(
        inspection_record_items::table
            .filter(inspection_record_items::record_id.eq_any(&record_ids)),
    )
    .execute(conn)?;
    let records_removed: usize = diesel::delete(
        inspection_records::table.filter(inspection_records::record_id.eq_any(&record_ids)),
    )
    .execute(conn)?;

    Ok((records_removed, items_removed))
}

/// Deletes every correction, entry, record and session.
///
/// # Errors
///
/// Returns an error if a delete fails.
pub fn delete_inspection_data(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    let corrections: usize = diesel::delete(record_item_corrections::table).execute(conn)?;
    let items: usize = diesel::delete(inspection_record_items::table).execute(conn)?;
    let records: usize = diesel::delete(inspection_records::table).execute(conn)?;
    let sessions: usize = diesel::delete(inspection_sessions::table).execute(conn)?;

    info!(corrections, items, records, sessions, "Deleted all inspection data");
    Ok(())
}
