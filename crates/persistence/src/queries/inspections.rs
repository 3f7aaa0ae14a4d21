// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Queries over sessions, inspection records, entries and corrections.

use diesel::SqliteConnection;
use diesel::dsl::max;
use diesel::prelude::*;
use patrol_domain::{
    Frequency, InspectionRecord, InspectionRecordItem, InspectionSession, RecordItemCorrection,
};

use crate::diesel_schema::{
    inspection_record_items, inspection_records, inspection_sessions, record_item_corrections,
};
use crate::error::PersistenceError;
use crate::queries::to_unsigned;

#[derive(Queryable, Selectable)]
#[diesel(table_name = inspection_sessions)]
struct SessionRow {
    session_id: i64,
    route_id: String,
    route_name: String,
    operator_id: String,
    shift_id: String,
    started_at_ms: i64,
}

impl From<SessionRow> for InspectionSession {
    fn from(row: SessionRow) -> Self {
        Self {
            session_id: Some(row.session_id),
            route_id: row.route_id,
            route_name: row.route_name,
            operator_id: row.operator_id,
            shift_id: row.shift_id,
            started_at_ms: row.started_at_ms,
        }
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = inspection_records)]
struct RecordRow {
    record_id: i64,
    session_id: i64,
    checkpoint_id: String,
    slot_index: i32,
    frequency_hours: i32,
    window_start_ms: i64,
    recorded_at_ms: i64,
}

impl TryFrom<RecordRow> for InspectionRecord {
    type Error = PersistenceError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let hours: u32 = to_unsigned(row.frequency_hours, "inspection_records.frequency_hours")?;
        let frequency: Frequency = Frequency::from_hours(hours).ok_or_else(|| {
            PersistenceError::ReconstructionError(format!(
                "record {} has unsupported frequency {hours}h",
                row.record_id
            ))
        })?;

        Ok(Self {
            record_id: Some(row.record_id),
            session_id: row.session_id,
            checkpoint_id: row.checkpoint_id,
            slot_index: to_unsigned(row.slot_index, "inspection_records.slot_index")?,
            frequency,
            window_start_ms: row.window_start_ms,
            recorded_at_ms: row.recorded_at_ms,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = inspection_record_items)]
struct RecordItemRow {
    entry_id: i64,
    record_id: i64,
    equipment_id: String,
    check_item_id: Option<String>,
    slot_index: i32,
    value: String,
    remark: Option<String>,
    abnormal: i32,
}

impl TryFrom<RecordItemRow> for InspectionRecordItem {
    type Error = PersistenceError;

    fn try_from(row: RecordItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            entry_id: Some(row.entry_id),
            record_id: Some(row.record_id),
            equipment_id: row.equipment_id,
            check_item_id: row.check_item_id,
            slot_index: to_unsigned(row.slot_index, "inspection_record_items.slot_index")?,
            value: row.value,
            remark: row.remark,
            abnormal: row.abnormal != 0,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = record_item_corrections)]
struct CorrectionRow {
    correction_id: i64,
    entry_id: i64,
    previous_value: String,
    new_value: String,
    remark: Option<String>,
    abnormal: i32,
    operator_id: String,
    corrected_at_ms: i64,
}

impl From<CorrectionRow> for RecordItemCorrection {
    fn from(row: CorrectionRow) -> Self {
        Self {
            correction_id: Some(row.correction_id),
            entry_id: row.entry_id,
            previous_value: row.previous_value,
            new_value: row.new_value,
            remark: row.remark,
            abnormal: row.abnormal != 0,
            operator_id: row.operator_id,
            corrected_at_ms: row.corrected_at_ms,
        }
    }
}

/// Retrieves a session by id.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_session(
    conn: &mut SqliteConnection,
    session_id: i64,
) -> Result<Option<InspectionSession>, PersistenceError> {
    let row: Option<SessionRow> = inspection_sessions::table
        .filter(inspection_sessions::session_id.eq(session_id))
        .select(SessionRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row.map(InspectionSession::from))
}

/// Retrieves the sessions with the given ids, ordered by id.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_sessions_by_ids(
    conn: &mut SqliteConnection,
    session_ids: &[i64],
) -> Result<Vec<InspectionSession>, PersistenceError> {
    let rows: Vec<SessionRow> = inspection_sessions::table
        .filter(inspection_sessions::session_id.eq_any(session_ids))
        .select(SessionRow::as_select())
        .order(inspection_sessions::session_id.asc())
        .load(conn)?;
    Ok(rows.into_iter().map(InspectionSession::from).collect())
}

/// Retrieves a record by id.
///
/// # Errors
///
/// Returns an error if the query fails or the stored record is malformed.
pub fn get_record(
    conn: &mut SqliteConnection,
    record_id: i64,
) -> Result<Option<InspectionRecord>, PersistenceError> {
    let row: Option<RecordRow> = inspection_records::table
        .filter(inspection_records::record_id.eq(record_id))
        .select(RecordRow::as_select())
        .first(conn)
        .optional()?;
    row.map(InspectionRecord::try_from).transpose()
}

/// Records with `start_ms <= recorded_at_ms < end_ms`, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails or a stored record is malformed.
pub fn list_records_in_window(
    conn: &mut SqliteConnection,
    start_ms: i64,
    end_ms: i64,
) -> Result<Vec<InspectionRecord>, PersistenceError> {
    let rows: Vec<RecordRow> = inspection_records::table
        .filter(inspection_records::recorded_at_ms.ge(start_ms))
        .filter(inspection_records::recorded_at_ms.lt(end_ms))
        .select(RecordRow::as_select())
        .order((
            inspection_records::recorded_at_ms.asc(),
            inspection_records::record_id.asc(),
        ))
        .load(conn)?;
    rows.into_iter().map(InspectionRecord::try_from).collect()
}

/// Records of one checkpoint and slot inside `[start_ms, end_ms)`.
///
/// # Errors
///
/// Returns an error if the query fails or a stored record is malformed.
pub fn list_records_for_checkpoint_slot(
    conn: &mut SqliteConnection,
    checkpoint_id: &str,
    slot_index: i32,
    start_ms: i64,
    end_ms: i64,
) -> Result<Vec<InspectionRecord>, PersistenceError> {
    let rows: Vec<RecordRow> = inspection_records::table
        .filter(inspection_records::checkpoint_id.eq(checkpoint_id))
        .filter(inspection_records::slot_index.eq(slot_index))
        .filter(inspection_records::recorded_at_ms.ge(start_ms))
        .filter(inspection_records::recorded_at_ms.lt(end_ms))
        .select(RecordRow::as_select())
        .order((
            inspection_records::recorded_at_ms.asc(),
            inspection_records::record_id.asc(),
        ))
        .load(conn)?;
    rows.into_iter().map(InspectionRecord::try_from).collect()
}

/// Entries of the given records, ordered by entry id.
///
/// # Errors
///
/// Returns an error if the query fails or a stored entry is malformed.
pub fn list_items_for_records(
    conn: &mut SqliteConnection,
    record_ids: &[i64],
) -> Result<Vec<InspectionRecordItem>, PersistenceError> {
    let rows: Vec<RecordItemRow> = inspection_record_items::table
        .filter(inspection_record_items::record_id.eq_any(record_ids))
        .select(RecordItemRow::as_select())
        .order(inspection_record_items::entry_id.asc())
        .load(conn)?;
    rows.into_iter().map(InspectionRecordItem::try_from).collect()
}

/// Retrieves a single entry by id.
///
/// # Errors
///
/// Returns an error if the query fails or the stored entry is malformed.
pub fn get_record_item(
    conn: &mut SqliteConnection,
    entry_id: i64,
) -> Result<Option<InspectionRecordItem>, PersistenceError> {
    let row: Option<RecordItemRow> = inspection_record_items::table
        .filter(inspection_record_items::entry_id.eq(entry_id))
        .select(RecordItemRow::as_select())
        .first(conn)
        .optional()?;
    row.map(InspectionRecordItem::try_from).transpose()
}

/// The value entered most recently for a check item, judged by the
/// owning record's timestamp. A corrected entry yields its latest
/// correction's value.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn latest_value_for_item(
    conn: &mut SqliteConnection,
    check_item_id: &str,
) -> Result<Option<String>, PersistenceError> {
    let newest: Option<(i64, String)> = inspection_record_items::table
        .inner_join(inspection_records::table)
        .filter(inspection_record_items::check_item_id.eq(check_item_id))
        .order((
            inspection_records::recorded_at_ms.desc(),
            inspection_record_items::entry_id.desc(),
        ))
        .select((
            inspection_record_items::entry_id,
            inspection_record_items::value,
        ))
        .first::<(i64, String)>(conn)
        .optional()?;
    let Some((entry_id, value)) = newest else {
        return Ok(None);
    };

    let corrected: Option<String> = record_item_corrections::table
        .filter(record_item_corrections::entry_id.eq(entry_id))
        .order((
            record_item_corrections::corrected_at_ms.desc(),
            record_item_corrections::correction_id.desc(),
        ))
        .select(record_item_corrections::new_value)
        .first::<String>(conn)
        .optional()?;

    Ok(Some(corrected.unwrap_or(value)))
}

/// Timestamp of the newest record.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn latest_record_timestamp(conn: &mut SqliteConnection) -> Result<Option<i64>, PersistenceError> {
    Ok(inspection_records::table
        .select(max(inspection_records::recorded_at_ms))
        .first::<Option<i64>>(conn)?)
}

/// Corrections of the given entries, oldest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_corrections_for_items(
    conn: &mut SqliteConnection,
    entry_ids: &[i64],
) -> Result<Vec<RecordItemCorrection>, PersistenceError> {
    let rows: Vec<CorrectionRow> = record_item_corrections::table
        .filter(record_item_corrections::entry_id.eq_any(entry_ids))
        .select(CorrectionRow::as_select())
        .order((
            record_item_corrections::corrected_at_ms.asc(),
            record_item_corrections::correction_id.asc(),
        ))
        .load(conn)?;
    Ok(rows.into_iter().map(RecordItemCorrection::from).collect())
}
