// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit trail and export mark queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use patrol::ExportMark;
use patrol_audit::{Action, Actor, AuditEvent, Cause};

use crate::data_models::{ActionData, ActorData, CauseData};
use crate::diesel_schema::{audit_events, export_marks};
use crate::error::PersistenceError;

#[derive(Queryable, Selectable)]
#[diesel(table_name = audit_events)]
struct AuditEventRow {
    event_id: i64,
    actor_json: String,
    cause_json: String,
    action_json: String,
    occurred_at_ms: i64,
}

impl TryFrom<AuditEventRow> for AuditEvent {
    type Error = PersistenceError;

    fn try_from(row: AuditEventRow) -> Result<Self, Self::Error> {
        let actor_data: ActorData = serde_json::from_str(&row.actor_json)?;
        let cause_data: CauseData = serde_json::from_str(&row.cause_json)?;
        let action_data: ActionData = serde_json::from_str(&row.action_json)?;

        Ok(Self::new(
            Actor::from(actor_data),
            Cause::from(cause_data),
            Action::from(action_data),
            row.occurred_at_ms,
        )
        .with_id(row.event_id))
    }
}

/// Retrieves an audit event by id.
///
/// # Errors
///
/// Returns [`PersistenceError::NotFound`] if no event has that id, or an
/// error if the stored JSON cannot be decoded.
pub fn get_audit_event(
    conn: &mut SqliteConnection,
    event_id: i64,
) -> Result<AuditEvent, PersistenceError> {
    let row: AuditEventRow = audit_events::table
        .filter(audit_events::event_id.eq(event_id))
        .select(AuditEventRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("audit event {event_id}")))?;
    AuditEvent::try_from(row)
}

/// All audit events in the order they were written.
///
/// # Errors
///
/// Returns an error if the query fails or stored JSON cannot be decoded.
pub fn list_audit_events(conn: &mut SqliteConnection) -> Result<Vec<AuditEvent>, PersistenceError> {
    let rows: Vec<AuditEventRow> = audit_events::table
        .select(AuditEventRow::as_select())
        .order(audit_events::event_id.asc())
        .load(conn)?;
    rows.into_iter().map(AuditEvent::try_from).collect()
}

/// The most recently confirmed export range.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_last_export_mark(
    conn: &mut SqliteConnection,
) -> Result<Option<ExportMark>, PersistenceError> {
    let row: Option<(i64, i64, i64)> = export_marks::table
        .select((
            export_marks::range_start_ms,
            export_marks::range_end_ms,
            export_marks::confirmed_at_ms,
        ))
        .order(export_marks::mark_id.desc())
        .first(conn)
        .optional()?;

    Ok(row.map(|(range_start_ms, range_end_ms, confirmed_at_ms)| ExportMark {
        range_start_ms,
        range_end_ms,
        confirmed_at_ms,
    }))
}
