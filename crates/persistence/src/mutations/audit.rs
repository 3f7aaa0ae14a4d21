// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit event and export mark writes.

use diesel::SqliteConnection;
use diesel::prelude::*;
use patrol::ExportMark;
use patrol_audit::AuditEvent;
use tracing::debug;

use crate::backend::sqlite::get_last_insert_rowid;
use crate::data_models::{ActionData, ActorData, CauseData};
use crate::diesel_schema::{audit_events, export_marks};
use crate::error::PersistenceError;

/// Persists an audit event.
///
/// # Returns
///
/// The event id assigned by the database.
///
/// # Errors
///
/// Returns an error if serialization or the insert fails.
pub fn persist_audit_event(
    conn: &mut SqliteConnection,
    event: &AuditEvent,
) -> Result<i64, PersistenceError> {
    let actor_json: String = serde_json::to_string(&ActorData::from(&event.actor))?;
    let cause_json: String = serde_json::to_string(&CauseData::from(&event.cause))?;
    let action_json: String = serde_json::to_string(&ActionData::from(&event.action))?;

    diesel::insert_into(audit_events::table)
        .values((
            audit_events::action_name.eq(&event.action.name),
            audit_events::actor_json.eq(&actor_json),
            audit_events::cause_json.eq(&cause_json),
            audit_events::action_json.eq(&action_json),
            audit_events::occurred_at_ms.eq(event.occurred_at_ms),
        ))
        .execute(conn)?;

    let event_id: i64 = get_last_insert_rowid(conn)?;
    debug!(event_id, action = %event.action.name, "Persisted audit event");
    Ok(event_id)
}

/// Records a confirmed export range.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_export_mark(
    conn: &mut SqliteConnection,
    mark: &ExportMark,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(export_marks::table)
        .values((
            export_marks::range_start_ms.eq(mark.range_start_ms),
            export_marks::range_end_ms.eq(mark.range_end_ms),
            export_marks::confirmed_at_ms.eq(mark.confirmed_at_ms),
        ))
        .execute(conn)?;
    get_last_insert_rowid(conn)
}
