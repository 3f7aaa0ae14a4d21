// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Detection and remediation of device clock regression.

use crate::error::CoreError;
use crate::report::PURGE_DESCRIPTION;
use crate::store::{InspectionStore, NewInspection, PurgeSummary};
use patrol_audit::{Action, Actor, AuditAction, AuditEvent, Cause};
use patrol_domain::{
    Frequency, InspectionRecord, InspectionRecordItem, InspectionSession, SYSTEM_AUDIT_CHECKPOINT_ID,
    ShiftCalendar,
};
use tracing::warn;

/// Guards operations against a device clock earlier than stored data.
pub struct ClockGuard<'a, S: InspectionStore + ?Sized> {
    store: &'a mut S,
    calendar: ShiftCalendar,
}

impl<'a, S: InspectionStore + ?Sized> ClockGuard<'a, S> {
    pub const fn new(store: &'a mut S, calendar: ShiftCalendar) -> Self {
        Self { store, calendar }
    }

    /// Verifies that no stored record is later than `now_ms`.
    ///
    /// # Errors
    ///
    /// Returns `ClockRegression` if the newest record is later than `now_ms`.
    pub fn check(&mut self, now_ms: i64) -> Result<(), CoreError> {
        match self.store.latest_record_timestamp()? {
            Some(latest_record_ms) if latest_record_ms > now_ms => {
                warn!(latest_record_ms, now_ms, "Device clock is behind stored records");
                Err(CoreError::ClockRegression {
                    latest_record_ms,
                    now_ms,
                })
            }
            _ => Ok(()),
        }
    }

    /// Deletes every record at or after `now_ms` and leaves a system audit
    /// record in its place, attributed to the given session.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` for an unknown session, or an error if the
    /// store fails.
    pub fn purge_future_records(
        &mut self,
        session_id: i64,
        now_ms: i64,
    ) -> Result<PurgeSummary, CoreError> {
        let session: InspectionSession = self
            .store
            .session(session_id)?
            .ok_or(CoreError::SessionNotFound(session_id))?;
        let window_start_ms: i64 = self.calendar.window_for(now_ms).0;

        let record = InspectionRecord {
            record_id: None,
            session_id,
            checkpoint_id: SYSTEM_AUDIT_CHECKPOINT_ID.to_string(),
            slot_index: 1,
            frequency: Frequency::EightHours,
            window_start_ms,
            recorded_at_ms: now_ms,
        };
        let item = InspectionRecordItem {
            entry_id: None,
            record_id: None,
            equipment_id: SYSTEM_AUDIT_CHECKPOINT_ID.to_string(),
            check_item_id: None,
            slot_index: 1,
            value: PURGE_DESCRIPTION.to_string(),
            remark: None,
            abnormal: false,
        };
        let event = AuditEvent::new(
            Actor::operator(&session.operator_id),
            Cause::new(
                format!("session-{session_id}"),
                String::from("Device clock earlier than stored records"),
            ),
            Action::of(
                AuditAction::FutureRecordsPurged,
                Some(format!("cutoff_ms={now_ms}")),
            ),
            now_ms,
        );

        let summary: PurgeSummary = self.store.purge_records_after(
            now_ms,
            &NewInspection {
                record,
                items: vec![item],
                equipment_states: Vec::new(),
                event,
            },
        )?;

        warn!(
            session_id,
            records_removed = summary.records_removed,
            items_removed = summary.items_removed,
            "Purged future-dated records"
        );
        Ok(summary)
    }
}
