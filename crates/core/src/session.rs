// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Inspection rounds: starting a session and the destructive clear.

use crate::error::CoreError;
use crate::store::InspectionStore;
use patrol_audit::{Action, Actor, AuditAction, AuditEvent, Cause};
use patrol_domain::{InspectionSession, Operator, Route, ShiftCalendar, ShiftWindow};
use tracing::{info, warn};

/// Phrase an operator must type to clear all inspection data.
pub const CLEAR_CONFIRMATION_PHRASE: &str = "DELETE";

/// Starts and replaces inspection sessions.
pub struct SessionManager<'a, S: InspectionStore + ?Sized> {
    store: &'a mut S,
    calendar: ShiftCalendar,
}

impl<'a, S: InspectionStore + ?Sized> SessionManager<'a, S> {
    pub const fn new(store: &'a mut S, calendar: ShiftCalendar) -> Self {
        Self { store, calendar }
    }

    fn prepare(
        &mut self,
        route_id: &str,
        operator_id: &str,
        now_ms: i64,
    ) -> Result<InspectionSession, CoreError> {
        let route: Route = self
            .store
            .route(route_id)?
            .ok_or_else(|| CoreError::RouteNotFound(route_id.to_string()))?;
        let operator: Operator = self
            .store
            .operator(operator_id)?
            .ok_or_else(|| CoreError::OperatorNotFound(operator_id.to_string()))?;
        let window: ShiftWindow = self.calendar.resolve_shift(now_ms);

        Ok(InspectionSession {
            session_id: None,
            route_id: route.route_id,
            route_name: route.name,
            operator_id: operator.operator_id,
            shift_id: window.shift.id().to_string(),
            started_at_ms: now_ms,
        })
    }

    /// Starts a round on `route_id` for `operator_id`.
    ///
    /// # Errors
    ///
    /// Returns `RouteNotFound` or `OperatorNotFound` for unknown references,
    /// or an error if the store fails.
    pub fn start_session(
        &mut self,
        route_id: &str,
        operator_id: &str,
        now_ms: i64,
    ) -> Result<InspectionSession, CoreError> {
        let mut session: InspectionSession = self.prepare(route_id, operator_id, now_ms)?;
        let event = AuditEvent::new(
            Actor::operator(operator_id),
            Cause::new(
                format!("route-{route_id}"),
                String::from("Operator started an inspection round"),
            ),
            Action::of(
                AuditAction::SessionStarted,
                Some(format!("shift={}", session.shift_id)),
            ),
            now_ms,
        );

        let session_id: i64 = self.store.insert_session(&session, &event)?;
        session.session_id = Some(session_id);
        info!(session_id, route_id, operator_id, shift = %session.shift_id, "Started session");
        Ok(session)
    }

    /// Deletes every session, record, record item and correction, then
    /// starts a fresh session for the same route and operator.
    ///
    /// # Errors
    ///
    /// Returns `ConfirmationMismatch` unless `confirmation` is exactly
    /// [`CLEAR_CONFIRMATION_PHRASE`]; nothing is deleted then.
    pub fn clear_all_data(
        &mut self,
        route_id: &str,
        operator_id: &str,
        confirmation: &str,
        now_ms: i64,
    ) -> Result<InspectionSession, CoreError> {
        if confirmation != CLEAR_CONFIRMATION_PHRASE {
            return Err(CoreError::ConfirmationMismatch);
        }

        let mut session: InspectionSession = self.prepare(route_id, operator_id, now_ms)?;
        let event = AuditEvent::new(
            Actor::operator(operator_id),
            Cause::new(
                format!("route-{route_id}"),
                String::from("Operator cleared all inspection data"),
            ),
            Action::of(AuditAction::InspectionDataCleared, None),
            now_ms,
        );

        let session_id: i64 = self.store.clear_inspection_data(&session, &event)?;
        session.session_id = Some(session_id);
        warn!(session_id, route_id, operator_id, "Cleared all inspection data");
        Ok(session)
    }
}
