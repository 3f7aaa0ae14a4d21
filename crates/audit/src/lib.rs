// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

/// Represents the entity performing an action.
///
/// An actor is either an operator carrying out an inspection round or
/// the system itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// The unique identifier for this actor.
    pub id: String,
    /// The type of actor (`"operator"` or `"system"`).
    pub actor_type: String,
}

impl Actor {
    /// Creates a new Actor.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this actor
    /// * `actor_type` - The type of actor
    #[must_use]
    pub const fn new(id: String, actor_type: String) -> Self {
        Self { id, actor_type }
    }

    /// An operator identified by their operator id.
    #[must_use]
    pub fn operator(operator_id: &str) -> Self {
        Self::new(operator_id.to_string(), String::from("operator"))
    }

    /// The system itself.
    #[must_use]
    pub fn system() -> Self {
        Self::new(String::from("system"), String::from("system"))
    }
}

/// Represents the reason or trigger for an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cause {
    /// A unique identifier for this cause (e.g. the session id).
    pub id: String,
    /// A description of the cause.
    pub description: String,
}

impl Cause {
    /// Creates a new Cause.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this cause
    /// * `description` - A description of what triggered this action
    #[must_use]
    pub const fn new(id: String, description: String) -> Self {
        Self { id, description }
    }
}

/// The kinds of state change recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    SessionStarted,
    InspectionSubmitted,
    RecordItemCorrected,
    FutureRecordsPurged,
    InspectionDataCleared,
    ExportConfirmed,
    ReferenceDataImported,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SessionStarted => "SessionStarted",
            Self::InspectionSubmitted => "InspectionSubmitted",
            Self::RecordItemCorrected => "RecordItemCorrected",
            Self::FutureRecordsPurged => "FutureRecordsPurged",
            Self::InspectionDataCleared => "InspectionDataCleared",
            Self::ExportConfirmed => "ExportConfirmed",
            Self::ReferenceDataImported => "ReferenceDataImported",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents the specific action performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// The name of the action (e.g., "`InspectionSubmitted`").
    pub name: String,
    /// Optional additional details about the action.
    pub details: Option<String>,
}

impl Action {
    /// Creates a new Action.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the action
    /// * `details` - Optional additional details
    #[must_use]
    pub const fn new(name: String, details: Option<String>) -> Self {
        Self { name, details }
    }

    /// Creates an Action from a known kind.
    #[must_use]
    pub fn of(kind: AuditAction, details: Option<String>) -> Self {
        Self::new(kind.as_str().to_string(), details)
    }
}

/// An immutable audit event describing one operator-initiated state change.
///
/// Audit events capture:
/// - Who performed the action (actor)
/// - Why it was performed (cause)
/// - What action was performed (action)
/// - When it happened (epoch milliseconds)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// `None` until persisted.
    pub event_id: Option<i64>,
    /// The actor who initiated this state change.
    pub actor: Actor,
    /// The cause or reason for this state change.
    pub cause: Cause,
    /// The action that was performed.
    pub action: Action,
    /// When the change happened.
    pub occurred_at_ms: i64,
}

impl AuditEvent {
    /// Creates a new `AuditEvent`.
    ///
    /// # Arguments
    ///
    /// * `actor` - The actor who initiated the change
    /// * `cause` - The reason for the change
    /// * `action` - The action that was performed
    /// * `occurred_at_ms` - When the change happened
    #[must_use]
    pub const fn new(actor: Actor, cause: Cause, action: Action, occurred_at_ms: i64) -> Self {
        Self {
            event_id: None,
            actor,
            cause,
            action,
            occurred_at_ms,
        }
    }

    /// Returns a copy carrying the identifier assigned by storage.
    #[must_use]
    pub const fn with_id(mut self, event_id: i64) -> Self {
        self.event_id = Some(event_id);
        self
    }
}
