// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use patrol_domain::DomainError;

/// Errors reported by an [`InspectionStore`](crate::InspectionStore)
/// implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    Conflict(String),
    /// A referenced row does not exist.
    NotFound(String),
    /// Any other storage failure.
    Backend(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conflict(msg) => write!(f, "Storage conflict: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found in storage: {msg}"),
            Self::Backend(msg) => write!(f, "Storage failure: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors that can occur while running inspection operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule was violated.
    DomainViolation(DomainError),
    /// The checkpoint was already inspected for this slot in this shift.
    DuplicateSlot {
        checkpoint_id: String,
        slot_index: u32,
        window_start_ms: i64,
    },
    /// No checkpoint is bound to the scanned tag.
    NoMatchingTag { tag: String },
    /// The scanned tag is bound only to checkpoints on other routes.
    TagNotOnActiveRoute {
        tag: String,
        route_id: String,
        bound_routes: Vec<String>,
    },
    /// The device clock is earlier than the newest stored record.
    ClockRegression {
        latest_record_ms: i64,
        now_ms: i64,
    },
    /// Required values are missing from a submission.
    MissingRequiredField { fields: Vec<String> },
    /// A submission carries a value for an item that is not presented now.
    UnexpectedEntry { check_item_id: String },
    /// The checkpoint has no equipment to inspect.
    NoEquipmentConfigured { checkpoint_id: String },
    /// The destructive-clear confirmation phrase did not match.
    ConfirmationMismatch,
    /// The record item is a marker and cannot be corrected.
    NotCorrectable { entry_id: i64 },
    RouteNotFound(String),
    CheckpointNotFound(String),
    OperatorNotFound(String),
    SessionNotFound(i64),
    RecordItemNotFound(i64),
    /// The storage collaborator failed.
    Store(StoreError),
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::DuplicateSlot {
                checkpoint_id,
                slot_index,
                window_start_ms,
            } => write!(
                f,
                "Checkpoint {checkpoint_id} was already inspected for slot {slot_index} of the shift starting at {window_start_ms}"
            ),
            Self::NoMatchingTag { tag } => write!(f, "No checkpoint is bound to tag {tag}"),
            Self::TagNotOnActiveRoute {
                tag,
                route_id,
                bound_routes,
            } => write!(
                f,
                "Tag {tag} is not on route {route_id} (bound on: {})",
                bound_routes.join(", ")
            ),
            Self::ClockRegression {
                latest_record_ms,
                now_ms,
            } => write!(
                f,
                "Device clock ({now_ms}) is earlier than the latest record ({latest_record_ms})"
            ),
            Self::MissingRequiredField { fields } => {
                write!(f, "Missing required fields: {}", fields.join(", "))
            }
            Self::UnexpectedEntry { check_item_id } => {
                write!(f, "Check item {check_item_id} is not due at this checkpoint now")
            }
            Self::NoEquipmentConfigured { checkpoint_id } => {
                write!(f, "Checkpoint {checkpoint_id} has no equipment configured")
            }
            Self::ConfirmationMismatch => write!(f, "Confirmation phrase does not match"),
            Self::NotCorrectable { entry_id } => {
                write!(f, "Record item {entry_id} is a marker and cannot be corrected")
            }
            Self::RouteNotFound(id) => write!(f, "Route not found: {id}"),
            Self::CheckpointNotFound(id) => write!(f, "Checkpoint not found: {id}"),
            Self::OperatorNotFound(id) => write!(f, "Operator not found: {id}"),
            Self::SessionNotFound(id) => write!(f, "Session not found: {id}"),
            Self::RecordItemNotFound(id) => write!(f, "Record item not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}
