// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use patrol::{CoreError, StoreError};
use patrol_domain::DomainError;

use crate::passphrase::PassphraseError;
use crate::report_writer::ExportError;

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// A domain rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// One or more required values were left empty.
    MissingRequiredFields {
        /// Every missing field, in form order.
        fields: Vec<String>,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// A CSV import file is malformed.
    InvalidCsvFormat {
        /// Why the file was rejected.
        reason: String,
    },
    /// The export could not be set up or written.
    ExportFailed {
        /// Whether the failure was the passphrase policy.
        encryption_setup: bool,
        /// A description of the failure.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::MissingRequiredFields { fields } => {
                write!(f, "Missing required fields: {}", fields.join(", "))
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::InvalidCsvFormat { reason } => write!(f, "Invalid CSV format: {reason}"),
            Self::ExportFailed { message, .. } => write!(f, "Export failed: {message}"),
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<PassphraseError> for ApiError {
    fn from(err: PassphraseError) -> Self {
        Self::ExportFailed {
            encryption_setup: true,
            message: err.to_string(),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        Self::ExportFailed {
            encryption_setup: matches!(
                err,
                ExportError::EncryptionSetup(_) | ExportError::SealKey(_)
            ),
            message: err.to_string(),
        }
    }
}

/// Translates a domain error into an API error.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::InvalidFrequency(hours) => ApiError::InvalidInput {
            field: String::from("frequency_hours"),
            message: format!("{hours} is not one of 2, 4 or 8"),
        },
        DomainError::InvalidValueKind(kind) => ApiError::InvalidInput {
            field: String::from("value_kind"),
            message: format!("'{kind}' is not BOOLEAN, NUMBER or TEXT"),
        },
        DomainError::InvalidOperationalState(state) => ApiError::InvalidInput {
            field: String::from("state"),
            message: format!("'{state}' is not RUNNING, STANDBY or MAINTENANCE"),
        },
        DomainError::InvalidShift(shift) => ApiError::InvalidInput {
            field: String::from("shift"),
            message: format!("'{shift}' is not a known shift"),
        },
        DomainError::InvalidTagId { raw, reason } => ApiError::InvalidInput {
            field: String::from("tag"),
            message: format!("'{raw}': {reason}"),
        },
        DomainError::InvalidTimezone(zone) => ApiError::InvalidInput {
            field: String::from("timezone"),
            message: format!("'{zone}' is not a timezone name or offset"),
        },
        DomainError::TimezoneObservesDst(zone) => ApiError::DomainRuleViolation {
            rule: String::from("fixed_offset_timezone"),
            message: format!("{zone} observes daylight saving time"),
        },
        DomainError::InvalidBounds { item_id, reason } => ApiError::InvalidInput {
            field: format!("{item_id}.bounds"),
            message: reason,
        },
        DomainError::MissingField { entity, field } => ApiError::InvalidInput {
            field: field.to_string(),
            message: format!("{entity} {field} must not be empty"),
        },
        DomainError::InvalidBoolean { item_id, value } => ApiError::InvalidInput {
            field: item_id,
            message: format!("'{value}' is not TRUE or FALSE"),
        },
        DomainError::InvalidNumber { item_id, value } => ApiError::InvalidInput {
            field: item_id,
            message: format!("'{value}' is not a number"),
        },
    }
}

/// Translates a storage failure into an API error.
#[must_use]
pub fn translate_store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::Conflict(message) => ApiError::DomainRuleViolation {
            rule: String::from("duplicate_slot"),
            message,
        },
        StoreError::NotFound(message) => ApiError::ResourceNotFound {
            resource_type: String::from("Record"),
            message,
        },
        StoreError::Backend(message) => ApiError::Internal { message },
    }
}

fn not_found(resource_type: &str, message: String) -> ApiError {
    ApiError::ResourceNotFound {
        resource_type: resource_type.to_string(),
        message,
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    let message: String = err.to_string();
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::DuplicateSlot { .. } => ApiError::DomainRuleViolation {
            rule: String::from("duplicate_slot"),
            message,
        },
        CoreError::NoMatchingTag { .. } => not_found("Tag", message),
        CoreError::TagNotOnActiveRoute { .. } => ApiError::DomainRuleViolation {
            rule: String::from("tag_not_on_active_route"),
            message,
        },
        CoreError::ClockRegression { .. } => ApiError::DomainRuleViolation {
            rule: String::from("clock_regression"),
            message,
        },
        CoreError::MissingRequiredField { fields } => ApiError::MissingRequiredFields { fields },
        CoreError::UnexpectedEntry { check_item_id } => ApiError::InvalidInput {
            field: check_item_id,
            message,
        },
        CoreError::NoEquipmentConfigured { .. } => ApiError::DomainRuleViolation {
            rule: String::from("equipment_configured"),
            message,
        },
        CoreError::ConfirmationMismatch => ApiError::InvalidInput {
            field: String::from("confirmation"),
            message,
        },
        CoreError::NotCorrectable { .. } => ApiError::DomainRuleViolation {
            rule: String::from("correctable_entry"),
            message,
        },
        CoreError::RouteNotFound(_) => not_found("Route", message),
        CoreError::CheckpointNotFound(_) => not_found("Checkpoint", message),
        CoreError::OperatorNotFound(_) => not_found("Operator", message),
        CoreError::SessionNotFound(_) => not_found("Session", message),
        CoreError::RecordItemNotFound(_) => not_found("Record item", message),
        CoreError::Store(store_err) => translate_store_error(store_err),
    }
}

