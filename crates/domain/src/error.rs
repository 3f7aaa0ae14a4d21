// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A check-item frequency is not one of 2, 4 or 8 hours.
    InvalidFrequency(u32),
    /// A check-item value kind is not recognized.
    InvalidValueKind(String),
    /// An equipment operational state is not recognized.
    InvalidOperationalState(String),
    /// A shift identifier or name is not recognized.
    InvalidShift(String),
    /// A scanned tag identifier is not valid hexadecimal.
    InvalidTagId {
        /// The raw identifier as delivered by the reader.
        raw: String,
        /// Why the identifier was rejected.
        reason: String,
    },
    /// A timezone name or offset could not be parsed.
    InvalidTimezone(String),
    /// The timezone observes daylight saving time, so shift windows
    /// would not stay exactly eight hours long.
    TimezoneObservesDst(String),
    /// A numeric check item declares bounds that cannot be satisfied.
    InvalidBounds {
        /// The check item identifier.
        item_id: String,
        /// Description of the problem.
        reason: String,
    },
    /// A required field on a reference-data entity is empty.
    MissingField {
        /// The entity kind (e.g. `"checkpoint"`).
        entity: &'static str,
        /// The empty field.
        field: &'static str,
    },
    /// A boolean entry is neither `TRUE` nor `FALSE`.
    InvalidBoolean {
        /// The check item identifier.
        item_id: String,
        /// The rejected input.
        value: String,
    },
    /// A numeric entry could not be parsed as a number.
    InvalidNumber {
        /// The check item identifier.
        item_id: String,
        /// The rejected input.
        value: String,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFrequency(hours) => {
                write!(f, "Invalid frequency: {hours} hours (expected 2, 4 or 8)")
            }
            Self::InvalidValueKind(kind) => write!(f, "Invalid value kind: {kind}"),
            Self::InvalidOperationalState(state) => {
                write!(f, "Invalid operational state: {state}")
            }
            Self::InvalidShift(shift) => write!(f, "Invalid shift: {shift}"),
            Self::InvalidTagId { raw, reason } => {
                write!(f, "Invalid tag identifier '{raw}': {reason}")
            }
            Self::InvalidTimezone(zone) => write!(f, "Invalid timezone: {zone}"),
            Self::TimezoneObservesDst(zone) => write!(
                f,
                "Timezone {zone} observes daylight saving time; use a fixed-offset zone"
            ),
            Self::InvalidBounds { item_id, reason } => {
                write!(f, "Invalid bounds for check item {item_id}: {reason}")
            }
            Self::MissingField { entity, field } => {
                write!(f, "Missing {field} for {entity}")
            }
            Self::InvalidBoolean { item_id, value } => {
                write!(f, "Value '{value}' for check item {item_id} is not TRUE or FALSE")
            }
            Self::InvalidNumber { item_id, value } => {
                write!(f, "Value '{value}' for check item {item_id} is not a number")
            }
        }
    }
}

impl std::error::Error for DomainError {}
