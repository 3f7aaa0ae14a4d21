// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::slot::total_slots;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Checkpoint identifier reserved for system audit entries.
///
/// Records carrying this identifier are not visits to a real checkpoint;
/// they mark operator-initiated purges of future-dated data.
pub const SYSTEM_AUDIT_CHECKPOINT_ID: &str = "-1";

/// How often a check item must be inspected.
///
/// Variants are ordered from the shortest interval (highest frequency)
/// to the longest, so `min()` over a checkpoint's items yields its
/// finest slot granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Frequency {
    /// Every two hours (four slots per shift).
    TwoHours,
    /// Every four hours (two slots per shift).
    FourHours,
    /// Once per eight-hour shift.
    EightHours,
}

impl Frequency {
    /// All supported frequencies, finest first.
    pub const ALL: [Self; 3] = [Self::TwoHours, Self::FourHours, Self::EightHours];

    /// The interval length in hours.
    #[must_use]
    pub const fn hours(self) -> u32 {
        match self {
            Self::TwoHours => 2,
            Self::FourHours => 4,
            Self::EightHours => 8,
        }
    }

    /// Maps an hour count to a frequency, if it is one of 2, 4 or 8.
    #[must_use]
    pub const fn from_hours(hours: u32) -> Option<Self> {
        match hours {
            2 => Some(Self::TwoHours),
            4 => Some(Self::FourHours),
            8 => Some(Self::EightHours),
            _ => None,
        }
    }

    /// Number of slots this frequency divides a shift into.
    #[must_use]
    pub const fn slots_per_shift(self) -> u32 {
        total_slots(self.hours())
    }

    /// How many fine-grained columns one slot of this frequency spans
    /// on a grid whose finest frequency is `finest`.
    ///
    /// Always at least 1.
    #[must_use]
    pub const fn merge_width(self, finest: Self) -> u32 {
        let width: u32 = self.hours() / finest.hours();
        if width == 0 { 1 } else { width }
    }

    /// The finest frequency among `frequencies`, defaulting to eight hours
    /// when there are none.
    #[must_use]
    pub fn finest<I>(frequencies: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        frequencies.into_iter().min().unwrap_or(Self::EightHours)
    }
}

impl TryFrom<u32> for Frequency {
    type Error = DomainError;

    fn try_from(hours: u32) -> Result<Self, Self::Error> {
        Self::from_hours(hours).ok_or(DomainError::InvalidFrequency(hours))
    }
}

impl From<Frequency> for u32 {
    fn from(frequency: Frequency) -> Self {
        frequency.hours()
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}h", self.hours())
    }
}

/// The kind of value a check item records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// A yes/no reading stored as `TRUE` or `FALSE`.
    Boolean,
    /// A numeric reading, optionally bounded.
    Numeric,
    /// Free text.
    Text,
}

impl ValueKind {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::Numeric => "NUMBER",
            Self::Text => "TEXT",
        }
    }
}

impl FromStr for ValueKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BOOLEAN" | "BOOL" => Ok(Self::Boolean),
            "NUMBER" | "NUMERIC" => Ok(Self::Numeric),
            "TEXT" => Ok(Self::Text),
            _ => Err(DomainError::InvalidValueKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operational state of a piece of equipment at inspection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OperationalState {
    /// In service. All active check items apply.
    #[default]
    Running,
    /// Idle but available. Only items required in standby apply.
    Standby,
    /// Out of service. No items apply.
    Maintenance,
}

impl OperationalState {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Standby => "STANDBY",
            Self::Maintenance => "MAINTENANCE",
        }
    }

    /// Human-readable label, used as the value of skipped-equipment markers.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Standby => "Standby",
            Self::Maintenance => "Maintenance",
        }
    }

    /// Whether a check item is presented for equipment in this state.
    #[must_use]
    pub const fn presents(&self, item: &CheckItem) -> bool {
        match self {
            Self::Running => true,
            Self::Standby => item.required_in_standby,
            Self::Maintenance => false,
        }
    }
}

impl FromStr for OperationalState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RUNNING" => Ok(Self::Running),
            "STANDBY" => Ok(Self::Standby),
            "MAINTENANCE" => Ok(Self::Maintenance),
            _ => Err(DomainError::InvalidOperationalState(s.to_string())),
        }
    }
}

impl std::fmt::Display for OperationalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fixed inspection route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub route_id: String,
    pub name: String,
    pub description: Option<String>,
}

/// A physical inspection location bound to a scannable tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub checkpoint_id: String,
    pub name: String,
    pub location: String,
    pub route_id: String,
    /// Bound tag identifier as imported. Matching is case- and
    /// byte-order-insensitive.
    pub tag_uid: String,
}

impl Checkpoint {
    /// Whether this checkpoint belongs to `route_id`, ignoring case and
    /// surrounding whitespace.
    #[must_use]
    pub fn is_on_route(&self, route_id: &str) -> bool {
        self.route_id.trim().to_lowercase() == route_id.trim().to_lowercase()
    }
}

/// A piece of equipment inspected at a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub equipment_id: String,
    pub name: String,
    pub checkpoint_id: String,
    /// Whether an operational state must be chosen before inspection.
    pub status_required: bool,
}

/// A single attribute inspected on a piece of equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckItem {
    pub item_id: String,
    pub equipment_id: String,
    pub name: String,
    pub kind: ValueKind,
    pub unit: Option<String>,
    pub required: bool,
    pub required_in_standby: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub frequency: Frequency,
}

impl CheckItem {
    /// Validates the bounds of a numeric item.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is empty or if `min > max`.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.item_id.trim().is_empty() {
            return Err(DomainError::MissingField {
                entity: "check item",
                field: "item_id",
            });
        }
        if let (Some(min), Some(max)) = (self.min, self.max)
            && min > max
        {
            return Err(DomainError::InvalidBounds {
                item_id: self.item_id.clone(),
                reason: format!("min {min} is greater than max {max}"),
            });
        }
        Ok(())
    }
}

/// An operator who performs inspection rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub operator_id: String,
    pub name: String,
}

/// One continuous inspection round on a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionSession {
    /// `None` until persisted.
    pub session_id: Option<i64>,
    pub route_id: String,
    pub route_name: String,
    pub operator_id: String,
    /// Identifier of the shift the round was started in (`S1`..`S3`).
    pub shift_id: String,
    pub started_at_ms: i64,
}

/// One checkpoint visit for one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionRecord {
    /// `None` until persisted.
    pub record_id: Option<i64>,
    pub session_id: i64,
    /// The checkpoint visited, or [`SYSTEM_AUDIT_CHECKPOINT_ID`].
    pub checkpoint_id: String,
    /// Slot index at `frequency` granularity.
    pub slot_index: u32,
    /// The checkpoint's finest frequency when the record was taken.
    pub frequency: Frequency,
    /// Start of the shift window the record belongs to.
    pub window_start_ms: i64,
    pub recorded_at_ms: i64,
}

impl InspectionRecord {
    /// Whether this is a system audit entry rather than a checkpoint visit.
    #[must_use]
    pub fn is_system_audit(&self) -> bool {
        self.checkpoint_id == SYSTEM_AUDIT_CHECKPOINT_ID
    }
}

/// One entered value within an inspection record.
///
/// Entries without a `check_item_id` are markers: either an equipment
/// skipped because of its operational state, or the description of a
/// system audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionRecordItem {
    /// `None` until persisted.
    pub entry_id: Option<i64>,
    /// `None` until the owning record is persisted.
    pub record_id: Option<i64>,
    pub equipment_id: String,
    pub check_item_id: Option<String>,
    pub slot_index: u32,
    pub value: String,
    pub remark: Option<String>,
    pub abnormal: bool,
}

/// An append-only correction of a previously entered value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordItemCorrection {
    /// `None` until persisted.
    pub correction_id: Option<i64>,
    /// The record item being corrected.
    pub entry_id: i64,
    pub previous_value: String,
    pub new_value: String,
    pub remark: Option<String>,
    pub abnormal: bool,
    pub operator_id: String,
    pub corrected_at_ms: i64,
}
