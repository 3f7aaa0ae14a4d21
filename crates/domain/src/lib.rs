// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Domain model for field equipment inspection rounds.
//!
//! This crate contains the pure rules of the system: the fixed shift
//! calendar, slot resolution, frequency activation, tag normalization
//! and value classification. Nothing here performs I/O.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod activation;
mod error;
mod evaluation;
mod shift_calendar;
mod slot;
mod tag;
mod types;

#[cfg(test)]
mod tests;

pub use activation::{FrequencyActivation, active_for_slot};
pub use error::DomainError;
pub use evaluation::{BOOLEAN_FALSE, BOOLEAN_TRUE, Classification, classify, parse_numeric};
pub use shift_calendar::{
    RotationLabel, SHIFT_DURATION_MS, Shift, ShiftCalendar, ShiftWindow, add_days,
};
pub use slot::{SlotResolver, slot_bounds, slot_in_window, total_slots};
pub use tag::TagId;
pub use types::{
    CheckItem, Checkpoint, Equipment, Frequency, InspectionRecord, InspectionRecordItem,
    InspectionSession, OperationalState, Operator, RecordItemCorrection, Route,
    SYSTEM_AUDIT_CHECKPOINT_ID, ValueKind,
};
