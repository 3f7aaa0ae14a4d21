// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Which check-item frequencies are due at a given moment.
//!
//! A coarser item is presented only on the first fine-grained slot it
//! overlaps, so an eight-hour check is asked once per shift even on a
//! checkpoint visited every two hours.

use crate::slot::SlotResolver;
use crate::types::Frequency;
use std::collections::BTreeSet;

/// Frequencies due on `slot` of a checkpoint whose finest frequency is
/// `max_frequency_hours`.
///
/// | finest | slot 1   | slot 2 | slot 3 | slot 4 |
/// |--------|----------|--------|--------|--------|
/// | 2h     | 2, 4, 8  | 2      | 2, 4   | 2      |
/// | 4h     | 4, 8     | 4      |        |        |
/// | 8h     | 8        |        |        |        |
///
/// Any other finest frequency yields `{8}`.
#[must_use]
pub fn active_for_slot(max_frequency_hours: u32, slot: u32) -> BTreeSet<Frequency> {
    let due: &[Frequency] = match (Frequency::from_hours(max_frequency_hours), slot) {
        (Some(Frequency::TwoHours), 1) => &Frequency::ALL,
        (Some(Frequency::TwoHours), 3) => &[Frequency::TwoHours, Frequency::FourHours],
        (Some(Frequency::TwoHours), _) => &[Frequency::TwoHours],
        (Some(Frequency::FourHours), 1) => &[Frequency::FourHours, Frequency::EightHours],
        (Some(Frequency::FourHours), _) => &[Frequency::FourHours],
        (Some(Frequency::EightHours) | None, _) => &[Frequency::EightHours],
    };
    due.iter().copied().collect()
}

/// Determines the active frequency set from the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyActivation {
    slots: SlotResolver,
}

impl FrequencyActivation {
    #[must_use]
    pub const fn new(slots: SlotResolver) -> Self {
        Self { slots }
    }

    /// Frequencies due at `now_ms` on a checkpoint whose finest frequency
    /// is `max_frequency_hours`.
    #[must_use]
    pub fn active_frequencies(&self, max_frequency_hours: u32, now_ms: i64) -> BTreeSet<Frequency> {
        let slot: u32 = self.slots.slot_index(max_frequency_hours, now_ms);
        active_for_slot(max_frequency_hours, slot)
    }
}
