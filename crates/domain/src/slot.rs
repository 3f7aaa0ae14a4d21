// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Slot resolution within a shift window.
//!
//! A check item with frequency `F` hours divides every shift into `8 / F`
//! equal slots. Slot indices are 1-based and always computed relative to
//! the enclosing shift window, never from the hour of day.

use crate::shift_calendar::{ShiftCalendar, ShiftWindow};

/// Number of slots per shift for a frequency in hours.
///
/// Unsupported frequencies fall back to a single slot.
#[must_use]
pub const fn total_slots(frequency_hours: u32) -> u32 {
    match frequency_hours {
        2 => 4,
        4 => 2,
        _ => 1,
    }
}

/// The 1-based slot of `at_ms` inside `window`, clamped to
/// `[1, total_slots(frequency_hours)]`.
#[must_use]
pub fn slot_in_window(window: &ShiftWindow, frequency_hours: u32, at_ms: i64) -> u32 {
    let total: i64 = i64::from(total_slots(frequency_hours));
    let slot_length: i64 = (window.duration_ms() / total).max(1);
    let raw: i64 = (at_ms - window.start_ms).div_euclid(slot_length) + 1;
    u32::try_from(raw.clamp(1, total)).unwrap_or(1)
}

/// Start and end (exclusive) of `slot` inside `window`.
#[must_use]
pub fn slot_bounds(window: &ShiftWindow, frequency_hours: u32, slot: u32) -> (i64, i64) {
    let total: u32 = total_slots(frequency_hours);
    let slot_length: i64 = window.duration_ms() / i64::from(total);
    let index: i64 = i64::from(slot.clamp(1, total) - 1);
    let start: i64 = window.start_ms + index * slot_length;
    (start, start + slot_length)
}

/// Resolves timestamps to slot indices using a [`ShiftCalendar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotResolver {
    calendar: ShiftCalendar,
}

impl SlotResolver {
    #[must_use]
    pub const fn new(calendar: ShiftCalendar) -> Self {
        Self { calendar }
    }

    #[must_use]
    pub const fn calendar(&self) -> &ShiftCalendar {
        &self.calendar
    }

    /// The slot index of `at_ms` for an item inspected every
    /// `frequency_hours` hours.
    #[must_use]
    pub fn slot_index(&self, frequency_hours: u32, at_ms: i64) -> u32 {
        let window: ShiftWindow = self.calendar.resolve_shift(at_ms);
        slot_in_window(&window, frequency_hours, at_ms)
    }

    #[must_use]
    pub const fn total_slots(frequency_hours: u32) -> u32 {
        total_slots(frequency_hours)
    }
}
