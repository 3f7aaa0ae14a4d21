// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Fixed eight-hour operational shifts.
//!
//! A day is tiled by three windows that start at fixed local-clock
//! boundaries:
//!
//! - Night: 00:30 - 08:30
//! - Day: 08:30 - 16:30
//! - Middle: 16:30 - 00:30 (next calendar day)
//!
//! Instants between 00:00 and 00:30 belong to the previous day's middle
//! shift. A window's `date` is always the local date on which it starts.
//!
//! ## Invariants
//!
//! - Every window is exactly eight hours long
//! - Every instant falls in exactly one window
//! - The local zone is a fixed offset (no DST)

use crate::error::DomainError;
use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
    Timelike, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Length of every shift window in milliseconds.
pub const SHIFT_DURATION_MS: i64 = 8 * 60 * 60 * 1000;

const MINUTE_MS: i64 = 60 * 1000;

/// One of the three fixed daily shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shift {
    /// 00:30 - 08:30.
    Night,
    /// 08:30 - 16:30.
    Day,
    /// 16:30 - 00:30 the next day.
    Middle,
}

impl Shift {
    /// The shifts of one operational day in chronological order.
    pub const IN_DAY_ORDER: [Self; 3] = [Self::Night, Self::Day, Self::Middle];

    /// Stable identifier.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Day => "S1",
            Self::Middle => "S2",
            Self::Night => "S3",
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Night => "Night",
            Self::Day => "Day",
            Self::Middle => "Middle",
        }
    }

    /// Start of the shift in minutes after local midnight.
    #[must_use]
    pub const fn start_minute(self) -> i64 {
        match self {
            Self::Night => 30,
            Self::Day => 8 * 60 + 30,
            Self::Middle => 16 * 60 + 30,
        }
    }

    /// Position of this shift's crew in the rotation on the anchor date.
    const fn rotation_base(self) -> i64 {
        match self {
            Self::Day => 0,
            Self::Middle => 2,
            Self::Night => 4,
        }
    }

    /// Whether the window crosses local midnight.
    #[must_use]
    pub const fn spans_midnight(self) -> bool {
        matches!(self, Self::Middle)
    }
}

impl FromStr for Shift {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S1" | "DAY" => Ok(Self::Day),
            "S2" | "MIDDLE" => Ok(Self::Middle),
            "S3" | "NIGHT" => Ok(Self::Night),
            _ => Err(DomainError::InvalidShift(s.to_string())),
        }
    }
}

impl std::fmt::Display for Shift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The recurring five-crew rotation label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationLabel {
    A,
    B,
    C,
    D,
    E,
}

impl RotationLabel {
    const CYCLE: [Self; 5] = [Self::A, Self::B, Self::C, Self::D, Self::E];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
        }
    }
}

impl std::fmt::Display for RotationLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A concrete shift window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShiftWindow {
    pub shift: Shift,
    /// Local date on which the window starts.
    pub date: NaiveDate,
    /// Inclusive start, epoch milliseconds.
    pub start_ms: i64,
    /// Exclusive end, epoch milliseconds.
    pub end_ms: i64,
}

impl ShiftWindow {
    #[must_use]
    pub const fn contains(&self, at_ms: i64) -> bool {
        self.start_ms <= at_ms && at_ms < self.end_ms
    }

    #[must_use]
    pub const fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    /// Intersection of this window with `[from_ms, to_ms)`, if non-empty.
    #[must_use]
    pub fn clip(&self, from_ms: i64, to_ms: i64) -> Option<(i64, i64)> {
        let start: i64 = self.start_ms.max(from_ms);
        let end: i64 = self.end_ms.min(to_ms);
        (start < end).then_some((start, end))
    }

    /// Crew label for this window.
    #[must_use]
    pub fn rotation_label(&self) -> RotationLabel {
        ShiftCalendar::rotation_label(self.date, self.shift)
    }
}

/// Maps instants to shift windows in a fixed-offset local zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftCalendar {
    offset: FixedOffset,
}

impl ShiftCalendar {
    /// Creates a calendar for the given local offset.
    #[must_use]
    pub const fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Creates a calendar from a zone description.
    ///
    /// Accepts either a fixed offset (`+08:00`) or an IANA zone name
    /// (`Asia/Shanghai`).
    ///
    /// # Errors
    ///
    /// Returns an error if the zone cannot be parsed or if it observes
    /// daylight saving time.
    pub fn from_zone(zone: &str) -> Result<Self, DomainError> {
        let trimmed: &str = zone.trim();

        if trimmed.starts_with('+') || trimmed.starts_with('-') {
            let offset: FixedOffset = trimmed
                .parse()
                .map_err(|_| DomainError::InvalidTimezone(zone.to_string()))?;
            return Ok(Self::new(offset));
        }

        let tz: Tz = trimmed
            .parse()
            .map_err(|_| DomainError::InvalidTimezone(zone.to_string()))?;

        // A fixed-offset zone reports the same offset in January and July.
        let winter: FixedOffset = Self::offset_on(tz, 1, zone)?;
        let summer: FixedOffset = Self::offset_on(tz, 7, zone)?;
        if winter != summer {
            return Err(DomainError::TimezoneObservesDst(zone.to_string()));
        }

        Ok(Self::new(winter))
    }

    fn offset_on(tz: Tz, month: u32, zone: &str) -> Result<FixedOffset, DomainError> {
        let sample: NaiveDateTime = NaiveDate::from_ymd_opt(2026, month, 15)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .ok_or_else(|| DomainError::InvalidTimezone(zone.to_string()))?;
        Ok(tz.offset_from_utc_datetime(&sample).fix())
    }

    #[must_use]
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Local wall-clock time of an instant.
    #[must_use]
    pub fn local_datetime(&self, at_ms: i64) -> NaiveDateTime {
        DateTime::<Utc>::from_timestamp_millis(at_ms)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
            .with_timezone(&self.offset)
            .naive_local()
    }

    /// Instant of a local wall-clock time.
    #[must_use]
    pub fn instant_of(&self, local: NaiveDateTime) -> i64 {
        local.and_utc().timestamp_millis() - i64::from(self.offset.local_minus_utc()) * 1000
    }

    /// The shift window containing `at_ms`.
    #[must_use]
    pub fn resolve_shift(&self, at_ms: i64) -> ShiftWindow {
        let local: NaiveDateTime = self.local_datetime(at_ms);
        let minute: i64 = i64::from(local.hour() * 60 + local.minute());
        let today: NaiveDate = local.date();

        let (date, shift): (NaiveDate, Shift) = if minute < Shift::Night.start_minute() {
            (today.pred_opt().unwrap_or(today), Shift::Middle)
        } else if minute < Shift::Day.start_minute() {
            (today, Shift::Night)
        } else if minute < Shift::Middle.start_minute() {
            (today, Shift::Day)
        } else {
            (today, Shift::Middle)
        };

        self.window_on(date, shift)
    }

    /// Start and end of the window containing `at_ms`.
    #[must_use]
    pub fn window_for(&self, at_ms: i64) -> (i64, i64) {
        let window: ShiftWindow = self.resolve_shift(at_ms);
        (window.start_ms, window.end_ms)
    }

    /// The window of `shift` starting on local `date`.
    #[must_use]
    pub fn window_on(&self, date: NaiveDate, shift: Shift) -> ShiftWindow {
        let midnight: i64 = self.instant_of(date.and_time(NaiveTime::MIN));
        let start_ms: i64 = midnight + shift.start_minute() * MINUTE_MS;
        ShiftWindow {
            shift,
            date,
            start_ms,
            end_ms: start_ms + SHIFT_DURATION_MS,
        }
    }

    /// Every window intersecting `[start_ms, end_ms)`, in chronological order.
    #[must_use]
    pub fn windows_intersecting(&self, start_ms: i64, end_ms: i64) -> Vec<ShiftWindow> {
        let mut windows: Vec<ShiftWindow> = Vec::new();
        if end_ms <= start_ms {
            return windows;
        }

        let mut current: ShiftWindow = self.resolve_shift(start_ms);
        while current.start_ms < end_ms {
            windows.push(current);
            current = self.resolve_shift(current.end_ms);
        }
        windows
    }

    /// Crew label for `shift` on `date`.
    ///
    /// Periodic with period five days for a fixed shift. Dates before the
    /// anchor wrap around rather than going negative.
    #[must_use]
    pub fn rotation_label(date: NaiveDate, shift: Shift) -> RotationLabel {
        let days: i64 = (date - rotation_anchor()).num_days();
        let index: i64 = (shift.rotation_base() + days).rem_euclid(5);
        // rem_euclid(5) is always in 0..5
        RotationLabel::CYCLE[usize::try_from(index).unwrap_or(0)]
    }
}

impl Default for ShiftCalendar {
    fn default() -> Self {
        Self::new(FixedOffset::east_opt(8 * 3600).unwrap_or_else(|| Utc.fix()))
    }
}

/// Anchor date of the crew rotation.
fn rotation_anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 15).unwrap_or_default()
}

/// Adds whole days to a date, saturating at the calendar limits.
#[must_use]
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days))
        .unwrap_or(date)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn calendar() -> ShiftCalendar {
        ShiftCalendar::new(FixedOffset::east_opt(8 * 3600).unwrap())
    }

    fn at(calendar: &ShiftCalendar, y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        calendar.instant_of(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, 0)
                .unwrap(),
        )
    }

    #[test]
    fn test_shift_ids_and_names() {
        assert_eq!(Shift::Day.id(), "S1");
        assert_eq!(Shift::Middle.id(), "S2");
        assert_eq!(Shift::Night.id(), "S3");
        assert_eq!("s2".parse::<Shift>().unwrap(), Shift::Middle);
        assert_eq!("night".parse::<Shift>().unwrap(), Shift::Night);
        assert!("S4".parse::<Shift>().is_err());
    }

    #[test]
    fn test_instant_round_trips_through_local_time() {
        let calendar = calendar();
        let local = NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap();
        let instant = calendar.instant_of(local);
        assert_eq!(calendar.local_datetime(instant), local);
    }

    #[test]
    fn test_day_shift_bounds() {
        let calendar = calendar();
        let window = calendar.resolve_shift(at(&calendar, 2026, 1, 5, 9, 0));
        assert_eq!(window.shift, Shift::Day);
        assert_eq!(window.start_ms, at(&calendar, 2026, 1, 5, 8, 30));
        assert_eq!(window.end_ms, at(&calendar, 2026, 1, 5, 16, 30));
    }

    #[test]
    fn test_early_morning_belongs_to_previous_middle_shift() {
        let calendar = calendar();
        let window = calendar.resolve_shift(at(&calendar, 2026, 1, 6, 0, 10));
        assert_eq!(window.shift, Shift::Middle);
        assert_eq!(window.date, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        assert_eq!(window.start_ms, at(&calendar, 2026, 1, 5, 16, 30));
        assert_eq!(window.end_ms, at(&calendar, 2026, 1, 6, 0, 30));
    }

    #[test]
    fn test_boundaries_are_half_open() {
        let calendar = calendar();
        let boundary = at(&calendar, 2026, 1, 5, 8, 30);
        assert_eq!(calendar.resolve_shift(boundary).shift, Shift::Day);
        assert_eq!(calendar.resolve_shift(boundary - 1).shift, Shift::Night);
    }

    #[test]
    fn test_add_days_saturates() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 27).unwrap();
        assert_eq!(add_days(date, 2), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(add_days(NaiveDate::MAX, 1), NaiveDate::MAX);
    }
}
