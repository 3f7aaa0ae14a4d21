// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{Frequency, ShiftCalendar, SlotResolver, slot_bounds, total_slots};
use chrono::{FixedOffset, NaiveDate};

fn resolver() -> SlotResolver {
    SlotResolver::new(ShiftCalendar::new(FixedOffset::east_opt(8 * 3600).unwrap()))
}

fn at(resolver: &SlotResolver, y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
    resolver.calendar().instant_of(
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap(),
    )
}

#[test]
fn test_total_slots() {
    assert_eq!(total_slots(2), 4);
    assert_eq!(total_slots(4), 2);
    assert_eq!(total_slots(8), 1);
    assert_eq!(total_slots(3), 1);
    assert_eq!(total_slots(0), 1);
    assert_eq!(SlotResolver::total_slots(2), 4);
}

#[test]
fn test_slot_index_is_always_in_range() {
    let resolver = resolver();
    let start = at(&resolver, 2026, 4, 1, 0, 0);
    let end = start + 2 * 24 * 3_600_000;

    for hours in [2, 4, 8] {
        let mut t = start;
        while t < end {
            let slot = resolver.slot_index(hours, t);
            assert!(
                (1..=8 / hours).contains(&slot),
                "slot {slot} out of range for {hours}h at {t}"
            );
            t += 11 * 60_000;
        }
    }
}

#[test]
fn test_four_hour_slots_in_day_shift() {
    let resolver = resolver();
    assert_eq!(resolver.slot_index(4, at(&resolver, 2026, 4, 1, 9, 0)), 1);
    assert_eq!(resolver.slot_index(4, at(&resolver, 2026, 4, 1, 12, 29)), 1);
    assert_eq!(resolver.slot_index(4, at(&resolver, 2026, 4, 1, 12, 30)), 2);
    assert_eq!(resolver.slot_index(4, at(&resolver, 2026, 4, 1, 13, 0)), 2);
}

#[test]
fn test_two_hour_slot_after_midnight_stays_in_middle_shift() {
    let resolver = resolver();
    // 16:30 + 7h40m
    assert_eq!(resolver.slot_index(2, at(&resolver, 2026, 4, 2, 0, 10)), 4);
    assert_eq!(resolver.slot_index(2, at(&resolver, 2026, 4, 1, 16, 30)), 1);
}

#[test]
fn test_slot_follows_shift_boundaries_not_hour_of_day() {
    let resolver = resolver();
    // 09:59 is still within the first two hours of the 08:30 shift.
    assert_eq!(resolver.slot_index(2, at(&resolver, 2026, 4, 1, 9, 59)), 1);
    assert_eq!(resolver.slot_index(2, at(&resolver, 2026, 4, 1, 10, 30)), 2);
}

#[test]
fn test_eight_hour_items_have_single_slot() {
    let resolver = resolver();
    assert_eq!(resolver.slot_index(8, at(&resolver, 2026, 4, 1, 16, 29)), 1);
}

#[test]
fn test_unsupported_frequency_uses_single_slot() {
    let resolver = resolver();
    assert_eq!(resolver.slot_index(6, at(&resolver, 2026, 4, 1, 15, 0)), 1);
}

#[test]
fn test_slot_bounds() {
    let resolver = resolver();
    let window = resolver
        .calendar()
        .resolve_shift(at(&resolver, 2026, 4, 1, 9, 0));

    assert_eq!(
        slot_bounds(&window, 2, 3),
        (
            at(&resolver, 2026, 4, 1, 12, 30),
            at(&resolver, 2026, 4, 1, 14, 30)
        )
    );
    assert_eq!(slot_bounds(&window, 8, 1), (window.start_ms, window.end_ms));
}

#[test]
fn test_merge_width() {
    assert_eq!(Frequency::EightHours.merge_width(Frequency::TwoHours), 4);
    assert_eq!(Frequency::FourHours.merge_width(Frequency::TwoHours), 2);
    assert_eq!(Frequency::TwoHours.merge_width(Frequency::TwoHours), 1);
    assert_eq!(Frequency::EightHours.merge_width(Frequency::FourHours), 2);
    assert_eq!(Frequency::TwoHours.merge_width(Frequency::EightHours), 1);
}

#[test]
fn test_merged_cells_cover_the_fine_grid() {
    for finest in Frequency::ALL {
        for item in Frequency::ALL.into_iter().filter(|f| *f >= finest) {
            let width = item.merge_width(finest);
            assert!(width >= 1);
            assert_eq!(item.hours() % finest.hours(), 0);
            assert_eq!(item.slots_per_shift(), 8 / item.hours());
            assert_eq!(item.slots_per_shift() * width, finest.slots_per_shift());
        }
    }
}
