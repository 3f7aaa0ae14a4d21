// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{CheckItem, Classification, Frequency, ValueKind, classify, parse_numeric};

fn item(kind: ValueKind, min: Option<f64>, max: Option<f64>) -> CheckItem {
    CheckItem {
        item_id: String::from("I1"),
        equipment_id: String::from("E1"),
        name: String::from("Bearing temperature"),
        kind,
        unit: Some(String::from("C")),
        required: true,
        required_in_standby: false,
        min,
        max,
        frequency: Frequency::TwoHours,
    }
}

#[test]
fn test_numeric_within_bounds_is_normal() {
    let item = item(ValueKind::Numeric, Some(10.0), Some(80.0));
    assert_eq!(classify(&item, "10"), Classification::Normal);
    assert_eq!(classify(&item, " 45.5 "), Classification::Normal);
    assert_eq!(classify(&item, "80"), Classification::Normal);
}

#[test]
fn test_numeric_outside_bounds_is_abnormal() {
    let item = item(ValueKind::Numeric, Some(10.0), Some(80.0));
    assert_eq!(classify(&item, "9.99"), Classification::Abnormal);
    assert_eq!(classify(&item, "80.1"), Classification::Abnormal);
}

#[test]
fn test_numeric_open_bounds() {
    let only_max = item(ValueKind::Numeric, None, Some(5.0));
    assert_eq!(classify(&only_max, "-100"), Classification::Normal);
    assert_eq!(classify(&only_max, "6"), Classification::Abnormal);

    let unbounded = item(ValueKind::Numeric, None, None);
    assert_eq!(classify(&unbounded, "1e9"), Classification::Normal);
}

#[test]
fn test_unparsable_numeric_is_not_flagged() {
    let item = item(ValueKind::Numeric, Some(10.0), Some(80.0));
    assert_eq!(classify(&item, "n/a"), Classification::Normal);
    assert_eq!(parse_numeric("n/a"), None);
    assert_eq!(parse_numeric("NaN"), None);
    assert_eq!(parse_numeric(" 3.5"), Some(3.5));
}

#[test]
fn test_boolean_classification() {
    let item = item(ValueKind::Boolean, None, None);
    assert_eq!(classify(&item, "TRUE"), Classification::Normal);
    assert_eq!(classify(&item, "true"), Classification::Normal);
    assert_eq!(classify(&item, "FALSE"), Classification::Abnormal);
    assert_eq!(classify(&item, "leaking seal"), Classification::Abnormal);
}

#[test]
fn test_text_is_never_abnormal() {
    let item = item(ValueKind::Text, Some(1.0), Some(2.0));
    assert_eq!(classify(&item, "500"), Classification::Normal);
    assert!(!classify(&item, "anything").is_abnormal());
}
