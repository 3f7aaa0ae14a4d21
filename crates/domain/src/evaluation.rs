// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Normal/abnormal classification of entered values.

use crate::types::{CheckItem, ValueKind};
use serde::{Deserialize, Serialize};

/// Stored representation of a true boolean reading.
pub const BOOLEAN_TRUE: &str = "TRUE";
/// Stored representation of a false boolean reading.
pub const BOOLEAN_FALSE: &str = "FALSE";

/// Outcome of evaluating a value against its check item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Normal,
    Abnormal,
}

impl Classification {
    #[must_use]
    pub const fn is_abnormal(self) -> bool {
        matches!(self, Self::Abnormal)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Abnormal => "Abnormal",
        }
    }
}

/// Parses a numeric entry, accepting surrounding whitespace.
#[must_use]
pub fn parse_numeric(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Classifies a stored value.
///
/// - Boolean: anything other than `TRUE` (or empty) is abnormal
/// - Numeric: abnormal when outside `[min, max]`; unparsable values are
///   left as normal since they cannot be compared
/// - Text: never abnormal
#[must_use]
pub fn classify(item: &CheckItem, value: &str) -> Classification {
    let trimmed: &str = value.trim();
    match item.kind {
        ValueKind::Boolean => {
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(BOOLEAN_TRUE) {
                Classification::Normal
            } else {
                Classification::Abnormal
            }
        }
        ValueKind::Numeric => match parse_numeric(trimmed) {
            Some(number) if out_of_bounds(item, number) => Classification::Abnormal,
            _ => Classification::Normal,
        },
        ValueKind::Text => Classification::Normal,
    }
}

fn out_of_bounds(item: &CheckItem, number: f64) -> bool {
    item.min.is_some_and(|min| number < min) || item.max.is_some_and(|max| number > max)
}
