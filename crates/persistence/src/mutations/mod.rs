// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Write operations.
//!
//! These functions do not open transactions themselves; callers that
//! write several rows wrap them in one.

pub mod audit;
pub mod inspections;
pub mod reference;

use num_traits::ToPrimitive;

use crate::error::PersistenceError;

/// Converts an unsigned value into the `INTEGER` column representation.
pub(crate) fn to_signed(value: u32, column: &str) -> Result<i32, PersistenceError> {
    value
        .to_i32()
        .ok_or_else(|| PersistenceError::QueryFailed(format!("{column} out of range: {value}")))
}
