// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries.
//!
//! Each function maps Diesel rows to domain values and reports rows that
//! cannot be mapped back as [`crate::PersistenceError::ReconstructionError`].

pub mod audit;
pub mod inspections;
pub mod reference;

use num_traits::ToPrimitive;

use crate::error::PersistenceError;

/// Converts a stored `INTEGER` column into an unsigned value.
pub(crate) fn to_unsigned(value: i32, column: &str) -> Result<u32, PersistenceError> {
    value.to_u32().ok_or_else(|| {
        PersistenceError::ReconstructionError(format!("{column} is negative: {value}"))
    })
}
