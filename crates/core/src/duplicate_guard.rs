// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Refuses a second submission for the same checkpoint slot.
//!
//! This is a check-then-act guard. The storage layer carries a uniqueness
//! constraint on `(checkpoint, slot, window start)` as a second line of
//! defense, surfaced through [`StoreError::Conflict`](crate::StoreError).

use crate::error::CoreError;
use crate::store::InspectionStore;
use tracing::debug;

/// Checks for an existing record before a submission is accepted.
pub struct DuplicateGuard<'a, S: InspectionStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: InspectionStore + ?Sized> DuplicateGuard<'a, S> {
    pub const fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Whether `checkpoint_id` already has a record for `slot_index` in
    /// `[window_start_ms, window_end_ms)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub fn has_existing(
        &mut self,
        checkpoint_id: &str,
        slot_index: u32,
        window_start_ms: i64,
        window_end_ms: i64,
    ) -> Result<bool, CoreError> {
        let existing: usize = self
            .store
            .records_for_checkpoint_slot_in_window(
                checkpoint_id,
                slot_index,
                window_start_ms,
                window_end_ms,
            )?
            .len();

        debug!(
            checkpoint_id,
            slot_index, window_start_ms, existing, "Duplicate slot check"
        );
        Ok(existing > 0)
    }

    /// Fails with [`CoreError::DuplicateSlot`] if the slot is taken.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot is already inspected or the query fails.
    pub fn ensure_vacant(
        &mut self,
        checkpoint_id: &str,
        slot_index: u32,
        window_start_ms: i64,
        window_end_ms: i64,
    ) -> Result<(), CoreError> {
        if self.has_existing(checkpoint_id, slot_index, window_start_ms, window_end_ms)? {
            return Err(CoreError::DuplicateSlot {
                checkpoint_id: checkpoint_id.to_string(),
                slot_index,
                window_start_ms,
            });
        }
        Ok(())
    }
}
