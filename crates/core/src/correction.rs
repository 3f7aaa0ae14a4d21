// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Retrospective correction of recorded values.
//!
//! Corrections are appended, never applied in place: the original record
//! item keeps its submitted value and every later read applies the newest
//! correction on top of it.

use crate::error::{CoreError, StoreError};
use crate::store::InspectionStore;
use crate::submission::evaluate_entry;
use patrol_audit::{Action, Actor, AuditAction, AuditEvent, Cause};
use patrol_domain::{CheckItem, InspectionRecordItem, RecordItemCorrection};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A requested change to a recorded value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionRequest {
    pub entry_id: i64,
    pub value: String,
    pub remark: Option<String>,
    pub operator_id: String,
}

/// An accepted correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectionReceipt {
    pub correction_id: i64,
    pub entry_id: i64,
    pub previous_value: String,
    pub new_value: String,
    pub abnormal: bool,
}

/// Appends a correction to a stored record item.
///
/// # Errors
///
/// - `RecordItemNotFound` or `OperatorNotFound` for unknown references
/// - `NotCorrectable` for skipped-equipment and system audit markers
/// - `DomainViolation` or `MissingRequiredField` if the new value is invalid
pub fn correct_record_item<S: InspectionStore + ?Sized>(
    store: &mut S,
    request: &CorrectionRequest,
    now_ms: i64,
) -> Result<CorrectionReceipt, CoreError> {
    let entry: InspectionRecordItem = store
        .record_item(request.entry_id)?
        .ok_or(CoreError::RecordItemNotFound(request.entry_id))?;
    let Some(check_item_id) = entry.check_item_id.as_deref() else {
        return Err(CoreError::NotCorrectable {
            entry_id: request.entry_id,
        });
    };
    let item: CheckItem = store.check_item(check_item_id)?.ok_or_else(|| {
        CoreError::Store(StoreError::NotFound(format!("check item {check_item_id}")))
    })?;
    if store.operator(&request.operator_id)?.is_none() {
        return Err(CoreError::OperatorNotFound(request.operator_id.clone()));
    }

    let previous_value: String = store
        .corrections_for_items(&[request.entry_id])?
        .pop()
        .map_or_else(|| entry.value.clone(), |c| c.new_value);
    let remark: Option<String> = request
        .remark
        .clone()
        .filter(|r| !r.trim().is_empty());
    let (new_value, abnormal): (String, bool) =
        evaluate_entry(&item, &request.value, remark.as_deref())?;

    let correction = RecordItemCorrection {
        correction_id: None,
        entry_id: request.entry_id,
        previous_value: previous_value.clone(),
        new_value: new_value.clone(),
        remark,
        abnormal,
        operator_id: request.operator_id.clone(),
        corrected_at_ms: now_ms,
    };
    let event = AuditEvent::new(
        Actor::operator(&request.operator_id),
        Cause::new(
            format!("entry-{}", request.entry_id),
            String::from("Recorded value corrected during review"),
        ),
        Action::of(
            AuditAction::RecordItemCorrected,
            Some(format!("{check_item_id}: {previous_value} -> {new_value}")),
        ),
        now_ms,
    );

    let correction_id: i64 = store.append_correction(&correction, &event)?;
    info!(
        correction_id,
        entry_id = request.entry_id,
        check_item_id,
        abnormal,
        "Recorded value corrected"
    );

    Ok(CorrectionReceipt {
        correction_id,
        entry_id: request.entry_id,
        previous_value,
        new_value,
        abnormal,
    })
}
