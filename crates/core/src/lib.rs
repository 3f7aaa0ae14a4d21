// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Inspection engine for SafePatrol.
//!
//! Reconciles checkpoint visits against the fixed shift calendar: which
//! slot a visit belongs to, whether that slot is already taken, which
//! checkpoint a scanned tag identifies, and how the stored records of an
//! arbitrary range lay out as a merged-cell report grid.
//!
//! All storage goes through the [`InspectionStore`] trait, passed in
//! explicitly to each component.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod aggregator;
mod clock;
mod correction;
mod duplicate_guard;
mod error;
mod report;
mod review;
mod session;
mod store;
mod submission;
mod tag_resolver;
mod visits;

#[cfg(test)]
mod tests;

pub use aggregator::{CheckpointStatus, RecordAggregator, RouteStatus, SlotCompletion};
pub use clock::ClockGuard;
pub use correction::{CorrectionReceipt, CorrectionRequest, correct_record_item};
pub use duplicate_guard::DuplicateGuard;
pub use error::{CoreError, StoreError};
pub use report::{
    NOT_INSPECTED, PURGE_DESCRIPTION, REPORT_HEADERS, ReportGrid, ReportGridBuilder, ReportRow,
    ReportSheet, ReportSubject, RowKind, display_date_time, load_subjects,
};
pub use review::{PointReview, ReviewCell, ReviewRow, review_point};
pub use session::{CLEAR_CONFIRMATION_PHRASE, SessionManager};
pub use store::{ExportMark, InspectionStore, NewInspection, PurgeSummary, ReferenceData};
pub use submission::{
    EntryInput, FormEquipment, FormItem, InspectionFlow, ScanResult, SubmissionReceipt,
    SubmissionRequest, evaluate_entry,
};
pub use tag_resolver::{AmbiguousTagBinding, TagResolution, TagResolver};
pub use visits::{EffectiveEntry, apply_corrections};
