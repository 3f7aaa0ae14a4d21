// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bulk import of reference data from a directory of CSV files.
//!
//! The directory must hold `routes.csv`, `checkpoints.csv`, `equipment.csv`,
//! `check_items.csv` and `operators.csv`. Every row of every file is parsed
//! and validated before anything is returned, so a single bad row rejects
//! the whole import.

use std::collections::HashMap;
use std::path::Path;

use csv::StringRecord;
use patrol::ReferenceData;
use patrol_domain::{
    CheckItem, Checkpoint, Equipment, Frequency, Operator, Route, TagId, ValueKind,
};
use tracing::{debug, info};

use crate::error::ApiError;

pub const ROUTES_FILE: &str = "routes.csv";
pub const CHECKPOINTS_FILE: &str = "checkpoints.csv";
pub const EQUIPMENT_FILE: &str = "equipment.csv";
pub const CHECK_ITEMS_FILE: &str = "check_items.csv";
pub const OPERATORS_FILE: &str = "operators.csv";

const ROUTE_HEADERS: &[&str] = &["route_id", "name"];
const CHECKPOINT_HEADERS: &[&str] = &["checkpoint_id", "name", "route_id", "tag_uid"];
const EQUIPMENT_HEADERS: &[&str] = &["equipment_id", "name", "checkpoint_id"];
const CHECK_ITEM_HEADERS: &[&str] = &[
    "item_id",
    "equipment_id",
    "name",
    "value_kind",
    "frequency_hours",
];
const OPERATOR_HEADERS: &[&str] = &["operator_id", "name"];

/// Normalizes a CSV header string for case-insensitive, whitespace-tolerant matching.
fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase().replace(' ', "_")
}

/// One parsed file: the normalized header map and its data rows.
struct CsvTable {
    file: &'static str,
    headers: HashMap<String, usize>,
    records: Vec<StringRecord>,
}

impl CsvTable {
    fn read(dir: &Path, file: &'static str, required: &[&str]) -> Result<Self, ApiError> {
        let path = dir.join(file);
        let mut reader: csv::Reader<std::fs::File> = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| ApiError::InvalidCsvFormat {
                reason: format!("{file}: {e}"),
            })?;

        let mut headers: HashMap<String, usize> = HashMap::new();
        let raw_headers: &StringRecord = reader.headers().map_err(|e| ApiError::InvalidCsvFormat {
            reason: format!("{file}: {e}"),
        })?;
        for (idx, header) in raw_headers.iter().enumerate() {
            headers.insert(normalize_header(header), idx);
        }

        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|name| !headers.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(ApiError::InvalidCsvFormat {
                reason: format!("{file}: missing required headers: {}", missing.join(", ")),
            });
        }

        let mut records: Vec<StringRecord> = Vec::new();
        for record in reader.records() {
            let record: StringRecord = record.map_err(|e| ApiError::InvalidCsvFormat {
                reason: format!("{file}: {e}"),
            })?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            records.push(record);
        }
        debug!(file, rows = records.len(), "Read CSV file");

        Ok(Self {
            file,
            headers,
            records,
        })
    }

    /// Parses every row, collecting the errors of all rows.
    fn parse<T>(
        &self,
        parse_row: impl Fn(&Row<'_>) -> Result<T, String>,
    ) -> Result<Vec<T>, Vec<String>> {
        let mut parsed: Vec<T> = Vec::with_capacity(self.records.len());
        let mut errors: Vec<String> = Vec::new();
        for (idx, record) in self.records.iter().enumerate() {
            let row: Row<'_> = Row {
                headers: &self.headers,
                record,
            };
            match parse_row(&row) {
                Ok(value) => parsed.push(value),
                // Header is line 1.
                Err(reason) => errors.push(format!("{} line {}: {reason}", self.file, idx + 2)),
            }
        }
        if errors.is_empty() {
            Ok(parsed)
        } else {
            Err(errors)
        }
    }
}

struct Row<'a> {
    headers: &'a HashMap<String, usize>,
    record: &'a StringRecord,
}

impl Row<'_> {
    fn optional(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|&idx| self.record.get(idx))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn required(&self, name: &str) -> Result<String, String> {
        self.optional(name)
            .ok_or_else(|| format!("{name}: required field is missing or empty"))
    }

    fn flag(&self, name: &str) -> Result<bool, String> {
        self.optional(name).map_or(Ok(false), |raw| parse_flag(name, &raw))
    }

    fn number(&self, name: &str) -> Result<Option<f64>, String> {
        self.optional(name)
            .map(|raw| {
                raw.parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| format!("{name}: invalid number '{raw}'"))
            })
            .transpose()
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, String> {
    match raw.to_ascii_uppercase().as_str() {
        "YES" | "Y" | "TRUE" | "1" => Ok(true),
        "NO" | "N" | "FALSE" | "0" => Ok(false),
        _ => Err(format!("{name}: expected YES or NO, got '{raw}'")),
    }
}

fn parse_route(row: &Row<'_>) -> Result<Route, String> {
    Ok(Route {
        route_id: row.required("route_id")?,
        name: row.required("name")?,
        description: row.optional("description"),
    })
}

fn parse_checkpoint(row: &Row<'_>) -> Result<Checkpoint, String> {
    let raw_tag: String = row.required("tag_uid")?;
    let tag: TagId = TagId::parse(&raw_tag).map_err(|e| format!("tag_uid: {e}"))?;
    Ok(Checkpoint {
        checkpoint_id: row.required("checkpoint_id")?,
        name: row.required("name")?,
        location: row.optional("location").unwrap_or_default(),
        route_id: row.required("route_id")?,
        tag_uid: tag.as_str().to_string(),
    })
}

fn parse_equipment(row: &Row<'_>) -> Result<Equipment, String> {
    Ok(Equipment {
        equipment_id: row.required("equipment_id")?,
        name: row.required("name")?,
        checkpoint_id: row.required("checkpoint_id")?,
        status_required: row.flag("status_required")?,
    })
}

fn parse_check_item(row: &Row<'_>) -> Result<CheckItem, String> {
    let kind: ValueKind = row
        .required("value_kind")?
        .parse()
        .map_err(|e| format!("value_kind: {e}"))?;
    let raw_hours: String = row.required("frequency_hours")?;
    let frequency: Frequency = raw_hours
        .parse::<u32>()
        .ok()
        .and_then(Frequency::from_hours)
        .ok_or_else(|| format!("frequency_hours: expected 2, 4 or 8, got '{raw_hours}'"))?;

    let item: CheckItem = CheckItem {
        item_id: row.required("item_id")?,
        equipment_id: row.required("equipment_id")?,
        name: row.required("name")?,
        kind,
        unit: row.optional("unit"),
        required: row.flag("required")?,
        required_in_standby: row.flag("required_in_standby")?,
        min: row.number("min")?,
        max: row.number("max")?,
        frequency,
    };
    item.validate().map_err(|e| e.to_string())?;
    Ok(item)
}

fn parse_operator(row: &Row<'_>) -> Result<Operator, String> {
    Ok(Operator {
        operator_id: row.required("operator_id")?,
        name: row.required("name")?,
    })
}

/// Loads and validates every reference-data file in `dir`.
///
/// # Errors
///
/// Returns [`ApiError::InvalidCsvFormat`] if a file is missing, lacks a
/// required header, or holds an invalid row. The error lists every invalid
/// row across all files.
pub fn load_reference_data(dir: &Path) -> Result<ReferenceData, ApiError> {
    let routes: CsvTable = CsvTable::read(dir, ROUTES_FILE, ROUTE_HEADERS)?;
    let checkpoints: CsvTable = CsvTable::read(dir, CHECKPOINTS_FILE, CHECKPOINT_HEADERS)?;
    let equipment: CsvTable = CsvTable::read(dir, EQUIPMENT_FILE, EQUIPMENT_HEADERS)?;
    let check_items: CsvTable = CsvTable::read(dir, CHECK_ITEMS_FILE, CHECK_ITEM_HEADERS)?;
    let operators: CsvTable = CsvTable::read(dir, OPERATORS_FILE, OPERATOR_HEADERS)?;

    let mut errors: Vec<String> = Vec::new();
    let mut collect = |result: Result<(), Vec<String>>| {
        if let Err(mut row_errors) = result {
            errors.append(&mut row_errors);
        }
    };

    let mut data: ReferenceData = ReferenceData::default();
    collect(routes.parse(parse_route).map(|rows| data.routes = rows));
    collect(checkpoints.parse(parse_checkpoint).map(|rows| data.checkpoints = rows));
    collect(equipment.parse(parse_equipment).map(|rows| data.equipment = rows));
    collect(check_items.parse(parse_check_item).map(|rows| data.check_items = rows));
    collect(operators.parse(parse_operator).map(|rows| data.operators = rows));

    if !errors.is_empty() {
        return Err(ApiError::InvalidCsvFormat {
            reason: errors.join("; "),
        });
    }

    info!(
        dir = %dir.display(),
        routes = data.routes.len(),
        checkpoints = data.checkpoints.len(),
        equipment = data.equipment.len(),
        check_items = data.check_items.len(),
        operators = data.operators.len(),
        "Loaded reference data"
    );
    Ok(data)
}
