// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Queries over routes, checkpoints, equipment, check items and operators.

use std::str::FromStr;

use diesel::SqliteConnection;
use diesel::prelude::*;
use patrol_domain::{
    CheckItem, Checkpoint, Equipment, Frequency, OperationalState, Operator, Route, ValueKind,
};
use tracing::debug;

use crate::diesel_schema::{
    check_items, checkpoints, equipment, equipment_status, operators, routes,
};
use crate::error::PersistenceError;
use crate::queries::to_unsigned;

#[derive(Queryable, Selectable)]
#[diesel(table_name = routes)]
struct RouteRow {
    route_id: String,
    name: String,
    description: Option<String>,
}

impl From<RouteRow> for Route {
    fn from(row: RouteRow) -> Self {
        Self {
            route_id: row.route_id,
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = checkpoints)]
struct CheckpointRow {
    checkpoint_id: String,
    name: String,
    location: String,
    route_id: String,
    tag_uid: String,
}

impl From<CheckpointRow> for Checkpoint {
    fn from(row: CheckpointRow) -> Self {
        Self {
            checkpoint_id: row.checkpoint_id,
            name: row.name,
            location: row.location,
            route_id: row.route_id,
            tag_uid: row.tag_uid,
        }
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = equipment)]
struct EquipmentRow {
    equipment_id: String,
    name: String,
    checkpoint_id: String,
    status_required: i32,
}

impl From<EquipmentRow> for Equipment {
    fn from(row: EquipmentRow) -> Self {
        Self {
            equipment_id: row.equipment_id,
            name: row.name,
            checkpoint_id: row.checkpoint_id,
            status_required: row.status_required != 0,
        }
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = check_items)]
struct CheckItemRow {
    item_id: String,
    equipment_id: String,
    name: String,
    value_kind: String,
    unit: Option<String>,
    required: i32,
    required_in_standby: i32,
    min_value: Option<f64>,
    max_value: Option<f64>,
    frequency_hours: i32,
}

impl TryFrom<CheckItemRow> for CheckItem {
    type Error = PersistenceError;

    fn try_from(row: CheckItemRow) -> Result<Self, Self::Error> {
        let kind: ValueKind = ValueKind::from_str(&row.value_kind)
            .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))?;
        let hours: u32 = to_unsigned(row.frequency_hours, "check_items.frequency_hours")?;
        let frequency: Frequency = Frequency::from_hours(hours).ok_or_else(|| {
            PersistenceError::ReconstructionError(format!(
                "check item {} has unsupported frequency {hours}h",
                row.item_id
            ))
        })?;

        Ok(Self {
            item_id: row.item_id,
            equipment_id: row.equipment_id,
            name: row.name,
            kind,
            unit: row.unit,
            required: row.required != 0,
            required_in_standby: row.required_in_standby != 0,
            min: row.min_value,
            max: row.max_value,
            frequency,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = operators)]
struct OperatorRow {
    operator_id: String,
    name: String,
}

/// Lists all routes ordered by id.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_routes(conn: &mut SqliteConnection) -> Result<Vec<Route>, PersistenceError> {
    let rows: Vec<RouteRow> = routes::table
        .select(RouteRow::as_select())
        .order(routes::route_id.asc())
        .load(conn)?;
    Ok(rows.into_iter().map(Route::from).collect())
}

/// Retrieves a route by id.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the route is not found.
pub fn get_route(
    conn: &mut SqliteConnection,
    route_id: &str,
) -> Result<Option<Route>, PersistenceError> {
    let row: Option<RouteRow> = routes::table
        .filter(routes::route_id.eq(route_id))
        .select(RouteRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row.map(Route::from))
}

/// Retrieves an operator by id.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_operator(
    conn: &mut SqliteConnection,
    operator_id: &str,
) -> Result<Option<Operator>, PersistenceError> {
    let row: Option<OperatorRow> = operators::table
        .filter(operators::operator_id.eq(operator_id))
        .select(OperatorRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row.map(|row| Operator {
        operator_id: row.operator_id,
        name: row.name,
    }))
}

/// Retrieves a checkpoint by id.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_checkpoint(
    conn: &mut SqliteConnection,
    checkpoint_id: &str,
) -> Result<Option<Checkpoint>, PersistenceError> {
    let row: Option<CheckpointRow> = checkpoints::table
        .filter(checkpoints::checkpoint_id.eq(checkpoint_id))
        .select(CheckpointRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row.map(Checkpoint::from))
}

/// Lists the checkpoints of a route ordered by id.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_checkpoints_for_route(
    conn: &mut SqliteConnection,
    route_id: &str,
) -> Result<Vec<Checkpoint>, PersistenceError> {
    let rows: Vec<CheckpointRow> = checkpoints::table
        .filter(checkpoints::route_id.eq(route_id))
        .select(CheckpointRow::as_select())
        .order(checkpoints::checkpoint_id.asc())
        .load(conn)?;
    Ok(rows.into_iter().map(Checkpoint::from).collect())
}

/// Finds checkpoints whose stored tag equals one of `tag_variants`.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn find_checkpoints_by_tags(
    conn: &mut SqliteConnection,
    tag_variants: &[String],
) -> Result<Vec<Checkpoint>, PersistenceError> {
    debug!(?tag_variants, "Looking up checkpoints by tag");

    let rows: Vec<CheckpointRow> = checkpoints::table
        .filter(checkpoints::tag_uid.eq_any(tag_variants))
        .select(CheckpointRow::as_select())
        .order(checkpoints::checkpoint_id.asc())
        .load(conn)?;
    Ok(rows.into_iter().map(Checkpoint::from).collect())
}

/// Lists the equipment at a checkpoint ordered by id.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_equipment_for_checkpoint(
    conn: &mut SqliteConnection,
    checkpoint_id: &str,
) -> Result<Vec<Equipment>, PersistenceError> {
    let rows: Vec<EquipmentRow> = equipment::table
        .filter(equipment::checkpoint_id.eq(checkpoint_id))
        .select(EquipmentRow::as_select())
        .order(equipment::equipment_id.asc())
        .load(conn)?;
    Ok(rows.into_iter().map(Equipment::from).collect())
}

/// Lists the check items of the given equipment, ordered by equipment
/// then item id.
///
/// # Errors
///
/// Returns an error if the query fails or a stored item is malformed.
pub fn list_check_items_for_equipment(
    conn: &mut SqliteConnection,
    equipment_ids: &[String],
) -> Result<Vec<CheckItem>, PersistenceError> {
    let rows: Vec<CheckItemRow> = check_items::table
        .filter(check_items::equipment_id.eq_any(equipment_ids))
        .select(CheckItemRow::as_select())
        .order((check_items::equipment_id.asc(), check_items::item_id.asc()))
        .load(conn)?;
    rows.into_iter().map(CheckItem::try_from).collect()
}

/// Retrieves a check item by id.
///
/// # Errors
///
/// Returns an error if the query fails or the stored item is malformed.
pub fn get_check_item(
    conn: &mut SqliteConnection,
    item_id: &str,
) -> Result<Option<CheckItem>, PersistenceError> {
    let row: Option<CheckItemRow> = check_items::table
        .filter(check_items::item_id.eq(item_id))
        .select(CheckItemRow::as_select())
        .first(conn)
        .optional()?;
    row.map(CheckItem::try_from).transpose()
}

/// Last chosen operational state of each of the given equipment, where
/// one has been recorded.
///
/// # Errors
///
/// Returns an error if the query fails or a stored state is unknown.
pub fn get_equipment_states(
    conn: &mut SqliteConnection,
    equipment_ids: &[String],
) -> Result<Vec<(String, OperationalState)>, PersistenceError> {
    let rows: Vec<(String, String)> = equipment_status::table
        .filter(equipment_status::equipment_id.eq_any(equipment_ids))
        .select((equipment_status::equipment_id, equipment_status::state))
        .order(equipment_status::equipment_id.asc())
        .load(conn)?;

    rows.into_iter()
        .map(|(equipment_id, state)| {
            let state: OperationalState = OperationalState::from_str(&state)
                .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))?;
            Ok((equipment_id, state))
        })
        .collect()
}
