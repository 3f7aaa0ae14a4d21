// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bulk upsert of reference data.

use diesel::SqliteConnection;
use diesel::prelude::*;
use diesel::upsert::excluded;
use patrol::ReferenceData;
use tracing::debug;

use crate::diesel_schema::{check_items, checkpoints, equipment, operators, routes};
use crate::error::PersistenceError;
use crate::mutations::to_signed;

/// Inserts or replaces every row of `data` by primary key.
///
/// Parents are written before children so foreign keys hold at every step.
///
/// # Errors
///
/// Returns an error if any row is rejected. The caller owns the
/// transaction and rolls it back.
pub fn upsert_reference_data(
    conn: &mut SqliteConnection,
    data: &ReferenceData,
) -> Result<(), PersistenceError> {
    for route in &data.routes {
        diesel::insert_into(routes::table)
            .values((
                routes::route_id.eq(&route.route_id),
                routes::name.eq(&route.name),
                routes::description.eq(&route.description),
            ))
            .on_conflict(routes::route_id)
            .do_update()
            .set((
                routes::name.eq(excluded(routes::name)),
                routes::description.eq(excluded(routes::description)),
            ))
            .execute(conn)?;
    }

    for checkpoint in &data.checkpoints {
        diesel::insert_into(checkpoints::table)
            .values((
                checkpoints::checkpoint_id.eq(&checkpoint.checkpoint_id),
                checkpoints::name.eq(&checkpoint.name),
                checkpoints::location.eq(&checkpoint.location),
                checkpoints::route_id.eq(&checkpoint.route_id),
                checkpoints::tag_uid.eq(&checkpoint.tag_uid),
            ))
            .on_conflict(checkpoints::checkpoint_id)
            .do_update()
            .set((
                checkpoints::name.eq(excluded(checkpoints::name)),
                checkpoints::location.eq(excluded(checkpoints::location)),
                checkpoints::route_id.eq(excluded(checkpoints::route_id)),
                checkpoints::tag_uid.eq(excluded(checkpoints::tag_uid)),
            ))
            .execute(conn)?;
    }

    for item in &data.equipment {
        diesel::insert_into(equipment::table)
            .values((
                equipment::equipment_id.eq(&item.equipment_id),
                equipment::name.eq(&item.name),
                equipment::checkpoint_id.eq(&item.checkpoint_id),
                equipment::status_required.eq(i32::from(item.status_required)),
            ))
            .on_conflict(equipment::equipment_id)
            .do_update()
            .set((
                equipment::name.eq(excluded(equipment::name)),
                equipment::checkpoint_id.eq(excluded(equipment::checkpoint_id)),
                equipment::status_required.eq(excluded(equipment::status_required)),
            ))
            .execute(conn)?;
    }

    for item in &data.check_items {
        let frequency_hours: i32 =
            to_signed(item.frequency.hours(), "check_items.frequency_hours")?;
        diesel::insert_into(check_items::table)
            .values((
                check_items::item_id.eq(&item.item_id),
                check_items::equipment_id.eq(&item.equipment_id),
                check_items::name.eq(&item.name),
                check_items::value_kind.eq(item.kind.as_str()),
                check_items::unit.eq(&item.unit),
                check_items::required.eq(i32::from(item.required)),
                check_items::required_in_standby.eq(i32::from(item.required_in_standby)),
                check_items::min_value.eq(item.min),
                check_items::max_value.eq(item.max),
                check_items::frequency_hours.eq(frequency_hours),
            ))
            .on_conflict(check_items::item_id)
            .do_update()
            .set((
                check_items::equipment_id.eq(excluded(check_items::equipment_id)),
                check_items::name.eq(excluded(check_items::name)),
                check_items::value_kind.eq(excluded(check_items::value_kind)),
                check_items::unit.eq(excluded(check_items::unit)),
                check_items::required.eq(excluded(check_items::required)),
                check_items::required_in_standby.eq(excluded(check_items::required_in_standby)),
                check_items::min_value.eq(excluded(check_items::min_value)),
                check_items::max_value.eq(excluded(check_items::max_value)),
                check_items::frequency_hours.eq(excluded(check_items::frequency_hours)),
            ))
            .execute(conn)?;
    }

    for operator in &data.operators {
        diesel::insert_into(operators::table)
            .values((
                operators::operator_id.eq(&operator.operator_id),
                operators::name.eq(&operator.name),
            ))
            .on_conflict(operators::operator_id)
            .do_update()
            .set(operators::name.eq(excluded(operators::name)))
            .execute(conn)?;
    }

    debug!(rows = data.len(), "Upserted reference data");
    Ok(())
}
