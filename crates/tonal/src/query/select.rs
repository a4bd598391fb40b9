// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use crate::error::FilterResult;
use crate::logging;
use crate::table::{Field, TrackTable};
use std::sync::Arc;

/// The `n` rows with the largest `field`, ties in table order.
/// Fewer than `n` rows yields all of them.
pub fn top_n(table: &TrackTable, field: Field, n: usize) -> FilterResult<TrackTable> {
    select(table, field, n, true)
}

/// The `n` rows with the smallest `field`, ties in table order.
pub fn bottom_n(table: &TrackTable, field: Field, n: usize) -> FilterResult<TrackTable> {
    select(table, field, n, false)
}

fn select(
    table: &TrackTable,
    field: Field,
    n: usize,
    descending: bool,
) -> FilterResult<TrackTable> {
    field.require_numeric()?;
    // adding 0.0 folds -0.0 into 0.0 so the two tie under total_cmp
    let mut keyed: Vec<(f64, &Arc<_>)> = table
        .shared_rows()
        .iter()
        .map(|row| (field.value(row).as_f64().map_or(f64::NAN, |v| v + 0.0), row))
        .collect();
    // sort_by is stable, so equal keys keep table order
    if descending {
        keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
    } else {
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    }
    let rows = keyed
        .into_iter()
        .take(n)
        .map(|(_, row)| Arc::clone(row))
        .collect();
    let result = TrackTable::from_shared(rows);
    let operation = if descending { "top_n" } else { "bottom_n" };
    logging::log_query(operation, 0, table.len(), result.len());
    Ok(result)
}
