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

use crate::error::{FilterResult, InvalidFilterError};
use crate::logging;
use crate::record::CanonicalRecord;
use crate::stats::{mean_of, sample_std_dev};
use crate::table::{Cell, Field, FieldKind, TrackTable, ValueKey};
use indexmap::{IndexMap, IndexSet};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    Count,
    Sum,
    Mean,
    Min,
    Max,
    StdDev,
    Mode,
    CountDistinct,
}

impl AggregateFunction {
    pub fn name(self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Mean => "mean",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::StdDev => "std_dev",
            AggregateFunction::Mode => "mode",
            AggregateFunction::CountDistinct => "count_distinct",
        }
    }
    fn needs_numeric(self) -> bool {
        matches!(
            self,
            AggregateFunction::Sum
                | AggregateFunction::Mean
                | AggregateFunction::Min
                | AggregateFunction::Max
                | AggregateFunction::StdDev
        )
    }
}

impl FromStr for AggregateFunction {
    type Err = InvalidFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" | "size" => Ok(AggregateFunction::Count),
            "sum" => Ok(AggregateFunction::Sum),
            "mean" | "avg" | "average" => Ok(AggregateFunction::Mean),
            "min" => Ok(AggregateFunction::Min),
            "max" => Ok(AggregateFunction::Max),
            "std" | "std_dev" | "stddev" => Ok(AggregateFunction::StdDev),
            "mode" => Ok(AggregateFunction::Mode),
            "count_distinct" | "nunique" => Ok(AggregateFunction::CountDistinct),
            other => Err(InvalidFilterError::UnknownAggregate(other.to_string())),
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub function: AggregateFunction,
    pub field: Option<String>,
    pub alias: Option<String>,
}

impl Aggregation {
    pub fn count() -> Self {
        Self {
            function: AggregateFunction::Count,
            field: None,
            alias: None,
        }
    }
    pub fn of(function: AggregateFunction, field: impl Into<String>) -> Self {
        Self {
            function,
            field: Some(field.into()),
            alias: None,
        }
    }
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
    /// Output column name: the alias, else `function_field`, else `count`.
    pub fn output_name(&self) -> String {
        match (&self.alias, &self.field) {
            (Some(alias), _) => alias.clone(),
            (None, Some(field)) => format!("{}_{field}", self.function),
            (None, None) => self.function.name().to_string(),
        }
    }

    fn resolve(&self) -> FilterResult<(AggregateFunction, Option<Field>)> {
        let field = self
            .field
            .as_deref()
            .map(str::parse::<Field>)
            .transpose()?;
        match (self.function, field) {
            (AggregateFunction::Count, field) => Ok((AggregateFunction::Count, field)),
            (function, None) => Err(InvalidFilterError::MissingAggregateField(function.name())),
            (function, Some(field)) => {
                if function.needs_numeric() {
                    field.require_numeric()?;
                }
                Ok((function, Some(field)))
            }
        }
    }
}

/// Dimensions to partition by and what to compute per partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub dimensions: Vec<String>,
    pub aggregations: Vec<Aggregation>,
}

impl GroupSpec {
    pub fn by<I, S>(dimensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dimensions: dimensions.into_iter().map(Into::into).collect(),
            aggregations: Vec::new(),
        }
    }
    pub fn aggregate(mut self, aggregation: Aggregation) -> Self {
        self.aggregations.push(aggregation);
        self
    }
    /// Column names a grouped result will carry: dimensions, then aggregations.
    pub fn output_columns(&self) -> Vec<String> {
        self.dimensions
            .iter()
            .cloned()
            .chain(self.aggregations.iter().map(Aggregation::output_name))
            .collect()
    }
}

/// Result of a group-by: named columns over rows of cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupedTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

pub fn group(table: &TrackTable, spec: &GroupSpec) -> FilterResult<GroupedTable> {
    let dimensions = spec
        .dimensions
        .iter()
        .map(|name| {
            let field: Field = name.parse()?;
            if field.kind() == FieldKind::Continuous {
                return Err(field.wrong_kind("categorical, boolean or discrete numeric"));
            }
            Ok(field)
        })
        .collect::<FilterResult<Vec<Field>>>()?;
    let aggregations = spec
        .aggregations
        .iter()
        .map(Aggregation::resolve)
        .collect::<FilterResult<Vec<_>>>()?;

    let mut partitions: IndexMap<Vec<ValueKey>, Vec<&CanonicalRecord>> = IndexMap::new();
    for record in table.iter() {
        let key = dimensions
            .iter()
            .map(|d| d.value(record).to_key())
            .collect();
        partitions.entry(key).or_default().push(record);
    }

    let mut columns: Vec<String> = dimensions.iter().map(|d| d.name().to_string()).collect();
    columns.extend(spec.aggregations.iter().map(Aggregation::output_name));

    let rows = partitions
        .into_iter()
        .map(|(key, members)| {
            let mut row: Vec<Cell> = key.iter().map(ValueKey::to_cell).collect();
            row.extend(
                aggregations
                    .iter()
                    .map(|(function, field)| aggregate(*function, *field, &members)),
            );
            row
        })
        .collect::<Vec<_>>();

    logging::log_query("group", dimensions.len(), table.len(), rows.len());
    Ok(GroupedTable { columns, rows })
}

fn aggregate(
    function: AggregateFunction,
    field: Option<Field>,
    members: &[&CanonicalRecord],
) -> Cell {
    let Some(field) = field else {
        return Cell::Integer(members.len() as i64);
    };
    let integral = field.kind() == FieldKind::Discrete;
    let numbers = || -> Vec<f64> {
        members
            .iter()
            .filter_map(|r| field.value(r).as_f64())
            .collect()
    };
    let number_cell = |v: f64| {
        if integral {
            Cell::Integer(v as i64)
        } else {
            Cell::Number(v)
        }
    };
    match function {
        AggregateFunction::Count => Cell::Integer(members.len() as i64),
        AggregateFunction::Sum => number_cell(numbers().iter().sum()),
        AggregateFunction::Mean => mean_of(&numbers()).map_or(Cell::Missing, Cell::Number),
        AggregateFunction::Min => numbers()
            .into_iter()
            .reduce(f64::min)
            .map_or(Cell::Missing, number_cell),
        AggregateFunction::Max => numbers()
            .into_iter()
            .reduce(f64::max)
            .map_or(Cell::Missing, number_cell),
        AggregateFunction::StdDev => sample_std_dev(&numbers()).map_or(Cell::Missing, Cell::Number),
        AggregateFunction::Mode => {
            let mut counts: IndexMap<ValueKey, usize> = IndexMap::new();
            for record in members {
                *counts.entry(field.value(record).to_key()).or_insert(0) += 1;
            }
            let mut best: Option<(&ValueKey, usize)> = None;
            for (key, count) in &counts {
                if best.map_or(true, |(_, top)| *count > top) {
                    best = Some((key, *count));
                }
            }
            best.map_or(Cell::Missing, |(key, _)| key.to_cell())
        }
        AggregateFunction::CountDistinct => {
            let distinct: IndexSet<ValueKey> =
                members.iter().map(|r| field.value(r).to_key()).collect();
            Cell::Integer(distinct.len() as i64)
        }
    }
}

impl GroupedTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> FilterResult<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| InvalidFilterError::UnknownColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> FilterResult<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    pub fn cell(&self, row: usize, column: &str) -> FilterResult<Option<&Cell>> {
        let idx = self.column_index(column)?;
        Ok(self.rows.get(row).map(|r| &r[idx]))
    }

    /// Stable sort on one column; missing cells always go last.
    pub fn sort_by(mut self, column: &str, descending: bool) -> FilterResult<Self> {
        let idx = self.column_index(column)?;
        self.rows.sort_by(|a, b| {
            let (x, y) = (&a[idx], &b[idx]);
            match (x.is_missing(), y.is_missing()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) if descending => compare_cells(y, x),
                (false, false) => compare_cells(x, y),
            }
        });
        Ok(self)
    }

    /// Keeps rows whose numeric cell lies in `[min, max]`.
    pub fn filter_range(mut self, column: &str, min: f64, max: f64) -> FilterResult<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(InvalidFilterError::MalformedRange {
                field: column.to_string(),
                min,
                max,
            });
        }
        let idx = self.column_index(column)?;
        self.rows
            .retain(|row| row[idx].as_f64().is_some_and(|v| v >= min && v <= max));
        Ok(self)
    }

    /// Keeps rows whose cell renders as one of `values`.
    pub fn filter_values(mut self, column: &str, values: &[String]) -> FilterResult<Self> {
        let idx = self.column_index(column)?;
        self.rows
            .retain(|row| values.iter().any(|v| *v == row[idx].to_string()));
        Ok(self)
    }

    pub fn head(mut self, n: usize) -> Self {
        self.rows.truncate(n);
        self
    }
}

fn compare_cells(a: &Cell, b: &Cell) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        // -0.0 and 0.0 compare equal
        (Some(x), Some(y)) => (x + 0.0).total_cmp(&(y + 0.0)),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

struct RowView<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, cell) in self.columns.iter().zip(self.cells) {
            map.serialize_entry(name, cell)?;
        }
        map.end()
    }
}

/// Serializes as a list of `{column: cell}` objects.
impl Serialize for GroupedTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for cells in &self.rows {
            seq.serialize_element(&RowView {
                columns: &self.columns,
                cells,
            })?;
        }
        seq.end()
    }
}

impl fmt::Display for GroupedTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(render_cell).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                rendered
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(name, &w)| format!("{name:<w$}"))
            .collect();
        writeln!(f, "{}", header.join("  ").trim_end())?;
        for row in rendered {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, &w)| format!("{cell:<w$}"))
                .collect();
            writeln!(f, "{}", line.join("  ").trim_end())?;
        }
        Ok(())
    }
}

fn render_cell(cell: &Cell) -> String {
    match cell {
        Cell::Number(v) => format!("{v:.3}"),
        other => other.to_string(),
    }
}
