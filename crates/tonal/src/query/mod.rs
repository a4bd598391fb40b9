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

//! Filter, group and rank the canonical table.
//!
//! Every page view is a composition of [`filter`], [`group`] and
//! [`top_n`]/[`bottom_n`]; [`Query`] bundles the three for ad-hoc use.

pub mod filter;
pub mod group;
pub mod parse;
pub mod select;

pub use filter::{filter, CompiledPredicate, FilterSet, Predicate};
pub use group::{group, AggregateFunction, Aggregation, GroupSpec, GroupedTable};
pub use parse::{parse_aggregation, parse_predicate};
pub use select::{bottom_n, top_n};

use crate::error::{FilterResult, InvalidFilterError};
use crate::table::{Field, TrackTable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Top,
    Bottom,
}

/// Ranking step applied after filtering (and grouping, when present).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub direction: Direction,
    /// A record field, or a grouped column name when the query groups.
    pub by: String,
    pub n: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub filters: FilterSet,
    pub group: Option<GroupSpec>,
    pub selection: Option<Selection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutput {
    Rows(TrackTable),
    Grouped(GroupedTable),
}

impl QueryOutput {
    pub fn len(&self) -> usize {
        match self {
            QueryOutput::Rows(table) => table.len(),
            QueryOutput::Grouped(grouped) => grouped.len(),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Query {
    pub fn run(&self, table: &TrackTable) -> FilterResult<QueryOutput> {
        // validate the ranking field or column before scanning
        let rank_field = match (&self.group, &self.selection) {
            (None, Some(selection)) => Some(selection.by.parse::<Field>()?),
            (Some(spec), Some(selection)) => {
                if !spec.output_columns().contains(&selection.by) {
                    return Err(InvalidFilterError::UnknownColumn(selection.by.clone()));
                }
                None
            }
            _ => None,
        };
        let subset = filter(table, &self.filters)?;
        match (&self.group, &self.selection) {
            (Some(spec), selection) => {
                let grouped = group(&subset, spec)?;
                let grouped = match selection {
                    Some(s) => grouped
                        .sort_by(&s.by, s.direction == Direction::Top)?
                        .head(s.n),
                    None => grouped,
                };
                Ok(QueryOutput::Grouped(grouped))
            }
            (None, Some(selection)) => {
                let field = rank_field.unwrap_or(Field::Popularity);
                let ranked = match selection.direction {
                    Direction::Top => top_n(&subset, field, selection.n)?,
                    Direction::Bottom => bottom_n(&subset, field, selection.n)?,
                };
                Ok(QueryOutput::Rows(ranked))
            }
            (None, None) => Ok(QueryOutput::Rows(subset)),
        }
    }
}
