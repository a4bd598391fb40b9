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
use crate::table::{Field, FieldKind, TrackTable};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

const PARALLEL_THRESHOLD: usize = 10_000;

/// A single constraint on one named field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// Inclusive `[min, max]` on a numeric field.
    Range { field: String, min: f64, max: f64 },
    /// Canonical text form of the value is one of `values`.
    OneOf { field: String, values: Vec<String> },
    Equals { field: String, value: bool },
}

impl Predicate {
    pub fn range(field: impl Into<String>, min: f64, max: f64) -> Self {
        Predicate::Range {
            field: field.into(),
            min,
            max,
        }
    }
    pub fn one_of<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::OneOf {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
    pub fn equals(field: impl Into<String>, value: bool) -> Self {
        Predicate::Equals {
            field: field.into(),
            value,
        }
    }
    pub fn field_name(&self) -> &str {
        match self {
            Predicate::Range { field, .. }
            | Predicate::OneOf { field, .. }
            | Predicate::Equals { field, .. } => field,
        }
    }

    pub fn compile(&self) -> FilterResult<CompiledPredicate> {
        let field: Field = self.field_name().parse()?;
        match self {
            Predicate::Range { min, max, .. } => {
                field.require_numeric()?;
                if !min.is_finite() || !max.is_finite() || min > max {
                    return Err(InvalidFilterError::MalformedRange {
                        field: field.name().to_string(),
                        min: *min,
                        max: *max,
                    });
                }
                Ok(CompiledPredicate::Range {
                    field,
                    min: *min,
                    max: *max,
                })
            }
            Predicate::OneOf { values, .. } => {
                if !matches!(field.kind(), FieldKind::Categorical | FieldKind::Discrete) {
                    return Err(field.wrong_kind("categorical or discrete numeric"));
                }
                if values.is_empty() {
                    return Err(InvalidFilterError::EmptyMembership(field.name().to_string()));
                }
                Ok(CompiledPredicate::OneOf {
                    field,
                    values: values.iter().cloned().collect(),
                })
            }
            Predicate::Equals { value, .. } => {
                if field.kind() != FieldKind::Boolean {
                    return Err(field.wrong_kind("boolean"));
                }
                Ok(CompiledPredicate::Equals {
                    field,
                    value: *value,
                })
            }
        }
    }
}

/// Conjunction of predicates; an empty set keeps every row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    pub predicates: Vec<Predicate>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }
    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }
    /// Conjunction of both sets.
    pub fn and(mut self, other: FilterSet) -> Self {
        self.predicates.extend(other.predicates);
        self
    }
    pub fn len(&self) -> usize {
        self.predicates.len()
    }
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
    pub fn compile(&self) -> FilterResult<Vec<CompiledPredicate>> {
        self.predicates.iter().map(Predicate::compile).collect()
    }
}

impl FromIterator<Predicate> for FilterSet {
    fn from_iter<T: IntoIterator<Item = Predicate>>(iter: T) -> Self {
        Self {
            predicates: iter.into_iter().collect(),
        }
    }
}

/// A predicate resolved against the field catalogue, ready to scan.
#[derive(Debug, Clone)]
pub enum CompiledPredicate {
    Range { field: Field, min: f64, max: f64 },
    OneOf { field: Field, values: HashSet<String> },
    Equals { field: Field, value: bool },
}

impl CompiledPredicate {
    pub fn evaluate(&self, record: &CanonicalRecord) -> bool {
        match self {
            CompiledPredicate::Range { field, min, max } => field
                .value(record)
                .as_f64()
                .is_some_and(|v| v >= *min && v <= *max),
            CompiledPredicate::OneOf { field, values } => {
                values.contains(field.value(record).as_text().as_ref())
            }
            CompiledPredicate::Equals { field, value } => {
                matches!(field.value(record), crate::table::Value::Bool(v) if v == *value)
            }
        }
    }
}

/// Rows matching every predicate, in table order. All predicates are
/// validated before any row is scanned.
pub fn filter(table: &TrackTable, filters: &FilterSet) -> FilterResult<TrackTable> {
    let compiled = filters.compile()?;
    let matches = |record: &CanonicalRecord| compiled.iter().all(|p| p.evaluate(record));
    let result = if table.len() > PARALLEL_THRESHOLD {
        let rows: Vec<Arc<CanonicalRecord>> = table
            .shared_rows()
            .par_iter()
            .filter(|r| matches(r))
            .cloned()
            .collect();
        TrackTable::from_shared(rows)
    } else {
        table.retain_rows(matches)
    };
    logging::log_query("filter", compiled.len(), table.len(), result.len());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::normalize::tests::raw;

    fn sample() -> TrackTable {
        let mut rows = Vec::new();
        for (i, (genre, popularity, explicit)) in [
            ("pop", 80, "True"),
            ("rock", 40, "False"),
            ("pop", 20, "False"),
            ("jazz", 60, "True"),
        ]
        .into_iter()
        .enumerate()
        {
            let mut row = raw(&format!("t{i}"), "A", genre, popularity);
            row.explicit = explicit.to_string();
            rows.push(normalize(&row).unwrap());
        }
        TrackTable::new(rows)
    }

    fn ids(table: &TrackTable) -> Vec<String> {
        table.iter().map(|r| r.track_id.clone()).collect()
    }

    #[test]
    fn conjunction_of_predicates() {
        let filters = FilterSet::new()
            .with(Predicate::one_of("track_genre", ["pop", "jazz"]))
            .with(Predicate::range("popularity", 50.0, 100.0));
        assert_eq!(ids(&filter(&sample(), &filters).unwrap()), vec!["t0", "t3"]);

        let explicit = FilterSet::new().with(Predicate::equals("explicit", false));
        assert_eq!(ids(&filter(&sample(), &explicit).unwrap()), vec!["t1", "t2"]);
    }

    #[test]
    fn discrete_membership_uses_text_form() {
        let filters = FilterSet::new().with(Predicate::one_of("time_signature", ["4"]));
        assert_eq!(filter(&sample(), &filters).unwrap().len(), 4);
        let filters = FilterSet::new().with(Predicate::one_of("genre_group", ["Jazz/Blues"]));
        assert_eq!(ids(&filter(&sample(), &filters).unwrap()), vec!["t3"]);
    }

    #[test]
    fn zero_matches_is_not_an_error() {
        let filters = FilterSet::new().with(Predicate::range("tempo", 300.0, 400.0));
        assert!(filter(&sample(), &filters).unwrap().is_empty());
    }

    #[test]
    fn invalid_filters_are_rejected() {
        let table = sample();
        let cases = [
            (
                Predicate::range("bpm", 0.0, 1.0),
                InvalidFilterError::UnknownField("bpm".to_string()),
            ),
            (
                Predicate::range("energy", 0.9, 0.1),
                InvalidFilterError::MalformedRange {
                    field: "energy".to_string(),
                    min: 0.9,
                    max: 0.1,
                },
            ),
            (
                Predicate::one_of("track_genre", Vec::<String>::new()),
                InvalidFilterError::EmptyMembership("track_genre".to_string()),
            ),
        ];
        for (predicate, expected) in cases {
            let err = filter(&table, &FilterSet::new().with(predicate)).unwrap_err();
            assert_eq!(err, expected);
        }
        assert!(matches!(
            filter(&table, &FilterSet::new().with(Predicate::range("track_genre", 0.0, 1.0))),
            Err(InvalidFilterError::WrongKind { .. })
        ));
        assert!(matches!(
            filter(&table, &FilterSet::new().with(Predicate::equals("energy", true))),
            Err(InvalidFilterError::WrongKind { .. })
        ));
        assert!(matches!(
            filter(&table, &FilterSet::new().with(Predicate::one_of("tempo", ["120"]))),
            Err(InvalidFilterError::WrongKind { .. })
        ));
    }

    #[test]
    fn filtering_leaves_source_untouched() {
        let table = sample();
        let before = table.clone();
        let _ = filter(&table, &FilterSet::new().with(Predicate::equals("explicit", true)));
        assert_eq!(table, before);
    }
}
