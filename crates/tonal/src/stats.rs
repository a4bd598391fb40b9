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

//! Scalar and matrix statistics over a [`TrackTable`].
//!
//! Operations that are undefined on zero rows return [`EmptyDatasetError`];
//! everything else treats an empty table as a normal input.

use crate::error::{EmptyDatasetError, InvalidFilterError, Result};
use crate::record::CanonicalRecord;
use crate::table::{Cell, Field, TrackTable, ValueKey};
use indexmap::IndexMap;
use serde::Serialize;

pub fn mean_of(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (n - 1); `None` below two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean_of(values)?;
    let variance =
        values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Pearson correlation; `None` for fewer than two pairs or zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mean_x = mean_of(xs)?;
    let mean_y = mean_of(ys)?;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

pub fn mean(table: &TrackTable, field: Field) -> Result<f64> {
    field.require_numeric()?;
    let values = table.numeric_column(field);
    mean_of(&values).ok_or_else(|| EmptyDatasetError::new("mean").into())
}

/// Row holding the largest value of `field`; the first one wins on ties.
pub fn argmax(table: &TrackTable, field: Field) -> Result<&CanonicalRecord> {
    field.require_numeric()?;
    let mut best: Option<(&CanonicalRecord, f64)> = None;
    for record in table.iter() {
        if let Some(value) = field.value(record).as_f64() {
            if best.map_or(true, |(_, top)| value > top) {
                best = Some((record, value));
            }
        }
    }
    best.map(|(record, _)| record)
        .ok_or_else(|| EmptyDatasetError::new("argmax").into())
}

/// Row holding the smallest value of `field`; the first one wins on ties.
pub fn argmin(table: &TrackTable, field: Field) -> Result<&CanonicalRecord> {
    field.require_numeric()?;
    let mut best: Option<(&CanonicalRecord, f64)> = None;
    for record in table.iter() {
        if let Some(value) = field.value(record).as_f64() {
            if best.map_or(true, |(_, low)| value < low) {
                best = Some((record, value));
            }
        }
    }
    best.map(|(record, _)| record)
        .ok_or_else(|| EmptyDatasetError::new("argmin").into())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frequency {
    pub value: Cell,
    pub count: usize,
}

/// Value counts, most frequent first; ties keep first-appearance order.
pub fn frequencies(table: &TrackTable, field: Field) -> Vec<Frequency> {
    let mut counts: IndexMap<ValueKey, usize> = IndexMap::new();
    for record in table.iter() {
        *counts.entry(field.value(record).to_key()).or_insert(0) += 1;
    }
    let mut out: Vec<Frequency> = counts
        .into_iter()
        .map(|(key, count)| Frequency {
            value: key.to_cell(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub fields: Vec<Field>,
    /// Row-major, `values[i][j]` correlates `fields[i]` with `fields[j]`.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Field, b: Field) -> Option<f64> {
        let i = self.fields.iter().position(|f| *f == a)?;
        let j = self.fields.iter().position(|f| *f == b)?;
        self.values[i][j]
    }
}

pub fn correlation_matrix(table: &TrackTable, fields: &[Field]) -> Result<CorrelationMatrix> {
    for field in fields {
        field.require_numeric()?;
    }
    if table.is_empty() {
        return Err(EmptyDatasetError::new("correlation_matrix").into());
    }
    let columns: Vec<Vec<f64>> = fields.iter().map(|f| table.numeric_column(*f)).collect();
    let values = columns
        .iter()
        .map(|x| columns.iter().map(|y| pearson(x, y)).collect())
        .collect();
    Ok(CorrelationMatrix {
        fields: fields.to_vec(),
        values,
    })
}

/// Correlation of two numeric fields, `None` when undefined.
pub fn correlation(table: &TrackTable, a: Field, b: Field) -> Result<Option<f64>> {
    a.require_numeric()?;
    b.require_numeric()?;
    Ok(pearson(&table.numeric_column(a), &table.numeric_column(b)))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Edges of `bins` equal-width intervals over `[min, max]`.
///
/// A zero-width range is widened by 0.1% on each side (or by 0.001 around
/// zero) so a constant column still gets `bins` intervals.
pub fn bin_edges(min: f64, max: f64, bins: usize) -> Vec<f64> {
    let (lo, hi) = if min == max {
        let pad = if min == 0.0 { 0.001 } else { min.abs() * 0.001 };
        (min - pad, max + pad)
    } else {
        (min, max)
    };
    let width = (hi - lo) / bins as f64;
    let mut edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    edges[bins] = hi;
    edges
}

/// Index of the interval holding `value`: the first is closed on both
/// sides, the others are closed on the right only.
pub fn bin_index(edges: &[f64], value: f64) -> usize {
    let last = edges.len().saturating_sub(2);
    edges
        .iter()
        .skip(1)
        .position(|upper| value <= *upper)
        .unwrap_or(last)
        .min(last)
}

pub fn equal_width_bins(table: &TrackTable, field: Field, bins: usize) -> Result<Vec<Bin>> {
    field.require_numeric()?;
    if bins == 0 {
        return Err(InvalidFilterError::ZeroBins.into());
    }
    let values = table.numeric_column(field);
    let (min, max) = min_max(&values).ok_or(EmptyDatasetError::new("equal_width_bins"))?;
    let edges = bin_edges(min, max, bins);
    let mut counts = vec![0usize; bins];
    for value in values {
        counts[bin_index(&edges, value)] += 1;
    }
    Ok(edges
        .windows(2)
        .zip(counts)
        .map(|(w, count)| Bin {
            lower: w[0],
            upper: w[1],
            count,
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinGrid {
    pub x: Field,
    pub y: Field,
    pub x_edges: Vec<f64>,
    pub y_edges: Vec<f64>,
    /// `counts[i][j]` rows with `x` in interval `i` and `y` in interval `j`.
    pub counts: Vec<Vec<usize>>,
}

/// Joint equal-width histogram of two numeric fields.
pub fn binned_grid(table: &TrackTable, x: Field, y: Field, bins: usize) -> Result<BinGrid> {
    x.require_numeric()?;
    y.require_numeric()?;
    if bins == 0 {
        return Err(InvalidFilterError::ZeroBins.into());
    }
    let xs = table.numeric_column(x);
    let ys = table.numeric_column(y);
    let empty = || EmptyDatasetError::new("binned_grid");
    let (x_min, x_max) = min_max(&xs).ok_or_else(empty)?;
    let (y_min, y_max) = min_max(&ys).ok_or_else(empty)?;
    let x_edges = bin_edges(x_min, x_max, bins);
    let y_edges = bin_edges(y_min, y_max, bins);
    let mut counts = vec![vec![0usize; bins]; bins];
    for (xv, yv) in xs.iter().zip(&ys) {
        counts[bin_index(&x_edges, *xv)][bin_index(&y_edges, *yv)] += 1;
    }
    Ok(BinGrid {
        x,
        y,
        x_edges,
        y_edges,
        counts,
    })
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TonalError;
    use crate::normalize::normalize;
    use crate::normalize::tests::raw;

    fn table_with_tempos(tempos: &[f64]) -> TrackTable {
        TrackTable::new(
            tempos
                .iter()
                .enumerate()
                .map(|(i, tempo)| {
                    let mut row = raw(&format!("t{i}"), "A", "pop", 10 + i as i64);
                    row.tempo = tempo.to_string();
                    normalize(&row).unwrap()
                })
                .collect(),
        )
    }

    #[test]
    fn std_dev_is_sample_based() {
        assert_eq!(sample_std_dev(&[1.0]), None);
        let sd = sample_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - 2.138_089_935).abs() < 1e-6);
    }

    #[test]
    fn pearson_edge_cases() {
        assert_eq!(pearson(&[1.0], &[2.0]), None);
        assert_eq!(pearson(&[1.0, 1.0], &[2.0, 3.0]), None);
        let r = pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        let r = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn mean_and_argmax_on_empty_table() {
        let empty = TrackTable::default();
        assert!(matches!(
            mean(&empty, Field::Tempo),
            Err(TonalError::EmptyDataset(_))
        ));
        assert!(matches!(
            argmax(&empty, Field::Popularity),
            Err(TonalError::EmptyDataset(_))
        ));
        assert!(matches!(
            mean(&empty, Field::TrackGenre),
            Err(TonalError::InvalidFilter(_))
        ));
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        let table = table_with_tempos(&[90.0, 150.0, 150.0, 80.0]);
        assert_eq!(argmax(&table, Field::Tempo).unwrap().track_id, "t1");
        assert_eq!(argmin(&table, Field::Tempo).unwrap().track_id, "t3");
    }

    #[test]
    fn frequencies_break_ties_by_first_appearance() {
        let table = TrackTable::new(
            ["rock", "jazz", "jazz", "rock", "pop"]
                .iter()
                .enumerate()
                .map(|(i, g)| normalize(&raw(&format!("t{i}"), "A", g, 1)).unwrap())
                .collect(),
        );
        let freq = frequencies(&table, Field::TrackGenre);
        let labels: Vec<_> = freq
            .iter()
            .map(|f| (f.value.to_string(), f.count))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("rock".to_string(), 2),
                ("jazz".to_string(), 2),
                ("pop".to_string(), 1)
            ]
        );
    }

    #[test]
    fn equal_width_bins_cover_every_row() {
        let table = table_with_tempos(&[60.0, 70.0, 80.0, 90.0, 100.0]);
        let bins = equal_width_bins(&table, Field::Tempo, 4).unwrap();
        assert_eq!(bins.len(), 4);
        assert_eq!(bins[0].lower, 60.0);
        assert_eq!(bins[3].upper, 100.0);
        // [60,70] (70,80] (80,90] (90,100]
        let counts: Vec<_> = bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 1, 1, 1]);
    }

    #[test]
    fn constant_column_fills_one_bin() {
        let table = table_with_tempos(&[120.0, 120.0, 120.0]);
        let bins = equal_width_bins(&table, Field::Tempo, 5).unwrap();
        assert_eq!(bins.len(), 5);
        assert_eq!(bins.iter().filter(|b| b.count > 0).count(), 1);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);
    }

    #[test]
    fn bin_errors() {
        let table = table_with_tempos(&[120.0]);
        assert!(matches!(
            equal_width_bins(&table, Field::Tempo, 0),
            Err(TonalError::InvalidFilter(InvalidFilterError::ZeroBins))
        ));
        assert!(matches!(
            equal_width_bins(&TrackTable::default(), Field::Tempo, 3),
            Err(TonalError::EmptyDataset(_))
        ));
    }

    #[test]
    fn correlation_matrix_is_symmetric() {
        let table = table_with_tempos(&[60.0, 90.0, 120.0, 150.0]);
        let matrix =
            correlation_matrix(&table, &[Field::Tempo, Field::Popularity, Field::Energy]).unwrap();
        assert!((matrix.get(Field::Tempo, Field::Popularity).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(
            matrix.get(Field::Tempo, Field::Popularity),
            matrix.get(Field::Popularity, Field::Tempo)
        );
        // constant energy column
        assert_eq!(matrix.get(Field::Energy, Field::Tempo), None);
    }

    #[test]
    fn grid_counts_sum_to_rows() {
        let table = table_with_tempos(&[60.0, 90.0, 120.0, 150.0, 180.0]);
        let grid = binned_grid(&table, Field::DurationMinutes, Field::Tempo, 5).unwrap();
        let total: usize = grid.counts.iter().flatten().sum();
        assert_eq!(total, 5);
    }
}
