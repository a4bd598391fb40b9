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


//! Data behind the dashboard pages.
//!
//! Each page is a pure function from the canonical table and a filter
//! struct to a serializable view. Views only compose [`crate::query`] and
//! [`crate::stats`]; none of them render anything.

pub mod artists;
pub mod features;
pub mod genres;
pub mod overview;
pub mod temporal;

use crate::buckets::Bucket;
use crate::error::Result;
use crate::query::Predicate;
use crate::record::CanonicalRecord;
use crate::stats::{self, CorrelationMatrix};
use crate::table::{Field, TrackTable};
use serde::Serialize;

/// One labelled count in a bar-style breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Row shown in the "top tracks" style lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackBrief {
    pub track_id: String,
    pub track_name: String,
    pub primary_artist: String,
    pub album_name: String,
    pub track_genre: String,
    pub popularity: i64,
    pub tempo: f64,
    pub duration_minutes: f64,
    pub energy: f64,
    pub danceability: f64,
}

impl From<&CanonicalRecord> for TrackBrief {
    fn from(record: &CanonicalRecord) -> Self {
        Self {
            track_id: record.track_id.clone(),
            track_name: record.track_name.clone(),
            primary_artist: record.primary_artist.clone(),
            album_name: record.album_name.clone(),
            track_genre: record.track_genre.clone(),
            popularity: record.popularity,
            tempo: record.tempo,
            duration_minutes: record.duration_minutes,
            energy: record.energy,
            danceability: record.danceability,
        }
    }
}

pub fn briefs(table: &TrackTable) -> Vec<TrackBrief> {
    table.iter().map(TrackBrief::from).collect()
}

/// Counts per bucket in the bucket's natural order, empty buckets omitted.
pub fn bucket_counts<B, F>(table: &TrackTable, bucket_of: F) -> Vec<LabelCount>
where
    B: Bucket,
    F: Fn(&CanonicalRecord) -> B,
{
    let mut counts = vec![0usize; B::ORDERED.len()];
    for record in table.iter() {
        let bucket = bucket_of(record);
        if let Some(i) = B::ORDERED.iter().position(|b| *b == bucket) {
            counts[i] += 1;
        }
    }
    B::ORDERED
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(bucket, count)| LabelCount {
            label: bucket.label().to_string(),
            count,
        })
        .collect()
}

/// The `n` most frequent values of `field`. Blank text values are not counted.
pub fn top_values(table: &TrackTable, field: Field, n: usize) -> Vec<LabelCount> {
    stats::frequencies(table, field)
        .into_iter()
        .filter(|f| !f.value.is_missing() && !f.value.as_str().is_some_and(str::is_empty))
        .take(n)
        .map(|f| LabelCount {
            label: f.value.to_string(),
            count: f.count,
        })
        .collect()
}

pub(crate) fn mean_or_none(table: &TrackTable, field: Field) -> Option<f64> {
    stats::mean_of(&table.numeric_column(field))
}

pub(crate) fn correlation_or_none(
    table: &TrackTable,
    fields: &[Field],
) -> Result<Option<CorrelationMatrix>> {
    if table.is_empty() {
        return Ok(None);
    }
    stats::correlation_matrix(table, fields).map(Some)
}

// `None` leaves the field unconstrained
pub(crate) fn push_range(predicates: &mut Vec<Predicate>, field: Field, range: Option<(f64, f64)>) {
    if let Some((min, max)) = range {
        predicates.push(Predicate::range(field.name(), min, max));
    }
}
