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


use super::{bucket_counts, correlation_or_none, mean_or_none, push_range, LabelCount};
use crate::error::Result;
use crate::query::{
    filter, group, AggregateFunction, Aggregation, FilterSet, GroupSpec, GroupedTable, Predicate,
};
use crate::stats::CorrelationMatrix;
use crate::table::{Field, TrackTable};
use serde::{Deserialize, Serialize};

/// Fields whose per-group means the features page compares.
pub const PROFILE_FIELDS: [Field; 7] = [
    Field::Danceability,
    Field::Energy,
    Field::Valence,
    Field::Acousticness,
    Field::Instrumentalness,
    Field::Speechiness,
    Field::Liveness,
];

pub const CORRELATED_FIELDS: [Field; 11] = [
    Field::Popularity,
    Field::DurationMinutes,
    Field::Danceability,
    Field::Energy,
    Field::Loudness,
    Field::Speechiness,
    Field::Acousticness,
    Field::Instrumentalness,
    Field::Liveness,
    Field::Valence,
    Field::Tempo,
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFilters {
    /// `track_genre` values; empty keeps every genre.
    pub genres: Vec<String>,
    pub popularity: Option<(f64, f64)>,
    pub energy: Option<(f64, f64)>,
    pub danceability: Option<(f64, f64)>,
    pub valence: Option<(f64, f64)>,
}

impl FeatureFilters {
    pub fn filter_set(&self) -> FilterSet {
        let mut predicates = Vec::new();
        if !self.genres.is_empty() {
            predicates.push(Predicate::one_of(Field::TrackGenre.name(), self.genres.clone()));
        }
        push_range(&mut predicates, Field::Popularity, self.popularity);
        push_range(&mut predicates, Field::Energy, self.energy);
        push_range(&mut predicates, Field::Danceability, self.danceability);
        push_range(&mut predicates, Field::Valence, self.valence);
        predicates.into_iter().collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureMeans {
    pub energy: Option<f64>,
    pub danceability: Option<f64>,
    pub valence: Option<f64>,
    pub acousticness: Option<f64>,
}

/// Off-diagonal pair with the largest absolute correlation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrongestPair {
    pub a: Field,
    pub b: Field,
    pub r: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeaturesView {
    pub track_count: usize,
    pub means: FeatureMeans,
    pub by_genre_group: GroupedTable,
    pub energy_buckets: Vec<LabelCount>,
    pub danceability_buckets: Vec<LabelCount>,
    pub key_mode: GroupedTable,
    pub correlation: Option<CorrelationMatrix>,
    pub strongest_pair: Option<StrongestPair>,
}

pub fn build(table: &TrackTable, filters: &FeatureFilters) -> Result<FeaturesView> {
    let subset = filter(table, &filters.filter_set())?;

    let counted = GroupSpec::by([Field::GenreGroup.name()])
        .aggregate(Aggregation::count().with_alias("tracks"));
    let profile = PROFILE_FIELDS.iter().fold(counted, |spec, field| {
        let mean = Aggregation::of(AggregateFunction::Mean, field.name());
        spec.aggregate(mean.with_alias(field.name()))
    });
    let key_mode = GroupSpec::by([Field::KeyLabel.name(), Field::ModeLabel.name()])
        .aggregate(Aggregation::count().with_alias("tracks"));
    let correlation = correlation_or_none(&subset, &CORRELATED_FIELDS)?;

    Ok(FeaturesView {
        track_count: subset.len(),
        means: FeatureMeans {
            energy: mean_or_none(&subset, Field::Energy),
            danceability: mean_or_none(&subset, Field::Danceability),
            valence: mean_or_none(&subset, Field::Valence),
            acousticness: mean_or_none(&subset, Field::Acousticness),
        },
        by_genre_group: group(&subset, &profile)?,
        energy_buckets: bucket_counts(&subset, |r| r.energy_bucket),
        danceability_buckets: bucket_counts(&subset, |r| r.danceability_bucket),
        key_mode: group(&subset, &key_mode)?.sort_by("tracks", true)?,
        strongest_pair: correlation.as_ref().and_then(strongest_pair),
        correlation,
    })
}

pub fn strongest_pair(matrix: &CorrelationMatrix) -> Option<StrongestPair> {
    let mut best: Option<StrongestPair> = None;
    for (i, row) in matrix.values.iter().enumerate() {
        for (j, r) in row.iter().enumerate().skip(i + 1) {
            let Some(r) = *r else { continue };
            if best.as_ref().map_or(true, |b| r.abs() > b.r.abs()) {
                best = Some(StrongestPair {
                    a: matrix.fields[i],
                    b: matrix.fields[j],
                    r,
                });
            }
        }
    }
    best
}
