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


use super::{briefs, mean_or_none, top_values, LabelCount, TrackBrief};
use crate::error::{EmptyDatasetError, Result};
use crate::query::{
    filter, group, top_n, AggregateFunction, Aggregation, FilterSet, GroupSpec, GroupedTable,
    Predicate,
};
use crate::table::{Field, TrackTable};
use serde::{Deserialize, Serialize};

pub const TRACKS: &str = "tracks";
pub const MEAN_POPULARITY: &str = "mean_popularity";
pub const STD_POPULARITY: &str = "std_popularity";
pub const MAX_POPULARITY: &str = "max_popularity";

/// Per-genre means, each aliased to the bare field name.
pub const PROFILE_FIELDS: [Field; 11] = [
    Field::Danceability,
    Field::Energy,
    Field::Valence,
    Field::Acousticness,
    Field::Instrumentalness,
    Field::Liveness,
    Field::Speechiness,
    Field::Tempo,
    Field::DurationMinutes,
    Field::Loudness,
    Field::Popularity,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenreFilters {
    pub min_tracks: usize,
    pub min_mean_popularity: f64,
    pub min_energy: f64,
    pub min_danceability: f64,
    pub limit: usize,
}

impl Default for GenreFilters {
    fn default() -> Self {
        Self {
            min_tracks: 1,
            min_mean_popularity: 0.0,
            min_energy: 0.0,
            min_danceability: 0.0,
            limit: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenresView {
    pub genre_count: usize,
    pub largest: GroupedTable,
    pub by_genre_group: GroupedTable,
    pub most_common: Option<LabelCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreDetail {
    pub genre: String,
    pub track_count: usize,
    pub mean_popularity: Option<f64>,
    pub top_artists: Vec<LabelCount>,
    pub top_tracks: Vec<TrackBrief>,
}

fn profile(dimension: Field) -> GroupSpec {
    let spec = GroupSpec::by([dimension.name()])
        .aggregate(Aggregation::count().with_alias(TRACKS))
        .aggregate(
            Aggregation::of(AggregateFunction::StdDev, Field::Popularity.name())
                .with_alias(STD_POPULARITY),
        )
        .aggregate(
            Aggregation::of(AggregateFunction::Max, Field::Popularity.name())
                .with_alias(MAX_POPULARITY),
        );
    PROFILE_FIELDS.iter().fold(spec, |spec, field| {
        let alias = if *field == Field::Popularity { MEAN_POPULARITY } else { field.name() };
        spec.aggregate(Aggregation::of(AggregateFunction::Mean, field.name()).with_alias(alias))
    })
}

/// Genre aggregates after the HAVING filters, in first-appearance order.
pub fn genre_stats(table: &TrackTable, filters: &GenreFilters) -> Result<GroupedTable> {
    Ok(group(table, &profile(Field::TrackGenre))?
        .filter_range(TRACKS, filters.min_tracks as f64, f64::MAX)?
        .filter_range(MEAN_POPULARITY, filters.min_mean_popularity, f64::MAX)?
        .filter_range(Field::Energy.name(), filters.min_energy, f64::MAX)?
        .filter_range(Field::Danceability.name(), filters.min_danceability, f64::MAX)?)
}

pub fn build(table: &TrackTable, filters: &GenreFilters) -> Result<GenresView> {
    let stats = genre_stats(table, filters)?;
    Ok(GenresView {
        genre_count: stats.len(),
        largest: stats.sort_by(TRACKS, true)?.head(filters.limit),
        by_genre_group: group(table, &profile(Field::GenreGroup))?.sort_by(TRACKS, true)?,
        most_common: top_values(table, Field::TrackGenre, 1).into_iter().next(),
    })
}

pub fn genre_detail(table: &TrackTable, genre: &str, limit: usize) -> Result<GenreDetail> {
    let filters = FilterSet::new().with(Predicate::one_of(Field::TrackGenre.name(), [genre]));
    let tracks = filter(table, &filters)?;
    if tracks.is_empty() {
        return Err(EmptyDatasetError::new("genre_detail").into());
    }
    Ok(GenreDetail {
        genre: genre.to_string(),
        track_count: tracks.len(),
        mean_popularity: mean_or_none(&tracks, Field::Popularity),
        top_artists: top_values(&tracks, Field::PrimaryArtist, limit),
        top_tracks: briefs(&top_n(&tracks, Field::Popularity, limit)?),
    })
}
