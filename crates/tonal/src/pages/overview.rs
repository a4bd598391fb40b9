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


use super::{
    bucket_counts, correlation_or_none, mean_or_none, push_range, top_values, LabelCount,
    TrackBrief,
};
use crate::error::Result;
use crate::query::{filter, FilterSet, Predicate};
use crate::stats::{self, CorrelationMatrix};
use crate::table::{Field, TrackTable};
use crate::taxonomy::GenreGroup;
use serde::{Deserialize, Serialize};

pub const TOP_GENRES: usize = 10;
pub const TOP_ARTISTS: usize = 15;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewFilters {
    /// Genre group label, matched case-insensitively.
    pub genre_group: Option<String>,
    pub popularity: Option<(f64, f64)>,
    pub explicit: Option<bool>,
}

impl OverviewFilters {
    pub fn filter_set(&self) -> FilterSet {
        let mut predicates = Vec::new();
        if let Some(group) = &self.genre_group {
            // unrecognised labels stay as typed and simply match nothing
            let label = GenreGroup::from_label(group).map_or(group.as_str(), |g| g.label());
            predicates.push(Predicate::one_of(Field::GenreGroup.name(), [label]));
        }
        push_range(&mut predicates, Field::Popularity, self.popularity);
        if let Some(explicit) = self.explicit {
            predicates.push(Predicate::equals(Field::Explicit.name(), explicit));
        }
        predicates.into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewView {
    pub track_count: usize,
    pub distinct_artists: usize,
    pub mean_popularity: Option<f64>,
    pub mean_duration_minutes: Option<f64>,
    pub explicit_percentage: Option<f64>,
    pub top_genres: Vec<LabelCount>,
    pub genre_groups: Vec<LabelCount>,
    pub popularity_buckets: Vec<LabelCount>,
    pub top_artists: Vec<LabelCount>,
    pub most_popular: Option<TrackBrief>,
    pub correlation: Option<CorrelationMatrix>,
}

pub fn build(table: &TrackTable, filters: &OverviewFilters) -> Result<OverviewView> {
    let subset = filter(table, &filters.filter_set())?;
    let track_count = subset.len();
    let explicit = subset.iter().filter(|r| r.explicit).count();
    let distinct_artists = stats::frequencies(&subset, Field::PrimaryArtist)
        .iter()
        .filter(|f| f.value.as_str().is_some_and(|s| !s.is_empty()))
        .count();
    let most_popular = if subset.is_empty() {
        None
    } else {
        Some(TrackBrief::from(stats::argmax(&subset, Field::Popularity)?))
    };

    Ok(OverviewView {
        track_count,
        distinct_artists,
        mean_popularity: mean_or_none(&subset, Field::Popularity),
        mean_duration_minutes: mean_or_none(&subset, Field::DurationMinutes),
        explicit_percentage: (track_count > 0)
            .then(|| explicit as f64 / track_count as f64 * 100.0),
        top_genres: top_values(&subset, Field::TrackGenre, TOP_GENRES),
        genre_groups: top_values(&subset, Field::GenreGroup, usize::MAX),
        popularity_buckets: bucket_counts(&subset, |r| r.popularity_bucket),
        top_artists: top_values(&subset, Field::PrimaryArtist, TOP_ARTISTS),
        most_popular,
        correlation: correlation_or_none(&subset, &Field::AUDIO_FEATURES)?,
    })
}
