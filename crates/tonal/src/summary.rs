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

use crate::error::EmptyDatasetError;
use crate::table::TrackTable;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Dataset-level statistics shown once on the overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub total_tracks: usize,
    /// Distinct non-empty primary artists.
    pub total_artists: usize,
    pub total_albums: usize,
    pub total_genres: usize,
    pub mean_duration_minutes: f64,
    pub mean_popularity: f64,
    pub most_popular_track: String,
    pub most_popular_artist: String,
    pub max_popularity: i64,
    pub most_common_genre: String,
    pub most_common_genre_count: usize,
    pub explicit_tracks: usize,
    pub explicit_percentage: f64,
}

pub fn summarize(table: &TrackTable) -> Result<DatasetSummary, EmptyDatasetError> {
    let first = table.get(0).ok_or(EmptyDatasetError::new("summarize"))?;

    let mut artists = HashSet::new();
    let mut albums = HashSet::new();
    let mut genre_counts: IndexMap<&str, usize> = IndexMap::new();
    let mut duration_total = 0.0;
    let mut popularity_total = 0i64;
    let mut explicit_tracks = 0usize;
    let mut top = first;

    for record in table.iter() {
        if !record.primary_artist.is_empty() {
            artists.insert(record.primary_artist.as_str());
        }
        if !record.album_name.is_empty() {
            albums.insert(record.album_name.as_str());
        }
        if !record.track_genre.is_empty() {
            *genre_counts.entry(record.track_genre.as_str()).or_insert(0) += 1;
        }
        duration_total += record.duration_minutes;
        popularity_total += record.popularity;
        if record.explicit {
            explicit_tracks += 1;
        }
        if record.popularity > top.popularity {
            top = record;
        }
    }

    // strict comparison keeps the first genre reaching the top count
    let mut most_common: Option<(&str, usize)> = None;
    for (genre, count) in &genre_counts {
        if most_common.map_or(true, |(_, best)| *count > best) {
            most_common = Some((*genre, *count));
        }
    }
    let (most_common_genre, most_common_genre_count) = most_common.unwrap_or(("", 0));

    let rows = table.len() as f64;
    Ok(DatasetSummary {
        total_tracks: table.len(),
        total_artists: artists.len(),
        total_albums: albums.len(),
        total_genres: genre_counts.len(),
        mean_duration_minutes: duration_total / rows,
        mean_popularity: popularity_total as f64 / rows,
        most_popular_track: top.track_name.clone(),
        most_popular_artist: top.primary_artist.clone(),
        max_popularity: top.popularity,
        most_common_genre: most_common_genre.to_string(),
        most_common_genre_count,
        explicit_tracks,
        explicit_percentage: explicit_tracks as f64 / rows * 100.0,
    })
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Tracks:            {}", self.total_tracks)?;
        writeln!(f, "Artists:           {}", self.total_artists)?;
        writeln!(f, "Albums:            {}", self.total_albums)?;
        writeln!(f, "Genres:            {}", self.total_genres)?;
        writeln!(f, "Mean duration:     {:.2} min", self.mean_duration_minutes)?;
        writeln!(f, "Mean popularity:   {:.1}", self.mean_popularity)?;
        writeln!(
            f,
            "Most popular:      {} by {} ({})",
            self.most_popular_track, self.most_popular_artist, self.max_popularity
        )?;
        writeln!(
            f,
            "Most common genre: {} ({} tracks)",
            self.most_common_genre, self.most_common_genre_count
        )?;
        write!(
            f,
            "Explicit tracks:   {} ({:.1}%)",
            self.explicit_tracks, self.explicit_percentage
        )
    }
}
