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


//! Per-artist aggregates. Artists are keyed by `primary_artist`; tracks
//! without one are left out, as are artists failing the HAVING filters.

use super::{briefs, mean_or_none, top_values, LabelCount, TrackBrief};
use crate::error::{EmptyDatasetError, Result};
use crate::query::{
    filter, group, top_n, AggregateFunction, Aggregation, FilterSet, GroupSpec, GroupedTable,
    Predicate,
};
use crate::stats;
use crate::table::{Cell, Field, TrackTable};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const TRACKS: &str = "tracks";
pub const MEAN_POPULARITY: &str = "mean_popularity";
pub const MAX_POPULARITY: &str = "max_popularity";
pub const MODAL_GENRE: &str = "modal_genre";

/// Modal genres shown in the breakdown, most frequent first.
const MODAL_GENRES: usize = 8;

const FEATURE_MEANS: [Field; 5] = [
    Field::Danceability,
    Field::Energy,
    Field::Valence,
    Field::Acousticness,
    Field::DurationMinutes,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtistFilters {
    pub min_tracks: usize,
    pub min_mean_popularity: f64,
    pub modal_genre: Option<String>,
    /// Length of both ranked lists.
    pub limit: usize,
}

impl Default for ArtistFilters {
    fn default() -> Self {
        Self {
            min_tracks: 1,
            min_mean_popularity: 0.0,
            modal_genre: None,
            limit: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistsView {
    pub artist_count: usize,
    pub top_by_popularity: GroupedTable,
    pub most_productive: GroupedTable,
    /// Across the retained artists: mean popularity against track count.
    pub popularity_vs_tracks: Option<f64>,
    pub by_modal_genre: Vec<ModalGenreProfile>,
}

/// Artists sharing a modal genre, averaged over their aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModalGenreProfile {
    pub genre: String,
    pub artists: usize,
    pub mean_popularity: Option<f64>,
    pub mean_tracks: Option<f64>,
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub valence: Option<f64>,
}

/// One side of an artist comparison, read off the artist aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistProfile {
    pub artist: String,
    pub tracks: usize,
    pub mean_popularity: Option<f64>,
    pub max_popularity: Option<i64>,
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub valence: Option<f64>,
    pub acousticness: Option<f64>,
    pub duration_minutes: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistComparison {
    pub first: ArtistProfile,
    pub second: ArtistProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistDetail {
    pub artist: String,
    pub track_count: usize,
    pub mean_popularity: Option<f64>,
    pub max_popularity: Option<i64>,
    pub mean_tempo: Option<f64>,
    pub genres: Vec<LabelCount>,
    pub top_tracks: Vec<TrackBrief>,
}

pub fn artist_spec() -> GroupSpec {
    let popularity = Field::Popularity.name();
    let spec = GroupSpec::by([Field::PrimaryArtist.name()])
        .aggregate(Aggregation::count().with_alias(TRACKS))
        .aggregate(Aggregation::of(AggregateFunction::Mean, popularity).with_alias(MEAN_POPULARITY))
        .aggregate(Aggregation::of(AggregateFunction::Max, popularity).with_alias(MAX_POPULARITY));
    FEATURE_MEANS
        .iter()
        .fold(spec, |spec, field| {
            let mean = Aggregation::of(AggregateFunction::Mean, field.name());
            spec.aggregate(mean.with_alias(field.name()))
        })
        .aggregate(
            Aggregation::of(AggregateFunction::Mode, Field::TrackGenre.name())
                .with_alias(MODAL_GENRE),
        )
}

/// Artist aggregates after the HAVING filters, in first-appearance order.
pub fn artist_stats(table: &TrackTable, filters: &ArtistFilters) -> Result<GroupedTable> {
    let credited = table.retain_rows(|r| !r.primary_artist.is_empty());
    let mut stats = group(&credited, &artist_spec())?
        .filter_range(TRACKS, filters.min_tracks as f64, f64::MAX)?
        .filter_range(MEAN_POPULARITY, filters.min_mean_popularity, f64::MAX)?;
    if let Some(genre) = &filters.modal_genre {
        stats = stats.filter_values(MODAL_GENRE, std::slice::from_ref(genre))?;
    }
    Ok(stats)
}

pub fn build(table: &TrackTable, filters: &ArtistFilters) -> Result<ArtistsView> {
    let stats = artist_stats(table, filters)?;
    let tracks = numeric_cells(&stats, TRACKS)?;
    let popularity = numeric_cells(&stats, MEAN_POPULARITY)?;
    Ok(ArtistsView {
        artist_count: stats.len(),
        popularity_vs_tracks: stats::pearson(&popularity, &tracks),
        by_modal_genre: modal_genre_profiles(&stats, MODAL_GENRES)?,
        top_by_popularity: stats.clone().sort_by(MEAN_POPULARITY, true)?.head(filters.limit),
        most_productive: stats.sort_by(TRACKS, true)?.head(filters.limit),
    })
}

/// The `n` most common modal genres among the artists in `stats`.
/// Ties keep the order in which the genre first appears.
pub fn modal_genre_profiles(stats: &GroupedTable, n: usize) -> Result<Vec<ModalGenreProfile>> {
    let genre_at = stats.column_index(MODAL_GENRE)?;
    let mut members: IndexMap<&str, Vec<usize>> = IndexMap::new();
    for (index, row) in stats.rows().iter().enumerate() {
        if let Some(genre) = row[genre_at].as_str() {
            members.entry(genre).or_default().push(index);
        }
    }
    let mut members: Vec<_> = members.into_iter().collect();
    members.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    let mean_over = |rows: &[usize], column: &str| -> Result<Option<f64>> {
        let at = stats.column_index(column)?;
        let values: Vec<f64> = rows
            .iter()
            .filter_map(|&row| stats.rows()[row][at].as_f64())
            .collect();
        Ok(stats::mean_of(&values))
    };
    members
        .into_iter()
        .take(n)
        .map(|(genre, rows)| {
            Ok(ModalGenreProfile {
                genre: genre.to_string(),
                artists: rows.len(),
                mean_popularity: mean_over(&rows, MEAN_POPULARITY)?,
                mean_tracks: mean_over(&rows, TRACKS)?,
                danceability: mean_over(&rows, Field::Danceability.name())?,
                energy: mean_over(&rows, Field::Energy.name())?,
                valence: mean_over(&rows, Field::Valence.name())?,
            })
        })
        .collect()
}

/// Side-by-side aggregates for two artists retained by `filters`.
pub fn artist_comparison(
    table: &TrackTable,
    filters: &ArtistFilters,
    first: &str,
    second: &str,
) -> Result<ArtistComparison> {
    let stats = artist_stats(table, filters)?;
    Ok(ArtistComparison {
        first: artist_profile(&stats, first)?,
        second: artist_profile(&stats, second)?,
    })
}

fn artist_profile(stats: &GroupedTable, artist: &str) -> Result<ArtistProfile> {
    let row = stats
        .column(Field::PrimaryArtist.name())?
        .iter()
        .position(|cell| cell.as_str() == Some(artist))
        .ok_or(EmptyDatasetError::new("artist_comparison"))?;
    let number = |column: &str| -> Result<Option<f64>> {
        Ok(stats.cell(row, column)?.and_then(Cell::as_f64))
    };
    Ok(ArtistProfile {
        artist: artist.to_string(),
        tracks: number(TRACKS)?.map_or(0, |v| v as usize),
        mean_popularity: number(MEAN_POPULARITY)?,
        max_popularity: number(MAX_POPULARITY)?.map(|v| v as i64),
        danceability: number(Field::Danceability.name())?,
        energy: number(Field::Energy.name())?,
        valence: number(Field::Valence.name())?,
        acousticness: number(Field::Acousticness.name())?,
        duration_minutes: number(Field::DurationMinutes.name())?,
    })
}

/// Drill-down on one artist over the whole table.
pub fn artist_detail(table: &TrackTable, artist: &str, limit: usize) -> Result<ArtistDetail> {
    let filters =
        FilterSet::new().with(Predicate::one_of(Field::PrimaryArtist.name(), [artist]));
    let tracks = filter(table, &filters)?;
    if tracks.is_empty() {
        return Err(EmptyDatasetError::new("artist_detail").into());
    }
    Ok(ArtistDetail {
        artist: artist.to_string(),
        track_count: tracks.len(),
        mean_popularity: mean_or_none(&tracks, Field::Popularity),
        max_popularity: tracks.iter().map(|r| r.popularity).max(),
        mean_tempo: mean_or_none(&tracks, Field::Tempo),
        genres: top_values(&tracks, Field::TrackGenre, usize::MAX),
        top_tracks: briefs(&top_n(&tracks, Field::Popularity, limit)?),
    })
}

fn numeric_cells(table: &GroupedTable, column: &str) -> Result<Vec<f64>> {
    Ok(table
        .column(column)?
        .into_iter()
        .map(|cell| cell.as_f64().unwrap_or(f64::NAN))
        .collect())
}

/// Display names of the retained artists, sorted, for pickers.
pub fn artist_names(stats: &GroupedTable) -> Result<Vec<String>> {
    let mut names: Vec<String> = stats
        .column(Field::PrimaryArtist.name())?
        .into_iter()
        .filter_map(Cell::as_str)
        .map(str::to_string)
        .collect();
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TonalError;
    use crate::pages::fixtures::{sample_table, Fixture};

    fn solo<'a>(id: &'a str, genre: &'a str, popularity: i64) -> Fixture<'a> {
        Fixture {
            id,
            artists: id,
            genre,
            popularity,
            tempo: 120.0,
            duration_ms: 200_000,
            energy: 0.5,
            explicit: false,
        }
    }

    #[test]
    fn aggregates_per_primary_artist() {
        let stats = artist_stats(&sample_table(), &ArtistFilters::default()).unwrap();
        assert_eq!(artist_names(&stats).unwrap(), vec!["Ana", "Caio", "Dora", "Eli"]);
        assert_eq!(stats.cell(0, TRACKS).unwrap(), Some(&Cell::Integer(2)));
        assert_eq!(stats.cell(0, MEAN_POPULARITY).unwrap(), Some(&Cell::Number(70.0)));
        assert_eq!(stats.cell(0, MAX_POPULARITY).unwrap(), Some(&Cell::Integer(80)));
        assert_eq!(
            stats.cell(1, MODAL_GENRE).unwrap(),
            Some(&Cell::Text("rock".to_string()))
        );
    }

    #[test]
    fn having_filters_drop_artists() {
        let filters = ArtistFilters {
            min_tracks: 2,
            min_mean_popularity: 50.0,
            ..ArtistFilters::default()
        };
        let stats = artist_stats(&sample_table(), &filters).unwrap();
        assert_eq!(artist_names(&stats).unwrap(), vec!["Ana"]);

        let filters = ArtistFilters {
            modal_genre: Some("jazz".to_string()),
            ..ArtistFilters::default()
        };
        let stats = artist_stats(&sample_table(), &filters).unwrap();
        assert_eq!(artist_names(&stats).unwrap(), vec!["Dora"]);
    }

    #[test]
    fn ranked_lists() {
        let filters = ArtistFilters {
            limit: 2,
            ..ArtistFilters::default()
        };
        let view = build(&sample_table(), &filters).unwrap();
        assert_eq!(view.artist_count, 4);
        let top: Vec<String> = view
            .top_by_popularity
            .column(Field::PrimaryArtist.name())
            .unwrap()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(top, vec!["Eli", "Ana"]);
        let productive: Vec<String> = view
            .most_productive
            .column(Field::PrimaryArtist.name())
            .unwrap()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(productive, vec!["Ana", "Caio"]);
        assert!(view.popularity_vs_tracks.is_some());
    }

    #[test]
    fn detail_lists_tracks_by_popularity() {
        let detail = artist_detail(&sample_table(), "Caio", 10).unwrap();
        assert_eq!(detail.track_count, 2);
        assert_eq!(detail.max_popularity, Some(50));
        assert_eq!(detail.mean_tempo, Some(140.0));
        let ids: Vec<_> = detail.top_tracks.iter().map(|t| t.track_id.as_str()).collect();
        assert_eq!(ids, vec!["t5", "t3"]);
        assert!(matches!(
            artist_detail(&sample_table(), "Nobody", 10),
            Err(TonalError::EmptyDataset(_))
        ));
    }

    #[test]
    fn modal_genres_rank_by_artist_count() {
        let table = TrackTable::new(
            [solo("X", "rock", 30), solo("Y", "pop", 70), solo("Z", "rock", 50)]
                .iter()
                .map(Fixture::build)
                .collect(),
        );
        let view = build(&table, &ArtistFilters::default()).unwrap();
        let genres: Vec<_> = view.by_modal_genre.iter().map(|p| p.genre.as_str()).collect();
        assert_eq!(genres, vec!["rock", "pop"]);
        let rock = &view.by_modal_genre[0];
        assert_eq!(rock.artists, 2);
        assert_eq!(rock.mean_popularity, Some(40.0));
        assert_eq!(rock.mean_tracks, Some(1.0));
        assert_eq!(rock.energy, Some(0.5));
    }

    #[test]
    fn modal_genre_breakdown_keeps_eight_genres() {
        let names: Vec<String> = (0..10).map(|i| format!("g{i}")).collect();
        let table = TrackTable::new(
            names
                .iter()
                .map(|name| solo(name, name, 50).build())
                .collect(),
        );
        let view = build(&table, &ArtistFilters::default()).unwrap();
        assert_eq!(view.artist_count, 10);
        assert_eq!(view.by_modal_genre.len(), 8);
        assert_eq!(view.by_modal_genre[0].genre, "g0");
    }

    #[test]
    fn compares_two_artists() {
        let comparison =
            artist_comparison(&sample_table(), &ArtistFilters::default(), "Ana", "Caio").unwrap();
        assert_eq!(comparison.first.artist, "Ana");
        assert_eq!(comparison.first.tracks, 2);
        assert_eq!(comparison.first.mean_popularity, Some(70.0));
        assert_eq!(comparison.first.max_popularity, Some(80));
        assert_eq!(comparison.second.tracks, 2);
        assert_eq!(comparison.second.mean_popularity, Some(45.0));
        assert_eq!(comparison.second.max_popularity, Some(50));
        assert_eq!(comparison.second.duration_minutes, Some(4.5));
        assert_eq!(comparison.second.acousticness, Some(0.2));
    }

    #[test]
    fn comparison_needs_both_artists_retained() {
        let filters = ArtistFilters {
            min_tracks: 2,
            ..ArtistFilters::default()
        };
        assert!(matches!(
            artist_comparison(&sample_table(), &filters, "Ana", "Dora"),
            Err(TonalError::EmptyDataset(_))
        ));
        assert!(matches!(
            artist_comparison(&sample_table(), &ArtistFilters::default(), "Nobody", "Ana"),
            Err(TonalError::EmptyDataset(_))
        ));
    }
}
