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


mod common;

use anyhow::Result;
use common::{catalog, csv_text, write_dataset, Track};
use proptest::prelude::*;
use std::path::Path;
use tempfile::TempDir;
use tonal::pages::artists::ArtistFilters;
use tonal::pages::overview::OverviewFilters;
use tonal::pages::temporal::TemporalFilters;
use tonal::query::{
    bottom_n, filter, group, parse_predicate, top_n, AggregateFunction, Aggregation,
};
use tonal::{
    summarize, AnalyticsConfig, Cell, DatasetLoader, Field, FilterSet, GroupSpec,
    InvalidFilterError, Predicate, TonalAnalytics, TonalError, TrackTable,
};

const GENRES: [&str; 4] = ["pop", "rock", "jazz", "samba"];

fn table_from(tracks: &[Track<'_>]) -> TrackTable {
    DatasetLoader::new()
        .load_from_reader(csv_text(tracks).as_bytes(), Path::new("memory.csv"))
        .expect("fixture loads")
        .table
}

fn catalog_table() -> TrackTable {
    table_from(&catalog())
}

fn ids(table: &TrackTable) -> Vec<String> {
    table.iter().map(|r| r.track_id.clone()).collect()
}

proptest! {
    #[test]
    fn conjunction_equals_sequential_filtering(
        rows in prop::collection::vec((0usize..4, 0i64..=100, 0.0f64..1.0, any::<bool>()), 0..40),
        low in 0.0f64..100.0,
        span in 0.0f64..100.0,
        genre_mask in 1usize..16,
        explicit in any::<bool>(),
    ) {
        let ids: Vec<String> = (0..rows.len()).map(|i| format!("p{i}")).collect();
        let popularity: Vec<String> = rows.iter().map(|r| r.1.to_string()).collect();
        let tracks: Vec<Track<'_>> = rows
            .iter()
            .enumerate()
            .map(|(i, (genre, _, energy, is_explicit))| Track {
                id: &ids[i],
                artists: "Someone",
                album: "Album",
                genre: GENRES[*genre],
                popularity: &popularity[i],
                duration_ms: "200000",
                explicit: *is_explicit,
                energy: *energy,
                tempo: 120.0,
                key: 5,
            })
            .collect();
        let table = table_from(&tracks);

        let genres: Vec<&str> = GENRES
            .iter()
            .enumerate()
            .filter(|(i, _)| genre_mask & (1 << i) != 0)
            .map(|(_, g)| *g)
            .collect();
        let first = FilterSet::new()
            .with(Predicate::range("popularity", low, low + span))
            .with(Predicate::one_of("track_genre", genres));
        let second = FilterSet::new().with(Predicate::equals("explicit", explicit));

        let combined = filter(&table, &first.clone().and(second.clone())).unwrap();
        let sequential = filter(&filter(&table, &first).unwrap(), &second).unwrap();
        prop_assert_eq!(combined, sequential);
    }

    #[test]
    fn top_n_is_sorted_prefix(n in 0usize..12) {
        let table = catalog_table();
        let top = top_n(&table, Field::Popularity, n).unwrap();
        prop_assert_eq!(top.len(), n.min(table.len()));
        let values: Vec<i64> = top.iter().map(|r| r.popularity).collect();
        prop_assert!(values.windows(2).all(|w| w[0] >= w[1]));
    }
}

#[test]
fn test_top_n_beyond_table_returns_everything() -> Result<()> {
    let table = catalog_table();
    let top = top_n(&table, Field::Tempo, 100)?;
    assert_eq!(top.len(), table.len());
    assert_eq!(ids(&top)[..2], ["a3", "a5"]);

    let slowest = bottom_n(&table, Field::Tempo, 2)?;
    assert_eq!(ids(&slowest), vec!["a4", "a6"]);
    Ok(())
}

#[test]
fn test_empty_subset_is_valid_until_aggregated() -> Result<()> {
    let table = catalog_table();
    let empty = filter(&table, &FilterSet::new().with(parse_predicate("tempo=300..400")?))?;
    assert!(empty.is_empty());

    let grouped = group(&empty, &GroupSpec::by(["track_genre"]).aggregate(Aggregation::count()))?;
    assert!(grouped.is_empty());
    assert!(summarize(&empty).is_err());
    assert!(matches!(
        tonal::stats::mean(&empty, Field::Popularity),
        Err(TonalError::EmptyDataset(_))
    ));
    Ok(())
}

#[test]
fn test_grouping_with_mode_tie_break() -> Result<()> {
    let table = catalog_table();
    let spec = GroupSpec::by(["genre_group"])
        .aggregate(Aggregation::count())
        .aggregate(Aggregation::of(AggregateFunction::Max, "popularity"))
        .aggregate(Aggregation::of(AggregateFunction::Mode, "primary_artist"));
    let grouped = group(&table, &spec)?;

    // table order is popularity descending: a2 (Pop) then a5 (Rock)
    let groups: Vec<String> = grouped
        .column("genre_group")?
        .into_iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(groups, vec!["Pop", "Rock", "Jazz/Blues", "Other", "Hip-Hop/R&B"]);
    assert_eq!(grouped.cell(0, "count")?, Some(&Cell::Integer(2)));
    assert_eq!(grouped.cell(1, "max_popularity")?, Some(&Cell::Integer(81)));
    assert_eq!(grouped.cell(0, "mode_primary_artist")?, Some(&Cell::Text("Nina Sol".to_string())));
    Ok(())
}

#[test]
fn test_invalid_filters_fail_before_scanning() {
    let table = catalog_table();
    let unknown = FilterSet::new().with(Predicate::range("loudest", 0.0, 1.0));
    assert_eq!(
        filter(&table, &unknown),
        Err(InvalidFilterError::UnknownField("loudest".to_string()))
    );
    let continuous = GroupSpec::by(["tempo"]).aggregate(Aggregation::count());
    assert!(matches!(
        group(&table, &continuous),
        Err(InvalidFilterError::WrongKind { .. })
    ));
}

#[test]
fn test_analytics_pages_over_a_file() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_dataset(&dir, &csv_text(&catalog()));
    let yaml = format!("dataset_path: {}\ntop_n: 3\n", path.display());
    let analytics = TonalAnalytics::new(AnalyticsConfig::from_yaml_str(&yaml)?)?;

    let overview = analytics.overview(&OverviewFilters {
        explicit: Some(true),
        ..OverviewFilters::default()
    })?;
    assert_eq!(overview.track_count, 3);
    assert_eq!(overview.most_popular.map(|t| t.track_id), Some("a2".to_string()));

    let artists = analytics.artists(&ArtistFilters {
        min_tracks: 2,
        ..ArtistFilters::default()
    })?;
    assert_eq!(artists.artist_count, 2);
    let modal: Vec<_> = artists.by_modal_genre.iter().map(|p| p.genre.as_str()).collect();
    assert_eq!(modal, vec!["pop", "hard-rock"]);

    let comparison =
        analytics.artist_comparison(&ArtistFilters::default(), "Nina Sol", "Os Trovões")?;
    assert_eq!(comparison.first.tracks, 2);
    assert_eq!(comparison.first.mean_popularity, Some(68.0));
    assert_eq!(comparison.second.mean_popularity, Some(64.0));
    assert_eq!(comparison.second.max_popularity, Some(81));
    assert!(analytics
        .artist_comparison(&ArtistFilters::default(), "Nina Sol", "Nobody")
        .is_err());

    let detail = analytics.artist_detail("Os Trovões")?;
    assert_eq!(detail.track_count, 2);
    assert_eq!(detail.genres[0].label, "hard-rock");

    let temporal = analytics.temporal(&TemporalFilters::default())?;
    assert_eq!(temporal.fastest.map(|t| t.track_id), Some("a3".to_string()));
    assert_eq!(analytics.genre_detail("pop")?.top_tracks.len(), 2);

    assert_eq!(analytics.report()?.rows_kept, 7);
    assert!(analytics.store().is_loaded());
    Ok(())
}
