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
    briefs, bucket_counts, correlation_or_none, mean_or_none, push_range, top_values, LabelCount,
    TrackBrief,
};
use crate::error::Result;
use crate::query::{
    bottom_n, filter, group, top_n, AggregateFunction, Aggregation, FilterSet, GroupSpec,
    GroupedTable, Predicate,
};
use crate::stats::{self, BinGrid, CorrelationMatrix};
use crate::table::{Cell, Field, TrackTable};
use serde::{Deserialize, Serialize};

pub const CLUSTER_BINS: usize = 5;
pub const EXTREMES: usize = 5;
pub const TOP_GENRES: usize = 15;

pub const TEMPORAL_FIELDS: [Field; 8] = [
    Field::DurationMinutes,
    Field::Tempo,
    Field::Popularity,
    Field::Energy,
    Field::Danceability,
    Field::Valence,
    Field::Acousticness,
    Field::Loudness,
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalFilters {
    pub duration_minutes: Option<(f64, f64)>,
    pub tempo: Option<(f64, f64)>,
    /// Empty keeps every time signature.
    pub time_signatures: Vec<i64>,
    pub genre: Option<String>,
}

impl TemporalFilters {
    pub fn filter_set(&self) -> FilterSet {
        let mut predicates = Vec::new();
        push_range(&mut predicates, Field::DurationMinutes, self.duration_minutes);
        push_range(&mut predicates, Field::Tempo, self.tempo);
        if !self.time_signatures.is_empty() {
            predicates.push(Predicate::one_of(
                Field::TimeSignature.name(),
                self.time_signatures.iter().map(ToString::to_string),
            ));
        }
        if let Some(genre) = &self.genre {
            predicates.push(Predicate::one_of(Field::TrackGenre.name(), [genre.as_str()]));
        }
        predicates.into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalView {
    pub track_count: usize,
    pub mean_duration_minutes: Option<f64>,
    pub mean_tempo: Option<f64>,
    pub mean_popularity: Option<f64>,
    pub common_time_signature: Option<i64>,
    pub longest: Option<TrackBrief>,
    pub fastest: Option<TrackBrief>,
    pub tempo_buckets: Vec<LabelCount>,
    pub duration_buckets: Vec<LabelCount>,
    pub modal_tempo_bucket: Option<String>,
    pub modal_duration_bucket: Option<String>,
    pub by_time_signature: GroupedTable,
    pub by_genre: GroupedTable,
    pub clusters: Option<BinGrid>,
    pub slowest_tracks: Vec<TrackBrief>,
    pub fastest_tracks: Vec<TrackBrief>,
    pub longest_tracks: Vec<TrackBrief>,
    pub duration_popularity: Option<f64>,
    pub tempo_energy: Option<f64>,
    pub correlation: Option<CorrelationMatrix>,
}

/// Track count per partition plus a mean column per field, named after it.
fn means(dimension: Field, fields: &[Field]) -> GroupSpec {
    let spec = GroupSpec::by([dimension.name()])
        .aggregate(Aggregation::count().with_alias("tracks"));
    fields.iter().fold(spec, |spec, field| {
        let mean = Aggregation::of(AggregateFunction::Mean, field.name());
        spec.aggregate(mean.with_alias(field.name()))
    })
}

pub fn build(table: &TrackTable, filters: &TemporalFilters) -> Result<TemporalView> {
    let subset = filter(table, &filters.filter_set())?;

    let by_time_signature = means(
        Field::TimeSignature,
        &[
            Field::Popularity,
            Field::DurationMinutes,
            Field::Tempo,
            Field::Energy,
            Field::Danceability,
        ],
    );
    let by_genre = means(
        Field::TrackGenre,
        &[Field::DurationMinutes, Field::Tempo, Field::Popularity, Field::Energy],
    );
    let frequent = top_values(&subset, Field::TrackGenre, TOP_GENRES);
    let frequent_tracks = if frequent.is_empty() {
        TrackTable::default()
    } else {
        let genres = FilterSet::new().with(Predicate::one_of(
            Field::TrackGenre.name(),
            frequent.into_iter().map(|g| g.label),
        ));
        filter(&subset, &genres)?
    };

    let (clusters, longest, fastest) = if subset.is_empty() {
        (None, None, None)
    } else {
        (
            Some(stats::binned_grid(&subset, Field::DurationMinutes, Field::Tempo, CLUSTER_BINS)?),
            Some(TrackBrief::from(stats::argmax(&subset, Field::DurationMinutes)?)),
            Some(TrackBrief::from(stats::argmax(&subset, Field::Tempo)?)),
        )
    };

    Ok(TemporalView {
        track_count: subset.len(),
        mean_duration_minutes: mean_or_none(&subset, Field::DurationMinutes),
        mean_tempo: mean_or_none(&subset, Field::Tempo),
        mean_popularity: mean_or_none(&subset, Field::Popularity),
        common_time_signature: stats::frequencies(&subset, Field::TimeSignature)
            .first()
            .and_then(|f| match f.value {
                Cell::Integer(v) => Some(v),
                _ => None,
            }),
        longest,
        fastest,
        tempo_buckets: bucket_counts(&subset, |r| r.tempo_bucket),
        duration_buckets: bucket_counts(&subset, |r| r.duration_bucket),
        modal_tempo_bucket: modal_label(&subset, Field::TempoBucket),
        modal_duration_bucket: modal_label(&subset, Field::DurationBucket),
        by_time_signature: group(&subset, &by_time_signature)?.sort_by("tracks", true)?,
        by_genre: group(&frequent_tracks, &by_genre)?.sort_by("tracks", true)?,
        clusters,
        slowest_tracks: briefs(&bottom_n(&subset, Field::Tempo, EXTREMES)?),
        fastest_tracks: briefs(&top_n(&subset, Field::Tempo, EXTREMES)?),
        longest_tracks: briefs(&top_n(&subset, Field::DurationMinutes, EXTREMES)?),
        duration_popularity: stats::correlation(
            &subset,
            Field::DurationMinutes,
            Field::Popularity,
        )?,
        tempo_energy: stats::correlation(&subset, Field::Tempo, Field::Energy)?,
        correlation: correlation_or_none(&subset, &TEMPORAL_FIELDS)?,
    })
}

fn modal_label(table: &TrackTable, field: Field) -> Option<String> {
    top_values(table, field, 1).into_iter().next().map(|c| c.label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::fixtures::sample_table;

    fn ids(briefs: &[TrackBrief]) -> Vec<&str> {
        briefs.iter().map(|b| b.track_id.as_str()).collect()
    }

    #[test]
    fn unfiltered_view() {
        let view = build(&sample_table(), &TemporalFilters::default()).unwrap();
        assert_eq!(view.track_count, 6);
        assert_eq!(view.common_time_signature, Some(4));
        assert_eq!(view.longest.as_ref().unwrap().track_id, "t4");
        assert_eq!(view.fastest.as_ref().unwrap().track_id, "t3");
        assert_eq!(ids(&view.slowest_tracks), vec!["t4", "t2", "t6", "t1", "t5"]);
        assert_eq!(ids(&view.longest_tracks)[..2], ["t4", "t3"]);
        assert_eq!(view.by_genre.len(), 4);
        let clusters = view.clusters.unwrap();
        assert_eq!(clusters.counts.len(), CLUSTER_BINS);
        assert_eq!(clusters.counts.iter().flatten().sum::<usize>(), 6);
        assert!(view.tempo_energy.unwrap() > 0.0);
    }

    #[test]
    fn tempo_buckets_in_order() {
        let view = build(&sample_table(), &TemporalFilters::default()).unwrap();
        let labels: Vec<_> = view.tempo_buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels.len(), 5);
        assert_eq!(view.tempo_buckets.iter().map(|b| b.count).sum::<usize>(), 6);
        assert_eq!(view.modal_tempo_bucket.as_deref(), Some(labels[2]));
    }

    #[test]
    fn filters_narrow_every_section() {
        let filters = TemporalFilters {
            tempo: Some((100.0, 140.0)),
            time_signatures: vec![4],
            ..TemporalFilters::default()
        };
        let view = build(&sample_table(), &filters).unwrap();
        assert_eq!(view.track_count, 3);
        assert_eq!(ids(&view.fastest_tracks), vec!["t5", "t1", "t6"]);

        let none = TemporalFilters {
            time_signatures: vec![3],
            ..TemporalFilters::default()
        };
        let view = build(&sample_table(), &none).unwrap();
        assert_eq!(view.track_count, 0);
        assert!(view.clusters.is_none());
        assert!(view.by_time_signature.is_empty());
        assert_eq!(view.duration_popularity, None);
    }
}
