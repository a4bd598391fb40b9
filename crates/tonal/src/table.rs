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

use crate::buckets::Bucket;
use crate::error::{FilterResult, InvalidFilterError};
use crate::record::CanonicalRecord;
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Ordered, immutable collection of canonical records.
///
/// Rows are shared behind `Arc`, so a filtered subset is a new table that
/// never aliases mutable state of its source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackTable {
    rows: Vec<Arc<CanonicalRecord>>,
}

impl TrackTable {
    pub fn new(rows: Vec<CanonicalRecord>) -> Self {
        Self {
            rows: rows.into_iter().map(Arc::new).collect(),
        }
    }
    pub fn from_shared(rows: Vec<Arc<CanonicalRecord>>) -> Self {
        Self { rows }
    }
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
    pub fn get(&self, index: usize) -> Option<&CanonicalRecord> {
        self.rows.get(index).map(|row| &**row)
    }
    pub fn iter(&self) -> impl Iterator<Item = &CanonicalRecord> + '_ {
        self.rows.iter().map(|row| &**row)
    }
    pub fn shared_rows(&self) -> &[Arc<CanonicalRecord>] {
        &self.rows
    }
    /// New table holding the rows that satisfy `keep`, in table order.
    pub fn retain_rows<F>(&self, keep: F) -> TrackTable
    where
        F: Fn(&CanonicalRecord) -> bool,
    {
        Self {
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
    /// Non-missing numeric values of `field`, in table order.
    pub fn numeric_column(&self, field: Field) -> Vec<f64> {
        self.iter().filter_map(|r| field.value(r).as_f64()).collect()
    }
}

impl Serialize for TrackTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Continuous,
    Discrete,
    Categorical,
    Boolean,
}

impl FieldKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldKind::Continuous | FieldKind::Discrete)
    }
    pub fn describe(self) -> &'static str {
        match self {
            FieldKind::Continuous => "continuous numeric",
            FieldKind::Discrete => "discrete numeric",
            FieldKind::Categorical => "categorical",
            FieldKind::Boolean => "boolean",
        }
    }
}

/// Every addressable column of a canonical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    TrackId,
    Artists,
    AlbumName,
    TrackName,
    Popularity,
    DurationMs,
    Explicit,
    Danceability,
    Energy,
    Key,
    Loudness,
    Mode,
    Speechiness,
    Acousticness,
    Instrumentalness,
    Liveness,
    Valence,
    Tempo,
    TimeSignature,
    TrackGenre,
    DurationSeconds,
    DurationMinutes,
    PrimaryArtist,
    HasFeature,
    PopularityBucket,
    EnergyBucket,
    DanceabilityBucket,
    DurationBucket,
    TempoBucket,
    KeyLabel,
    ModeLabel,
    GenreGroup,
}

impl Field {
    pub const ALL: [Field; 32] = [
        Field::TrackId,
        Field::Artists,
        Field::AlbumName,
        Field::TrackName,
        Field::Popularity,
        Field::DurationMs,
        Field::Explicit,
        Field::Danceability,
        Field::Energy,
        Field::Key,
        Field::Loudness,
        Field::Mode,
        Field::Speechiness,
        Field::Acousticness,
        Field::Instrumentalness,
        Field::Liveness,
        Field::Valence,
        Field::Tempo,
        Field::TimeSignature,
        Field::TrackGenre,
        Field::DurationSeconds,
        Field::DurationMinutes,
        Field::PrimaryArtist,
        Field::HasFeature,
        Field::PopularityBucket,
        Field::EnergyBucket,
        Field::DanceabilityBucket,
        Field::DurationBucket,
        Field::TempoBucket,
        Field::KeyLabel,
        Field::ModeLabel,
        Field::GenreGroup,
    ];

    /// The audio features shown together in correlation heatmaps.
    pub const AUDIO_FEATURES: [Field; 11] = [
        Field::Danceability,
        Field::Energy,
        Field::Loudness,
        Field::Speechiness,
        Field::Acousticness,
        Field::Instrumentalness,
        Field::Liveness,
        Field::Valence,
        Field::Tempo,
        Field::Popularity,
        Field::DurationMinutes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::TrackId => "track_id",
            Field::Artists => "artists",
            Field::AlbumName => "album_name",
            Field::TrackName => "track_name",
            Field::Popularity => "popularity",
            Field::DurationMs => "duration_ms",
            Field::Explicit => "explicit",
            Field::Danceability => "danceability",
            Field::Energy => "energy",
            Field::Key => "key",
            Field::Loudness => "loudness",
            Field::Mode => "mode",
            Field::Speechiness => "speechiness",
            Field::Acousticness => "acousticness",
            Field::Instrumentalness => "instrumentalness",
            Field::Liveness => "liveness",
            Field::Valence => "valence",
            Field::Tempo => "tempo",
            Field::TimeSignature => "time_signature",
            Field::TrackGenre => "track_genre",
            Field::DurationSeconds => "duration_seconds",
            Field::DurationMinutes => "duration_minutes",
            Field::PrimaryArtist => "primary_artist",
            Field::HasFeature => "has_feature",
            Field::PopularityBucket => "popularity_bucket",
            Field::EnergyBucket => "energy_bucket",
            Field::DanceabilityBucket => "danceability_bucket",
            Field::DurationBucket => "duration_bucket",
            Field::TempoBucket => "tempo_bucket",
            Field::KeyLabel => "key_label",
            Field::ModeLabel => "mode_label",
            Field::GenreGroup => "genre_group",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Danceability
            | Field::Energy
            | Field::Loudness
            | Field::Speechiness
            | Field::Acousticness
            | Field::Instrumentalness
            | Field::Liveness
            | Field::Valence
            | Field::Tempo
            | Field::DurationSeconds
            | Field::DurationMinutes => FieldKind::Continuous,
            Field::Popularity
            | Field::DurationMs
            | Field::Key
            | Field::Mode
            | Field::TimeSignature => FieldKind::Discrete,
            Field::Explicit | Field::HasFeature => FieldKind::Boolean,
            Field::TrackId
            | Field::Artists
            | Field::AlbumName
            | Field::TrackName
            | Field::TrackGenre
            | Field::PrimaryArtist
            | Field::PopularityBucket
            | Field::EnergyBucket
            | Field::DanceabilityBucket
            | Field::DurationBucket
            | Field::TempoBucket
            | Field::KeyLabel
            | Field::ModeLabel
            | Field::GenreGroup => FieldKind::Categorical,
        }
    }

    pub fn require_numeric(self) -> FilterResult<()> {
        if self.kind().is_numeric() {
            Ok(())
        } else {
            Err(self.wrong_kind("numeric"))
        }
    }

    pub fn wrong_kind(self, expected: &'static str) -> InvalidFilterError {
        InvalidFilterError::WrongKind {
            field: self.name().to_string(),
            expected,
            actual: self.kind().describe(),
        }
    }

    pub fn value(self, record: &CanonicalRecord) -> Value<'_> {
        match self {
            Field::TrackId => Value::Text(&record.track_id),
            Field::Artists => Value::Text(&record.artists),
            Field::AlbumName => Value::Text(&record.album_name),
            Field::TrackName => Value::Text(&record.track_name),
            Field::Popularity => Value::Integer(record.popularity),
            Field::DurationMs => Value::Integer(record.duration_ms),
            Field::Explicit => Value::Bool(record.explicit),
            Field::Danceability => Value::Number(record.danceability),
            Field::Energy => Value::Number(record.energy),
            Field::Key => Value::Integer(record.key),
            Field::Loudness => Value::Number(record.loudness),
            Field::Mode => Value::Integer(record.mode),
            Field::Speechiness => Value::Number(record.speechiness),
            Field::Acousticness => Value::Number(record.acousticness),
            Field::Instrumentalness => Value::Number(record.instrumentalness),
            Field::Liveness => Value::Number(record.liveness),
            Field::Valence => Value::Number(record.valence),
            Field::Tempo => Value::Number(record.tempo),
            Field::TimeSignature => Value::Integer(record.time_signature),
            Field::TrackGenre => Value::Text(&record.track_genre),
            Field::DurationSeconds => Value::Number(record.duration_seconds),
            Field::DurationMinutes => Value::Number(record.duration_minutes),
            Field::PrimaryArtist => Value::Text(&record.primary_artist),
            Field::HasFeature => Value::Bool(record.has_feature),
            Field::PopularityBucket => Value::Text(record.popularity_bucket.label()),
            Field::EnergyBucket => Value::Text(record.energy_bucket.label()),
            Field::DanceabilityBucket => Value::Text(record.danceability_bucket.label()),
            Field::DurationBucket => Value::Text(record.duration_bucket.label()),
            Field::TempoBucket => Value::Text(record.tempo_bucket.label()),
            Field::KeyLabel => Value::Text(record.key_name()),
            Field::ModeLabel => Value::Text(record.mode_name()),
            Field::GenreGroup => Value::Text(record.genre_group.label()),
        }
    }
}

impl FromStr for Field {
    type Err = InvalidFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Field::ALL
            .into_iter()
            .find(|field| field.name() == name)
            .ok_or_else(|| InvalidFilterError::UnknownField(name.to_string()))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// A borrowed cell of one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Number(f64),
    Integer(i64),
    Text(&'a str),
    Bool(bool),
}

impl Value<'_> {
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Number(v) => Some(v),
            Value::Integer(v) => Some(v as f64),
            Value::Text(_) | Value::Bool(_) => None,
        }
    }
    /// Canonical text form used by membership predicates.
    pub fn as_text(&self) -> Cow<'_, str> {
        match *self {
            Value::Text(s) => Cow::Borrowed(s),
            Value::Integer(v) => Cow::Owned(v.to_string()),
            Value::Number(v) => Cow::Owned(v.to_string()),
            Value::Bool(v) => Cow::Borrowed(if v { "true" } else { "false" }),
        }
    }
    pub fn to_key(&self) -> ValueKey {
        match *self {
            // fold -0.0 into 0.0 so equal numbers share a key
            Value::Number(v) if v == 0.0 => ValueKey::Float(0f64.to_bits()),
            Value::Number(v) => ValueKey::Float(v.to_bits()),
            Value::Integer(v) => ValueKey::Integer(v),
            Value::Text(s) => ValueKey::Text(s.to_string()),
            Value::Bool(v) => ValueKey::Bool(v),
        }
    }
}

/// Owned, hashable form of a [`Value`], used for grouping and counting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKey {
    Integer(i64),
    Float(u64),
    Text(String),
    Bool(bool),
}

impl ValueKey {
    pub fn to_cell(&self) -> Cell {
        match self {
            ValueKey::Integer(v) => Cell::Integer(*v),
            ValueKey::Float(bits) => Cell::Number(f64::from_bits(*bits)),
            ValueKey::Text(s) => Cell::Text(s.clone()),
            ValueKey::Bool(v) => Cell::Bool(*v),
        }
    }
}

impl fmt::Display for ValueKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.to_cell().fmt(f)
    }
}

/// One output cell of a grouped or derived table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Missing,
    Integer(i64),
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(v) => Some(*v as f64),
            Cell::Number(v) => Some(*v),
            Cell::Missing | Cell::Text(_) | Cell::Bool(_) => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Cell::Missing => f.write_str("-"),
            Cell::Integer(v) => write!(f, "{v}"),
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Text(s) => f.write_str(s),
            Cell::Bool(v) => write!(f, "{v}"),
        }
    }
}
