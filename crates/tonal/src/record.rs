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

use crate::buckets::{DurationBucket, LevelBucket, PopularityBucket, TempoBucket};
use crate::taxonomy::{GenreGroup, Mode, PitchClass, UNKNOWN_LABEL};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::Display;

/// Header names every dataset file must provide.
pub const REQUIRED_COLUMNS: [&str; 20] = [
    "track_id",
    "artists",
    "album_name",
    "track_name",
    "popularity",
    "duration_ms",
    "explicit",
    "danceability",
    "energy",
    "key",
    "loudness",
    "mode",
    "speechiness",
    "acousticness",
    "instrumentalness",
    "liveness",
    "valence",
    "tempo",
    "time_signature",
    "track_genre",
];

/// One row as read from the source, every cell still text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub track_id: String,
    pub artists: String,
    pub album_name: String,
    pub track_name: String,
    pub popularity: String,
    pub duration_ms: String,
    pub explicit: String,
    pub danceability: String,
    pub energy: String,
    pub key: String,
    pub loudness: String,
    pub mode: String,
    pub speechiness: String,
    pub acousticness: String,
    pub instrumentalness: String,
    pub liveness: String,
    pub valence: String,
    pub tempo: String,
    pub time_signature: String,
    pub track_genre: String,
}

/// A typed row with every derived attribute computed at load time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    pub track_id: String,
    pub artists: String,
    pub album_name: String,
    pub track_name: String,
    pub popularity: i64,
    pub duration_ms: i64,
    pub explicit: bool,
    pub danceability: f64,
    pub energy: f64,
    pub key: i64,
    pub loudness: f64,
    pub mode: i64,
    pub speechiness: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub valence: f64,
    pub tempo: f64,
    pub time_signature: i64,
    pub track_genre: String,

    pub duration_seconds: f64,
    pub duration_minutes: f64,
    pub primary_artist: String,
    pub has_feature: bool,
    pub popularity_bucket: PopularityBucket,
    pub energy_bucket: LevelBucket,
    pub danceability_bucket: LevelBucket,
    pub duration_bucket: DurationBucket,
    pub tempo_bucket: TempoBucket,
    #[serde(serialize_with = "label_or_unknown")]
    pub key_label: Option<PitchClass>,
    #[serde(serialize_with = "label_or_unknown")]
    pub mode_label: Option<Mode>,
    pub genre_group: GenreGroup,
}

impl CanonicalRecord {
    pub fn key_name(&self) -> &'static str {
        self.key_label.map_or(UNKNOWN_LABEL, PitchClass::label)
    }

    pub fn mode_name(&self) -> &'static str {
        self.mode_label.map_or(UNKNOWN_LABEL, Mode::label)
    }
}

fn label_or_unknown<T: Display, S: Serializer>(
    value: &Option<T>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(label) => serializer.collect_str(label),
        None => serializer.serialize_str(UNKNOWN_LABEL),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_record_fields_cover_required_columns() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(RawRecord::default()).unwrap();
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header, REQUIRED_COLUMNS.join(","));
    }
}
