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

//! Per-row derivation of the canonical record.
//!
//! Nothing here looks at any other row, so the loader is free to run
//! [`normalize`] over rows in any order or in parallel.

use crate::buckets::{
    danceability_bucket, duration_bucket, energy_bucket, popularity_bucket, tempo_bucket,
};
use crate::error::{ValidationError, ValidationResult};
use crate::record::{CanonicalRecord, RawRecord};
use crate::taxonomy::{GenreGroup, Mode, PitchClass};

/// Separator between collaborating artists in the `artists` column.
pub const ARTIST_SEPARATOR: char = ';';

pub fn normalize(raw: &RawRecord) -> ValidationResult<CanonicalRecord> {
    let popularity = parse_int("popularity", &raw.popularity)?;
    if !(0..=100).contains(&popularity) {
        return Err(ValidationError::OutOfRange {
            field: "popularity",
            value: popularity.to_string(),
        });
    }
    let duration_ms = parse_int("duration_ms", &raw.duration_ms)?;
    if duration_ms <= 0 {
        return Err(ValidationError::OutOfRange {
            field: "duration_ms",
            value: duration_ms.to_string(),
        });
    }
    let explicit = parse_bool("explicit", &raw.explicit)?;
    let danceability = parse_float("danceability", &raw.danceability)?;
    let energy = parse_float("energy", &raw.energy)?;
    let key = parse_int("key", &raw.key)?;
    let loudness = parse_float("loudness", &raw.loudness)?;
    let mode = parse_int("mode", &raw.mode)?;
    let speechiness = parse_float("speechiness", &raw.speechiness)?;
    let acousticness = parse_float("acousticness", &raw.acousticness)?;
    let instrumentalness = parse_float("instrumentalness", &raw.instrumentalness)?;
    let liveness = parse_float("liveness", &raw.liveness)?;
    let valence = parse_float("valence", &raw.valence)?;
    let tempo = parse_float("tempo", &raw.tempo)?;
    let time_signature = parse_int("time_signature", &raw.time_signature)?;

    let duration_seconds = duration_ms as f64 / 1000.0;
    let duration_minutes = duration_seconds / 60.0;
    let (primary_artist, has_feature) = split_artists(&raw.artists);

    Ok(CanonicalRecord {
        track_id: raw.track_id.clone(),
        artists: raw.artists.clone(),
        album_name: raw.album_name.clone(),
        track_name: raw.track_name.clone(),
        popularity,
        duration_ms,
        explicit,
        danceability,
        energy,
        key,
        loudness,
        mode,
        speechiness,
        acousticness,
        instrumentalness,
        liveness,
        valence,
        tempo,
        time_signature,
        track_genre: raw.track_genre.clone(),
        duration_seconds,
        duration_minutes,
        primary_artist,
        has_feature,
        popularity_bucket: popularity_bucket(popularity),
        energy_bucket: energy_bucket(energy),
        danceability_bucket: danceability_bucket(danceability),
        duration_bucket: duration_bucket(duration_minutes),
        tempo_bucket: tempo_bucket(tempo),
        // out-of-table codes recover to an unknown label
        key_label: PitchClass::from_code(key).ok(),
        mode_label: Mode::from_code(mode).ok(),
        genre_group: GenreGroup::classify(&raw.track_genre),
    })
}

/// Returns the first listed artist and whether any collaborator follows it.
pub fn split_artists(artists: &str) -> (String, bool) {
    match artists.split_once(ARTIST_SEPARATOR) {
        Some((first, _)) => (first.to_string(), true),
        None => (artists.to_string(), false),
    }
}

fn parse_float(field: &'static str, raw: &str) -> ValidationResult<f64> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ValidationError::Missing { field });
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ValidationError::NotNumeric {
            field,
            value: raw.to_string(),
        }),
    }
}

/// Accepts integral floats such as `"5.0"`, which spreadsheet exports produce.
fn parse_int(field: &'static str, raw: &str) -> ValidationResult<i64> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ValidationError::Missing { field });
    }
    if let Ok(value) = text.parse::<i64>() {
        return Ok(value);
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 => {
            Ok(value as i64)
        }
        _ => Err(ValidationError::NotNumeric {
            field,
            value: raw.to_string(),
        }),
    }
}

fn parse_bool(field: &'static str, raw: &str) -> ValidationResult<bool> {
    match raw.trim() {
        "" => Err(ValidationError::Missing { field }),
        "true" | "True" | "TRUE" | "1" => Ok(true),
        "false" | "False" | "FALSE" | "0" => Ok(false),
        _ => Err(ValidationError::NotBoolean {
            field,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::buckets::{DurationBucket, LevelBucket, PopularityBucket, TempoBucket};

    pub(crate) fn raw(track_id: &str, artists: &str, genre: &str, popularity: i64) -> RawRecord {
        RawRecord {
            track_id: track_id.to_string(),
            artists: artists.to_string(),
            album_name: format!("{track_id} album"),
            track_name: format!("{track_id} song"),
            popularity: popularity.to_string(),
            duration_ms: "210000".to_string(),
            explicit: "False".to_string(),
            danceability: "0.5".to_string(),
            energy: "0.7".to_string(),
            key: "1".to_string(),
            loudness: "-6.5".to_string(),
            mode: "1".to_string(),
            speechiness: "0.05".to_string(),
            acousticness: "0.2".to_string(),
            instrumentalness: "0.0".to_string(),
            liveness: "0.1".to_string(),
            valence: "0.6".to_string(),
            tempo: "118.0".to_string(),
            time_signature: "4".to_string(),
            track_genre: genre.to_string(),
        }
    }

    #[test]
    fn derives_every_attribute() {
        let record = normalize(&raw("t1", "Alice;Bob", "k-pop", 73)).unwrap();
        assert_eq!(record.primary_artist, "Alice");
        assert!(record.has_feature);
        assert!((record.duration_seconds - 210.0).abs() < 1e-12);
        assert!((record.duration_minutes - 3.5).abs() < 1e-12);
        assert_eq!(record.duration_bucket, DurationBucket::Short);
        assert_eq!(record.popularity_bucket, PopularityBucket::High);
        assert_eq!(record.energy_bucket, LevelBucket::High);
        assert_eq!(record.danceability_bucket, LevelBucket::Medium);
        assert_eq!(record.tempo_bucket, TempoBucket::Moderate);
        assert_eq!(record.key_label, Some(PitchClass::CSharp));
        assert_eq!(record.mode_label, Some(Mode::Major));
        assert_eq!(record.genre_group, GenreGroup::Pop);
    }

    #[test]
    fn artist_separator_scenarios() {
        assert_eq!(split_artists("A;B"), ("A".to_string(), true));
        assert_eq!(split_artists("A"), ("A".to_string(), false));
        assert_eq!(split_artists(""), (String::new(), false));
    }

    #[test]
    fn empty_artist_degrades_instead_of_failing() {
        let record = normalize(&raw("t1", "", "jazz", 10)).unwrap();
        assert_eq!(record.primary_artist, "");
        assert!(!record.has_feature);
    }

    #[test]
    fn out_of_table_codes_become_unknown() {
        let mut row = raw("t1", "A", "jazz", 10);
        row.key = "-1".to_string();
        row.mode = "3".to_string();
        let record = normalize(&row).unwrap();
        assert_eq!(record.key_label, None);
        assert_eq!(record.key_name(), "Unknown");
        assert_eq!(record.mode_name(), "Unknown");
    }

    #[test]
    fn rejects_bad_numeric_fields() {
        let mut row = raw("t1", "A", "jazz", 10);
        row.tempo = String::new();
        assert_eq!(
            normalize(&row),
            Err(ValidationError::Missing { field: "tempo" })
        );

        let mut row = raw("t1", "A", "jazz", 10);
        row.energy = "loud".to_string();
        assert!(matches!(
            normalize(&row),
            Err(ValidationError::NotNumeric { field: "energy", .. })
        ));

        let mut row = raw("t1", "A", "jazz", 10);
        row.loudness = "NaN".to_string();
        assert!(matches!(
            normalize(&row),
            Err(ValidationError::NotNumeric { field: "loudness", .. })
        ));

        let row = raw("t1", "A", "jazz", 101);
        assert!(matches!(
            normalize(&row),
            Err(ValidationError::OutOfRange { field: "popularity", .. })
        ));

        let mut row = raw("t1", "A", "jazz", 10);
        row.duration_ms = "0".to_string();
        assert!(matches!(
            normalize(&row),
            Err(ValidationError::OutOfRange { field: "duration_ms", .. })
        ));

        let mut row = raw("t1", "A", "jazz", 10);
        row.explicit = "maybe".to_string();
        assert!(matches!(
            normalize(&row),
            Err(ValidationError::NotBoolean { field: "explicit", .. })
        ));
    }

    #[test]
    fn integral_floats_parse_as_integers() {
        let mut row = raw("t1", "A", "jazz", 10);
        row.key = "5.0".to_string();
        row.explicit = "1".to_string();
        let record = normalize(&row).unwrap();
        assert_eq!(record.key, 5);
        assert!(record.explicit);

        row.key = "5.5".to_string();
        assert!(normalize(&row).is_err());
    }

    #[test]
    fn normalization_is_deterministic() {
        let row = raw("t1", "A;B;C", "house", 55);
        assert_eq!(normalize(&row), normalize(&row));
    }
}
