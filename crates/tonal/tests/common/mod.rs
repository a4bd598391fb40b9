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


#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Header with the leading unnamed index column the raw export carries.
pub const HEADER: &str = ",track_id,artists,album_name,track_name,popularity,duration_ms,explicit,\
danceability,energy,key,loudness,mode,speechiness,acousticness,instrumentalness,liveness,\
valence,tempo,time_signature,track_genre";

pub struct Track<'a> {
    pub id: &'a str,
    pub artists: &'a str,
    pub album: &'a str,
    pub genre: &'a str,
    pub popularity: &'a str,
    pub duration_ms: &'a str,
    pub explicit: bool,
    pub energy: f64,
    pub tempo: f64,
    pub key: i64,
}

impl Track<'_> {
    pub fn line(&self, index: usize) -> String {
        format!(
            "{index},{id},{artists},{album},{id} song,{popularity},{duration},{explicit},\
             0.55,{energy},{key},-7.2,1,0.04,0.3,0.0,0.12,0.5,{tempo},4,{genre}",
            id = self.id,
            artists = self.artists,
            album = self.album,
            popularity = self.popularity,
            duration = self.duration_ms,
            explicit = if self.explicit { "True" } else { "False" },
            energy = self.energy,
            key = self.key,
            tempo = self.tempo,
            genre = self.genre,
        )
    }
}

pub fn catalog() -> Vec<Track<'static>> {
    // id, artists, album, genre, popularity, duration_ms, explicit, energy, tempo, key
    let rows = [
        ("a1", "Nina Sol", "Dawn", "pop", "55", "201000", false, 0.72, 118.0, 0),
        ("a2", "Nina Sol;Rui", "Dawn", "pop", "81", "185000", true, 0.81, 124.0, 7),
        ("a3", "Os Trovões", "Ruído", "hard-rock", "47", "262000", false, 0.93, 141.0, 4),
        ("a4", "Lia", "Noturno", "jazz", "33", "395000", false, 0.21, 65.0, 12),
        ("a5", "Os Trovões", "Ruído", "hard-rock", "81", "240000", true, 0.88, 140.0, 9),
        ("a6", "MC Vento", "Rua", "hip-hop", "0", "175000", true, 0.64, 71.0, 2),
        ("a7", "Tessa", "Valsa", "polka", "12", "150000", false, 0.5, 100.0, 5),
    ];
    rows.iter()
        .map(
            |&(id, artists, album, genre, popularity, duration_ms, explicit, energy, tempo, key)| {
                Track {
                    id,
                    artists,
                    album,
                    genre,
                    popularity,
                    duration_ms,
                    explicit,
                    energy,
                    tempo,
                    key,
                }
            },
        )
        .collect()
}

pub fn csv_text(tracks: &[Track<'_>]) -> String {
    let mut text = String::from(HEADER);
    for (index, track) in tracks.iter().enumerate() {
        text.push('\n');
        text.push_str(&track.line(index));
    }
    text.push('\n');
    text
}

pub fn write_dataset(dir: &TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("dataset.csv");
    fs::write(&path, text).expect("write fixture");
    path
}
