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

//! Fixed lookup tables for musical keys, modes and coarse genre families.

use crate::error::DomainError;
use serde::{Serialize, Serializer};
use std::fmt;

/// Label used wherever a lookup fell outside its table.
pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    pub fn from_code(code: i64) -> Result<Self, DomainError> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
            .ok_or(DomainError::KeyOutOfRange(code))
    }

    pub fn label(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#/Db",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#/Eb",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#/Gb",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#/Ab",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#/Bb",
            PitchClass::B => "B",
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for PitchClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mode {
    Minor,
    Major,
}

impl Mode {
    pub fn from_code(code: i64) -> Result<Self, DomainError> {
        match code {
            0 => Ok(Mode::Minor),
            1 => Ok(Mode::Major),
            other => Err(DomainError::ModeOutOfRange(other)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Minor => "Minor",
            Mode::Major => "Major",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Mode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GenreGroup {
    Pop,
    Rock,
    Metal,
    Electronic,
    HipHopRnb,
    JazzBlues,
    Latin,
    FolkAcoustic,
    ClassicalOpera,
    World,
    Other,
}

/// Ordered family table; classification takes the first family listing the code.
const GENRE_FAMILIES: &[(GenreGroup, &[&str])] = &[
    (
        GenreGroup::Pop,
        &[
            "pop", "pop-film", "power-pop", "indie-pop", "k-pop", "j-pop", "mandopop",
            "cantopop",
        ],
    ),
    (
        GenreGroup::Rock,
        &[
            "rock",
            "alt-rock",
            "alternative",
            "hard-rock",
            "punk-rock",
            "punk",
            "rock-n-roll",
            "grunge",
            "psych-rock",
            "rockabilly",
        ],
    ),
    (
        GenreGroup::Metal,
        &[
            "metal",
            "black-metal",
            "death-metal",
            "heavy-metal",
            "metalcore",
            "grindcore",
        ],
    ),
    (
        GenreGroup::Electronic,
        &[
            "electronic",
            "edm",
            "electro",
            "house",
            "techno",
            "trance",
            "dubstep",
            "drum-and-bass",
            "detroit-techno",
            "deep-house",
            "progressive-house",
            "minimal-techno",
        ],
    ),
    (GenreGroup::HipHopRnb, &["hip-hop", "r-n-b"]),
    (GenreGroup::JazzBlues, &["jazz", "blues"]),
    (
        GenreGroup::Latin,
        &[
            "latin", "latino", "samba", "salsa", "reggaeton", "tango", "sertanejo",
        ],
    ),
    (
        GenreGroup::FolkAcoustic,
        &[
            "folk",
            "acoustic",
            "singer-songwriter",
            "songwriter",
            "country",
        ],
    ),
    (GenreGroup::ClassicalOpera, &["classical", "opera", "piano"]),
    (
        GenreGroup::World,
        &[
            "world-music",
            "afrobeat",
            "brazilian",
            "french",
            "german",
            "indian",
            "iranian",
            "turkish",
            "spanish",
            "swedish",
            "malay",
        ],
    ),
];

impl GenreGroup {
    pub const ALL: [GenreGroup; 11] = [
        GenreGroup::Pop,
        GenreGroup::Rock,
        GenreGroup::Metal,
        GenreGroup::Electronic,
        GenreGroup::HipHopRnb,
        GenreGroup::JazzBlues,
        GenreGroup::Latin,
        GenreGroup::FolkAcoustic,
        GenreGroup::ClassicalOpera,
        GenreGroup::World,
        GenreGroup::Other,
    ];

    /// Codes not listed by any family are valid and land in `Other`.
    pub fn classify(genre: &str) -> Self {
        GENRE_FAMILIES
            .iter()
            .find(|(_, members)| members.contains(&genre))
            .map_or(GenreGroup::Other, |(group, _)| *group)
    }

    /// Genre codes explicitly listed for this family; empty for `Other`.
    pub fn members(self) -> &'static [&'static str] {
        GENRE_FAMILIES
            .iter()
            .find(|(group, _)| *group == self)
            .map(|(_, members)| *members)
            .unwrap_or(&[])
    }

    pub fn label(self) -> &'static str {
        match self {
            GenreGroup::Pop => "Pop",
            GenreGroup::Rock => "Rock",
            GenreGroup::Metal => "Metal",
            GenreGroup::Electronic => "Electronic",
            GenreGroup::HipHopRnb => "Hip-Hop/R&B",
            GenreGroup::JazzBlues => "Jazz/Blues",
            GenreGroup::Latin => "Latin",
            GenreGroup::FolkAcoustic => "Folk/Acoustic",
            GenreGroup::ClassicalOpera => "Classical/Opera",
            GenreGroup::World => "World",
            GenreGroup::Other => "Other",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|group| group.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for GenreGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for GenreGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
