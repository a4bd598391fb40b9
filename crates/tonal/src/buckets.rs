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

//! Threshold bucketing of continuous values into ordered categories.
//!
//! Every threshold is an inclusive upper bound: a value sitting exactly on a
//! boundary belongs to the lower bucket. Each function ends in an
//! unconditional branch so every input, including values outside the
//! nominal domain, maps to exactly one bucket.

use serde::{Serialize, Serializer};
use std::fmt;

/// An ordered categorical bucket with a display label.
pub trait Bucket: Copy + Ord + 'static {
    /// All buckets from lowest to highest.
    const ORDERED: &'static [Self];
    fn label(self) -> &'static str;
}

macro_rules! impl_label_traits {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    f.write_str(Bucket::label(*self))
                }
            }

            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_str(Bucket::label(*self))
                }
            }
        )*
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PopularityBucket {
    NoData,
    Low,
    MediumLow,
    Medium,
    High,
    VeryHigh,
}

impl Bucket for PopularityBucket {
    const ORDERED: &'static [Self] = &[
        Self::NoData,
        Self::Low,
        Self::MediumLow,
        Self::Medium,
        Self::High,
        Self::VeryHigh,
    ];
    fn label(self) -> &'static str {
        match self {
            Self::NoData => "No data",
            Self::Low => "Low (1-20)",
            Self::MediumLow => "Medium-low (21-40)",
            Self::Medium => "Medium (41-60)",
            Self::High => "High (61-80)",
            Self::VeryHigh => "Very High (81-100)",
        }
    }
}

/// Shared three-level scale for energy and danceability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LevelBucket {
    Low,
    Medium,
    High,
}

impl Bucket for LevelBucket {
    const ORDERED: &'static [Self] = &[Self::Low, Self::Medium, Self::High];
    fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DurationBucket {
    VeryShort,
    Short,
    Medium,
    Long,
    VeryLong,
}

impl Bucket for DurationBucket {
    const ORDERED: &'static [Self] = &[
        Self::VeryShort,
        Self::Short,
        Self::Medium,
        Self::Long,
        Self::VeryLong,
    ];
    fn label(self) -> &'static str {
        match self {
            Self::VeryShort => "Very short",
            Self::Short => "Short",
            Self::Medium => "Medium",
            Self::Long => "Long",
            Self::VeryLong => "Very long",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TempoBucket {
    VerySlow,
    Slow,
    Moderate,
    Fast,
    VeryFast,
}

impl Bucket for TempoBucket {
    const ORDERED: &'static [Self] = &[
        Self::VerySlow,
        Self::Slow,
        Self::Moderate,
        Self::Fast,
        Self::VeryFast,
    ];
    fn label(self) -> &'static str {
        match self {
            Self::VerySlow => "Very slow",
            Self::Slow => "Slow",
            Self::Moderate => "Moderate",
            Self::Fast => "Fast",
            Self::VeryFast => "Very fast",
        }
    }
}

impl_label_traits!(PopularityBucket, LevelBucket, DurationBucket, TempoBucket);

pub fn popularity_bucket(popularity: i64) -> PopularityBucket {
    if popularity == 0 {
        PopularityBucket::NoData
    } else if popularity <= 20 {
        PopularityBucket::Low
    } else if popularity <= 40 {
        PopularityBucket::MediumLow
    } else if popularity <= 60 {
        PopularityBucket::Medium
    } else if popularity <= 80 {
        PopularityBucket::High
    } else {
        PopularityBucket::VeryHigh
    }
}

fn level_bucket(value: f64) -> LevelBucket {
    if value <= 0.3 {
        LevelBucket::Low
    } else if value <= 0.6 {
        LevelBucket::Medium
    } else {
        LevelBucket::High
    }
}

pub fn energy_bucket(energy: f64) -> LevelBucket {
    level_bucket(energy)
}

pub fn danceability_bucket(danceability: f64) -> LevelBucket {
    level_bucket(danceability)
}

pub fn duration_bucket(minutes: f64) -> DurationBucket {
    if minutes <= 2.0 {
        DurationBucket::VeryShort
    } else if minutes <= 3.5 {
        DurationBucket::Short
    } else if minutes <= 5.0 {
        DurationBucket::Medium
    } else if minutes <= 7.0 {
        DurationBucket::Long
    } else {
        DurationBucket::VeryLong
    }
}

pub fn tempo_bucket(bpm: f64) -> TempoBucket {
    if bpm <= 70.0 {
        TempoBucket::VerySlow
    } else if bpm <= 100.0 {
        TempoBucket::Slow
    } else if bpm <= 120.0 {
        TempoBucket::Moderate
    } else if bpm <= 140.0 {
        TempoBucket::Fast
    } else {
        TempoBucket::VeryFast
    }
}
