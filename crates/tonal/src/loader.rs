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

use crate::config::{AnalyticsConfig, InvalidRowPolicy};
use crate::error::{DataSourceError, SourceResult, ValidationError};
use crate::logging;
use crate::normalize::normalize;
use crate::record::{CanonicalRecord, RawRecord, REQUIRED_COLUMNS};
use crate::table::TrackTable;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt::Display;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

static UNNAMED_INDEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Unnamed: \d+$").expect("index column pattern is valid"));

/// A row dropped under [`InvalidRowPolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowIssue {
    /// 1-based data row number, header excluded.
    pub row: usize,
    pub track_id: Option<String>,
    #[serde(serialize_with = "as_display")]
    pub error: ValidationError,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub source: PathBuf,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub skipped: Vec<RowIssue>,
    pub discarded_columns: Vec<String>,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub table: TrackTable,
    pub report: LoadReport,
}

#[derive(Debug, Clone)]
pub struct DatasetLoader {
    delimiter: u8,
    index_columns: Vec<String>,
    policy: InvalidRowPolicy,
    parallel_threshold: usize,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::from_config(&AnalyticsConfig::default())
    }
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self {
            delimiter: config.delimiter_byte(),
            index_columns: config.index_columns.clone(),
            policy: config.invalid_rows,
            parallel_threshold: config.parallel_threshold,
        }
    }
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
    pub fn with_policy(mut self, policy: InvalidRowPolicy) -> Self {
        self.policy = policy;
        self
    }
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn load(&self, path: &Path) -> SourceResult<LoadedDataset> {
        if !path.exists() {
            return Err(DataSourceError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path).map_err(|source| DataSourceError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_from_reader(file, path)
    }

    /// Parses from any reader; `source` is only used for reporting.
    pub fn load_from_reader<R: Read>(
        &self,
        input: R,
        source: &Path,
    ) -> SourceResult<LoadedDataset> {
        let started = Instant::now();
        logging::log_load_started(source);
        let malformed = |error: csv::Error| DataSourceError::Malformed {
            path: source.to_path_buf(),
            source: error,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(input);
        let headers = reader.headers().map_err(malformed)?.clone();

        let discarded_columns: Vec<String> = headers
            .iter()
            .filter(|name| self.is_index_column(name))
            .map(str::to_string)
            .collect();
        for column in &discarded_columns {
            logging::log_column_discarded(column);
        }
        if let Some(missing) = REQUIRED_COLUMNS
            .iter()
            .find(|required| !headers.iter().any(|name| name == **required))
        {
            return Err(DataSourceError::MissingColumn {
                path: source.to_path_buf(),
                column: (*missing).to_string(),
            });
        }

        let mut raw_rows: Vec<RawRecord> = Vec::new();
        for record in reader.records() {
            let mut record = record.map_err(malformed)?;
            // short rows are padded so their absent cells fail validation
            while record.len() < headers.len() {
                record.push_field("");
            }
            // index columns are simply not part of RawRecord
            let raw: RawRecord = record.deserialize(Some(&headers)).map_err(malformed)?;
            raw_rows.push(raw);
        }
        let rows_read = raw_rows.len();

        let normalized: Vec<Result<CanonicalRecord, ValidationError>> =
            if rows_read > self.parallel_threshold {
                raw_rows.par_iter().map(normalize).collect()
            } else {
                raw_rows.iter().map(normalize).collect()
            };

        let mut rows = Vec::with_capacity(rows_read);
        let mut skipped = Vec::new();
        for (idx, (outcome, raw)) in normalized.into_iter().zip(&raw_rows).enumerate() {
            let row = idx + 1;
            match outcome {
                Ok(record) => rows.push(record),
                Err(error) => match self.policy {
                    InvalidRowPolicy::Abort => {
                        return Err(DataSourceError::RowRejected { row, source: error });
                    }
                    InvalidRowPolicy::Skip => {
                        let track_id = (!raw.track_id.is_empty()).then(|| raw.track_id.clone());
                        logging::log_row_skipped(row, track_id.as_deref(), &error);
                        skipped.push(RowIssue {
                            row,
                            track_id,
                            error,
                        });
                    }
                },
            }
        }

        sort_by_popularity(&mut rows);
        let rows_kept = rows.len();
        logging::log_load_finished(rows_read, rows_kept, started.elapsed());

        Ok(LoadedDataset {
            table: TrackTable::new(rows),
            report: LoadReport {
                source: source.to_path_buf(),
                rows_read,
                rows_kept,
                skipped,
                discarded_columns,
                loaded_at: Utc::now(),
            },
        })
    }

    fn is_index_column(&self, name: &str) -> bool {
        self.index_columns.iter().any(|c| c == name) || UNNAMED_INDEX_RE.is_match(name)
    }
}

/// Popularity descending; `sort_by` is stable so ties keep source order.
pub fn sort_by_popularity(rows: &mut [CanonicalRecord]) {
    rows.sort_by(|a, b| b.popularity.cmp(&a.popularity));
}

fn as_display<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
