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

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DATASET_ENV: &str = "TONAL_DATASET";
pub const INVALID_ROWS_ENV: &str = "TONAL_INVALID_ROWS";

/// What the loader does with a row that fails normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidRowPolicy {
    /// Drop the row, log a warning and record it in the load report.
    #[default]
    Skip,
    /// Fail the whole load on the first invalid row.
    Abort,
}

impl FromStr for InvalidRowPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            other => Err(ConfigError::Invalid {
                field: "invalid_rows",
                reason: format!("expected 'skip' or 'abort', got '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub dataset_path: PathBuf,
    pub delimiter: char,
    /// Exact header names treated as leftover positional index columns.
    pub index_columns: Vec<String>,
    pub invalid_rows: InvalidRowPolicy,
    pub top_n: usize,
    /// Row count above which normalization runs on the rayon pool.
    pub parallel_threshold: usize,
    pub log_filter: String,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("./Dataset/dataset.csv"),
            delimiter: ',',
            index_columns: vec!["Unnamed: 0".to_string(), String::new()],
            invalid_rows: InvalidRowPolicy::Skip,
            top_n: 10,
            parallel_threshold: 10_000,
            log_filter: "info".to_string(),
        }
    }
}

impl AnalyticsConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        // an empty document means "all defaults"
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `TONAL_DATASET` and `TONAL_INVALID_ROWS` when set.
    pub fn apply_env(self) -> ConfigResult<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DATASET_ENV) {
            self.dataset_path = PathBuf::from(path);
        }
        if let Some(policy) = lookup(INVALID_ROWS_ENV) {
            self.invalid_rows = policy.parse()?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.dataset_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "dataset_path",
                reason: "must not be empty".to_string(),
            });
        }
        if !self.delimiter.is_ascii() {
            return Err(ConfigError::Invalid {
                field: "delimiter",
                reason: format!("'{}' is not a single-byte character", self.delimiter),
            });
        }
        if self.top_n == 0 {
            return Err(ConfigError::Invalid {
                field: "top_n",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// The delimiter as the byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> u8 {
        u8::try_from(self.delimiter).unwrap_or(b',')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = AnalyticsConfig::from_yaml_str("top_n: 5\ninvalid_rows: abort\n").unwrap();
        assert_eq!(config.top_n, 5);
        assert_eq!(config.invalid_rows, InvalidRowPolicy::Abort);
        assert_eq!(config.dataset_path, PathBuf::from("./Dataset/dataset.csv"));
        assert_eq!(config.delimiter, ',');
        assert_eq!(config.index_columns, vec!["Unnamed: 0".to_string(), String::new()]);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(
            AnalyticsConfig::from_yaml_str("").unwrap(),
            AnalyticsConfig::default()
        );
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            AnalyticsConfig::from_yaml_str("top_n: 0"),
            Err(ConfigError::Invalid { field: "top_n", .. })
        ));
        assert!(matches!(
            AnalyticsConfig::from_yaml_str("delimiter: \"é\""),
            Err(ConfigError::Invalid { field: "delimiter", .. })
        ));
        assert!(matches!(
            AnalyticsConfig::from_yaml_str("dataset_path: \"\""),
            Err(ConfigError::Invalid { field: "dataset_path", .. })
        ));
        assert!(matches!(
            AnalyticsConfig::from_yaml_str("invalid_rows: sometimes"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn overrides_replace_path_and_policy() {
        let env: HashMap<&str, &str> =
            HashMap::from([(DATASET_ENV, "/data/tracks.csv"), (INVALID_ROWS_ENV, "Abort")]);
        let config = AnalyticsConfig::default()
            .apply_overrides(|key| env.get(key).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(config.dataset_path, PathBuf::from("/data/tracks.csv"));
        assert_eq!(config.invalid_rows, InvalidRowPolicy::Abort);

        let bad = AnalyticsConfig::default()
            .apply_overrides(|key| (key == INVALID_ROWS_ENV).then(|| "retry".to_string()));
        assert!(bad.is_err());
    }

    #[test]
    fn reads_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tonal.yml");
        fs::write(&path, "dataset_path: other.csv\ndelimiter: \";\"\n").unwrap();
        let config = AnalyticsConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.dataset_path, PathBuf::from("other.csv"));
        assert_eq!(config.delimiter_byte(), b';');

        let missing = AnalyticsConfig::from_yaml_file(dir.path().join("nope.yml"));
        assert!(matches!(missing, Err(ConfigError::Unreadable { .. })));
    }
}
