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

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TonalError {
    #[error("Data source error: {0}")]
    DataSource(#[from] DataSourceError),
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("Invalid filter: {0}")]
    InvalidFilter(#[from] InvalidFilterError),
    #[error("{0}")]
    EmptyDataset(#[from] EmptyDatasetError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("Dataset file '{}' does not exist", path.display())]
    NotFound { path: PathBuf },
    #[error("Failed to read dataset file '{}': {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed CSV in '{}': {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Dataset '{}' is missing required column '{column}'", path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error("Row {row} rejected and the loader is configured to abort: {source}")]
    RowRejected {
        row: usize,
        #[source]
        source: ValidationError,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Required field '{field}' is empty")]
    Missing { field: &'static str },
    #[error("Field '{field}' is not numeric: '{value}'")]
    NotNumeric { field: &'static str, value: String },
    #[error("Field '{field}' is not a boolean: '{value}'")]
    NotBoolean { field: &'static str, value: String },
    #[error("Field '{field}' out of range: {value}")]
    OutOfRange { field: &'static str, value: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Key code {0} is outside the pitch-class table [0, 11]")]
    KeyOutOfRange(i64),
    #[error("Mode code {0} is neither 0 (minor) nor 1 (major)")]
    ModeOutOfRange(i64),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidFilterError {
    #[error("Unknown field '{0}'")]
    UnknownField(String),
    #[error("Field '{field}' is {actual}, expected {expected}")]
    WrongKind {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("Malformed range on '{field}': [{min}, {max}]")]
    MalformedRange { field: String, min: f64, max: f64 },
    #[error("Membership filter on '{0}' lists no values")]
    EmptyMembership(String),
    #[error("Unknown column '{0}' in grouped result")]
    UnknownColumn(String),
    #[error("Cannot parse predicate '{0}'")]
    Syntax(String),
    #[error("Unknown aggregate function '{0}'")]
    UnknownAggregate(String),
    #[error("Aggregate '{0}' needs a field")]
    MissingAggregateField(&'static str),
    #[error("Bin count must be positive")]
    ZeroBins,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Operation '{operation}' is undefined on an empty dataset")]
pub struct EmptyDatasetError {
    pub operation: &'static str,
}

impl EmptyDatasetError {
    pub fn new(operation: &'static str) -> Self {
        Self { operation }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{}': {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse configuration: {source}")]
    Parse {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("Invalid configuration: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, TonalError>;
pub type SourceResult<T> = std::result::Result<T, DataSourceError>;
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;
pub type FilterResult<T> = std::result::Result<T, InvalidFilterError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl TonalError {
    /// Validation, domain and empty-input errors describe a single row or
    /// request; the dataset itself is still usable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TonalError::Validation(_)
                | TonalError::Domain(_)
                | TonalError::EmptyDataset(_)
                | TonalError::InvalidFilter(_)
        )
    }
    pub fn category(&self) -> &'static str {
        match self {
            TonalError::DataSource(_) => "DataSource",
            TonalError::Validation(_) => "Validation",
            TonalError::Domain(_) => "Domain",
            TonalError::InvalidFilter(_) => "InvalidFilter",
            TonalError::EmptyDataset(_) => "EmptyDataset",
            TonalError::Config(_) => "Configuration",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_and_recoverability() {
        let err: TonalError = EmptyDatasetError::new("summarize").into();
        assert_eq!(err.category(), "EmptyDataset");
        assert!(err.is_recoverable());

        let err: TonalError = DataSourceError::NotFound {
            path: PathBuf::from("missing.csv"),
        }
        .into();
        assert_eq!(err.category(), "DataSource");
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("missing.csv"));
    }
}
