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

use crate::error::ValidationError;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber. `RUST_LOG` takes precedence over
/// `default_filter`. Returns `false` when a subscriber was already set.
pub fn init(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

pub fn log_load_started(path: &Path) {
    info!(path = %path.display(), "Loading dataset");
}

pub fn log_load_finished(rows_read: usize, rows_kept: usize, elapsed: Duration) {
    info!(
        rows_read = rows_read,
        rows_kept = rows_kept,
        elapsed_ms = elapsed.as_millis() as u64,
        "Dataset loaded"
    );
}

pub fn log_row_skipped(row: usize, track_id: Option<&str>, error: &ValidationError) {
    warn!(
        row = row,
        track_id = track_id.unwrap_or("-"),
        error = %error,
        "Skipping invalid row"
    );
}

pub fn log_column_discarded(column: &str) {
    debug!(column = column, "Discarding positional index column");
}

pub fn log_cache_hit(rows: usize) {
    debug!(rows = rows, "Serving memoized dataset");
}

pub fn log_query(operation: &str, predicates: usize, input_rows: usize, output_rows: usize) {
    debug!(
        operation = operation,
        predicates = predicates,
        input_rows = input_rows,
        output_rows = output_rows,
        "Query executed"
    );
}
