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

use crate::error::SourceResult;
use crate::loader::{DatasetLoader, LoadReport, LoadedDataset};
use crate::logging;
use crate::table::TrackTable;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Builds the canonical table at most once and serves it afterwards.
///
/// Concurrent first callers block while a single build runs. A failed build
/// leaves the cell empty, so a later call builds again.
#[derive(Debug)]
pub struct DatasetStore {
    path: PathBuf,
    loader: DatasetLoader,
    cell: OnceCell<Arc<LoadedDataset>>,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>, loader: DatasetLoader) -> Self {
        Self {
            path: path.into(),
            loader,
            cell: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> SourceResult<Arc<LoadedDataset>> {
        if let Some(loaded) = self.cell.get() {
            logging::log_cache_hit(loaded.table.len());
            return Ok(Arc::clone(loaded));
        }
        self.cell
            .get_or_try_init(|| self.loader.load(&self.path).map(Arc::new))
            .map(Arc::clone)
    }

    pub fn table(&self) -> SourceResult<TrackTable> {
        self.load().map(|loaded| loaded.table.clone())
    }

    pub fn report(&self) -> SourceResult<LoadReport> {
        self.load().map(|loaded| loaded.report.clone())
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}
