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


pub mod buckets;
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod normalize;
pub mod pages;
pub mod query;
pub mod record;
pub mod stats;
pub mod store;
pub mod summary;
pub mod table;
pub mod taxonomy;

pub use config::{AnalyticsConfig, InvalidRowPolicy};
pub use error::{
    ConfigError, DataSourceError, DomainError, EmptyDatasetError, InvalidFilterError, Result,
    TonalError, ValidationError,
};
pub use loader::{DatasetLoader, LoadReport, LoadedDataset, RowIssue};
pub use query::{FilterSet, GroupSpec, GroupedTable, Predicate, Query, QueryOutput};
pub use record::{CanonicalRecord, RawRecord};
pub use store::DatasetStore;
pub use summary::{summarize, DatasetSummary};
pub use table::{Cell, Field, FieldKind, TrackTable};
pub use taxonomy::{GenreGroup, Mode, PitchClass};

use pages::artists::{ArtistComparison, ArtistDetail, ArtistFilters, ArtistsView};
use pages::features::{FeatureFilters, FeaturesView};
use pages::genres::{GenreDetail, GenreFilters, GenresView};
use pages::overview::{OverviewFilters, OverviewView};
use pages::temporal::{TemporalFilters, TemporalView};

/// Configuration plus the memoized dataset; the entry point for callers
/// that want summaries and page views without wiring the pieces by hand.
pub struct TonalAnalytics {
    config: AnalyticsConfig,
    store: DatasetStore,
}

impl TonalAnalytics {
    pub fn new(config: AnalyticsConfig) -> Result<Self> {
        config.validate()?;
        let store = DatasetStore::new(
            config.dataset_path.clone(),
            DatasetLoader::from_config(&config),
        );
        Ok(Self { config, store })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    pub fn table(&self) -> Result<TrackTable> {
        Ok(self.store.table()?)
    }

    pub fn report(&self) -> Result<LoadReport> {
        Ok(self.store.report()?)
    }

    pub fn summary(&self) -> Result<DatasetSummary> {
        Ok(summarize(&self.table()?)?)
    }

    pub fn query(&self, query: &Query) -> Result<QueryOutput> {
        Ok(query.run(&self.table()?)?)
    }

    pub fn overview(&self, filters: &OverviewFilters) -> Result<OverviewView> {
        pages::overview::build(&self.table()?, filters)
    }

    pub fn features(&self, filters: &FeatureFilters) -> Result<FeaturesView> {
        pages::features::build(&self.table()?, filters)
    }

    pub fn artists(&self, filters: &ArtistFilters) -> Result<ArtistsView> {
        pages::artists::build(&self.table()?, filters)
    }

    pub fn artist_detail(&self, artist: &str) -> Result<ArtistDetail> {
        pages::artists::artist_detail(&self.table()?, artist, self.config.top_n)
    }

    /// Two artists side by side, both subject to the page's HAVING filters.
    pub fn artist_comparison(
        &self,
        filters: &ArtistFilters,
        first: &str,
        second: &str,
    ) -> Result<ArtistComparison> {
        pages::artists::artist_comparison(&self.table()?, filters, first, second)
    }

    pub fn genres(&self, filters: &GenreFilters) -> Result<GenresView> {
        pages::genres::build(&self.table()?, filters)
    }

    pub fn genre_detail(&self, genre: &str) -> Result<GenreDetail> {
        pages::genres::genre_detail(&self.table()?, genre, self.config.top_n)
    }

    pub fn temporal(&self, filters: &TemporalFilters) -> Result<TemporalView> {
        pages::temporal::build(&self.table()?, filters)
    }
}
