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


use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tonal-cli")]
#[command(about = "Summaries, page views and ad-hoc queries over a track catalogue export")]
#[command(version)]
pub struct Args {
    #[arg(long, help = "YAML configuration file (default: config/tonal.yml when present)")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Dataset CSV, overrides the configured path")]
    pub dataset: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    #[arg(long, value_enum, help = "Set the logging level (RUST_LOG still wins)")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Headline statistics over the whole table
    Summary,
    /// What the last load read, kept and skipped
    Report,
    /// Data behind one dashboard page
    Page {
        #[arg(value_enum)]
        page: PageKind,
        #[arg(long, help = "YAML file with the page's filter values")]
        filters: Option<PathBuf>,
        #[arg(long, help = "Artist or genre to drill into (artists and genres pages)")]
        detail: Option<String>,
        #[arg(
            long,
            num_args = 2,
            value_names = ["FIRST", "SECOND"],
            conflicts_with = "detail",
            help = "Two artists side by side (artists page)"
        )]
        compare: Option<Vec<String>>,
    },
    /// Filter, group and rank the table
    Query {
        #[arg(
            long = "where",
            value_name = "PRED",
            help = "e.g. popularity=50..100, track_genre in pop,rock"
        )]
        predicates: Vec<String>,
        #[arg(long = "group-by", value_name = "FIELD")]
        group_by: Vec<String>,
        #[arg(long = "agg", value_name = "FUNC[:FIELD][@ALIAS]")]
        aggregations: Vec<String>,
        #[arg(long, value_name = "N", conflicts_with = "bottom")]
        top: Option<usize>,
        #[arg(long, value_name = "N")]
        bottom: Option<usize>,
        #[arg(long, value_name = "FIELD", default_value = "popularity")]
        by: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    Text,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum PageKind {
    Overview,
    Features,
    Artists,
    Genres,
    Temporal,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
