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


mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Command, Format, PageKind};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tonal::pages::{artists, features, genres, overview, temporal};
use tonal::query::{parse_aggregation, parse_predicate, Aggregation, Direction, Selection};
use tonal::{
    AnalyticsConfig, FilterSet, GroupSpec, LoadReport, Query, QueryOutput, TonalAnalytics,
};
use tracing::{debug, error};

const DEFAULT_CONFIG: &str = "config/tonal.yml";

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = resolve_config(args)?;
    let filter = args
        .log_level
        .map_or_else(|| config.log_filter.clone(), |level| level.as_str().to_string());
    tonal::logging::init(&filter);
    debug!(dataset = %config.dataset_path.display(), "Configuration resolved");

    let analytics = TonalAnalytics::new(config).context("Invalid configuration")?;
    match &args.command {
        Command::Summary => {
            let summary = analytics.summary().context("Failed to summarize dataset")?;
            emit(args.format, &summary, || summary.to_string())
        }
        Command::Report => {
            let report = analytics.report().context("Failed to load dataset")?;
            emit(args.format, &report, || render_report(&report))
        }
        Command::Page {
            page,
            filters,
            detail,
            compare,
        } => {
            let drill = match (detail, compare) {
                (Some(name), _) => Drill::Detail(name),
                (None, Some(pair)) => match pair.as_slice() {
                    [first, second] => Drill::Compare(first, second),
                    _ => anyhow::bail!("--compare takes exactly two artists"),
                },
                (None, None) => Drill::None,
            };
            run_page(args.format, &analytics, *page, filters.as_deref(), drill)
        }
        Command::Query {
            predicates,
            group_by,
            aggregations,
            top,
            bottom,
            by,
        } => {
            let query = build_query(predicates, group_by, aggregations, *top, *bottom, by)?;
            let output = analytics.query(&query).context("Query failed")?;
            emit(args.format, &output, || render_output(&output))
        }
    }
}

fn resolve_config(args: &Args) -> Result<AnalyticsConfig> {
    let path = args
        .config
        .clone()
        .or_else(|| Some(PathBuf::from(DEFAULT_CONFIG)).filter(|p| p.exists()));
    let config = match path {
        Some(path) => AnalyticsConfig::from_yaml_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AnalyticsConfig::default(),
    };
    let mut config = config.apply_env().context("Invalid environment override")?;
    if let Some(dataset) = &args.dataset {
        config.dataset_path.clone_from(dataset);
    }
    Ok(config)
}

/// Optional drill-down requested alongside a page.
enum Drill<'a> {
    None,
    Detail(&'a str),
    Compare(&'a str, &'a str),
}

fn run_page(
    format: Format,
    analytics: &TonalAnalytics,
    page: PageKind,
    filters: Option<&Path>,
    drill: Drill<'_>,
) -> Result<()> {
    match (page, drill) {
        (PageKind::Artists, Drill::Compare(first, second)) => {
            let filters = read_filters::<artists::ArtistFilters>(filters)?;
            let view = analytics
                .artist_comparison(&filters, first, second)
                .with_context(|| format!("Cannot compare '{first}' with '{second}'"))?;
            emit_yaml(format, &view)
        }
        (_, Drill::Compare(..)) => anyhow::bail!("--compare is only available on the artists page"),
        (PageKind::Artists, Drill::Detail(artist)) => {
            let view = analytics
                .artist_detail(artist)
                .with_context(|| format!("No tracks credited to '{artist}'"))?;
            emit_yaml(format, &view)
        }
        (PageKind::Genres, Drill::Detail(genre)) => {
            let view = analytics
                .genre_detail(genre)
                .with_context(|| format!("No tracks in genre '{genre}'"))?;
            emit_yaml(format, &view)
        }
        (_, Drill::Detail(_)) => {
            anyhow::bail!("--detail is only available on the artists and genres pages")
        }
        (PageKind::Overview, Drill::None) => {
            let filters = read_filters::<overview::OverviewFilters>(filters)?;
            emit_yaml(format, &analytics.overview(&filters)?)
        }
        (PageKind::Features, Drill::None) => {
            let filters = read_filters::<features::FeatureFilters>(filters)?;
            emit_yaml(format, &analytics.features(&filters)?)
        }
        (PageKind::Artists, Drill::None) => {
            let filters = read_filters::<artists::ArtistFilters>(filters)?;
            emit_yaml(format, &analytics.artists(&filters)?)
        }
        (PageKind::Genres, Drill::None) => {
            let filters = read_filters::<genres::GenreFilters>(filters)?;
            emit_yaml(format, &analytics.genres(&filters)?)
        }
        (PageKind::Temporal, Drill::None) => {
            let filters = read_filters::<temporal::TemporalFilters>(filters)?;
            emit_yaml(format, &analytics.temporal(&filters)?)
        }
    }
}

fn read_filters<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read filters from {}", path.display()))?;
    if text.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(&text).with_context(|| format!("Malformed filters in {}", path.display()))
}

fn build_query(
    predicates: &[String],
    group_by: &[String],
    aggregations: &[String],
    top: Option<usize>,
    bottom: Option<usize>,
    by: &str,
) -> Result<Query> {
    let filters = predicates
        .iter()
        .map(|text| parse_predicate(text))
        .collect::<Result<FilterSet, _>>()
        .context("Invalid --where predicate")?;
    let group = if group_by.is_empty() && aggregations.is_empty() {
        None
    } else {
        let mut aggregations = aggregations
            .iter()
            .map(|text| parse_aggregation(text))
            .collect::<Result<Vec<_>, _>>()
            .context("Invalid --agg aggregation")?;
        if aggregations.is_empty() {
            aggregations.push(Aggregation::count());
        }
        Some(GroupSpec {
            dimensions: group_by.to_vec(),
            aggregations,
        })
    };
    let selection = match (top, bottom) {
        (Some(n), _) => Some((Direction::Top, n)),
        (None, Some(n)) => Some((Direction::Bottom, n)),
        (None, None) => None,
    }
    .map(|(direction, n)| Selection {
        direction,
        by: by.to_string(),
        n,
    });
    Ok(Query {
        filters,
        group,
        selection,
    })
}

fn emit<T: Serialize>(format: Format, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(value)?),
        Format::Text => print!("{}", text()),
    }
    Ok(())
}

// page views have no bespoke text layout; YAML reads well enough
fn emit_yaml<T: Serialize>(format: Format, value: &T) -> Result<()> {
    emit(format, value, || {
        serde_yaml::to_string(value).unwrap_or_else(|e| format!("<unprintable view: {e}>\n"))
    })
}

fn render_report(report: &LoadReport) -> String {
    let mut out = format!(
        "Source:     {}\nLoaded at:  {}\nRows read:  {}\nRows kept:  {}\n",
        report.source.display(),
        report.loaded_at.to_rfc3339(),
        report.rows_read,
        report.rows_kept
    );
    if !report.discarded_columns.is_empty() {
        let _ = writeln!(out, "Discarded:  {:?}", report.discarded_columns);
    }
    for issue in &report.skipped {
        let _ = writeln!(
            out,
            "Skipped row {} ({}): {}",
            issue.row,
            issue.track_id.as_deref().unwrap_or("no id"),
            issue.error
        );
    }
    out
}

fn render_output(output: &QueryOutput) -> String {
    match output {
        QueryOutput::Grouped(grouped) => grouped.to_string(),
        QueryOutput::Rows(rows) => {
            let mut out = String::new();
            for record in rows.iter() {
                let _ = writeln!(
                    out,
                    "{:<24} {:<40} {:<24} {:<16} {:>3}",
                    record.track_id,
                    record.track_name,
                    record.primary_artist,
                    record.track_genre,
                    record.popularity
                );
            }
            let _ = writeln!(out, "({} rows)", rows.len());
            out
        }
    }
}
