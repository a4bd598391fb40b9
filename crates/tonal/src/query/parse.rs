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

//! Text forms accepted on the command line.
//!
//! ```text
//! popularity=50..100        range
//! track_genre in pop,rock   membership
//! track_genre=pop|rock      membership
//! explicit=true             boolean equality
//! mean:popularity           aggregation
//! ```

use super::filter::Predicate;
use super::group::{AggregateFunction, Aggregation};
use crate::error::{FilterResult, InvalidFilterError};
use crate::table::{Field, FieldKind};

pub fn parse_predicate(text: &str) -> FilterResult<Predicate> {
    let syntax = || InvalidFilterError::Syntax(text.to_string());

    if let Some((name, list)) = text.split_once(" in ") {
        let field: Field = name.parse()?;
        return Ok(Predicate::one_of(field.name(), split_values(list, ',')));
    }

    let (name, rhs) = text.split_once('=').ok_or_else(syntax)?;
    let field: Field = name.parse()?;
    let rhs = rhs.trim();
    if rhs.is_empty() {
        return Err(syntax());
    }
    match field.kind() {
        FieldKind::Boolean => {
            let value = match rhs.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => return Err(syntax()),
            };
            Ok(Predicate::equals(field.name(), value))
        }
        kind if kind.is_numeric() && rhs.contains("..") => {
            let (min, max) = rhs.split_once("..").ok_or_else(syntax)?;
            let min = parse_bound(min, f64::MIN).ok_or_else(syntax)?;
            let max = parse_bound(max, f64::MAX).ok_or_else(syntax)?;
            Ok(Predicate::range(field.name(), min, max))
        }
        _ => Ok(Predicate::one_of(field.name(), split_values(rhs, '|'))),
    }
}

/// `FUNC` or `FUNC:FIELD`, optionally followed by `@alias`.
pub fn parse_aggregation(text: &str) -> FilterResult<Aggregation> {
    let (body, alias) = match text.split_once('@') {
        Some((body, alias)) if !alias.trim().is_empty() => (body, Some(alias.trim())),
        Some(_) => return Err(InvalidFilterError::Syntax(text.to_string())),
        None => (text, None),
    };
    let aggregation = match body.split_once(':') {
        Some((function, field)) => {
            let function: AggregateFunction = function.parse()?;
            let field: Field = field.parse()?;
            Aggregation::of(function, field.name())
        }
        None => {
            let function: AggregateFunction = body.parse()?;
            if function != AggregateFunction::Count {
                return Err(InvalidFilterError::MissingAggregateField(function.name()));
            }
            Aggregation::count()
        }
    };
    Ok(match alias {
        Some(alias) => aggregation.with_alias(alias),
        None => aggregation,
    })
}

// open ends (`..120`, `60..`) take the widest finite bound
fn parse_bound(text: &str, open: f64) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        Some(open)
    } else {
        text.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

fn split_values(list: &str, separator: char) -> Vec<String> {
    list.split(separator)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_predicate_form() {
        assert_eq!(
            parse_predicate("popularity=50..100").unwrap(),
            Predicate::range("popularity", 50.0, 100.0)
        );
        assert_eq!(
            parse_predicate("track_genre in pop, rock").unwrap(),
            Predicate::one_of("track_genre", ["pop", "rock"])
        );
        assert_eq!(
            parse_predicate("genre_group=Hip-Hop/R&B|Latin").unwrap(),
            Predicate::one_of("genre_group", ["Hip-Hop/R&B", "Latin"])
        );
        assert_eq!(
            parse_predicate("explicit=false").unwrap(),
            Predicate::equals("explicit", false)
        );
        assert_eq!(
            parse_predicate("time_signature=4").unwrap(),
            Predicate::one_of("time_signature", ["4"])
        );
    }

    #[test]
    fn open_ranges() {
        assert_eq!(
            parse_predicate("tempo=..90").unwrap(),
            Predicate::range("tempo", f64::MIN, 90.0)
        );
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(matches!(
            parse_predicate("tempo"),
            Err(InvalidFilterError::Syntax(_))
        ));
        assert!(matches!(
            parse_predicate("explicit=perhaps"),
            Err(InvalidFilterError::Syntax(_))
        ));
        assert!(matches!(
            parse_predicate("tempo=fast..slow"),
            Err(InvalidFilterError::Syntax(_))
        ));
        assert!(matches!(
            parse_predicate("bpm=1..2"),
            Err(InvalidFilterError::UnknownField(_))
        ));
    }

    #[test]
    fn parses_aggregations() {
        assert_eq!(parse_aggregation("count").unwrap(), Aggregation::count());
        assert_eq!(
            parse_aggregation("avg:popularity@mean_pop").unwrap(),
            Aggregation::of(AggregateFunction::Mean, "popularity").with_alias("mean_pop")
        );
        assert_eq!(
            parse_aggregation("mean"),
            Err(InvalidFilterError::MissingAggregateField("mean"))
        );
        assert!(matches!(
            parse_aggregation("median:tempo"),
            Err(InvalidFilterError::UnknownAggregate(_))
        ));
    }
}
