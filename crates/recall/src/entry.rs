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

use crate::normalise::normalise;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tally::AnalysisResults;

/// One processed query, as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Written as RFC 3339; read back from any ISO-8601 date-time.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub agents_used: Vec<String>,
    pub results: Value,
    pub insights: String,
}

impl MemoryEntry {
    pub fn new(
        query: impl Into<String>,
        agents_used: Vec<String>,
        results: Value,
        insights: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            query: query.into(),
            agents_used,
            results,
            insights: insights.into(),
        }
    }

    /// Captures a finished interaction; insights are joined one per line.
    pub fn record(
        query: &str,
        agents_used: &[String],
        results: &AnalysisResults,
        insights: &[String],
    ) -> Self {
        Self::new(
            query,
            agents_used.to_vec(),
            normalise(results),
            insights.join("\n"),
        )
    }

    pub fn tokens(&self) -> HashSet<String> {
        tokenize(&self.query)
    }
}

/// Layouts accepted for timestamps written without an offset.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses an ISO-8601 date-time. Values without an offset are taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(stamped) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamped.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| de::Error::custom(format!("invalid ISO-8601 timestamp '{raw}'")))
}

/// Case-folded whitespace tokens. No stemming and no stopword removal.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Number of distinct tokens two texts share.
pub fn overlap(query_tokens: &HashSet<String>, text: &str) -> usize {
    tokenize(text).intersection(query_tokens).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_case_folded_sets() {
        let tokens = tokenize("Sales  TREND sales\tanalysis");
        assert_eq!(tokens.len(), 3);
        assert!(tokens.contains("trend"));
    }

    #[test]
    fn overlap_counts_shared_words_once() {
        let query = tokenize("sales trend");
        assert_eq!(overlap(&query, "trend detection sales"), 2);
        assert_eq!(overlap(&query, "Sales sales sales"), 1);
        assert_eq!(overlap(&query, "region comparison"), 0);
        assert_eq!(overlap(&query, "sales-trend"), 0);
    }

    #[test]
    fn timestamps_with_and_without_offsets_parse() {
        let naive = parse_timestamp("2025-01-01T10:00:00.123456").unwrap();
        assert_eq!(naive.to_rfc3339(), "2025-01-01T10:00:00.123456+00:00");
        let shifted = parse_timestamp("2025-01-01T12:00:00+02:00").unwrap();
        assert_eq!(shifted, parse_timestamp("2025-01-01 10:00:00").unwrap());
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
