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

use serde::Serialize;
use std::fmt;

/// Analytical intent recognised from literal keywords in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Trend,
    Correlation,
    Group,
    Anomaly,
}

impl Intent {
    /// Evaluation order used by the plan compiler.
    pub const ALL: [Intent; 4] = [
        Intent::Trend,
        Intent::Correlation,
        Intent::Group,
        Intent::Anomaly,
    ];

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Intent::Trend => &["trend", "time", "over time", "growth"],
            Intent::Correlation => &["correlation", "relationship", "related"],
            Intent::Group => &["group", "by", "category", "segment"],
            Intent::Anomaly => &["anomaly", "outlier", "unusual"],
        }
    }

    /// Substring test against an already lower-cased query.
    pub fn matches(&self, lowered_query: &str) -> bool {
        self.keywords()
            .iter()
            .any(|keyword| lowered_query.contains(keyword))
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Intent::Trend => "trend",
            Intent::Correlation => "correlation",
            Intent::Group => "group",
            Intent::Anomaly => "anomaly",
        };
        f.write_str(name)
    }
}

pub fn detect(query: &str) -> Vec<Intent> {
    let lowered = query.to_lowercase();
    Intent::ALL
        .into_iter()
        .filter(|intent| intent.matches(&lowered))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_match_case_insensitively() {
        assert_eq!(detect("Show GROWTH"), vec![Intent::Trend]);
        assert_eq!(
            detect("Outliers related to revenue"),
            vec![Intent::Correlation, Intent::Anomaly]
        );
    }

    #[test]
    fn keywords_match_inside_words() {
        // "by" in "nearby", "time" in "sometimes"
        assert_eq!(detect("nearby sometimes"), vec![Intent::Trend, Intent::Group]);
    }

    #[test]
    fn plural_forms_of_anomaly_do_not_match() {
        assert!(detect("Detect any anomalies in the sales data").is_empty());
    }

    #[test]
    fn default_queries_map_to_expected_intents() {
        assert_eq!(detect("Analyze sales trends over time"), vec![Intent::Trend]);
        assert_eq!(
            detect("What are the correlations between different metrics?"),
            vec![Intent::Correlation]
        );
        assert_eq!(detect("Compare performance by region"), vec![Intent::Group]);
    }
}
