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

use serde::{Deserialize, Serialize};
use std::fmt;
use tally::{AnalysisResults, TrendDirection};

const GROWTH_ACTION_PERCENT: f64 = 20.0;
const ANOMALY_RATE_PERCENT: f64 = 5.0;

/// Ranked high to low; `Ord` follows that rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub action: String,
    pub recommendation: String,
}

impl Recommendation {
    pub fn new(priority: Priority, action: &str, recommendation: impl Into<String>) -> Self {
        Self {
            priority,
            action: action.to_string(),
            recommendation: recommendation.into(),
        }
    }
}

/// Threshold-driven actions, stably ordered by priority.
pub fn recommend(results: &AnalysisResults) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if let Some(summary) = results.summary() {
        if summary.total_missing() > 0 {
            recommendations.push(Recommendation::new(
                Priority::High,
                "Data Quality",
                "Address missing values through imputation or collection of additional data",
            ));
        }
    }

    if let Some(correlation) = results.correlation() {
        if !correlation.strong_correlations.is_empty() {
            recommendations.push(Recommendation::new(
                Priority::Medium,
                "Feature Engineering",
                "Leverage strong correlations for predictive modeling or feature selection",
            ));
        }
    }

    if let Some(trend) = results.trend() {
        let growth = trend.growth_analysis.total_growth_percent;
        match (trend.trend_analysis.trend, growth) {
            (TrendDirection::Increasing, Some(g)) if g > GROWTH_ACTION_PERCENT => {
                recommendations.push(Recommendation::new(
                    Priority::High,
                    "Capitalize on Growth",
                    "Strong positive trend detected - consider scaling operations or investments",
                ));
            }
            (TrendDirection::Decreasing, Some(g)) if g < -GROWTH_ACTION_PERCENT => {
                recommendations.push(Recommendation::new(
                    Priority::High,
                    "Address Decline",
                    "Negative trend detected - investigate root causes and implement corrective measures",
                ));
            }
            _ => {}
        }
    }

    if let Some(anomaly) = results.anomaly() {
        if anomaly.anomaly_percentage > ANOMALY_RATE_PERCENT {
            recommendations.push(Recommendation::new(
                Priority::High,
                "Investigate Anomalies",
                format!(
                    "High anomaly rate ({:.1}%) - investigate data quality or unusual events",
                    anomaly.anomaly_percentage
                ),
            ));
        } else if anomaly.anomaly_count > 0 {
            recommendations.push(Recommendation::new(
                Priority::Low,
                "Monitor Outliers",
                "Review detected anomalies for potential opportunities or issues",
            ));
        }
    }

    prioritize(recommendations)
}

/// Stable sort by priority rank.
pub fn prioritize(mut recommendations: Vec<Recommendation>) -> Vec<Recommendation> {
    recommendations.sort_by_key(|recommendation| recommendation.priority);
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priorities_rank_high_first() {
        assert!(Priority::High < Priority::Medium);
        assert!(Priority::Medium < Priority::Low);
        assert_eq!(Priority::Low.rank(), 2);
        assert_eq!(serde_json::to_value(Priority::Medium).unwrap(), "medium");
    }
}
