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

use tally::{
    AnalysisResults, AnomalyReport, CorrelationReport, GroupReport, SummaryReport, TrendReport,
};

pub const MAX_CORRELATION_INSIGHTS: usize = 3;
const GROWTH_INSIGHT_PERCENT: f64 = 10.0;

/// Natural-language findings in fixed order: summary, correlation, trend,
/// group, anomaly. Failed or missing outcomes contribute nothing.
pub fn synthesize(results: &AnalysisResults) -> Vec<String> {
    let mut insights = Vec::new();
    if let Some(summary) = results.summary() {
        insights.extend(summary_insights(summary));
    }
    if let Some(correlation) = results.correlation() {
        insights.extend(correlation_insights(correlation));
    }
    if let Some(trend) = results.trend() {
        insights.extend(trend_insights(trend));
    }
    if let Some(group) = results.group() {
        insights.extend(group_insights(group));
    }
    if let Some(anomaly) = results.anomaly() {
        insights.extend(anomaly_insights(anomaly));
    }
    insights
}

fn summary_insights(summary: &SummaryReport) -> Vec<String> {
    let mut insights = vec![format!(
        "📊 Dataset contains {} rows and {} columns",
        thousands(summary.rows),
        summary.columns
    )];
    let missing = summary.total_missing();
    if missing > 0 {
        insights.push(format!(
            "⚠️ Found {} missing values across the dataset",
            thousands(missing)
        ));
    }
    insights
}

/// Reports the first pairs in scan order, not the strongest.
fn correlation_insights(correlation: &CorrelationReport) -> Vec<String> {
    if correlation.strong_correlations.is_empty() {
        return vec!["📉 No strong correlations detected between variables".to_string()];
    }
    correlation
        .strong_correlations
        .iter()
        .take(MAX_CORRELATION_INSIGHTS)
        .map(|pair| {
            let direction = if pair.correlation > 0.0 {
                "positive"
            } else {
                "negative"
            };
            format!(
                "🔗 Strong {direction} correlation ({:.2}) between {} and {}",
                pair.correlation, pair.var1, pair.var2
            )
        })
        .collect()
}

fn trend_insights(trend: &TrendReport) -> Vec<String> {
    let fit = &trend.trend_analysis;
    let mut insights = vec![format!(
        "📈 Data shows an {} trend (R² = {:.3})",
        fit.trend, fit.r_squared
    )];
    if let Some(growth) = trend.growth_analysis.total_growth_percent {
        if growth.abs() > GROWTH_INSIGHT_PERCENT {
            let direction = if growth > 0.0 { "increased" } else { "decreased" };
            insights.push(format!("💹 Overall {direction} by {:.1}%", growth.abs()));
        }
    }
    insights
}

fn group_insights(group: &GroupReport) -> Vec<String> {
    match (&group.best_performing, &group.worst_performing) {
        (Some(best), Some(worst)) => vec![
            format!("🏆 Best performing group: {best}"),
            format!("📉 Lowest performing group: {worst}"),
        ],
        _ => Vec::new(),
    }
}

fn anomaly_insights(anomaly: &AnomalyReport) -> Vec<String> {
    if anomaly.anomaly_count > 0 {
        vec![format!(
            "🚨 Detected {} anomalies ({:.1}% of data)",
            anomaly.anomaly_count, anomaly.anomaly_percentage
        )]
    } else {
        vec!["✅ No significant anomalies detected".to_string()]
    }
}

/// Formats an integer with comma thousands separators.
pub fn thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_separators() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1_000), "1,000");
        assert_eq!(thousands(1_234_567), "1,234,567");
    }
}
