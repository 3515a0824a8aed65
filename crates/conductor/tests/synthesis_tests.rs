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

use conductor::{prioritize, recommend, synthesize, Priority, Recommendation};
use indexmap::IndexMap;
use proptest::prelude::*;
use tally::{
    AnalysisPayload, AnalysisResults, AnomalyReport, CorrelationPair, CorrelationReport,
    GroupReport, GrowthReport, SummaryReport, TaskOutcome, TrendDirection, TrendFit, TrendReport,
};

fn summary(rows: usize, missing: usize) -> TaskOutcome {
    let mut missing_values = IndexMap::new();
    missing_values.insert("sales".to_string(), missing);
    TaskOutcome::Success(AnalysisPayload::Summary(SummaryReport {
        rows,
        columns: 7,
        column_names: vec!["sales".to_string()],
        dtypes: IndexMap::new(),
        missing_values,
        estimated_size_bytes: 0,
        detailed_statistics: IndexMap::new(),
    }))
}

fn correlation(pairs: &[(&str, &str, f64)]) -> TaskOutcome {
    TaskOutcome::Success(AnalysisPayload::Correlation(CorrelationReport {
        columns: Vec::new(),
        matrix: Vec::new(),
        strong_correlations: pairs
            .iter()
            .map(|(a, b, r)| CorrelationPair {
                var1: a.to_string(),
                var2: b.to_string(),
                correlation: *r,
            })
            .collect(),
    }))
}

fn trend(direction: TrendDirection, growth: Option<f64>) -> TaskOutcome {
    TaskOutcome::Success(AnalysisPayload::Trend(TrendReport {
        date_col: "date".to_string(),
        value_col: "sales".to_string(),
        trend_analysis: TrendFit {
            trend: direction,
            slope: 0.5,
            intercept: 1.0,
            r_squared: 0.123_456,
        },
        growth_analysis: GrowthReport {
            total_growth_percent: growth,
            first_value: 100.0,
            last_value: 125.0,
        },
    }))
}

fn group(best: Option<&str>, worst: Option<&str>) -> TaskOutcome {
    TaskOutcome::Success(AnalysisPayload::Group(GroupReport {
        group_col: "region".to_string(),
        value_col: "sales".to_string(),
        group_statistics: IndexMap::new(),
        best_performing: best.map(str::to_string),
        worst_performing: worst.map(str::to_string),
    }))
}

fn anomaly(count: usize, percentage: f64) -> TaskOutcome {
    TaskOutcome::Success(AnalysisPayload::Anomaly(AnomalyReport {
        column: "sales".to_string(),
        threshold: 3.0,
        anomaly_count: count,
        anomaly_indices: (0..count).collect(),
        anomaly_percentage: percentage,
    }))
}

#[test]
fn test_insights_follow_fixed_category_order() {
    let mut results = AnalysisResults::new();
    results.insert("anomaly", anomaly(0, 0.0));
    results.insert("group", group(Some("West"), Some("East")));
    results.insert("trend", trend(TrendDirection::Increasing, Some(25.0)));
    results.insert("correlation", correlation(&[]));
    results.insert("summary", summary(1_000, 12));

    assert_eq!(
        synthesize(&results),
        vec![
            "📊 Dataset contains 1,000 rows and 7 columns",
            "⚠️ Found 12 missing values across the dataset",
            "📉 No strong correlations detected between variables",
            "📈 Data shows an increasing trend (R² = 0.123)",
            "💹 Overall increased by 25.0%",
            "🏆 Best performing group: West",
            "📉 Lowest performing group: East",
            "✅ No significant anomalies detected",
        ]
    );
}

#[test]
fn test_correlation_insights_take_first_three_in_scan_order() {
    let mut results = AnalysisResults::new();
    results.insert(
        "correlation",
        correlation(&[
            ("a", "b", 0.71),
            ("a", "c", -0.8),
            ("b", "c", 0.75),
            ("b", "d", 0.99),
        ]),
    );
    assert_eq!(
        synthesize(&results),
        vec![
            "🔗 Strong positive correlation (0.71) between a and b",
            "🔗 Strong negative correlation (-0.80) between a and c",
            "🔗 Strong positive correlation (0.75) between b and c",
        ]
    );
}

#[test]
fn test_small_growth_and_partial_groups_are_quiet() {
    let mut results = AnalysisResults::new();
    results.insert("trend", trend(TrendDirection::Decreasing, Some(-10.0)));
    results.insert("group", group(Some("West"), None));
    results.insert("anomaly", anomaly(3, 0.3));
    assert_eq!(
        synthesize(&results),
        vec![
            "📈 Data shows an decreasing trend (R² = 0.123)",
            "🚨 Detected 3 anomalies (0.3% of data)",
        ]
    );
}

#[test]
fn test_failed_outcomes_produce_nothing() {
    let mut results = AnalysisResults::new();
    results.insert("summary", TaskOutcome::error("boom"));
    results.insert("anomaly", TaskOutcome::error("Column 'x' not found in dataset"));
    assert!(synthesize(&results).is_empty());
    assert!(recommend(&results).is_empty());
}

#[test]
fn test_recommendations_sorted_by_priority() {
    let mut results = AnalysisResults::new();
    results.insert("summary", summary(10, 1));
    results.insert("correlation", correlation(&[("a", "b", 0.9)]));
    results.insert("trend", trend(TrendDirection::Increasing, Some(25.0)));
    results.insert("anomaly", anomaly(1, 2.0));

    let actions: Vec<(Priority, String)> = recommend(&results)
        .into_iter()
        .map(|r| (r.priority, r.action))
        .collect();
    assert_eq!(
        actions,
        vec![
            (Priority::High, "Data Quality".to_string()),
            (Priority::High, "Capitalize on Growth".to_string()),
            (Priority::Medium, "Feature Engineering".to_string()),
            (Priority::Low, "Monitor Outliers".to_string()),
        ]
    );
}

#[test]
fn test_trend_recommendations_need_direction_and_magnitude() {
    let cases = [
        (TrendDirection::Increasing, Some(20.0), None),
        (TrendDirection::Increasing, Some(-30.0), None),
        (TrendDirection::Decreasing, Some(30.0), None),
        (TrendDirection::Increasing, None, None),
        (
            TrendDirection::Decreasing,
            Some(-20.5),
            Some("Address Decline"),
        ),
    ];
    for (direction, growth, expected) in cases {
        let mut results = AnalysisResults::new();
        results.insert("trend", trend(direction, growth));
        let actions: Vec<String> = recommend(&results).into_iter().map(|r| r.action).collect();
        assert_eq!(actions, expected.into_iter().map(str::to_string).collect::<Vec<_>>());
    }
}

#[test]
fn test_high_anomaly_rate_mentions_percentage() {
    let mut results = AnalysisResults::new();
    results.insert("anomaly", anomaly(6, 6.0));
    let recommendations = recommend(&results);
    assert_eq!(
        recommendations,
        vec![Recommendation::new(
            Priority::High,
            "Investigate Anomalies",
            "High anomaly rate (6.0%) - investigate data quality or unusual events",
        )]
    );
}

fn priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::High),
        Just(Priority::Medium),
        Just(Priority::Low)
    ]
}

proptest! {
    #[test]
    fn prop_prioritize_orders_and_keeps_ties_stable(
        priorities in prop::collection::vec(priority(), 0..20)
    ) {
        let input: Vec<Recommendation> = priorities
            .iter()
            .enumerate()
            .map(|(i, p)| Recommendation::new(*p, &format!("action {i}"), "text"))
            .collect();
        let sorted = prioritize(input.clone());
        prop_assert_eq!(sorted.len(), input.len());
        for pair in sorted.windows(2) {
            prop_assert!(pair[0].priority.rank() <= pair[1].priority.rank());
            if pair[0].priority == pair[1].priority {
                let index = |r: &Recommendation| {
                    input.iter().position(|x| x.action == r.action).unwrap()
                };
                prop_assert!(index(&pair[0]) < index(&pair[1]));
            }
        }
    }
}
