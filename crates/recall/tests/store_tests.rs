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

use polars::prelude::*;
use proptest::prelude::*;
use recall::{
    tokenize, InMemoryBackend, JsonFileBackend, MemoryBackend, MemoryEntry, MemoryError,
    MemoryStore,
};
use serde_json::{json, Value};
use tally::{
    AnalysisResults, ChartRequest, Dataset, TaskOutcome, Visualizer, VISUALIZATION_KEY,
};

fn entry(query: &str, agents: &[&str]) -> MemoryEntry {
    MemoryEntry::new(
        query,
        agents.iter().map(|a| a.to_string()).collect(),
        json!({}),
        "",
    )
}

#[test]
fn test_relevance_orders_by_overlap_then_storage() {
    let mut store = MemoryStore::with_backend(InMemoryBackend::new(), 10).unwrap();
    store.add(entry("sales trend analysis", &["DataAnalyst"])).unwrap();
    store.add(entry("region comparison", &["DataAnalyst"])).unwrap();
    store.add(entry("trend detection sales", &["DataAnalyst"])).unwrap();

    let found: Vec<&str> = store
        .relevant("sales trend", 3)
        .iter()
        .map(|e| e.query.as_str())
        .collect();
    assert_eq!(found, vec!["sales trend analysis", "trend detection sales"]);
}

#[test]
fn test_relevance_prefers_higher_scores_and_respects_top_k() {
    let mut store = MemoryStore::with_backend(InMemoryBackend::new(), 10).unwrap();
    store.add(entry("sales", &[])).unwrap();
    store.add(entry("sales by region", &[])).unwrap();
    store.add(entry("Sales BY Region over time", &[])).unwrap();

    let found: Vec<&str> = store
        .relevant("sales by region", 2)
        .iter()
        .map(|e| e.query.as_str())
        .collect();
    assert_eq!(found, vec!["sales by region", "Sales BY Region over time"]);
    assert!(store.relevant("inventory", 3).is_empty());
    assert!(store.relevant("sales", 0).is_empty());
}

#[test]
fn test_eviction_keeps_most_recent_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.json");
    let mut store = MemoryStore::open(&path, 3).unwrap();
    for i in 0..5 {
        store.add(entry(&format!("query {i}"), &["DataAnalyst"])).unwrap();
        assert!(store.len() <= 3);
        let persisted = JsonFileBackend::new(&path).load().unwrap();
        assert!(persisted.len() <= 3);
    }
    let queries: Vec<&str> = store.entries().iter().map(|e| e.query.as_str()).collect();
    assert_eq!(queries, vec!["query 2", "query 3", "query 4"]);
}

#[test]
fn test_round_trip_preserves_query_timestamp_and_agents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("memory.json");
    let original = entry("Compare performance by region", &["DataAnalyst", "Visualizer"]);
    {
        let mut store = MemoryStore::open(&path, 10).unwrap();
        store.add(original.clone()).unwrap();
    }
    let reopened = MemoryStore::open(&path, 10).unwrap();
    let restored = &reopened.entries()[0];
    assert_eq!(restored.query, original.query);
    assert_eq!(restored.timestamp, original.timestamp);
    assert_eq!(restored.agents_used, original.agents_used);
}

#[test]
fn test_missing_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::open(dir.path().join("absent.json"), 10).unwrap();
    assert!(store.is_empty());
    assert_eq!(store.statistics(5).total_queries, 0);
}

#[test]
fn test_corrupt_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = MemoryStore::open(&path, 10).unwrap_err();
    assert!(matches!(err, MemoryError::Corrupt { .. }));
}

#[test]
fn test_offsetless_iso_timestamps_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent_memory.json");
    let legacy = json!([{
        "timestamp": "2025-01-01T10:00:00.123456",
        "query": "sales trend",
        "agents_used": ["DataAnalyst"],
        "results": {},
        "insights": ""
    }]);
    std::fs::write(&path, legacy.to_string()).unwrap();

    let mut store = MemoryStore::open(&path, 10).unwrap();
    assert_eq!(store.len(), 1);
    let loaded = &store.entries()[0];
    assert_eq!(loaded.timestamp.to_rfc3339(), "2025-01-01T10:00:00.123456+00:00");
    assert_eq!(store.relevant("sales", 3).len(), 1);

    store.add(entry("region comparison", &["Visualizer"])).unwrap();
    let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written[0]["timestamp"], "2025-01-01T10:00:00.123456Z");
}

#[test]
fn test_oversized_file_is_trimmed_on_load() {
    let backend = InMemoryBackend::with_entries(
        (0..6).map(|i| entry(&format!("q{i}"), &[])).collect(),
    );
    let store = MemoryStore::with_backend(backend, 4).unwrap();
    assert_eq!(store.entries()[0].query, "q2");
}

#[test]
fn test_statistics_are_chronological() {
    let mut store = MemoryStore::with_backend(InMemoryBackend::new(), 20).unwrap();
    for i in 0..7 {
        let agents: &[&str] = if i % 2 == 0 {
            &["DataAnalyst", "Visualizer"]
        } else {
            &["DataAnalyst"]
        };
        store.add(entry(&format!("q{i}"), agents)).unwrap();
    }
    let stats = store.statistics(5);
    assert_eq!(stats.total_queries, 7);
    assert_eq!(stats.agents_usage["DataAnalyst"], 7);
    assert_eq!(stats.agents_usage["Visualizer"], 4);
    let order: Vec<&String> = stats.agents_usage.keys().collect();
    assert_eq!(order, vec!["DataAnalyst", "Visualizer"]);
    assert_eq!(stats.recent_queries, vec!["q2", "q3", "q4", "q5", "q6"]);
}

#[test]
fn test_figures_persist_as_descriptors() {
    let data = Dataset::from_columns(vec![
        Column::new("x".into(), [1.0, 2.0, 3.0]),
        Column::new("y".into(), [2.0, f64::NAN, 6.0]),
    ])
    .unwrap();
    let outcome = Visualizer::default().visualize(
        &data,
        &ChartRequest::Line {
            x_col: "x".to_string(),
            y_col: "y".to_string(),
            title: Some("y Trend Over Time".to_string()),
        },
    );
    let mut results = AnalysisResults::new();
    results.insert(VISUALIZATION_KEY, outcome);
    results.insert("anomaly", TaskOutcome::error("boom"));

    let backend = InMemoryBackend::new();
    let mut store = MemoryStore::with_backend(backend.clone(), 5).unwrap();
    store
        .record(
            "show trend",
            &["Visualizer".to_string()],
            &results,
            &["first".to_string(), "second".to_string()],
        )
        .unwrap();

    let saved = &backend.snapshot()[0];
    assert_eq!(saved.insights, "first\nsecond");
    assert_eq!(
        saved.results[VISUALIZATION_KEY]["figure"],
        Value::String("Figure(line: y Trend Over Time)".to_string())
    );
    assert_eq!(saved.results[VISUALIZATION_KEY]["status"], "success");
    assert_eq!(saved.results["anomaly"]["error"], "boom");
    let text = serde_json::to_string(&saved.results).unwrap();
    assert!(!text.contains("NaN"));
}

proptest! {
    #[test]
    fn prop_relevance_is_ranked_and_stable(
        queries in prop::collection::vec("[a-c]{1,2}( [a-c]{1,2}){0,3}", 0..12),
        query in "[a-c]{1,2}( [a-c]{1,2}){0,2}",
        top_k in 0usize..6,
    ) {
        let mut store = MemoryStore::with_backend(InMemoryBackend::new(), 50).unwrap();
        for text in &queries {
            store.add(entry(text, &[])).unwrap();
        }
        let query_tokens = tokenize(&query);
        let score = |text: &str| tokenize(text).intersection(&query_tokens).count();

        let found = store.relevant(&query, top_k);
        prop_assert!(found.len() <= top_k);
        let positions: Vec<usize> = found
            .iter()
            .map(|e| store.entries().iter().position(|s| std::ptr::eq(s, *e)).unwrap())
            .collect();
        for pair in positions.windows(2) {
            let a = score(&store.entries()[pair[0]].query);
            let b = score(&store.entries()[pair[1]].query);
            prop_assert!(a > b || (a == b && pair[0] < pair[1]));
        }
        for entry in &found {
            prop_assert!(score(&entry.query) > 0);
        }
        let qualifying = store.entries().iter().filter(|e| score(&e.query) > 0).count();
        prop_assert_eq!(found.len(), qualifying.min(top_k));
    }
}
