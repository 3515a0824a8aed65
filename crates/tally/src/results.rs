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

use crate::analysis::{
    AnalysisKind, AnomalyReport, CorrelationReport, GroupReport, SummaryReport, TrendReport,
};
use crate::visualize::VisualizationReport;
use indexmap::IndexMap;
use serde::Serialize;

/// Result key shared by every visualizer task.
pub const VISUALIZATION_KEY: &str = "visualization";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisPayload {
    Summary(SummaryReport),
    Correlation(CorrelationReport),
    Trend(TrendReport),
    Group(GroupReport),
    Anomaly(AnomalyReport),
    Visualization(VisualizationReport),
}

/// Outcome of one adapter call. Serialises as `{"status": "success", ...}`
/// or `{"status": "error", "error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    Success(AnalysisPayload),
    Error { error: String },
}

impl TaskOutcome {
    pub fn error(message: impl Into<String>) -> Self {
        TaskOutcome::Error {
            error: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success(_))
    }

    pub fn payload(&self) -> Option<&AnalysisPayload> {
        match self {
            TaskOutcome::Success(payload) => Some(payload),
            TaskOutcome::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            TaskOutcome::Error { error } => Some(error),
            TaskOutcome::Success(_) => None,
        }
    }
}

/// Outcomes of one plan execution, keyed by analysis kind or
/// [`VISUALIZATION_KEY`], in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnalysisResults {
    entries: IndexMap<String, TaskOutcome>,
}

impl AnalysisResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an outcome, returning whatever it replaced.
    pub fn insert(&mut self, key: impl Into<String>, outcome: TaskOutcome) -> Option<TaskOutcome> {
        self.entries.insert(key.into(), outcome)
    }

    pub fn get(&self, key: &str) -> Option<&TaskOutcome> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaskOutcome)> {
        self.entries.iter().map(|(key, outcome)| (key.as_str(), outcome))
    }

    fn payload(&self, kind: AnalysisKind) -> Option<&AnalysisPayload> {
        self.get(kind.as_str()).and_then(TaskOutcome::payload)
    }

    pub fn summary(&self) -> Option<&SummaryReport> {
        match self.payload(AnalysisKind::Summary)? {
            AnalysisPayload::Summary(report) => Some(report),
            _ => None,
        }
    }

    pub fn correlation(&self) -> Option<&CorrelationReport> {
        match self.payload(AnalysisKind::Correlation)? {
            AnalysisPayload::Correlation(report) => Some(report),
            _ => None,
        }
    }

    pub fn trend(&self) -> Option<&TrendReport> {
        match self.payload(AnalysisKind::Trend)? {
            AnalysisPayload::Trend(report) => Some(report),
            _ => None,
        }
    }

    pub fn group(&self) -> Option<&GroupReport> {
        match self.payload(AnalysisKind::Group)? {
            AnalysisPayload::Group(report) => Some(report),
            _ => None,
        }
    }

    pub fn anomaly(&self) -> Option<&AnomalyReport> {
        match self.payload(AnalysisKind::Anomaly)? {
            AnalysisPayload::Anomaly(report) => Some(report),
            _ => None,
        }
    }

    pub fn visualization(&self) -> Option<&VisualizationReport> {
        match self.get(VISUALIZATION_KEY).and_then(TaskOutcome::payload)? {
            AnalysisPayload::Visualization(report) => Some(report),
            _ => None,
        }
    }
}
