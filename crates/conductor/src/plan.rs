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

use crate::intent::Intent;
use serde::Serialize;
use std::fmt;
use tally::{
    Aggregate, AnalysisRequest, Analyst, ChartRequest, SchemaProfile, Visualizer, VISUALIZATION_KEY,
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Agent {
    DataAnalyst,
    Visualizer,
}

impl Agent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Agent::DataAnalyst => Analyst::NAME,
            Agent::Visualizer => Visualizer::NAME,
        }
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TaskOperation {
    Analysis(AnalysisRequest),
    Visualization(ChartRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub agent: Agent,
    pub action: String,
    #[serde(flatten)]
    pub operation: TaskOperation,
}

impl Task {
    pub fn analysis(action: &str, request: AnalysisRequest) -> Self {
        Self {
            agent: Agent::DataAnalyst,
            action: action.to_string(),
            operation: TaskOperation::Analysis(request),
        }
    }

    pub fn visualization(action: &str, request: ChartRequest) -> Self {
        Self {
            agent: Agent::Visualizer,
            action: action.to_string(),
            operation: TaskOperation::Visualization(request),
        }
    }

    /// Key under which this task's outcome is stored.
    pub fn result_key(&self) -> &str {
        match &self.operation {
            TaskOperation::Analysis(request) => request.name(),
            TaskOperation::Visualization(_) => VISUALIZATION_KEY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionPlan {
    pub description: String,
    pub tasks: Vec<Task>,
}

impl ExecutionPlan {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            description: format!("Execute {} analysis tasks", tasks.len()),
            tasks,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn result_keys(&self) -> Vec<&str> {
        self.tasks.iter().map(Task::result_key).collect()
    }
}

/// Turns a query and a column classification into an ordered task list.
///
/// Summary always runs first. Each matched intent adds its tasks only when
/// the columns it needs exist; "first column" means first in the schema's
/// category list. A plan that would hold only the summary gains a
/// correlation task.
#[derive(Debug, Clone, Default)]
pub struct PlanCompiler;

impl PlanCompiler {
    pub fn new() -> Self {
        Self
    }

    pub fn compile(&self, query: &str, schema: &SchemaProfile) -> ExecutionPlan {
        let lowered = query.to_lowercase();
        let mut tasks = vec![Task::analysis("Generate data summary", AnalysisRequest::Summary)];

        for intent in Intent::ALL {
            if !intent.matches(&lowered) {
                continue;
            }
            debug!(intent = %intent, "Intent matched");
            match intent {
                Intent::Trend => match (schema.first_temporal(), schema.first_numeric()) {
                    (Some(date_col), Some(value_col)) => {
                        tasks.push(Task::analysis(
                            "Analyze trends",
                            AnalysisRequest::Trend {
                                date_col: date_col.to_string(),
                                value_col: value_col.to_string(),
                            },
                        ));
                        tasks.push(Task::visualization(
                            "Create trend visualization",
                            ChartRequest::Line {
                                x_col: date_col.to_string(),
                                y_col: value_col.to_string(),
                                title: Some(format!("{value_col} Trend Over Time")),
                            },
                        ));
                    }
                    _ => warn!(
                        intent = %intent,
                        "Skipping intent: needs a date and a numeric column"
                    ),
                },
                Intent::Correlation => {
                    tasks.push(Task::analysis(
                        "Analyze correlations",
                        AnalysisRequest::Correlation,
                    ));
                    tasks.push(Task::visualization(
                        "Create correlation heatmap",
                        ChartRequest::Heatmap {
                            title: Some("Correlation Matrix".to_string()),
                        },
                    ));
                }
                Intent::Group => match (schema.first_categorical(), schema.first_numeric()) {
                    (Some(group_col), Some(value_col)) => {
                        tasks.push(Task::analysis(
                            "Analyze by groups",
                            AnalysisRequest::Group {
                                group_col: group_col.to_string(),
                                value_col: value_col.to_string(),
                            },
                        ));
                        tasks.push(Task::visualization(
                            "Create group comparison",
                            ChartRequest::Bar {
                                x_col: group_col.to_string(),
                                y_col: value_col.to_string(),
                                title: Some(format!("{value_col} by {group_col}")),
                                aggregate: Some(Aggregate::Mean),
                            },
                        ));
                    }
                    _ => warn!(
                        intent = %intent,
                        "Skipping intent: needs a categorical and a numeric column"
                    ),
                },
                Intent::Anomaly => match schema.first_numeric() {
                    Some(column) => tasks.push(Task::analysis(
                        "Detect anomalies",
                        AnalysisRequest::Anomaly {
                            column: column.to_string(),
                            threshold: None,
                        },
                    )),
                    None => warn!(intent = %intent, "Skipping intent: needs a numeric column"),
                },
            }
        }

        if tasks.len() == 1 {
            debug!("No intent produced tasks; adding correlation fallback");
            tasks.push(Task::analysis(
                "Analyze correlations",
                AnalysisRequest::Correlation,
            ));
        }

        let plan = ExecutionPlan::new(tasks);
        info!(tasks = plan.len(), description = %plan.description, "Execution plan compiled");
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(numeric: &[&str], categorical: &[&str], temporal: &[&str]) -> SchemaProfile {
        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        SchemaProfile {
            columns: Vec::new(),
            numeric: names(numeric),
            categorical: names(categorical),
            temporal: names(temporal),
        }
    }

    #[test]
    fn no_keywords_gives_summary_then_correlation() {
        let plan = PlanCompiler::new().compile("hello there", &schema(&["a", "b"], &[], &[]));
        assert_eq!(plan.result_keys(), vec!["summary", "correlation"]);
        assert_eq!(plan.description, "Execute 2 analysis tasks");
    }

    #[test]
    fn trend_without_dates_falls_back() {
        let plan =
            PlanCompiler::new().compile("show the trend", &schema(&["sales"], &["region"], &[]));
        assert_eq!(plan.result_keys(), vec!["summary", "correlation"]);
        assert!(plan
            .tasks
            .iter()
            .all(|task| !matches!(task.operation, TaskOperation::Visualization(_))));
    }

    #[test]
    fn trend_uses_first_columns_and_pairs_a_line_chart() {
        let plan = PlanCompiler::new().compile(
            "Sales trends over time",
            &schema(&["sales", "units"], &["region"], &["date", "shipped"]),
        );
        assert_eq!(plan.len(), 3);
        assert_eq!(
            plan.tasks[1].operation,
            TaskOperation::Analysis(AnalysisRequest::Trend {
                date_col: "date".to_string(),
                value_col: "sales".to_string(),
            })
        );
        assert_eq!(
            plan.tasks[2],
            Task::visualization(
                "Create trend visualization",
                ChartRequest::Line {
                    x_col: "date".to_string(),
                    y_col: "sales".to_string(),
                    title: Some("sales Trend Over Time".to_string()),
                }
            )
        );
    }

    #[test]
    fn every_intent_in_fixed_order() {
        let plan = PlanCompiler::new().compile(
            "unusual growth related to each segment",
            &schema(&["sales"], &["region"], &["date"]),
        );
        assert_eq!(
            plan.result_keys(),
            vec![
                "summary",
                "trend",
                "visualization",
                "correlation",
                "visualization",
                "group",
                "visualization",
                "anomaly"
            ]
        );
        assert_eq!(plan.description, "Execute 8 analysis tasks");
    }

    #[test]
    fn correlation_has_no_column_guard() {
        let plan = PlanCompiler::new().compile("any relationship?", &SchemaProfile::default());
        assert_eq!(plan.result_keys(), vec!["summary", "correlation", "visualization"]);
    }

    #[test]
    fn tasks_serialise_with_flat_parameters() {
        let task = Task::analysis(
            "Detect anomalies",
            AnalysisRequest::Anomaly {
                column: "sales".to_string(),
                threshold: None,
            },
        );
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "agent": "DataAnalyst",
                "action": "Detect anomalies",
                "analysis_type": "anomaly",
                "column": "sales"
            })
        );
    }
}
