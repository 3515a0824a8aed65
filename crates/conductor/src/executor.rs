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

use crate::plan::{ExecutionPlan, TaskOperation};
use tally::{AnalysisResults, Analyst, Dataset, TaskOutcome, Visualizer};
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct ExecutionOutcome {
    pub results: AnalysisResults,
    /// One agent name per executed task, in execution order.
    pub agents_used: Vec<String>,
}

/// Runs plan tasks in order against the analyst and visualizer adapters.
///
/// A failing task is recorded as an error outcome and the plan carries on.
/// Outcomes sharing a key overwrite earlier ones.
#[derive(Debug, Clone, Default)]
pub struct TaskExecutor {
    analyst: Analyst,
    visualizer: Visualizer,
}

impl TaskExecutor {
    pub fn new(analyst: Analyst, visualizer: Visualizer) -> Self {
        Self {
            analyst,
            visualizer,
        }
    }

    pub fn run(&self, plan: &ExecutionPlan, dataset: &Dataset) -> ExecutionOutcome {
        let mut outcome = ExecutionOutcome::default();
        for task in &plan.tasks {
            info!(agent = %task.agent, action = %task.action, "Dispatching task");
            outcome.agents_used.push(task.agent.to_string());
            let result = match &task.operation {
                TaskOperation::Analysis(request) => self
                    .analyst
                    .analyze(dataset, request)
                    .unwrap_or_else(|e| {
                        warn!(
                            action = %task.action,
                            category = e.category(),
                            error = %e,
                            "Analysis task failed"
                        );
                        TaskOutcome::error(e.to_string())
                    }),
                TaskOperation::Visualization(request) => {
                    self.visualizer.visualize(dataset, request)
                }
            };
            let key = task.result_key();
            if outcome.results.insert(key, result).is_some() {
                warn!(key, "Result overwritten by a later task");
            }
        }
        outcome
    }
}
