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

use crate::config::AnalyticsConfig;
use crate::executor::TaskExecutor;
use crate::insights::synthesize;
use crate::plan::{ExecutionPlan, PlanCompiler};
use crate::recommendations::{recommend, Recommendation};
use recall::{MemoryBackend, MemoryEntry, MemoryStore};
use serde::Serialize;
use tally::{AnalysisResults, Analyst, Dataset, SchemaInspector, Visualizer};
use tracing::{info, warn};

/// Everything produced for one query.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsResponse {
    pub query: String,
    pub execution_plan: ExecutionPlan,
    pub analysis_results: AnalysisResults,
    pub insights: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub agents_used: Vec<String>,
    pub relevant_memories: Vec<MemoryEntry>,
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
    inspector: SchemaInspector,
    compiler: PlanCompiler,
    executor: TaskExecutor,
    relevant_top_k: usize,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(&AnalyticsConfig::default())
    }
}

impl Orchestrator {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            inspector: SchemaInspector::new(),
            compiler: PlanCompiler::new(),
            executor: TaskExecutor::new(
                Analyst::new(config.analysis),
                Visualizer::new(config.visualization.clone()),
            ),
            relevant_top_k: config.memory.relevant_top_k,
        }
    }

    /// Runs the full pipeline for one query and records it in `memory`.
    ///
    /// Relevant history is read before the new entry is written. A failed
    /// memory write is logged and the response is still returned.
    pub fn process<B: MemoryBackend>(
        &self,
        query: &str,
        dataset: &Dataset,
        memory: &mut MemoryStore<B>,
    ) -> AnalyticsResponse {
        info!(query, "Processing query");
        let relevant_memories: Vec<MemoryEntry> = memory
            .relevant(query, self.relevant_top_k)
            .into_iter()
            .cloned()
            .collect();

        let schema = self.inspector.inspect(dataset);
        let execution_plan = self.compiler.compile(query, &schema);
        let outcome = self.executor.run(&execution_plan, dataset);

        let insights = synthesize(&outcome.results);
        let recommendations = recommend(&outcome.results);
        info!(
            insights = insights.len(),
            recommendations = recommendations.len(),
            "Synthesis complete"
        );

        if let Err(e) = memory.record(query, &outcome.agents_used, &outcome.results, &insights) {
            warn!(error = %e, "Failed to persist memory entry");
        }

        AnalyticsResponse {
            query: query.to_string(),
            execution_plan,
            analysis_results: outcome.results,
            insights,
            recommendations,
            agents_used: outcome.agents_used,
            relevant_memories,
        }
    }
}
