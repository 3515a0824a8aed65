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

pub mod analysis;
pub mod cleaning;
pub mod dataset;
pub mod error;
pub mod results;
pub mod sample;
pub mod schema;
pub mod stats;
pub mod visualize;

pub use analysis::{
    AnalysisKind, AnalysisRequest, Analyst, AnalystConfig, AnomalyReport, CorrelationPair,
    CorrelationReport, GroupReport, GroupStats, GrowthReport, Params, SummaryReport,
    TrendDirection, TrendFit, TrendReport,
};
pub use cleaning::clean;
pub use dataset::Dataset;
pub use error::{Result, TallyError};
pub use results::{AnalysisPayload, AnalysisResults, TaskOutcome, VISUALIZATION_KEY};
pub use schema::{ColumnCategory, ColumnProfile, SchemaInspector, SchemaProfile, TemporalRule};
pub use stats::DescriptiveStats;
pub use visualize::{
    suggest_chart, Aggregate, ChartKind, ChartRequest, Datum, Figure, FigureConfig, Trace,
    VisualizationReport, Visualizer,
};
