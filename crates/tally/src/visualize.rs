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

use crate::dataset::{is_numeric_dtype, Dataset};
use crate::error::{Result, TallyError};
use crate::results::{AnalysisPayload, TaskOutcome};
use crate::schema::SchemaProfile;
use crate::stats;
use indexmap::IndexMap;
use polars::prelude::ChunkAgg;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    Scatter,
    Heatmap,
    Distribution,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Scatter => "scatter",
            ChartKind::Heatmap => "heatmap",
            ChartKind::Distribution => "distribution",
        }
    }

    pub fn default_title(&self) -> &'static str {
        match self {
            ChartKind::Line => "Line Chart",
            ChartKind::Bar => "Bar Chart",
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::Heatmap => "Correlation Heatmap",
            ChartKind::Distribution => "Distribution Plot",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    Mean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "viz_type", rename_all = "snake_case")]
pub enum ChartRequest {
    Line {
        x_col: String,
        y_col: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    Bar {
        x_col: String,
        y_col: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        aggregate: Option<Aggregate>,
    },
    Scatter {
        x_col: String,
        y_col: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hue_col: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    Heatmap {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    Distribution {
        column: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bins: Option<usize>,
    },
    Unknown {
        name: String,
    },
}

impl ChartRequest {
    pub fn kind(&self) -> Option<ChartKind> {
        match self {
            ChartRequest::Line { .. } => Some(ChartKind::Line),
            ChartRequest::Bar { .. } => Some(ChartKind::Bar),
            ChartRequest::Scatter { .. } => Some(ChartKind::Scatter),
            ChartRequest::Heatmap { .. } => Some(ChartKind::Heatmap),
            ChartRequest::Distribution { .. } => Some(ChartKind::Distribution),
            ChartRequest::Unknown { .. } => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ChartRequest::Unknown { name } => name,
            known => known.kind().map_or("unknown", |kind| kind.as_str()),
        }
    }

    fn title(&self) -> Option<&str> {
        match self {
            ChartRequest::Line { title, .. }
            | ChartRequest::Bar { title, .. }
            | ChartRequest::Scatter { title, .. }
            | ChartRequest::Heatmap { title }
            | ChartRequest::Distribution { title, .. } => title.as_deref(),
            ChartRequest::Unknown { .. } => None,
        }
    }
}

/// One plotted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Datum {
    Number(f64),
    Text(String),
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub x: Vec<Datum>,
    pub y: Vec<Datum>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapGrid {
    pub labels: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

/// Renderer-neutral description of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub chart: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub traces: Vec<Trace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<HeatmapGrid>,
    pub width: f64,
    pub height: f64,
    pub style: String,
}

impl Figure {
    /// Stable one-line description, used wherever the figure itself cannot be stored.
    pub fn descriptor(&self) -> String {
        format!("Figure({}: {})", self.chart, self.title)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let body = serde_json::to_string_pretty(self)?;
        std::fs::write(path, body)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualizationReport {
    pub viz_type: ChartKind,
    pub figure: Figure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub width: f64,
    pub height: f64,
    pub style: String,
    pub histogram_bins: usize,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 10.0,
            height: 6.0,
            style: "seaborn-v0_8".to_string(),
            histogram_bins: 30,
        }
    }
}

/// Chart adapter. Every failure is returned as an error outcome.
#[derive(Debug, Clone, Default)]
pub struct Visualizer {
    config: FigureConfig,
}

impl Visualizer {
    pub const NAME: &'static str = "Visualizer";

    pub fn new(config: FigureConfig) -> Self {
        Self { config }
    }

    pub fn visualize(&self, dataset: &Dataset, request: &ChartRequest) -> TaskOutcome {
        let Some(viz_type) = request.kind() else {
            return TaskOutcome::error(format!("Unknown visualization type: {}", request.name()));
        };
        match self.render(dataset, request) {
            Ok(figure) => TaskOutcome::Success(AnalysisPayload::Visualization(VisualizationReport {
                viz_type,
                figure,
            })),
            Err(e) => {
                warn!(viz_type = %viz_type, error = %e, "Visualization failed");
                TaskOutcome::error(e.to_string())
            }
        }
    }

    pub fn render(&self, dataset: &Dataset, request: &ChartRequest) -> Result<Figure> {
        let title = request.title().map(str::to_string);
        let figure = match request {
            ChartRequest::Line { x_col, y_col, .. } => {
                let trace = Trace {
                    name: None,
                    x: axis_values(dataset, x_col)?,
                    y: numeric_axis(dataset, y_col)?,
                };
                self.figure(ChartKind::Line, title, x_col, y_col, vec![trace])
            }
            ChartRequest::Bar {
                x_col,
                y_col,
                aggregate,
                ..
            } => {
                let trace = match aggregate {
                    Some(Aggregate::Mean) => mean_by_category(dataset, x_col, y_col)?,
                    None => Trace {
                        name: None,
                        x: axis_values(dataset, x_col)?,
                        y: numeric_axis(dataset, y_col)?,
                    },
                };
                self.figure(ChartKind::Bar, title, x_col, y_col, vec![trace])
            }
            ChartRequest::Scatter {
                x_col,
                y_col,
                hue_col,
                ..
            } => {
                let traces = match hue_col {
                    Some(hue) => traces_by_hue(dataset, x_col, y_col, hue)?,
                    None => vec![Trace {
                        name: None,
                        x: numeric_axis(dataset, x_col)?,
                        y: numeric_axis(dataset, y_col)?,
                    }],
                };
                self.figure(ChartKind::Scatter, title, x_col, y_col, traces)
            }
            ChartRequest::Heatmap { .. } => {
                let labels = dataset.numeric_column_names();
                if labels.is_empty() {
                    return Err(TallyError::insufficient("heatmap", "no numeric columns"));
                }
                let columns = labels
                    .iter()
                    .map(|name| dataset.numeric_values(name))
                    .collect::<Result<Vec<_>>>()?;
                let values = columns
                    .iter()
                    .map(|row| {
                        columns
                            .iter()
                            .map(|col| stats::pearson(row, col).map(|r| stats::round_to(r, 2)))
                            .collect()
                    })
                    .collect();
                let mut figure = self.figure(ChartKind::Heatmap, title, "", "", Vec::new());
                figure.grid = Some(HeatmapGrid { labels, values });
                figure
            }
            ChartRequest::Distribution { column, bins, .. } => {
                let dtype = dataset.dtype(column)?;
                if !is_numeric_dtype(&dtype) {
                    return Err(TallyError::NotNumeric {
                        column: column.clone(),
                        dtype: dtype.to_string(),
                    });
                }
                let values = stats::present(&dataset.numeric_values(column)?);
                let (edges, counts) =
                    stats::histogram(&values, bins.unwrap_or(self.config.histogram_bins));
                let centres = edges
                    .windows(2)
                    .map(|pair| Datum::Number((pair[0] + pair[1]) / 2.0))
                    .collect();
                let trace = Trace {
                    name: None,
                    x: centres,
                    y: counts.into_iter().map(|c| Datum::Number(c as f64)).collect(),
                };
                self.figure(ChartKind::Distribution, title, column, "Frequency", vec![trace])
            }
            ChartRequest::Unknown { name } => {
                return Err(TallyError::InvalidParameter {
                    param: "viz_type".to_string(),
                    value: name.clone(),
                })
            }
        };
        debug!(chart = %figure.chart, traces = figure.traces.len(), "Figure rendered");
        Ok(figure)
    }

    fn figure(
        &self,
        chart: ChartKind,
        title: Option<String>,
        x_label: &str,
        y_label: &str,
        traces: Vec<Trace>,
    ) -> Figure {
        Figure {
            chart,
            title: title.unwrap_or_else(|| chart.default_title().to_string()),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            traces,
            grid: None,
            width: self.config.width,
            height: self.config.height,
            style: self.config.style.clone(),
        }
    }
}

fn numeric_axis(dataset: &Dataset, column: &str) -> Result<Vec<Datum>> {
    Ok(dataset
        .numeric_values(column)?
        .into_iter()
        .map(|value| value.map_or(Datum::Missing, Datum::Number))
        .collect())
}

fn axis_values(dataset: &Dataset, column: &str) -> Result<Vec<Datum>> {
    if is_numeric_dtype(&dataset.dtype(column)?) {
        return numeric_axis(dataset, column);
    }
    Ok(dataset
        .text_values(column)?
        .into_iter()
        .map(|value| value.map_or(Datum::Missing, Datum::Text))
        .collect())
}

fn mean_by_category(dataset: &Dataset, x_col: &str, y_col: &str) -> Result<Trace> {
    let keys = dataset.text_values(x_col)?;
    let values = dataset.numeric_values(y_col)?;
    let mut buckets: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (key, value) in keys.into_iter().zip(values) {
        if let (Some(key), Some(value)) = (key, value) {
            buckets.entry(key).or_default().push(value);
        }
    }
    let (x, y) = buckets
        .into_iter()
        .map(|(key, values)| {
            (
                Datum::Text(key),
                stats::to_chunked(&values)
                    .mean()
                    .map_or(Datum::Missing, Datum::Number),
            )
        })
        .unzip();
    Ok(Trace { name: None, x, y })
}

fn traces_by_hue(dataset: &Dataset, x_col: &str, y_col: &str, hue: &str) -> Result<Vec<Trace>> {
    let xs = numeric_axis(dataset, x_col)?;
    let ys = numeric_axis(dataset, y_col)?;
    let hues = dataset.text_values(hue)?;
    let mut traces: IndexMap<String, Trace> = IndexMap::new();
    for ((x, y), category) in xs.into_iter().zip(ys).zip(hues) {
        let label = category.unwrap_or_else(|| "null".to_string());
        let trace = traces.entry(label.clone()).or_insert_with(|| Trace {
            name: Some(label),
            x: Vec::new(),
            y: Vec::new(),
        });
        trace.x.push(x);
        trace.y.push(y);
    }
    Ok(traces.into_values().collect())
}

/// Picks a chart kind for an analysis goal and the available columns.
pub fn suggest_chart(schema: &SchemaProfile, goal: &str) -> ChartKind {
    let goal = goal.to_lowercase();
    if goal.contains("trend") || goal.contains("time") {
        ChartKind::Line
    } else if goal.contains("correlation") {
        ChartKind::Heatmap
    } else if goal.contains("distribution") {
        ChartKind::Distribution
    } else if goal.contains("compare") || goal.contains("comparison") {
        ChartKind::Bar
    } else if schema.numeric.len() >= 2 {
        ChartKind::Scatter
    } else {
        ChartKind::Bar
    }
}
