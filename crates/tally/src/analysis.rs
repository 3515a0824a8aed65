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

use crate::dataset::Dataset;
use crate::error::{Result, TallyError};
use crate::results::{AnalysisPayload, TaskOutcome};
use crate::stats::{self, DescriptiveStats};
use indexmap::IndexMap;
use polars::prelude::{ChunkAgg, ChunkQuantile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Summary,
    Correlation,
    Trend,
    Group,
    Anomaly,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 5] = [
        AnalysisKind::Summary,
        AnalysisKind::Correlation,
        AnalysisKind::Trend,
        AnalysisKind::Group,
        AnalysisKind::Anomaly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Summary => "summary",
            AnalysisKind::Correlation => "correlation",
            AnalysisKind::Trend => "trend",
            AnalysisKind::Group => "group",
            AnalysisKind::Anomaly => "anomaly",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single analyst operation and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "analysis_type", rename_all = "snake_case")]
pub enum AnalysisRequest {
    Summary,
    Correlation,
    Trend {
        date_col: String,
        value_col: String,
    },
    Group {
        group_col: String,
        value_col: String,
    },
    Anomaly {
        column: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        threshold: Option<f64>,
    },
    Unknown {
        name: String,
    },
}

/// Named string parameters, as supplied by callers that dispatch on text tags.
pub type Params = IndexMap<String, String>;

impl AnalysisRequest {
    pub fn kind(&self) -> Option<AnalysisKind> {
        match self {
            AnalysisRequest::Summary => Some(AnalysisKind::Summary),
            AnalysisRequest::Correlation => Some(AnalysisKind::Correlation),
            AnalysisRequest::Trend { .. } => Some(AnalysisKind::Trend),
            AnalysisRequest::Group { .. } => Some(AnalysisKind::Group),
            AnalysisRequest::Anomaly { .. } => Some(AnalysisKind::Anomaly),
            AnalysisRequest::Unknown { .. } => None,
        }
    }

    /// The result key this request writes to.
    pub fn name(&self) -> &str {
        match self {
            AnalysisRequest::Unknown { name } => name,
            known => known.kind().map_or("unknown", |kind| kind.as_str()),
        }
    }

    /// Builds a request from a kind tag and named parameters.
    pub fn from_parts(kind: &str, params: &Params) -> Result<Self> {
        let require = |param: &str| -> Result<String> {
            params
                .get(param)
                .cloned()
                .ok_or_else(|| TallyError::missing_parameter(kind, param))
        };
        let Some(known) = AnalysisKind::from_name(kind) else {
            return Ok(AnalysisRequest::Unknown {
                name: kind.to_string(),
            });
        };
        Ok(match known {
            AnalysisKind::Summary => AnalysisRequest::Summary,
            AnalysisKind::Correlation => AnalysisRequest::Correlation,
            AnalysisKind::Trend => AnalysisRequest::Trend {
                date_col: require("date_col")?,
                value_col: require("value_col")?,
            },
            AnalysisKind::Group => AnalysisRequest::Group {
                group_col: require("group_col")?,
                value_col: require("value_col")?,
            },
            AnalysisKind::Anomaly => {
                let threshold = match params.get("threshold") {
                    Some(raw) => Some(raw.parse::<f64>().map_err(|_| {
                        TallyError::InvalidParameter {
                            param: "threshold".to_string(),
                            value: raw.clone(),
                        }
                    })?),
                    None => None,
                };
                AnalysisRequest::Anomaly {
                    column: require("column")?,
                    threshold,
                }
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    pub dtypes: IndexMap<String, String>,
    pub missing_values: IndexMap<String, usize>,
    pub estimated_size_bytes: usize,
    pub detailed_statistics: IndexMap<String, DescriptiveStats>,
}

impl SummaryReport {
    pub fn total_missing(&self) -> usize {
        self.missing_values.values().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub var1: String,
    pub var2: String,
    pub correlation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    pub columns: Vec<String>,
    pub matrix: Vec<Vec<Option<f64>>>,
    /// Pairs above the strength threshold, in upper-triangle scan order.
    pub strong_correlations: Vec<CorrelationPair>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Increasing => f.write_str("increasing"),
            TrendDirection::Decreasing => f.write_str("decreasing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendFit {
    pub trend: TrendDirection,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthReport {
    pub total_growth_percent: Option<f64>,
    pub first_value: f64,
    pub last_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub date_col: String,
    pub value_col: String,
    pub trend_analysis: TrendFit,
    pub growth_analysis: GrowthReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupReport {
    pub group_col: String,
    pub value_col: String,
    pub group_statistics: IndexMap<String, GroupStats>,
    pub best_performing: Option<String>,
    pub worst_performing: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub column: String,
    pub threshold: f64,
    pub anomaly_count: usize,
    pub anomaly_indices: Vec<usize>,
    pub anomaly_percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalystConfig {
    pub anomaly_threshold: f64,
    pub strong_correlation: f64,
}

impl Default for AnalystConfig {
    fn default() -> Self {
        Self {
            anomaly_threshold: 3.0,
            strong_correlation: 0.7,
        }
    }
}

/// Statistical adapter. Bad parameters propagate as errors; an unknown kind
/// comes back as an error outcome.
#[derive(Debug, Clone, Default)]
pub struct Analyst {
    config: AnalystConfig,
}

impl Analyst {
    pub const NAME: &'static str = "DataAnalyst";

    pub fn new(config: AnalystConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, dataset: &Dataset, request: &AnalysisRequest) -> Result<TaskOutcome> {
        info!(analysis = request.name(), "Running analysis");
        let payload = match request {
            AnalysisRequest::Summary => AnalysisPayload::Summary(self.summary(dataset)?),
            AnalysisRequest::Correlation => {
                AnalysisPayload::Correlation(self.correlation(dataset)?)
            }
            AnalysisRequest::Trend {
                date_col,
                value_col,
            } => AnalysisPayload::Trend(self.trend(dataset, date_col, value_col)?),
            AnalysisRequest::Group {
                group_col,
                value_col,
            } => AnalysisPayload::Group(self.group(dataset, group_col, value_col)?),
            AnalysisRequest::Anomaly { column, threshold } => AnalysisPayload::Anomaly(
                self.anomalies(
                    dataset,
                    column,
                    threshold.unwrap_or(self.config.anomaly_threshold),
                )?,
            ),
            AnalysisRequest::Unknown { name } => {
                return Ok(TaskOutcome::error(format!("Unknown analysis type: {name}")))
            }
        };
        Ok(TaskOutcome::Success(payload))
    }

    /// Text-tag entry point: `analyze(dataset, kind, params)`.
    pub fn analyze_named(
        &self,
        dataset: &Dataset,
        kind: &str,
        params: &Params,
    ) -> Result<TaskOutcome> {
        let request = AnalysisRequest::from_parts(kind, params)?;
        self.analyze(dataset, &request)
    }

    pub fn summary(&self, dataset: &Dataset) -> Result<SummaryReport> {
        let mut detailed_statistics = IndexMap::new();
        for name in dataset.numeric_column_names() {
            let values = dataset.float_values(&name)?;
            detailed_statistics.insert(name, DescriptiveStats::from_chunked(&values));
        }
        Ok(SummaryReport {
            rows: dataset.height(),
            columns: dataset.width(),
            column_names: dataset.column_names(),
            dtypes: dataset.dtypes(),
            missing_values: dataset.null_counts(),
            estimated_size_bytes: dataset.estimated_size(),
            detailed_statistics,
        })
    }

    pub fn correlation(&self, dataset: &Dataset) -> Result<CorrelationReport> {
        let columns = dataset.numeric_column_names();
        let values = columns
            .iter()
            .map(|name| dataset.numeric_values(name))
            .collect::<Result<Vec<_>>>()?;
        let size = columns.len();
        let mut matrix = vec![vec![None; size]; size];
        for i in 0..size {
            for j in i..size {
                let coefficient = if i == j {
                    stats::pearson(&values[i], &values[j]).map(|_| 1.0)
                } else {
                    stats::pearson(&values[i], &values[j])
                };
                matrix[i][j] = coefficient;
                matrix[j][i] = coefficient;
            }
        }
        let mut strong_correlations = Vec::new();
        for i in 0..size {
            for j in (i + 1)..size {
                if let Some(r) = matrix[i][j] {
                    if r.abs() > self.config.strong_correlation {
                        strong_correlations.push(CorrelationPair {
                            var1: columns[i].clone(),
                            var2: columns[j].clone(),
                            correlation: stats::round_to(r, 3),
                        });
                    }
                }
            }
        }
        debug!(
            columns = size,
            strong = strong_correlations.len(),
            "Correlation matrix computed"
        );
        Ok(CorrelationReport {
            columns,
            matrix,
            strong_correlations,
        })
    }

    pub fn trend(&self, dataset: &Dataset, date_col: &str, value_col: &str) -> Result<TrendReport> {
        let dates = dataset.temporal_seconds(date_col)?;
        let values = dataset.numeric_values(value_col)?;
        let mut rows: Vec<(f64, f64)> = dates
            .into_iter()
            .zip(values)
            .filter_map(|pair| match pair {
                (Some(at), Some(value)) if !at.is_nan() && !value.is_nan() => Some((at, value)),
                _ => None,
            })
            .collect();
        if rows.len() < 2 {
            return Err(TallyError::insufficient(
                "trend",
                format!("{} usable rows in '{date_col}'/'{value_col}'", rows.len()),
            ));
        }
        rows.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (xs, ys): (Vec<f64>, Vec<f64>) = rows.iter().copied().unzip();
        let fit = stats::linear_regression(&xs, &ys)
            .ok_or_else(|| TallyError::insufficient("trend", "regression is undefined"))?;
        let first_value = ys[0];
        let last_value = ys[ys.len() - 1];
        let total_growth_percent = (first_value != 0.0)
            .then(|| stats::round_to((last_value - first_value) / first_value * 100.0, 2));
        Ok(TrendReport {
            date_col: date_col.to_string(),
            value_col: value_col.to_string(),
            trend_analysis: TrendFit {
                trend: if fit.slope > 0.0 {
                    TrendDirection::Increasing
                } else {
                    TrendDirection::Decreasing
                },
                slope: fit.slope,
                intercept: fit.intercept,
                r_squared: fit.r_squared,
            },
            growth_analysis: GrowthReport {
                total_growth_percent,
                first_value,
                last_value,
            },
        })
    }

    pub fn group(
        &self,
        dataset: &Dataset,
        group_col: &str,
        value_col: &str,
    ) -> Result<GroupReport> {
        let keys = dataset.text_values(group_col)?;
        let values = dataset.numeric_values(value_col)?;
        let mut buckets: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for (key, value) in keys.into_iter().zip(values) {
            let Some(key) = key else { continue };
            let bucket = buckets.entry(key).or_default();
            if let Some(value) = value.filter(|value| !value.is_nan()) {
                bucket.push(value);
            }
        }
        let round = |value: Option<f64>| value.map(|value| stats::round_to(value, 2));
        let group_statistics: IndexMap<String, GroupStats> = buckets
            .into_iter()
            .map(|(key, values)| {
                let values = stats::to_chunked(&values);
                let summary = GroupStats {
                    count: values.len(),
                    mean: round(values.mean()),
                    median: round(values.median()),
                    std: round(stats::deviation(&values, 1)),
                    min: round(values.min()),
                    max: round(values.max()),
                };
                (key, summary)
            })
            .collect();

        let mut best: Option<(&String, f64)> = None;
        let mut worst: Option<(&String, f64)> = None;
        for (key, summary) in &group_statistics {
            let Some(mean) = summary.mean else { continue };
            if best.map_or(true, |(_, top)| mean > top) {
                best = Some((key, mean));
            }
            if worst.map_or(true, |(_, bottom)| mean < bottom) {
                worst = Some((key, mean));
            }
        }
        let best_performing = best.map(|(key, _)| key.clone());
        let worst_performing = worst.map(|(key, _)| key.clone());
        Ok(GroupReport {
            group_col: group_col.to_string(),
            value_col: value_col.to_string(),
            group_statistics,
            best_performing,
            worst_performing,
        })
    }

    pub fn anomalies(
        &self,
        dataset: &Dataset,
        column: &str,
        threshold: f64,
    ) -> Result<AnomalyReport> {
        let values = dataset.numeric_values(column)?;
        let (positions, present): (Vec<usize>, Vec<f64>) = values
            .iter()
            .enumerate()
            .filter_map(|(row, value)| value.filter(|v| !v.is_nan()).map(|v| (row, v)))
            .unzip();
        let anomaly_indices: Vec<usize> = stats::z_scores(&present)
            .iter()
            .zip(&positions)
            .filter(|(z, _)| z.abs() > threshold)
            .map(|(_, row)| *row)
            .collect();
        let anomaly_count = anomaly_indices.len();
        let anomaly_percentage = if dataset.height() == 0 {
            0.0
        } else {
            stats::round_to(anomaly_count as f64 / dataset.height() as f64 * 100.0, 2)
        };
        debug!(column, anomaly_count, threshold, "Anomaly scan complete");
        Ok(AnomalyReport {
            column: column.to_string(),
            threshold,
            anomaly_count,
            anomaly_indices,
            anomaly_percentage,
        })
    }
}
