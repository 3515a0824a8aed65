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

use crate::dataset::{is_categorical_dtype, is_numeric_dtype, is_temporal_dtype, Dataset};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnCategory {
    Numeric,
    Categorical,
    Temporal,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalRule {
    DeclaredType,
    NameContainsDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub category: ColumnCategory,
    pub dtype: String,
    pub null_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporal_rule: Option<TemporalRule>,
}

/// Column classification used to decide which analyses apply.
///
/// The three name lists are disjoint and keep dataset column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaProfile {
    pub columns: Vec<ColumnProfile>,
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub temporal: Vec<String>,
}

impl SchemaProfile {
    pub fn first_numeric(&self) -> Option<&str> {
        self.numeric.first().map(String::as_str)
    }

    pub fn first_categorical(&self) -> Option<&str> {
        self.categorical.first().map(String::as_str)
    }

    pub fn first_temporal(&self) -> Option<&str> {
        self.temporal.first().map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct SchemaInspector {
    date_marker: String,
}

impl Default for SchemaInspector {
    fn default() -> Self {
        Self {
            date_marker: "date".to_string(),
        }
    }
}

impl SchemaInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inspect(&self, dataset: &Dataset) -> SchemaProfile {
        let mut columns: Vec<ColumnProfile> = dataset
            .frame()
            .get_columns()
            .iter()
            .map(|column| {
                let dtype = column.dtype();
                let (category, temporal_rule) = if is_numeric_dtype(dtype) {
                    (ColumnCategory::Numeric, None)
                } else if is_temporal_dtype(dtype) {
                    (ColumnCategory::Temporal, Some(TemporalRule::DeclaredType))
                } else if is_categorical_dtype(dtype) {
                    (ColumnCategory::Categorical, None)
                } else {
                    (ColumnCategory::Other, None)
                };
                ColumnProfile {
                    name: column.name().to_string(),
                    category,
                    dtype: dtype.to_string(),
                    null_count: column.null_count(),
                    temporal_rule,
                }
            })
            .collect();

        let declared_temporal = columns
            .iter()
            .any(|column| column.category == ColumnCategory::Temporal);
        if !declared_temporal {
            for column in &mut columns {
                if column.name.to_lowercase().contains(&self.date_marker) {
                    column.category = ColumnCategory::Temporal;
                    column.temporal_rule = Some(TemporalRule::NameContainsDate);
                }
            }
        }

        let names_in = |category: ColumnCategory| -> Vec<String> {
            columns
                .iter()
                .filter(|column| column.category == category)
                .map(|column| column.name.clone())
                .collect()
        };
        let profile = SchemaProfile {
            numeric: names_in(ColumnCategory::Numeric),
            categorical: names_in(ColumnCategory::Categorical),
            temporal: names_in(ColumnCategory::Temporal),
            columns,
        };
        debug!(
            numeric = profile.numeric.len(),
            categorical = profile.categorical.len(),
            temporal = profile.temporal.len(),
            "Schema inspected"
        );
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn declared_dates_win_over_names() {
        let dates = Column::new("when".into(), [19723i32, 19724])
            .cast(&DataType::Date)
            .unwrap();
        let data = Dataset::from_columns(vec![
            dates,
            Column::new("update_date".into(), ["a", "b"]),
            Column::new("sales".into(), [1.0, 2.0]),
        ])
        .unwrap();
        let profile = SchemaInspector::new().inspect(&data);
        assert_eq!(profile.temporal, vec!["when"]);
        assert_eq!(profile.categorical, vec!["update_date"]);
        assert_eq!(profile.numeric, vec!["sales"]);
    }

    #[test]
    fn date_named_text_column_becomes_temporal() {
        let data = Dataset::from_columns(vec![
            Column::new("Order_Date".into(), ["2024-01-01", "2024-01-02"]),
            Column::new("region".into(), ["North", "South"]),
        ])
        .unwrap();
        let profile = SchemaInspector::new().inspect(&data);
        assert_eq!(profile.temporal, vec!["Order_Date"]);
        assert_eq!(profile.categorical, vec!["region"]);
        assert_eq!(
            profile.columns[0].temporal_rule,
            Some(TemporalRule::NameContainsDate)
        );
    }

    #[test]
    fn empty_dataset_has_empty_lists() {
        let profile = SchemaInspector::new().inspect(&Dataset::default());
        assert!(profile.numeric.is_empty());
        assert!(profile.categorical.is_empty());
        assert!(profile.temporal.is_empty());
    }
}
