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
use crate::error::Result;
use polars::prelude::{ChunkQuantile, DataType, NamedFrom, Series};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

pub const UNKNOWN_LABEL: &str = "Unknown";

/// Drops repeated rows (first kept), then fills numeric gaps with the column
/// median and text gaps with the most frequent value.
pub fn clean(dataset: &Dataset) -> Result<Dataset> {
    let names = dataset.column_names();
    let rendered = names
        .iter()
        .map(|name| dataset.text_values(name))
        .collect::<Result<Vec<_>>>()?;
    let mut seen = HashSet::new();
    let mask: Vec<bool> = (0..dataset.height())
        .map(|row| {
            let key: Vec<Option<&str>> = rendered
                .iter()
                .map(|column| column[row].as_deref())
                .collect();
            seen.insert(key)
        })
        .collect();
    let duplicates = mask.iter().filter(|keep| !**keep).count();
    let mut cleaned = dataset.filter_rows(&mask)?;

    for name in &names {
        let column = cleaned.column(name)?;
        if column.null_count() == 0 {
            continue;
        }
        let dtype = column.dtype().clone();
        if is_numeric_dtype(&dtype) {
            let values = cleaned.float_values(name)?;
            let Some(fill) = values.median() else {
                continue;
            };
            let filled: Vec<f64> = values.into_iter().map(|v| v.unwrap_or(fill)).collect();
            cleaned = cleaned.with_series(Series::new(name.as_str().into(), filled))?;
        } else if dtype == DataType::String {
            let values = cleaned.text_values(name)?;
            let fill = mode(&values).unwrap_or_else(|| UNKNOWN_LABEL.to_string());
            let filled: Vec<String> = values
                .into_iter()
                .map(|v| v.unwrap_or_else(|| fill.clone()))
                .collect();
            cleaned = cleaned.with_series(Series::new(name.as_str().into(), filled))?;
        }
    }
    debug!(duplicates, rows = cleaned.height(), "Dataset cleaned");
    Ok(cleaned)
}

/// Most frequent present value; ties go to the smallest value.
fn mode(values: &[Option<String>]) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values.iter().flatten() {
        *counts.entry(value.as_str()).or_default() += 1;
    }
    let top = counts.values().copied().max()?;
    counts
        .into_iter()
        .find(|(_, count)| *count == top)
        .map(|(value, _)| value.to_string())
}
