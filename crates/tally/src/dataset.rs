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

use crate::error::{Result, TallyError};
use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Text layouts tried, in order, when a string column is read as dates.
pub const TEMPORAL_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%SZ",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y%m%d",
];

const SECONDS_PER_DAY: f64 = 86_400.0;

pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::UInt64
            | DataType::UInt32
    )
}

pub fn is_temporal_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Date | DataType::Datetime(_, _))
}

pub fn is_categorical_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String | DataType::Boolean)
}

/// Parses a single text value into seconds since the Unix epoch.
pub fn parse_timestamp(value: &str) -> Option<f64> {
    let value = value.trim();
    TEMPORAL_FORMATS.iter().find_map(|format| {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc().timestamp() as f64);
        }
        NaiveDate::parse_from_str(value, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp() as f64)
    })
}

fn missing_count(column: &Column) -> usize {
    if !matches!(column.dtype(), DataType::Float64 | DataType::Float32) {
        return column.null_count();
    }
    column
        .as_materialized_series()
        .cast(&DataType::Float64)
        .ok()
        .and_then(|floats| {
            floats.f64().ok().map(|values| {
                values
                    .into_iter()
                    .filter(|value| value.map_or(true, f64::is_nan))
                    .count()
            })
        })
        .unwrap_or_else(|| column.null_count())
}

/// In-memory table of named, typed columns.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    frame: DataFrame,
}

impl Dataset {
    pub fn from_frame(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        Ok(Self::from_frame(DataFrame::new(columns)?))
    }

    /// Loads a `.csv` or `.json` file. CSV date columns are parsed on read.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let frame = match extension.as_deref() {
            Some("csv") => {
                let file = File::open(path)?;
                CsvReadOptions::default()
                    .with_has_header(true)
                    .map_parse_options(|options| options.with_try_parse_dates(true))
                    .into_reader_with_file_handle(file)
                    .finish()?
            }
            Some("json") => {
                let file = File::open(path)?;
                JsonReader::new(file).finish()?
            }
            _ => {
                return Err(TallyError::UnsupportedFormat {
                    source_path: path.display().to_string(),
                })
            }
        };
        debug!(
            path = %path.display(),
            rows = frame.height(),
            columns = frame.width(),
            "Loaded dataset"
        );
        Ok(Self::from_frame(frame))
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.width() == 0 || self.frame.height() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.frame
            .column(name)
            .map_err(|_| TallyError::column_not_found(name))
    }

    pub fn dtype(&self, name: &str) -> Result<DataType> {
        Ok(self.column(name)?.dtype().clone())
    }

    pub fn dtypes(&self) -> IndexMap<String, String> {
        self.frame
            .get_columns()
            .iter()
            .map(|column| (column.name().to_string(), column.dtype().to_string()))
            .collect()
    }

    /// Missing entries per column. Float `NaN` counts as missing.
    pub fn null_counts(&self) -> IndexMap<String, usize> {
        self.frame
            .get_columns()
            .iter()
            .map(|column| (column.name().to_string(), missing_count(column)))
            .collect()
    }

    pub fn estimated_size(&self) -> usize {
        self.frame.estimated_size()
    }

    /// Names of columns whose declared type is numeric, in column order.
    pub fn numeric_column_names(&self) -> Vec<String> {
        self.frame
            .get_columns()
            .iter()
            .filter(|column| is_numeric_dtype(column.dtype()))
            .map(|column| column.name().to_string())
            .collect()
    }

    /// A numeric column cast to `Float64`, with `NaN` turned into null.
    pub fn float_values(&self, name: &str) -> Result<Float64Chunked> {
        let column = self.column(name)?;
        if !is_numeric_dtype(column.dtype()) {
            return Err(TallyError::NotNumeric {
                column: name.to_string(),
                dtype: column.dtype().to_string(),
            });
        }
        let floats = column
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        Ok(Float64Chunked::from_iter_options(
            name.into(),
            floats.f64()?.into_iter().map(|value| value.filter(|v| !v.is_nan())),
        ))
    }

    pub fn numeric_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        Ok(self.float_values(name)?.into_iter().collect())
    }

    /// Every value rendered as text; dates keep their ISO form.
    pub fn text_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        let column = self.column(name)?;
        let text = column.as_materialized_series().cast(&DataType::String)?;
        Ok(text
            .str()?
            .into_iter()
            .map(|value| value.map(str::to_string))
            .collect())
    }

    /// Seconds since the epoch for each row of a date-like column.
    pub fn temporal_seconds(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let column = self.column(name)?;
        let series = column.as_materialized_series();
        match series.dtype() {
            DataType::Date => {
                let days = series.cast(&DataType::Int64)?;
                Ok(days
                    .i64()?
                    .into_iter()
                    .map(|day| day.map(|day| day as f64 * SECONDS_PER_DAY))
                    .collect())
            }
            DataType::Datetime(unit, _) => {
                let per_second = match unit {
                    TimeUnit::Nanoseconds => 1e9,
                    TimeUnit::Microseconds => 1e6,
                    TimeUnit::Milliseconds => 1e3,
                };
                let raw = series.cast(&DataType::Int64)?;
                Ok(raw
                    .i64()?
                    .into_iter()
                    .map(|value| value.map(|value| value as f64 / per_second))
                    .collect())
            }
            DataType::String => Ok(series
                .str()?
                .into_iter()
                .map(|value| value.and_then(parse_timestamp))
                .collect()),
            dtype if is_numeric_dtype(dtype) => self.numeric_values(name),
            dtype => Err(TallyError::NotTemporal {
                column: name.to_string(),
                dtype: dtype.to_string(),
            }),
        }
    }

    /// Keeps the rows whose mask entry is true.
    pub fn filter_rows(&self, mask: &[bool]) -> Result<Self> {
        let mask = BooleanChunked::from_slice("mask".into(), mask);
        Ok(Self::from_frame(self.frame.filter(&mask)?))
    }

    /// Replaces (or appends) a column with the same name as `series`.
    pub fn with_series(&self, series: Series) -> Result<Self> {
        let mut frame = self.frame.clone();
        frame.with_column(series)?;
        Ok(Self::from_frame(frame))
    }
}

impl From<DataFrame> for Dataset {
    fn from(frame: DataFrame) -> Self {
        Self::from_frame(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed() -> Dataset {
        let dates = Column::new("order_date".into(), [19723i32, 19724, 19725])
            .cast(&DataType::Date)
            .unwrap();
        Dataset::from_columns(vec![
            dates,
            Column::new("sales".into(), [10.0, 12.5, 9.0]),
            Column::new("region".into(), ["North", "South", "North"]),
            Column::new("units".into(), [Some(3i64), None, Some(5)]),
        ])
        .unwrap()
    }

    #[test]
    fn reports_shape_and_nulls() {
        let data = mixed();
        assert_eq!(data.height(), 3);
        assert_eq!(data.width(), 4);
        assert_eq!(data.null_counts()["units"], 1);
        assert_eq!(data.numeric_column_names(), vec!["sales", "units"]);
    }

    #[test]
    fn nan_counts_as_missing() {
        let data = Dataset::from_columns(vec![
            Column::new("ratio".into(), [Some(0.5), Some(f64::NAN), None]),
            Column::new("label".into(), [Some("a"), None, Some("c")]),
        ])
        .unwrap();
        let missing = data.null_counts();
        assert_eq!(missing["ratio"], 2);
        assert_eq!(missing["label"], 1);
        assert_eq!(data.numeric_values("ratio").unwrap(), vec![Some(0.5), None, None]);
    }

    #[test]
    fn date_columns_convert_to_epoch_seconds() {
        let seconds = mixed().temporal_seconds("order_date").unwrap();
        assert_eq!(seconds[0], Some(19723.0 * 86_400.0));
        assert_eq!(seconds[2], Some(19725.0 * 86_400.0));
    }

    #[test]
    fn string_dates_are_parsed_with_known_formats() {
        assert_eq!(parse_timestamp("1970-01-02"), Some(86_400.0));
        assert_eq!(parse_timestamp("01/02/1970"), Some(86_400.0));
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn text_columns_are_not_numeric() {
        let err = mixed().numeric_values("region").unwrap_err();
        assert!(matches!(err, TallyError::NotNumeric { .. }));
        let err = mixed().numeric_values("missing").unwrap_err();
        assert!(err.is_caller_error());
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = Dataset::from_path("data.parquet").unwrap_err();
        assert!(matches!(err, TallyError::UnsupportedFormat { .. }));
    }
}
