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

use thiserror::Error;
#[derive(Error, Debug)]
pub enum TallyError {
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },
    #[error("Missing required parameter '{param}' for {operation}")]
    MissingParameter { operation: String, param: String },
    #[error("Invalid value '{value}' for parameter '{param}'")]
    InvalidParameter { param: String, value: String },
    #[error("Column '{column}' is not numeric (found {dtype})")]
    NotNumeric { column: String, dtype: String },
    #[error("Column '{column}' cannot be read as dates (found {dtype})")]
    NotTemporal { column: String, dtype: String },
    #[error("Insufficient data for {operation}: {reason}")]
    InsufficientData { operation: String, reason: String },
    #[error("Unsupported data source: {source_path}")]
    UnsupportedFormat { source_path: String },
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialisation failed: {0}")]
    Serialisation(#[from] serde_json::Error),
}
pub type Result<T> = std::result::Result<T, TallyError>;
impl TallyError {
    pub fn column_not_found(column: &str) -> Self {
        TallyError::ColumnNotFound {
            column: column.to_string(),
        }
    }
    pub fn missing_parameter(operation: &str, param: &str) -> Self {
        TallyError::MissingParameter {
            operation: operation.to_string(),
            param: param.to_string(),
        }
    }
    pub fn insufficient(operation: &str, reason: impl Into<String>) -> Self {
        TallyError::InsufficientData {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
    pub fn category(&self) -> &'static str {
        match self {
            TallyError::ColumnNotFound { .. }
            | TallyError::MissingParameter { .. }
            | TallyError::InvalidParameter { .. } => "Parameter",
            TallyError::NotNumeric { .. } | TallyError::NotTemporal { .. } => "Type",
            TallyError::InsufficientData { .. } => "Data",
            TallyError::UnsupportedFormat { .. } | TallyError::Io(_) => "I/O",
            TallyError::Polars(_) => "Engine",
            TallyError::Serialisation(_) => "Serialisation",
        }
    }
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            TallyError::ColumnNotFound { .. }
                | TallyError::MissingParameter { .. }
                | TallyError::InvalidParameter { .. }
        )
    }
}
