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

//! Conversion of analysis results into plain JSON before they are written.
//!
//! Figures are reduced to their descriptor text and non-finite floats become
//! `null`. Conversion never fails: anything serde rejects is stored as a
//! description of the failure.

use serde::Serialize;
use serde_json::Value;
use tally::{AnalysisPayload, AnalysisResults, TaskOutcome};
use tracing::warn;

pub fn normalise(results: &AnalysisResults) -> Value {
    let entries = results
        .iter()
        .map(|(key, outcome)| (key.to_string(), normalise_outcome(outcome)))
        .collect();
    Value::Object(entries)
}

pub fn normalise_outcome(outcome: &TaskOutcome) -> Value {
    let mut value = to_plain_value(outcome);
    if let (TaskOutcome::Success(AnalysisPayload::Visualization(report)), Value::Object(fields)) =
        (outcome, &mut value)
    {
        fields.insert(
            "figure".to_string(),
            Value::String(report.figure.descriptor()),
        );
    }
    value
}

/// Serialises any value, substituting a description when serde refuses it.
pub fn to_plain_value<T: Serialize + ?Sized>(value: &T) -> Value {
    match serde_json::to_value(value) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Value could not be serialised; storing description");
            Value::String(format!("<unserialisable: {e}>"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn non_finite_numbers_become_null() {
        let value = to_plain_value(&vec![1.5, f64::NAN, f64::INFINITY]);
        assert_eq!(value, json!([1.5, null, null]));
    }

    #[test]
    fn unserialisable_maps_become_text() {
        let mut odd: HashMap<Vec<u8>, u8> = HashMap::new();
        odd.insert(vec![1], 2);
        let value = to_plain_value(&odd);
        assert!(value.as_str().is_some_and(|text| text.starts_with("<unserialisable")));
    }

    #[test]
    fn error_outcomes_keep_their_message() {
        let mut results = AnalysisResults::new();
        results.insert("trend", TaskOutcome::error("Column 'x' not found in dataset"));
        assert_eq!(
            normalise(&results),
            json!({"trend": {"status": "error", "error": "Column 'x' not found in dataset"}})
        );
    }
}
