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

//! Numeric routines for the analyst and visualizer.
//!
//! Location, spread and order statistics come from polars `Float64Chunked`
//! aggregations, which skip nulls. Moments, pairwise correlation, least
//! squares, z-scores and histograms are computed here over present values.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
}

impl DescriptiveStats {
    /// Statistics over the non-null entries of `values`.
    pub fn from_chunked(values: &Float64Chunked) -> Self {
        let present: Vec<f64> = values.into_iter().flatten().collect();
        Self {
            count: present.len(),
            mean: values.mean(),
            std: deviation(values, 1),
            min: values.min(),
            q25: values.quantile(0.25, QuantileMethod::Linear).ok().flatten(),
            median: values.median(),
            q75: values.quantile(0.75, QuantileMethod::Linear).ok().flatten(),
            max: values.max(),
            skewness: skewness(&present),
            kurtosis: kurtosis(&present),
        }
    }

    pub fn from_values(values: &[f64]) -> Self {
        Self::from_chunked(&to_chunked(values))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Present values as a float array; `NaN` becomes null.
pub fn to_chunked_optional(values: &[Option<f64>]) -> Float64Chunked {
    Float64Chunked::from_iter_options(
        "values".into(),
        values.iter().map(|value| value.filter(|v| !v.is_nan())),
    )
}

pub fn to_chunked(values: &[f64]) -> Float64Chunked {
    Float64Chunked::from_slice("values".into(), values)
}

pub fn present(values: &[Option<f64>]) -> Vec<f64> {
    values
        .iter()
        .flatten()
        .copied()
        .filter(|value| !value.is_nan())
        .collect()
}

/// Standard deviation with `ddof` delta degrees of freedom. `None` unless
/// more than `ddof` values are present.
pub fn deviation(values: &Float64Chunked, ddof: u8) -> Option<f64> {
    let present = values.len() - values.null_count();
    if present <= usize::from(ddof) {
        return None;
    }
    values.std(ddof)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    to_chunked(values).mean()
}

pub fn min(values: &[f64]) -> Option<f64> {
    to_chunked(values).min()
}

pub fn max(values: &[f64]) -> Option<f64> {
    to_chunked(values).max()
}

/// Linear interpolation between closest ranks.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    to_chunked(values)
        .quantile(q, QuantileMethod::Linear)
        .ok()
        .flatten()
}

pub fn median(values: &[f64]) -> Option<f64> {
    to_chunked(values).median()
}

pub fn sample_std(values: &[f64]) -> Option<f64> {
    deviation(&to_chunked(values), 1)
}

pub fn population_std(values: &[f64]) -> Option<f64> {
    deviation(&to_chunked(values), 0)
}

fn sum_of_powers(values: &[f64], centre: f64, power: i32) -> f64 {
    values.iter().map(|value| (value - centre).powi(power)).sum()
}

/// Bias-adjusted Fisher-Pearson skewness. Constant input yields zero.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let count = n as f64;
    let centre = mean(values)?;
    let m2 = sum_of_powers(values, centre, 2) / count;
    if m2 == 0.0 {
        return Some(0.0);
    }
    let m3 = sum_of_powers(values, centre, 3) / count;
    let g1 = m3 / m2.powf(1.5);
    Some(g1 * (count * (count - 1.0)).sqrt() / (count - 2.0))
}

/// Bias-adjusted excess kurtosis. Constant input yields zero.
pub fn kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 4 {
        return None;
    }
    let count = n as f64;
    let centre = mean(values)?;
    let m2 = sum_of_powers(values, centre, 2);
    if m2 == 0.0 {
        return Some(0.0);
    }
    let m4 = sum_of_powers(values, centre, 4);
    let numerator = count * (count + 1.0) * (count - 1.0) * m4;
    let denominator = (count - 2.0) * (count - 3.0) * m2 * m2;
    let adjustment = 3.0 * (count - 1.0).powi(2) / ((count - 2.0) * (count - 3.0));
    Some(numerator / denominator - adjustment)
}

/// Pearson correlation over rows where both sides are present.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let (left, right): (Vec<f64>, Vec<f64>) = xs
        .iter()
        .zip(ys)
        .filter_map(|pair| match pair {
            (Some(x), Some(y)) if !x.is_nan() && !y.is_nan() => Some((*x, *y)),
            _ => None,
        })
        .unzip();
    if left.len() < 2 {
        return None;
    }
    let mean_x = mean(&left)?;
    let mean_y = mean(&right)?;
    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in left.iter().zip(&right) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((covariance / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Ordinary least squares of `ys` on `xs`.
///
/// Constant `xs` produce a zero slope through the mean. A perfect fit scores
/// 1.0 and constant `ys` score 1.0 only when predicted exactly.
pub fn linear_regression(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mean_x = mean(xs)?;
    let mean_y = mean(ys)?;
    let sxx = sum_of_powers(xs, mean_x, 2);
    let sxy: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();
    let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };
    let intercept = mean_y - slope * mean_x;
    let residual: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
        .sum();
    let total = sum_of_powers(ys, mean_y, 2);
    let r_squared = if total == 0.0 {
        if residual == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - residual / total
    };
    Some(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}

/// Standard scores against the population deviation. Constant input gives NaN.
pub fn z_scores(values: &[f64]) -> Vec<f64> {
    let (Some(centre), Some(spread)) = (mean(values), population_std(values)) else {
        return Vec::new();
    };
    values
        .iter()
        .map(|value| {
            if spread == 0.0 {
                f64::NAN
            } else {
                (value - centre) / spread
            }
        })
        .collect()
}

/// Equal-width bins over the value range. The last bin is closed.
pub fn histogram(values: &[f64], bins: usize) -> (Vec<f64>, Vec<usize>) {
    let bins = bins.max(1);
    let (Some(mut low), Some(mut high)) = (min(values), max(values)) else {
        return (Vec::new(), Vec::new());
    };
    if low == high {
        low -= 0.5;
        high += 0.5;
    }
    let width = (high - low) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| low + width * i as f64).collect();
    let mut counts = vec![0usize; bins];
    for value in values {
        let index = (((value - low) / width).floor() as usize).min(bins - 1);
        counts[index] += 1;
    }
    (edges, counts)
}

pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}
