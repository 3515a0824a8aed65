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
use crate::error::Result;
use polars::prelude::{Column, DataType};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub const PRODUCTS: [&str; 4] = ["Product_A", "Product_B", "Product_C", "Product_D"];
pub const REGIONS: [&str; 4] = ["North", "South", "East", "West"];

/// Days from the Unix epoch to 2024-01-01.
const FIRST_DAY: i32 = 19_723;

/// Synthetic sales table, reproducible for a given seed.
pub fn sales_dataset(rows: usize, seed: u64) -> Result<Dataset> {
    let mut rng = StdRng::seed_from_u64(seed);
    let span = i32::try_from(rows.max(1)).unwrap_or(i32::MAX);

    let mut days = Vec::with_capacity(rows);
    let mut products = Vec::with_capacity(rows);
    let mut regions = Vec::with_capacity(rows);
    let mut sales = Vec::with_capacity(rows);
    let mut quantity = Vec::with_capacity(rows);
    let mut satisfaction = Vec::with_capacity(rows);
    let mut revenue = Vec::with_capacity(rows);
    for _ in 0..rows {
        let sale: i64 = rng.gen_range(100..10_000);
        days.push(FIRST_DAY + rng.gen_range(0..span));
        products.push(*PRODUCTS.choose(&mut rng).unwrap_or(&PRODUCTS[0]));
        regions.push(*REGIONS.choose(&mut rng).unwrap_or(&REGIONS[0]));
        sales.push(sale);
        quantity.push(rng.gen_range(1i64..100));
        satisfaction.push(rng.gen_range(1.0..5.0));
        revenue.push(sale as f64 * rng.gen_range(0.8..1.2));
    }

    Dataset::from_columns(vec![
        Column::new("date".into(), days).cast(&DataType::Date)?,
        Column::new("product".into(), products),
        Column::new("region".into(), regions),
        Column::new("sales".into(), sales),
        Column::new("quantity".into(), quantity),
        Column::new("customer_satisfaction".into(), satisfaction),
        Column::new("revenue".into(), revenue),
    ])
}
