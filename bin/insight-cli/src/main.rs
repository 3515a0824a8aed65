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

use anyhow::{Context, Result};
use clap::Parser;
use conductor::{AnalyticsConfig, AnalyticsResponse, Orchestrator};
use std::fs;
use std::path::{Path, PathBuf};
use tally::sample::sales_dataset;
use tally::{AnalysisPayload, Dataset, VISUALIZATION_KEY};
use tracing::{info, warn};

mod report;

const DEFAULT_QUERIES: [&str; 4] = [
    "Analyze sales trends over time",
    "What are the correlations between different metrics?",
    "Compare performance by region",
    "Detect any anomalies in the sales data",
];

#[derive(Parser, Debug, Clone)]
#[command(
    name = "insight-cli",
    about = "Answer analytical questions about a table and remember past analyses"
)]
struct Cli {
    /// TOML configuration; defaults to config/analytics.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// CSV or JSON table. A synthetic sales table is generated when omitted.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Query to run; repeat for several. Runs the demo queries when omitted.
    #[arg(long = "query", value_name = "TEXT")]
    queries: Vec<String>,

    #[arg(long)]
    memory_file: Option<PathBuf>,

    #[arg(long)]
    max_size: Option<usize>,

    #[arg(long, default_value_t = 1000)]
    rows: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Directory that receives one JSON render-spec per chart.
    #[arg(long)]
    figures_dir: Option<PathBuf>,

    /// Print each response as JSON instead of the text report.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let dataset = load_dataset(&cli)?;
    let mut memory = config.open_memory().context("opening memory store")?;
    let orchestrator = Orchestrator::new(&config);

    let queries: Vec<String> = if cli.queries.is_empty() {
        DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect()
    } else {
        cli.queries.clone()
    };

    if !cli.json {
        println!("{}", report::banner("🎯 RUNNING AGENTIC ANALYTICS"));
    }
    for (i, query) in queries.iter().enumerate() {
        let response = orchestrator.process(query, &dataset, &mut memory);
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else {
            println!("\n\nQUERY {}/{}", i + 1, queries.len());
            println!("{}", report::response(&response));
        }
        if let Some(dir) = &cli.figures_dir {
            save_figure(dir, i + 1, &response)?;
        }
    }

    if !cli.json {
        let stats = memory.statistics(config.memory.recent_queries);
        println!("\n\n{}", report::statistics(&stats));
        println!("✅ Agentic Analytics Complete!");
    }
    Ok(())
}

/// File config, then `ANALYTICS_*` variables, then flags.
fn load_config(cli: &Cli) -> Result<AnalyticsConfig> {
    let config = match &cli.config {
        Some(path) => AnalyticsConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnalyticsConfig::load_or_default(),
    };
    let mut config = config.with_env_overrides();
    if let Some(path) = &cli.memory_file {
        config.memory.path = path.clone();
    }
    if let Some(max_size) = cli.max_size {
        config.memory.max_size = max_size;
    }
    Ok(config)
}

fn load_dataset(cli: &Cli) -> Result<Dataset> {
    let dataset = match &cli.data {
        Some(path) => Dataset::from_path(path)
            .with_context(|| format!("loading dataset {}", path.display()))?,
        None => sales_dataset(cli.rows, cli.seed).context("generating sample data")?,
    };
    info!(
        rows = dataset.height(),
        columns = dataset.width(),
        "Dataset ready"
    );
    if !cli.json {
        println!(
            "✅ Loaded dataset with {} rows and {} columns",
            dataset.height(),
            dataset.width()
        );
        println!("   Columns: {}", dataset.column_names().join(", "));
    }
    Ok(dataset)
}

fn save_figure(dir: &Path, index: usize, response: &AnalyticsResponse) -> Result<()> {
    let Some(outcome) = response.analysis_results.get(VISUALIZATION_KEY) else {
        return Ok(());
    };
    match outcome.payload() {
        Some(AnalysisPayload::Visualization(report)) => {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
            let path = dir.join(format!("query_{index}_{}.json", report.viz_type));
            report.figure.save_json(&path)?;
            info!(path = %path.display(), "Figure written");
        }
        _ => warn!(
            error = outcome.error_message().unwrap_or_default(),
            "Visualization failed; no figure written"
        ),
    }
    Ok(())
}
