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

use crate::error::{ConductorError, Result};
use recall::{MemoryStore, DEFAULT_MAX_SIZE, DEFAULT_RECENT_QUERIES, DEFAULT_TOP_K};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tally::{AnalystConfig, FigureConfig};
use tracing::warn;

pub const MEMORY_FILE_ENV: &str = "ANALYTICS_MEMORY_FILE";
pub const MEMORY_SIZE_ENV: &str = "ANALYTICS_MEMORY_SIZE";
pub const ANOMALY_THRESHOLD_ENV: &str = "ANALYTICS_ANOMALY_THRESHOLD";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    pub path: PathBuf,
    pub max_size: usize,
    pub relevant_top_k: usize,
    pub recent_queries: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("agent_memory.json"),
            max_size: DEFAULT_MAX_SIZE,
            relevant_top_k: DEFAULT_TOP_K,
            recent_queries: DEFAULT_RECENT_QUERIES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub memory: MemorySettings,
    pub analysis: AnalystConfig,
    pub visualization: FigureConfig,
}

impl AnalyticsConfig {
    pub fn load_from_file(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path).map_err(|source| ConductorError::ConfigIo {
            path: config_path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConductorError::Config {
            path: config_path.to_path_buf(),
            source,
        })
    }

    pub fn default_config_path() -> PathBuf {
        PathBuf::from("config/analytics.toml")
    }

    pub fn load_or_default() -> Self {
        Self::load_or_default_from(&Self::default_config_path())
    }

    /// Reads `config_path`, falling back to defaults when it is absent or
    /// malformed. A malformed file is logged.
    pub fn load_or_default_from(config_path: &Path) -> Self {
        match Self::load_from_file(config_path) {
            Ok(config) => config,
            Err(ConductorError::ConfigIo { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Self::default()
            }
            Err(e) => {
                warn!(
                    path = %config_path.display(),
                    error = %e,
                    "Using default configuration"
                );
                Self::default()
            }
        }
    }

    /// Opens the file-backed memory store described by `[memory]`.
    pub fn open_memory(&self) -> Result<MemoryStore> {
        Ok(MemoryStore::open(&self.memory.path, self.memory.max_size)?)
    }

    /// Applies `ANALYTICS_*` variables from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from any key lookup. Unparsable values are skipped.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(MEMORY_FILE_ENV) {
            self.memory.path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(MEMORY_SIZE_ENV) {
            match raw.trim().parse() {
                Ok(size) => self.memory.max_size = size,
                Err(_) => warn!(
                    key = MEMORY_SIZE_ENV,
                    value = %raw,
                    "Ignoring unparsable override"
                ),
            }
        }
        if let Some(raw) = lookup(ANOMALY_THRESHOLD_ENV) {
            match raw.trim().parse() {
                Ok(threshold) => self.analysis.anomaly_threshold = threshold,
                Err(_) => {
                    warn!(key = ANOMALY_THRESHOLD_ENV, value = %raw, "Ignoring unparsable override")
                }
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: AnalyticsConfig = toml::from_str(
            r#"
            [memory]
            max_size = 10

            [visualization]
            style = "ggplot"
            "#,
        )
        .unwrap();
        assert_eq!(config.memory.max_size, 10);
        assert_eq!(config.memory.path, PathBuf::from("agent_memory.json"));
        assert_eq!(config.memory.relevant_top_k, 3);
        assert_eq!(config.analysis.anomaly_threshold, 3.0);
        assert_eq!(config.visualization.style, "ggplot");
        assert_eq!(config.visualization.histogram_bins, 30);
    }

    #[test]
    fn overrides_replace_parsable_values_only() {
        let env: HashMap<&str, &str> = [
            (MEMORY_FILE_ENV, "/tmp/other.json"),
            (MEMORY_SIZE_ENV, "lots"),
            (ANOMALY_THRESHOLD_ENV, " 2.5 "),
        ]
        .into_iter()
        .collect();
        let config = AnalyticsConfig::default()
            .with_overrides_from(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.memory.path, PathBuf::from("/tmp/other.json"));
        assert_eq!(config.memory.max_size, 100);
        assert_eq!(config.analysis.anomaly_threshold, 2.5);
    }

    #[test]
    fn checked_in_file_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/analytics.toml");
        let config = AnalyticsConfig::load_from_file(&path).unwrap();
        assert_eq!(config, AnalyticsConfig::default());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics.toml");
        fs::write(&path, "[memory\nmax_size = ").unwrap();
        assert!(matches!(
            AnalyticsConfig::load_from_file(&path),
            Err(ConductorError::Config { .. })
        ));
        assert_eq!(
            AnalyticsConfig::load_or_default_from(&path),
            AnalyticsConfig::default()
        );
        assert_eq!(
            AnalyticsConfig::load_or_default_from(&dir.path().join("absent.toml")),
            AnalyticsConfig::default()
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = AnalyticsConfig::load_from_file(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, ConductorError::ConfigIo { .. }));
    }
}
