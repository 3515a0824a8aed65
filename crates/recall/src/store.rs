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

use crate::backend::{JsonFileBackend, MemoryBackend};
use crate::entry::{overlap, tokenize, MemoryEntry};
use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tally::AnalysisResults;
use tracing::{debug, info};

pub const DEFAULT_MAX_SIZE: usize = 100;
pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_RECENT_QUERIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStatistics {
    pub total_queries: usize,
    /// Invocation count per agent, in first-seen order.
    pub agents_usage: IndexMap<String, usize>,
    /// Most recent queries, oldest first.
    pub recent_queries: Vec<String>,
}

/// Bounded, chronologically ordered log of past interactions.
///
/// Holds at most `max_size` entries; the oldest are evicted first and the
/// backend is rewritten on every append.
#[derive(Debug)]
pub struct MemoryStore<B: MemoryBackend = JsonFileBackend> {
    backend: B,
    entries: Vec<MemoryEntry>,
    max_size: usize,
}

impl MemoryStore<JsonFileBackend> {
    pub fn open<P: AsRef<Path>>(path: P, max_size: usize) -> Result<Self> {
        Self::with_backend(JsonFileBackend::new(path), max_size)
    }
}

impl<B: MemoryBackend> MemoryStore<B> {
    pub fn with_backend(backend: B, max_size: usize) -> Result<Self> {
        let mut entries = backend.load()?;
        if entries.len() > max_size {
            entries.drain(..entries.len() - max_size);
        }
        info!(
            store = %backend.describe(),
            entries = entries.len(),
            max_size,
            "Memory store loaded"
        );
        Ok(Self {
            backend,
            entries,
            max_size,
        })
    }

    /// Appends an entry, evicts past capacity and persists the log.
    pub fn add(&mut self, entry: MemoryEntry) -> Result<()> {
        self.entries.push(entry);
        if self.entries.len() > self.max_size {
            let evicted = self.entries.len() - self.max_size;
            self.entries.drain(..evicted);
            debug!(evicted, "Evicted oldest memory entries");
        }
        self.backend.persist(&self.entries)
    }

    pub fn record(
        &mut self,
        query: &str,
        agents_used: &[String],
        results: &AnalysisResults,
        insights: &[String],
    ) -> Result<()> {
        self.add(MemoryEntry::record(query, agents_used, results, insights))
    }

    /// Entries sharing at least one query word, best overlap first.
    ///
    /// Equal scores keep storage order, which is chronological.
    pub fn relevant(&self, query: &str, top_k: usize) -> Vec<&MemoryEntry> {
        let query_tokens = tokenize(query);
        let mut scored: Vec<(usize, &MemoryEntry)> = self
            .entries
            .iter()
            .map(|entry| (overlap(&query_tokens, &entry.query), entry))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
            .into_iter()
            .take(top_k)
            .map(|(_, entry)| entry)
            .collect()
    }

    pub fn statistics(&self, recent: usize) -> MemoryStatistics {
        let mut agents_usage: IndexMap<String, usize> = IndexMap::new();
        for agent in self.entries.iter().flat_map(|entry| &entry.agents_used) {
            *agents_usage.entry(agent.clone()).or_default() += 1;
        }
        let skip = self.entries.len().saturating_sub(recent);
        MemoryStatistics {
            total_queries: self.entries.len(),
            agents_usage,
            recent_queries: self.entries[skip..]
                .iter()
                .map(|entry| entry.query.clone())
                .collect(),
        }
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
