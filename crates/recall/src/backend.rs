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

use crate::entry::MemoryEntry;
use crate::error::{MemoryError, Result};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Durable home of the memory log. The whole log is rewritten on every persist.
pub trait MemoryBackend {
    /// Reads every stored entry. A store that does not exist yet is empty.
    fn load(&self) -> Result<Vec<MemoryEntry>>;

    fn persist(&self, entries: &[MemoryEntry]) -> Result<()>;

    fn describe(&self) -> String;
}

/// Pretty-printed JSON array of entries in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> MemoryError {
        MemoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl MemoryBackend for JsonFileBackend {
    fn load(&self) -> Result<Vec<MemoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        serde_json::from_str(&json).map_err(|source| MemoryError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn persist(&self, entries: &[MemoryEntry]) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        fs::write(&self.path, json).map_err(|e| self.io_error(e))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Process-local backend; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    entries: Arc<Mutex<Vec<MemoryEntry>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<MemoryEntry>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    /// What the last persist wrote.
    pub fn snapshot(&self) -> Vec<MemoryEntry> {
        self.entries.lock().clone()
    }
}

impl MemoryBackend for InMemoryBackend {
    fn load(&self) -> Result<Vec<MemoryEntry>> {
        Ok(self.entries.lock().clone())
    }

    fn persist(&self, entries: &[MemoryEntry]) -> Result<()> {
        *self.entries.lock() = entries.to_vec();
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}
