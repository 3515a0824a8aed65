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

use recall::MemoryError;
use std::path::PathBuf;
use tally::TallyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConductorError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file '{}': {source}", path.display())]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),
    #[error("Data error: {0}")]
    Data(#[from] TallyError),
}

pub type Result<T> = std::result::Result<T, ConductorError>;
