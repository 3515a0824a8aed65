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

pub mod config;
pub mod error;
pub mod executor;
pub mod insights;
pub mod intent;
pub mod orchestrator;
pub mod plan;
pub mod recommendations;

pub use config::{AnalyticsConfig, MemorySettings};
pub use error::{ConductorError, Result};
pub use executor::{ExecutionOutcome, TaskExecutor};
pub use insights::synthesize;
pub use intent::{detect, Intent};
pub use orchestrator::{AnalyticsResponse, Orchestrator};
pub use plan::{Agent, ExecutionPlan, PlanCompiler, Task, TaskOperation};
pub use recommendations::{prioritize, recommend, Priority, Recommendation};
