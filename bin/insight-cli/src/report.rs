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

//! Plain-text rendering of responses and memory statistics.

use conductor::{AnalyticsResponse, Priority};
use recall::MemoryStatistics;
use std::fmt::Write;

const RULE_WIDTH: usize = 80;

fn rule(ch: char) -> String {
    ch.to_string().repeat(RULE_WIDTH)
}

pub fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "🔴",
        Priority::Medium => "🟡",
        Priority::Low => "🟢",
    }
}

pub fn banner(title: &str) -> String {
    format!("{}\n{title}\n{}", rule('='), rule('='))
}

pub fn response(response: &AnalyticsResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", banner("📊 AGENTIC ANALYTICS REPORT"));
    let _ = writeln!(out, "\n🔍 Query: {}", response.query);
    let _ = writeln!(out, "\n🤖 Agents Used: {}", response.agents_used.join(", "));

    let _ = writeln!(out, "\n💡 KEY INSIGHTS:\n{}", rule('-'));
    for (i, insight) in response.insights.iter().enumerate() {
        let _ = writeln!(out, "{}. {insight}", i + 1);
    }

    let _ = writeln!(out, "\n🎯 RECOMMENDATIONS:\n{}", rule('-'));
    for (i, rec) in response.recommendations.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} [{}] {}",
            i + 1,
            priority_marker(rec.priority),
            rec.priority.as_str().to_uppercase(),
            rec.action
        );
        let _ = writeln!(out, "   → {}\n", rec.recommendation);
    }

    if !response.relevant_memories.is_empty() {
        let _ = writeln!(out, "\n🧠 RELEVANT PAST ANALYSES:\n{}", rule('-'));
        for memory in &response.relevant_memories {
            let _ = writeln!(out, "  • {}", memory.query);
        }
    }
    let _ = write!(out, "\n{}", rule('='));
    out
}

pub fn statistics(stats: &MemoryStatistics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", banner("🧠 MEMORY SYSTEM STATISTICS"));
    let _ = writeln!(out, "\nTotal Queries Processed: {}", stats.total_queries);
    let _ = writeln!(out, "\nAgent Usage:");
    for (agent, count) in &stats.agents_usage {
        let _ = writeln!(out, "  • {agent}: {count} times");
    }
    if !stats.recent_queries.is_empty() {
        let _ = writeln!(out, "\nRecent Queries:");
        for query in &stats.recent_queries {
            let _ = writeln!(out, "  • {query}");
        }
    }
    out
}
