//! Pyramid status report.

use crate::filter::anchor_tier;
use crate::store::Settings;
use crate::task::Task;
use crate::tier::Tier;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;

/// Name of the Taskwarrior context the filter is published under.
pub const CONTEXT_NAME: &str = "needs";

/// Number of open tasks at each tier, index 0 holding tier 1.
#[must_use]
pub fn tier_counts(tasks: &[Task]) -> [usize; 6] {
    let mut counts = [0; 6];
    for tier in tasks.iter().filter(|t| t.is_open()).filter_map(Task::tier) {
        counts[usize::from(tier.get() - 1)] += 1;
    }
    counts
}

/// Snapshot of the hierarchy for display.
#[derive(Debug, Clone, Serialize)]
pub struct PyramidReport {
    pub counts: [usize; 6],
    /// Tier the count window is anchored at, as the filter sees it.
    pub anchor: Option<Tier>,
    pub settings: Settings,
    pub filter: Option<String>,
    pub active_context: Option<String>,
}

impl PyramidReport {
    #[must_use]
    pub fn new(
        tasks: &[Task],
        settings: Settings,
        filter: Option<String>,
        active_context: Option<String>,
        today: DateTime<Utc>,
    ) -> Self {
        // Broken settings still get a report; `need check` names the problem.
        let filter_settings = settings.filter_settings().unwrap_or_default();
        Self {
            counts: tier_counts(tasks),
            anchor: anchor_tier(tasks, &filter_settings, today),
            settings,
            filter,
            active_context,
        }
    }

    #[must_use]
    pub fn count(&self, tier: Tier) -> usize {
        self.counts[usize::from(tier.get() - 1)]
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active_context.as_deref() == Some(CONTEXT_NAME)
    }

    /// Render the report as terminal text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let anchor = self.anchor;

        let _ = writeln!(out, "\n{} Priority Hierarchy", "Need:".cyan().bold());
        let _ = writeln!(out, "{}", "─".repeat(72));

        for tier in Tier::all().rev() {
            let marker = if Some(tier) == anchor { " -->" } else { "    " };
            let row = format!(
                "{marker}{tier}  {:<55} ({})",
                tier.label(),
                self.count(tier)
            );
            if Some(tier) == anchor {
                let _ = writeln!(out, "{}", row.green().bold());
            } else {
                let _ = writeln!(out, "{row}");
            }
        }

        let _ = writeln!(
            out,
            "\n   Config: span={}, lookahead={}, lookback={}",
            self.settings.span, self.settings.lookahead, self.settings.lookback
        );

        match &self.filter {
            Some(filter) => {
                let _ = writeln!(out, "\n   Context filter (auto-updated by hooks):");
                let _ = writeln!(out, "     {filter}");
                if self.is_active() {
                    let _ = writeln!(
                        out,
                        "\n   Status: context '{CONTEXT_NAME}' is {}",
                        "ACTIVE".green().bold()
                    );
                    let _ = writeln!(out, "     Deactivate: task context none");
                } else {
                    let _ = writeln!(
                        out,
                        "\n   Status: context '{CONTEXT_NAME}' is defined but {}",
                        "NOT active".yellow()
                    );
                    let _ = writeln!(out, "     Activate: task context {CONTEXT_NAME}");
                }
            }
            None => {
                let _ = writeln!(out, "\n   No pending tasks - context filter is empty");
                let _ = writeln!(out, "   Add tasks to automatically update the filter");
            }
        }

        out
    }
}
