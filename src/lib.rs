//! need - hierarchy-of-needs priorities for Taskwarrior
//!
//! Assigns every task a priority tier from 1 (physiological needs) to 6
//! (higher goals) and keeps a Taskwarrior context narrowed to the most
//! urgent tiers that currently have open work.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`tier`] - The `Tier` type and its urgency coefficients
//! - [`task`] - Task records as exchanged with Taskwarrior hooks
//! - [`rules`] - Auto-assignment rules loaded from the rc file
//! - [`classify`] - First-match-wins tier assignment
//! - [`filter`] - Context filter synthesis and evaluation
//! - [`store`] - The rc file holding rules, settings and the filter
//! - [`host`] - Taskwarrior hook handling and task store access
//! - [`report`] - Pyramid status report
//! - [`error`] - Custom error types and handling
//! - [`testing`] - Test doubles and fixtures
//!
//! # Example
//!
//! ```rust
//! use need::{classify, synthesize, FilterSettings, RuleSet, Task, Tier};
//!
//! let rules = RuleSet::load("priority.1.auto=+meds\n").unwrap();
//! let mut task = Task { tags: vec!["meds".into()], ..Default::default() };
//! task.set_tier(classify(&task, &rules, Tier::DEFAULT));
//! assert_eq!(task.tier(), Some(Tier::MOST_URGENT));
//!
//! let filter = synthesize(&[task], &FilterSettings::default(), chrono::Utc::now()).unwrap();
//! assert!(filter.to_string().starts_with("( priority:1 or priority:2 or"));
//! ```

pub mod classify;
pub mod error;
pub mod filter;
pub mod host;
pub mod report;
pub mod rules;
pub mod store;
pub mod task;
pub mod testing;
pub mod tier;

// Re-export commonly used types
pub use error::{NeedError, Result};

pub use classify::{classify, explain, review, Classification, Suggestion};
pub use filter::{
    anchor_tier, local_today, synthesize, FilterExpression, FilterSettings, Span, TwDuration,
    Window,
};
pub use host::{HookOutcome, HostAdapter, TaskCli, TaskSource};
pub use report::{PyramidReport, CONTEXT_NAME};
pub use rules::{Clause, Rule, RuleSet};
pub use store::{ConfigStore, RcFile, Settings, SettingsUpdate};
pub use task::{Status, Task};
pub use tier::Tier;
