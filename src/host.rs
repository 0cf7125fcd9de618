//! Taskwarrior integration.
//!
//! Taskwarrior runs `on-add` and `on-modify` hooks once per mutation, feeding
//! task JSON on stdin and reading the (possibly changed) task back from the
//! first line of stdout. Further stdout lines are shown to the user as
//! feedback. [`HostAdapter`] implements both hooks on top of a
//! [`ConfigStore`] and a [`TaskSource`].

use crate::classify::{explain, Classification};
use crate::error::{NeedError, Result};
use crate::filter::{local_today, synthesize, FilterExpression};
use crate::rules::RuleSet;
use crate::store::ConfigStore;
use crate::task::{Status, Task};
use crate::tier::Tier;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Read and write access to the host's task store.
pub trait TaskSource {
    /// Every pending task, ignoring any active context.
    fn pending_tasks(&self) -> Result<Vec<Task>>;

    /// Set the tier of an existing task.
    fn set_tier(&self, uuid: Uuid, tier: Tier) -> Result<()>;

    /// Name of the active context, if one is set.
    fn active_context(&self) -> Result<Option<String>>;
}

/// [`TaskSource`] that shells out to the `task` binary.
#[derive(Debug, Clone)]
pub struct TaskCli {
    bin: PathBuf,
}

impl TaskCli {
    /// Resolve `bin` on `PATH` (or as a path).
    ///
    /// # Errors
    ///
    /// Returns [`NeedError::Host`] if the binary cannot be found.
    pub fn locate(bin: impl AsRef<Path>) -> Result<Self> {
        let bin = bin.as_ref();
        let resolved = which::which(bin).map_err(|e| {
            NeedError::host(format!("cannot find Taskwarrior binary '{}': {e}", bin.display()))
        })?;
        Ok(Self { bin: resolved })
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        debug!(bin = %self.bin.display(), ?args, "Running task");
        let output = Command::new(&self.bin)
            // Hooks must not fire recursively while a hook is running.
            .args(["rc.hooks=off", "rc.confirmation=off", "rc.verbose=nothing"])
            .args(args)
            .output()?;

        if !output.status.success() {
            return Err(NeedError::host(format!(
                "task {} exited with {}: {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl TaskSource for TaskCli {
    fn pending_tasks(&self) -> Result<Vec<Task>> {
        let stdout = self.run(&["rc.context=none", "rc.json.array=on", "status:pending", "export"])?;
        if stdout.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&stdout)?)
    }

    fn set_tier(&self, uuid: Uuid, tier: Tier) -> Result<()> {
        self.run(&[&uuid.to_string(), "modify", &format!("priority:{tier}")])?;
        Ok(())
    }

    fn active_context(&self) -> Result<Option<String>> {
        let stdout = self.run(&["_get", "rc.context"])?;
        let name = stdout.trim();
        Ok((!name.is_empty() && name != "none").then(|| name.to_string()))
    }
}

/// What a hook hands back to Taskwarrior.
#[derive(Debug, Clone, PartialEq)]
pub struct HookOutcome {
    /// The task to print as the first stdout line.
    pub task: Task,
    /// Feedback lines shown to the user.
    pub feedback: Vec<String>,
    /// The filter that was written.
    pub filter: FilterExpression,
}

impl HookOutcome {
    /// Render stdout: the task JSON followed by feedback lines.
    pub fn to_stdout(&self) -> Result<String> {
        let mut out = self.task.to_json()?;
        for line in &self.feedback {
            out.push('\n');
            out.push_str(line);
        }
        out.push('\n');
        Ok(out)
    }
}

/// Drives classification and filter synthesis for one host mutation.
pub struct HostAdapter<S, T> {
    store: S,
    tasks: T,
    today: DateTime<Utc>,
}

impl<S: ConfigStore, T: TaskSource> HostAdapter<S, T> {
    pub fn new(store: S, tasks: T) -> Self {
        Self {
            store,
            tasks,
            today: local_today(),
        }
    }

    /// Evaluate due/scheduled bounds relative to a fixed day.
    #[must_use]
    pub fn with_today(mut self, today: DateTime<Utc>) -> Self {
        self.today = today;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handle `on-add`: classify the new task and recompute the filter.
    ///
    /// # Errors
    ///
    /// Fails on malformed input, broken rules or settings, or when the task
    /// store cannot be read. Nothing is written in those cases.
    pub fn on_add(&mut self, input: &str) -> Result<HookOutcome> {
        let line = input
            .lines()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| NeedError::hook("on-add", "no task on stdin"))?;
        let mut task = Task::from_json(line)?;

        let rules = RuleSet::load(&self.store.read_rules()?)?;
        let settings = self.store.read_settings()?;
        let default_tier = settings.default_tier()?;
        let filter_settings = settings.filter_settings()?;

        let classification = explain(&task, &rules, default_tier);
        let tier = classification.tier();
        let mut feedback = Vec::new();
        match &classification {
            Classification::Explicit(_) => {
                info!(description = %task.description, %tier, "Keeping explicit priority");
            }
            Classification::Matched { clause, .. } => {
                info!(description = %task.description, %tier, %clause, "Assigned priority");
                feedback.push(format!("Need: priority {tier} ({clause})"));
            }
            Classification::Default(_) => {
                info!(description = %task.description, %tier, "No rule matched, using default");
            }
        }
        task.set_tier(tier);

        let mut open = self.tasks.pending_tasks()?;
        merge(&mut open, &task);

        let filter = synthesize(&open, &filter_settings, self.today)?;
        self.write_filter(&filter)?;

        Ok(HookOutcome {
            task,
            feedback,
            filter,
        })
    }

    /// Handle `on-modify`: repair a missing or invalid priority and recompute
    /// the filter. Completed and deleted tasks drop out of the open set.
    ///
    /// # Errors
    ///
    /// Fails on malformed input, broken settings, or when the task store
    /// cannot be read.
    pub fn on_modify(&mut self, input: &str) -> Result<HookOutcome> {
        let mut lines = input.lines().filter(|l| !l.trim().is_empty());
        let _original = lines
            .next()
            .ok_or_else(|| NeedError::hook("on-modify", "no original task on stdin"))?;
        let modified = lines
            .next()
            .ok_or_else(|| NeedError::hook("on-modify", "no modified task on stdin"))?;
        let mut task = Task::from_json(modified)?;

        let settings = self.store.read_settings()?;
        let default_tier = settings.default_tier()?;
        let filter_settings = settings.filter_settings()?;

        let mut feedback = Vec::new();
        if !task.has_priority() {
            if task.status != Status::Deleted {
                warn!(description = %task.description, "Priority cleared, restoring default");
                task.set_tier(default_tier);
                feedback.push(format!("Need: priority is required, restored {default_tier}"));
            }
        } else if task.tier().is_none() {
            let raw = task.priority.clone().unwrap_or_default();
            warn!(description = %task.description, priority = %raw, "Invalid priority, using default");
            task.set_tier(default_tier);
            feedback.push(format!(
                "Need: '{raw}' is not a priority from 1 to 6, set {default_tier}"
            ));
        }

        let mut open = self.tasks.pending_tasks()?;
        merge(&mut open, &task);

        let filter = synthesize(&open, &filter_settings, self.today)?;
        self.write_filter(&filter)?;

        Ok(HookOutcome {
            task,
            feedback,
            filter,
        })
    }

    /// Recompute the filter from the current task store.
    ///
    /// # Errors
    ///
    /// Fails on broken settings or when the task store cannot be read.
    pub fn recompute(&mut self) -> Result<FilterExpression> {
        let filter_settings = self.store.read_settings()?.filter_settings()?;
        let open = self.tasks.pending_tasks()?;
        let filter = synthesize(&open, &filter_settings, self.today)?;
        self.write_filter(&filter)?;
        Ok(filter)
    }

    fn write_filter(&mut self, filter: &FilterExpression) -> Result<()> {
        let text = filter.to_string();
        self.store.write_filter(&text)?;
        match filter.window() {
            Some(window) => info!(%window, filter = %text, "Updated context filter"),
            None => info!("No pending tasks, cleared context filter"),
        }
        Ok(())
    }
}

/// Overlay the task being mutated onto the stored snapshot, which does not
/// yet reflect the change.
fn merge(open: &mut Vec<Task>, task: &Task) {
    if let Some(uuid) = task.uuid {
        open.retain(|t| t.uuid != Some(uuid));
    }
    if task.is_open() {
        open.push(task.clone());
    }
}
