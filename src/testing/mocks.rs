//! Mock implementations of the collaborator traits.
//!
//! These mocks provide controllable test doubles for the rc file and the
//! Taskwarrior task store, enabling deterministic unit tests.

use crate::error::{NeedError, Result};
use crate::host::TaskSource;
use crate::store::{
    get_value, parse_settings, set_value, ConfigStore, Settings, SettingsUpdate, FILTER_KEY,
};
use crate::task::Task;
use crate::tier::Tier;
use std::sync::Mutex;
use uuid::Uuid;

/// In-memory [`ConfigStore`] holding rc text.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    text: String,
    filter_writes: u32,
}

impl MemoryStore {
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            filter_writes: 0,
        }
    }

    /// Value stored for `key`, if any.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<String> {
        get_value(&self.text, key).map(str::to_string)
    }

    /// Number of `write_filter` calls so far.
    #[must_use]
    pub fn filter_writes(&self) -> u32 {
        self.filter_writes
    }
}

impl ConfigStore for MemoryStore {
    fn read_rules(&self) -> Result<String> {
        Ok(self.text.clone())
    }

    fn read_settings(&self) -> Result<Settings> {
        Ok(parse_settings(&self.text))
    }

    fn read_filter(&self) -> Result<Option<String>> {
        Ok(self.value(FILTER_KEY).filter(|v| !v.is_empty()))
    }

    fn write_filter(&mut self, filter: &str) -> Result<()> {
        self.text = set_value(&self.text, FILTER_KEY, filter);
        self.filter_writes += 1;
        Ok(())
    }

    fn write_settings(&mut self, update: &SettingsUpdate) -> Result<()> {
        for (key, value) in update.entries() {
            self.text = set_value(&self.text, key, value);
        }
        Ok(())
    }
}

/// Mock [`TaskSource`] with a fixed pending list.
///
/// # Example
///
/// ```rust
/// use need::testing::{MockTaskSource, TaskBuilder};
/// use need::TaskSource;
///
/// let tasks = MockTaskSource::new()
///     .with_pending(vec![TaskBuilder::new("Pay rent").priority("2").build()])
///     .with_context("needs");
///
/// assert_eq!(tasks.pending_tasks().unwrap().len(), 1);
/// assert_eq!(tasks.active_context().unwrap().as_deref(), Some("needs"));
/// ```
#[derive(Debug, Default)]
pub struct MockTaskSource {
    pending: Mutex<Vec<Task>>,
    context: Option<String>,
    error: Option<String>,
    tier_changes: Mutex<Vec<(Uuid, Tier)>>,
}

impl MockTaskSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_pending(self, tasks: Vec<Task>) -> Self {
        Self {
            pending: Mutex::new(tasks),
            ..self
        }
    }

    #[must_use]
    pub fn with_context(mut self, name: &str) -> Self {
        self.context = Some(name.to_string());
        self
    }

    /// Make every call fail with a host error.
    #[must_use]
    pub fn with_error(mut self, message: &str) -> Self {
        self.error = Some(message.to_string());
        self
    }

    /// Tier changes applied through [`TaskSource::set_tier`], in order.
    #[must_use]
    pub fn tier_changes(&self) -> Vec<(Uuid, Tier)> {
        self.tier_changes
            .lock()
            .map(|changes| changes.clone())
            .unwrap_or_default()
    }

    fn check(&self) -> Result<()> {
        match &self.error {
            Some(message) => Err(NeedError::host(message.clone())),
            None => Ok(()),
        }
    }
}

impl TaskSource for MockTaskSource {
    fn pending_tasks(&self) -> Result<Vec<Task>> {
        self.check()?;
        Ok(self
            .pending
            .lock()
            .map(|tasks| tasks.clone())
            .unwrap_or_default())
    }

    fn set_tier(&self, uuid: Uuid, tier: Tier) -> Result<()> {
        self.check()?;
        if let Ok(mut tasks) = self.pending.lock() {
            if let Some(task) = tasks.iter_mut().find(|t| t.uuid == Some(uuid)) {
                task.set_tier(tier);
            }
        }
        if let Ok(mut changes) = self.tier_changes.lock() {
            changes.push((uuid, tier));
        }
        Ok(())
    }

    fn active_context(&self) -> Result<Option<String>> {
        self.check()?;
        Ok(self.context.clone())
    }
}
