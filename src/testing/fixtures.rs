//! Task fixtures for consistent test data.

use crate::task::{Status, Task};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Builder for [`Task`] records. Every built task gets a fresh UUID.
///
/// # Example
///
/// ```rust
/// use need::testing::TaskBuilder;
///
/// let task = TaskBuilder::new("Pay rent").project("Home").tag("bills").build();
/// assert!(task.has_tag("bills"));
/// assert!(task.uuid.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    #[must_use]
    pub fn new(description: &str) -> Self {
        Self {
            task: Task {
                uuid: Some(Uuid::new_v4()),
                description: description.to_string(),
                ..Default::default()
            },
        }
    }

    #[must_use]
    pub fn tag(mut self, tag: &str) -> Self {
        self.task.tags.push(tag.to_string());
        self
    }

    #[must_use]
    pub fn project(mut self, project: &str) -> Self {
        self.task.project = Some(project.to_string());
        self
    }

    /// Raw priority value, valid or not.
    #[must_use]
    pub fn priority(mut self, priority: &str) -> Self {
        self.task.priority = Some(priority.to_string());
        self
    }

    #[must_use]
    pub fn status(mut self, status: Status) -> Self {
        self.task.status = status;
        self
    }

    #[must_use]
    pub fn due(mut self, due: DateTime<Utc>) -> Self {
        self.task.due = Some(due);
        self
    }

    #[must_use]
    pub fn scheduled(mut self, scheduled: DateTime<Utc>) -> Self {
        self.task.scheduled = Some(scheduled);
        self
    }

    #[must_use]
    pub fn build(self) -> Task {
        self.task
    }
}
