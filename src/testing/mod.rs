//! Testing infrastructure for need.
//!
//! Provides in-memory doubles for the two external collaborators, the rc
//! file and the Taskwarrior task store, plus a builder for task records.
//!
//! # Example
//!
//! ```rust
//! use need::testing::{MemoryStore, MockTaskSource, TaskBuilder};
//! use need::HostAdapter;
//!
//! let store = MemoryStore::new("priority.1.auto=+meds\n");
//! let tasks = MockTaskSource::new()
//!     .with_pending(vec![TaskBuilder::new("Call mom").priority("3").build()]);
//!
//! let mut adapter = HostAdapter::new(store, tasks);
//! let filter = adapter.recompute().unwrap();
//! assert_eq!(filter.window().unwrap().low.get(), 3);
//! ```

pub mod fixtures;
pub mod mocks;

// Re-export commonly used types
pub use fixtures::*;
pub use mocks::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::TaskSource;
    use crate::store::{ConfigStore, SettingsUpdate, FILTER_KEY};
    use crate::tier::Tier;

    // =========================================================================
    // MemoryStore Tests
    // =========================================================================

    #[test]
    fn test_memory_store_reads_settings() {
        let store = MemoryStore::new("priority.span=3\n");
        let settings = store.read_settings().unwrap();
        assert_eq!(settings.span, "3");
        assert_eq!(settings.lookahead, "2d");
    }

    #[test]
    fn test_memory_store_counts_writes() {
        let mut store = MemoryStore::new("");
        store.write_filter("priority:1").unwrap();
        store
            .write_settings(&SettingsUpdate {
                span: Some("4".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(store.filter_writes(), 1);
        assert_eq!(store.value(FILTER_KEY).as_deref(), Some("priority:1"));
        assert_eq!(store.read_settings().unwrap().span, "4");
    }

    // =========================================================================
    // MockTaskSource Tests
    // =========================================================================

    #[test]
    fn test_mock_task_source_default() {
        let tasks = MockTaskSource::default();
        assert!(tasks.pending_tasks().unwrap().is_empty());
        assert_eq!(tasks.active_context().unwrap(), None);
    }

    #[test]
    fn test_mock_task_source_records_tier_changes() {
        let task = TaskBuilder::new("x").build();
        let uuid = task.uuid.unwrap();
        let tasks = MockTaskSource::new().with_pending(vec![task]);
        tasks.set_tier(uuid, Tier::MOST_URGENT).unwrap();
        assert_eq!(tasks.tier_changes(), vec![(uuid, Tier::MOST_URGENT)]);
        assert_eq!(
            tasks.pending_tasks().unwrap()[0].tier(),
            Some(Tier::MOST_URGENT)
        );
    }

    #[test]
    fn test_mock_task_source_error() {
        let tasks = MockTaskSource::new().with_error("boom");
        assert!(tasks.pending_tasks().is_err());
    }
}
