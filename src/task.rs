//! Task records as exchanged with Taskwarrior.
//!
//! Hooks receive tasks as one JSON object per line and must echo them back
//! with every field intact, so fields this crate does not interpret are kept
//! in [`Task::extra`] and serialized unchanged.

use crate::tier::Tier;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Waiting,
    Recurring,
    Completed,
    Deleted,
}

/// A single task record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub status: Status,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Raw priority value. Kept as text so invalid values can be detected
    /// and repaired instead of failing deserialization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    #[serde(default, with = "tw_date", skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,

    #[serde(default, with = "tw_date", skip_serializing_if = "Option::is_none")]
    pub scheduled: Option<DateTime<Utc>>,

    /// Every other attribute, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Task {
    /// Parse a task from one line of hook input.
    pub fn from_json(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line.trim())
    }

    /// Serialize the task as a single JSON line.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// The explicit tier carried by this task, if its priority is a valid tier.
    #[must_use]
    pub fn tier(&self) -> Option<Tier> {
        self.priority.as_deref().and_then(|p| p.parse().ok())
    }

    /// True when a priority value is present and non-empty, valid or not.
    #[must_use]
    pub fn has_priority(&self) -> bool {
        self.priority.as_deref().is_some_and(|p| !p.trim().is_empty())
    }

    pub fn set_tier(&mut self, tier: Tier) {
        self.priority = Some(tier.to_string());
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Project name, or the empty string when unset.
    #[must_use]
    pub fn project_name(&self) -> &str {
        self.project.as_deref().unwrap_or("")
    }

    /// Open tasks are the ones the context filter is computed over. Only
    /// pending tasks count, matching the `status:pending` export.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == Status::Pending
    }
}

/// Parse a Taskwarrior timestamp (`20261019T143000Z`), falling back to RFC 3339.
pub fn parse_tw_date(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, tw_date::FORMAT)
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)))
}

mod tw_date {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub(super) const FORMAT: &str = "%Y%m%dT%H%M%SZ";

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&dt.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| super::parse_tw_date(&s).map_err(de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ADD_LINE: &str = r#"{"description":"Take meds","entry":"20261019T080000Z","status":"pending","tags":["meds","daily"],"uuid":"4b9b7a36-2b1e-4a0b-9a59-0f6a2f9b8c11","due":"20261020T120000Z","urgency":3.2}"#;

    #[test]
    fn test_parse_hook_line() {
        let task = Task::from_json(ADD_LINE).unwrap();
        assert_eq!(task.description, "Take meds");
        assert_eq!(task.status, Status::Pending);
        assert!(task.has_tag("meds"));
        assert!(!task.has_tag("Meds"));
        assert_eq!(
            task.due,
            Some(Utc.with_ymd_and_hms(2026, 10, 20, 12, 0, 0).unwrap())
        );
        assert!(task.scheduled.is_none());
        assert!(task.extra.contains_key("entry"));
    }

    #[test]
    fn test_round_trip_preserves_unknown_fields() {
        let task = Task::from_json(ADD_LINE).unwrap();
        let json = task.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["entry"], "20261019T080000Z");
        assert_eq!(value["urgency"], 3.2);
        assert_eq!(value["due"], "20261020T120000Z");
        assert!(value.get("priority").is_none());
    }

    #[test]
    fn test_tier_accessors() {
        let mut task = Task::from_json(r#"{"description":"x","priority":"2"}"#).unwrap();
        assert_eq!(task.tier(), Tier::new(2));
        task.set_tier(Tier::LEAST_URGENT);
        assert_eq!(task.priority.as_deref(), Some("6"));
    }

    #[test]
    fn test_invalid_priority_is_kept_raw() {
        let task = Task::from_json(r#"{"description":"x","priority":"H"}"#).unwrap();
        assert!(task.has_priority());
        assert!(task.tier().is_none());
    }

    #[test]
    fn test_empty_priority_is_absent() {
        let task = Task::from_json(r#"{"description":"x","priority":""}"#).unwrap();
        assert!(!task.has_priority());
    }

    #[test]
    fn test_is_open() {
        let pending = Task::default();
        assert!(pending.is_open());
        let done = Task {
            status: Status::Completed,
            ..Default::default()
        };
        assert!(!done.is_open());
        let waiting = Task {
            status: Status::Waiting,
            ..Default::default()
        };
        assert!(!waiting.is_open());
    }

    #[test]
    fn test_parse_tw_date_rfc3339_fallback() {
        let dt = parse_tw_date("2026-10-19T10:00:00Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap());
        assert!(parse_tw_date("tomorrow").is_err());
    }
}
