//! Auto-assignment rules.
//!
//! Rules live in the rc file as one line per tier:
//!
//! ```text
//! priority.1.auto=+meds,desc.has:water
//! priority.2.auto=proj:Finance,proj.has:health
//! priority.6.auto=+goals
//! ```
//!
//! Each line attaches a list of OR-ed clauses to one tier. Lines with any
//! other key are ignored here; they belong to settings or to the host.
//!
//! # Example
//!
//! ```rust
//! use need::{RuleSet, Task, Tier};
//!
//! let rules = RuleSet::load("priority.1.auto=+meds\n").unwrap();
//! let task = Task { tags: vec!["meds".into()], ..Default::default() };
//! assert!(rules.matches(&task, Tier::MOST_URGENT));
//! assert!(RuleSet::load("priority.7.auto=+x\n").is_err());
//! ```

use crate::error::{NeedError, Result};
use crate::task::Task;
use crate::tier::Tier;
use anyhow::Context;
use regex::Regex;
use std::fmt;

/// A single atomic match condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// `+X`: tag `X` is present (exact, case-sensitive).
    Tag(String),
    /// `proj:X`: project equals `X` exactly.
    Project(String),
    /// `proj.has:X`: project contains `X`, ignoring case. Stored lowercased.
    ProjectHas(String),
    /// `desc.has:X`: description contains `X`, ignoring case. Stored lowercased.
    DescriptionHas(String),
}

impl Clause {
    /// Parse one clause, returning a description of the problem on failure.
    pub fn parse(raw: &str) -> std::result::Result<Self, String> {
        let raw = raw.trim();
        let (clause, value) = if let Some(v) = raw.strip_prefix('+') {
            (Clause::Tag(v.to_string()), v)
        } else if let Some(v) = raw.strip_prefix("proj.has:") {
            (Clause::ProjectHas(v.to_lowercase()), v)
        } else if let Some(v) = raw.strip_prefix("proj:") {
            (Clause::Project(v.to_string()), v)
        } else if let Some(v) = raw.strip_prefix("desc.has:") {
            (Clause::DescriptionHas(v.to_lowercase()), v)
        } else if raw.is_empty() {
            return Err("empty clause".to_string());
        } else {
            return Err(format!(
                "unknown clause '{raw}' (expected +tag, proj:, proj.has: or desc.has:)"
            ));
        };

        if value.is_empty() {
            return Err(format!("clause '{raw}' has no value"));
        }
        Ok(clause)
    }

    /// Test the clause against a task.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Clause::Tag(tag) => task.has_tag(tag),
            Clause::Project(project) => task.project.as_deref() == Some(project.as_str()),
            Clause::ProjectHas(needle) => task.project_name().to_lowercase().contains(needle),
            Clause::DescriptionHas(needle) => task.description.to_lowercase().contains(needle),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Tag(v) => write!(f, "+{v}"),
            Clause::Project(v) => write!(f, "proj:{v}"),
            Clause::ProjectHas(v) => write!(f, "proj.has:{v}"),
            Clause::DescriptionHas(v) => write!(f, "desc.has:{v}"),
        }
    }
}

/// One `priority.<tier>.auto` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub tier: Tier,
    pub clauses: Vec<Clause>,
}

impl Rule {
    /// The first clause that matches, if any.
    #[must_use]
    pub fn matching_clause(&self, task: &Task) -> Option<&Clause> {
        self.clauses.iter().find(|c| c.matches(task))
    }
}

/// Ordered rule table, most urgent tier first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Parse every rule line in `config_text`.
    ///
    /// # Errors
    ///
    /// Returns [`NeedError::ConfigParse`] for a rule line with a malformed key,
    /// a tier outside `1..=6`, an empty clause list, or an unknown clause prefix.
    pub fn load(config_text: &str) -> Result<Self> {
        let rule_key =
            Regex::new(r"^priority\.([^.]*)\.auto$").context("Failed to compile rule key regex")?;

        let mut rules = Vec::new();
        for (idx, line) in config_text.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = match line.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (line, None),
            };
            if !(key.starts_with("priority.") && key.ends_with("auto")) {
                continue;
            }

            let caps = rule_key
                .captures(key)
                .ok_or_else(|| NeedError::parse(line_no, format!("malformed rule key '{key}'")))?;
            let tier: Tier = caps[1]
                .parse()
                .map_err(|e| NeedError::parse(line_no, format!("{e}")))?;

            let value = value.ok_or_else(|| {
                NeedError::parse(line_no, format!("rule '{key}' is missing '='"))
            })?;
            if value.is_empty() {
                return Err(NeedError::parse(
                    line_no,
                    format!("rule '{key}' has an empty clause list"),
                ));
            }

            let clauses = value
                .split(',')
                .map(Clause::parse)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|msg| NeedError::parse(line_no, msg))?;

            rules.push(Rule { tier, clauses });
        }

        // Stable sort keeps file order among rules of the same tier.
        rules.sort_by_key(|r| r.tier);
        Ok(Self { rules })
    }

    /// True if any rule attached to `tier` matches the task.
    #[must_use]
    pub fn matches(&self, task: &Task, tier: Tier) -> bool {
        self.rules_for(tier).any(|r| r.matching_clause(task).is_some())
    }

    /// Rules attached to one tier, in file order.
    pub fn rules_for(&self, tier: Tier) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |r| r.tier == tier)
    }

    /// All rules, most urgent tier first.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TaskBuilder;

    fn tier(n: u8) -> Tier {
        Tier::new(n).unwrap()
    }

    #[test]
    fn test_load_ignores_unrelated_lines() {
        let text = "\
# needs hierarchy
uda.priority.values=1,2,3,4,5,6
priority.span=2
context.needs.read=priority:1

priority.1.auto=+meds
";
        let rules = RuleSet::load(text).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.rules()[0].tier, tier(1));
        assert_eq!(rules.rules()[0].clauses, vec![Clause::Tag("meds".into())]);
    }

    #[test]
    fn test_load_all_clause_kinds() {
        let rules =
            RuleSet::load("priority.2.auto=+bills, proj:Home,proj.has:Health,desc.has:Rent\n")
                .unwrap();
        assert_eq!(
            rules.rules()[0].clauses,
            vec![
                Clause::Tag("bills".into()),
                Clause::Project("Home".into()),
                Clause::ProjectHas("health".into()),
                Clause::DescriptionHas("rent".into()),
            ]
        );
    }

    #[test]
    fn test_load_sorts_by_tier_keeping_file_order() {
        let text = "priority.5.auto=+a\npriority.2.auto=+b\npriority.5.auto=+c\n";
        let rules = RuleSet::load(text).unwrap();
        let order: Vec<(u8, String)> = rules
            .rules()
            .iter()
            .map(|r| (r.tier.get(), r.clauses[0].to_string()))
            .collect();
        assert_eq!(
            order,
            vec![(2, "+b".into()), (5, "+a".into()), (5, "+c".into())]
        );
    }

    #[test]
    fn test_tier_out_of_range_is_parse_error() {
        let err = RuleSet::load("priority.7.auto=+x\n").unwrap_err();
        assert!(matches!(err, NeedError::ConfigParse { line: 1, .. }));
    }

    #[test]
    fn test_non_integer_tier_is_parse_error() {
        let err = RuleSet::load("priority.high.auto=+x\n").unwrap_err();
        assert!(matches!(err, NeedError::ConfigParse { .. }));
    }

    #[test]
    fn test_malformed_key_is_parse_error() {
        let err = RuleSet::load("priority.auto=+x\n").unwrap_err();
        assert!(err.to_string().contains("malformed rule key"));
    }

    #[test]
    fn test_unknown_clause_is_parse_error() {
        let err = RuleSet::load("priority.3.auto=+ok\npriority.3.auto=tag:x\n").unwrap_err();
        assert!(matches!(err, NeedError::ConfigParse { line: 2, .. }));
        assert!(err.to_string().contains("unknown clause"));
    }

    #[test]
    fn test_empty_clause_list_is_parse_error() {
        assert!(RuleSet::load("priority.3.auto=\n").is_err());
        assert!(RuleSet::load("priority.3.auto=+a,,+b\n").is_err());
        assert!(RuleSet::load("priority.3.auto=proj:\n").is_err());
        assert!(RuleSet::load("priority.3.auto\n").is_err());
    }

    #[test]
    fn test_tag_clause_is_case_sensitive() {
        let clause = Clause::parse("+Meds").unwrap();
        assert!(!clause.matches(&TaskBuilder::new("x").tag("meds").build()));
        assert!(clause.matches(&TaskBuilder::new("x").tag("Meds").build()));
    }

    #[test]
    fn test_project_exact() {
        let clause = Clause::parse("proj:Home").unwrap();
        assert!(clause.matches(&TaskBuilder::new("x").project("Home").build()));
        assert!(!clause.matches(&TaskBuilder::new("x").project("Home.Garden").build()));
        assert!(!clause.matches(&TaskBuilder::new("x").build()));
    }

    #[test]
    fn test_project_substring_ignores_case() {
        let clause = Clause::parse("proj.has:HEALTH").unwrap();
        assert!(clause.matches(&TaskBuilder::new("x").project("MentalHealth").build()));
        assert!(!clause.matches(&TaskBuilder::new("x").project("Work").build()));
    }

    #[test]
    fn test_description_substring_ignores_case() {
        let clause = Clause::parse("desc.has:Rent").unwrap();
        assert!(clause.matches(&TaskBuilder::new("pay RENT today").build()));
        assert!(!clause.matches(&TaskBuilder::new("pay bills").build()));
    }

    #[test]
    fn test_matches_is_scoped_to_tier() {
        let rules = RuleSet::load("priority.1.auto=+meds\npriority.6.auto=+goals\n").unwrap();
        let task = TaskBuilder::new("x").tag("goals").build();
        assert!(!rules.matches(&task, tier(1)));
        assert!(rules.matches(&task, tier(6)));
        assert!(!rules.matches(&task, tier(4)));
    }
}
