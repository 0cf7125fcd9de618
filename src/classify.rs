//! Tier assignment for new tasks and review of existing ones.
//!
//! An explicit, valid priority on the incoming task always wins. Otherwise
//! tiers are tried from 1 to 6 and the first tier with a matching rule is
//! assigned; when nothing matches the default tier applies.

use crate::rules::{Clause, RuleSet};
use crate::task::Task;
use crate::tier::Tier;
use tracing::debug;

/// Why a tier was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification<'a> {
    /// The task already carried this tier.
    Explicit(Tier),
    /// A rule for this tier matched through the given clause.
    Matched { tier: Tier, clause: &'a Clause },
    /// No rule matched.
    Default(Tier),
}

impl Classification<'_> {
    #[must_use]
    pub fn tier(&self) -> Tier {
        match self {
            Self::Explicit(tier) | Self::Default(tier) => *tier,
            Self::Matched { tier, .. } => *tier,
        }
    }
}

/// Assign a tier to `task`.
#[must_use]
pub fn classify(task: &Task, rules: &RuleSet, default_tier: Tier) -> Tier {
    explain(task, rules, default_tier).tier()
}

/// Assign a tier and report which path produced it.
#[must_use]
pub fn explain<'a>(task: &Task, rules: &'a RuleSet, default_tier: Tier) -> Classification<'a> {
    if let Some(tier) = task.tier() {
        debug!(%tier, "Explicit priority kept");
        return Classification::Explicit(tier);
    }
    suggest(task, rules, default_tier)
}

/// Tier the rules alone would assign, ignoring any priority already on the task.
#[must_use]
pub fn suggest<'a>(task: &Task, rules: &'a RuleSet, default_tier: Tier) -> Classification<'a> {
    for tier in Tier::all() {
        for rule in rules.rules_for(tier) {
            if let Some(clause) = rule.matching_clause(task) {
                debug!(%tier, %clause, "Rule matched");
                return Classification::Matched { tier, clause };
            }
        }
    }
    Classification::Default(default_tier)
}

/// A pending task whose tier differs from what the rules would assign.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion<'a> {
    pub task: &'a Task,
    pub current: Option<Tier>,
    pub suggested: Tier,
    /// The clause that produced the suggestion, `None` for the default tier.
    pub clause: Option<&'a Clause>,
}

/// Tasks worth re-tiering.
///
/// A task with a valid tier is only flagged when a rule matches and points
/// elsewhere; falling back to the default never overrides a chosen tier.
/// Tasks without a valid tier are always flagged.
#[must_use]
pub fn review<'a>(tasks: &'a [Task], rules: &'a RuleSet, default_tier: Tier) -> Vec<Suggestion<'a>> {
    tasks
        .iter()
        .filter_map(|task| {
            let current = task.tier();
            let (suggested, clause) = match suggest(task, rules, default_tier) {
                Classification::Matched { tier, clause } => (tier, Some(clause)),
                Classification::Default(tier) if current.is_none() => (tier, None),
                _ => return None,
            };
            (current != Some(suggested)).then_some(Suggestion {
                task,
                current,
                suggested,
                clause,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TaskBuilder;

    fn tier(n: u8) -> Tier {
        Tier::new(n).unwrap()
    }

    fn rules() -> RuleSet {
        RuleSet::load(
            "\
priority.1.auto=+meds,desc.has:water
priority.2.auto=proj:Finance
priority.3.auto=proj.has:family
priority.6.auto=+goals
",
        )
        .unwrap()
    }

    #[test]
    fn test_tag_rule_assigns_tier() {
        let task = TaskBuilder::new("Take pills").tag("meds").build();
        assert_eq!(classify(&task, &rules(), Tier::DEFAULT), tier(1));
    }

    #[test]
    fn test_no_match_uses_default() {
        let task = TaskBuilder::new("Buy headphones").build();
        assert_eq!(classify(&task, &rules(), Tier::DEFAULT), tier(4));
        assert_eq!(classify(&task, &rules(), tier(5)), tier(5));
    }

    #[test]
    fn test_explicit_priority_wins() {
        let task = TaskBuilder::new("Plan trip").tag("goals").priority("1").build();
        assert_eq!(classify(&task, &rules(), Tier::DEFAULT), tier(1));

        let task = TaskBuilder::new("Refill water").priority("5").build();
        assert_eq!(classify(&task, &rules(), Tier::DEFAULT), tier(5));
    }

    #[test]
    fn test_invalid_explicit_priority_is_reclassified() {
        let task = TaskBuilder::new("x").tag("goals").priority("H").build();
        assert_eq!(classify(&task, &rules(), Tier::DEFAULT), tier(6));
    }

    #[test]
    fn test_first_match_wins() {
        // Matches tier 2 (project) and tier 6 (tag).
        let task = TaskBuilder::new("x")
            .project("Finance")
            .tag("goals")
            .build();
        assert_eq!(classify(&task, &rules(), Tier::DEFAULT), tier(2));

        let task = TaskBuilder::new("Drink water")
            .tag("goals")
            .project("family.finance")
            .build();
        assert_eq!(classify(&task, &rules(), Tier::DEFAULT), tier(1));
    }

    #[test]
    fn test_first_match_wins_for_every_tier_pair() {
        for low in 1..=6u8 {
            for high in (low + 1)..=6u8 {
                let text = format!("priority.{high}.auto=+both\npriority.{low}.auto=+both\n");
                let rules = RuleSet::load(&text).unwrap();
                let task = TaskBuilder::new("x").tag("both").build();
                assert_eq!(classify(&task, &rules, Tier::DEFAULT), tier(low));
            }
        }
    }

    #[test]
    fn test_explain_reports_clause() {
        let rules = rules();
        let task = TaskBuilder::new("Fill WATER jug").build();
        match explain(&task, &rules, Tier::DEFAULT) {
            Classification::Matched { tier: t, clause } => {
                assert_eq!(t, tier(1));
                assert_eq!(clause.to_string(), "desc.has:water");
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn test_suggest_ignores_explicit_priority() {
        let rules = rules();
        let task = TaskBuilder::new("x").tag("meds").priority("4").build();
        assert_eq!(explain(&task, &rules, Tier::DEFAULT).tier(), tier(4));
        assert_eq!(suggest(&task, &rules, Tier::DEFAULT).tier(), tier(1));
    }

    #[test]
    fn test_empty_rule_set_uses_default() {
        let task = TaskBuilder::new("x").tag("meds").build();
        assert_eq!(classify(&task, &RuleSet::default(), Tier::DEFAULT), tier(4));
    }

    #[test]
    fn test_review_flags_mismatches_only() {
        let rules = rules();
        let tasks = vec![
            TaskBuilder::new("meds at 4").tag("meds").priority("4").build(),
            TaskBuilder::new("meds at 1").tag("meds").priority("1").build(),
            TaskBuilder::new("chosen 5, no rule").priority("5").build(),
            TaskBuilder::new("untiered").build(),
        ];
        let suggestions = review(&tasks, &rules, Tier::DEFAULT);
        assert_eq!(suggestions.len(), 2);

        assert_eq!(suggestions[0].task.description, "meds at 4");
        assert_eq!(suggestions[0].current, Some(tier(4)));
        assert_eq!(suggestions[0].suggested, tier(1));
        assert_eq!(suggestions[0].clause.map(ToString::to_string).as_deref(), Some("+meds"));

        assert_eq!(suggestions[1].task.description, "untiered");
        assert_eq!(suggestions[1].current, None);
        assert_eq!(suggestions[1].suggested, Tier::DEFAULT);
        assert!(suggestions[1].clause.is_none());
    }
}
