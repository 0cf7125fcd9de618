//! Context filter synthesis.
//!
//! Turns the tiers present among open tasks plus the configured span,
//! lookahead and lookback into the Taskwarrior filter that becomes the
//! `needs` context:
//!
//! ```text
//! ( priority:2 or priority:3 or due.before:today+2d or ( scheduled.before:today+2d and scheduled.after:today-1w ) ) and ( due.none: or due.after:today-1w )
//! ```
//!
//! The tier window is anchored at the most urgent tier present (count
//! mode) or fixed (range mode). Tasks due or scheduled within the lookahead
//! are shown regardless of tier, and tasks overdue by more than the
//! lookback are hidden regardless of tier.
//!
//! [`FilterExpression::matches`] evaluates the same predicate in-process so
//! the emitted text can be checked against concrete tasks.

use crate::error::{NeedError, Result};
use crate::task::Task;
use crate::tier::Tier;
use chrono::{DateTime, Local, TimeDelta, Utc};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Error returned when a settings value cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSettingError {
    input: String,
    reason: String,
}

impl ParseSettingError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ParseSettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.input, self.reason)
    }
}

impl std::error::Error for ParseSettingError {}

// ============================================================================
// Span
// ============================================================================

/// Width of the visible tier window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    /// Window of `n` tiers starting at the most urgent tier present.
    Count(u32),
    /// Fixed window `[low, high]`, independent of which tiers are present.
    Range(Tier, Tier),
}

impl Default for Span {
    fn default() -> Self {
        Span::Count(2)
    }
}

impl Span {
    fn validate(&self) -> std::result::Result<(), String> {
        match *self {
            Span::Count(0) => Err("span must be positive".to_string()),
            Span::Range(low, high) if low > high => {
                Err(format!("range lower bound {low} exceeds upper bound {high}"))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Span::Count(n) => write!(f, "{n}"),
            Span::Range(low, high) => write!(f, "{low}-{high}"),
        }
    }
}

impl FromStr for Span {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.starts_with('-') {
            return Err(ParseSettingError::new(s, "span must be positive"));
        }

        let span = match raw.split_once('-') {
            Some((low, high)) => {
                let bound = |b: &str| {
                    b.parse::<Tier>()
                        .map_err(|e| ParseSettingError::new(s, e.to_string()))
                };
                Span::Range(bound(low)?, bound(high)?)
            }
            None => Span::Count(raw.parse().map_err(|_| {
                ParseSettingError::new(s, "expected a tier count like 2 or a range like 2-4")
            })?),
        };

        span.validate().map_err(|reason| ParseSettingError::new(s, reason))?;
        Ok(span)
    }
}

// ============================================================================
// Durations
// ============================================================================

/// Unit of a compact duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Days,
    Weeks,
}

/// A compact duration such as `2d` or `1w`, written back verbatim into the
/// filter text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwDuration {
    pub amount: u32,
    pub unit: DurationUnit,
}

impl TwDuration {
    #[must_use]
    pub fn days(amount: u32) -> Self {
        Self {
            amount,
            unit: DurationUnit::Days,
        }
    }

    #[must_use]
    pub fn weeks(amount: u32) -> Self {
        Self {
            amount,
            unit: DurationUnit::Weeks,
        }
    }

    /// Length as a chrono delta.
    #[must_use]
    pub fn to_delta(self) -> TimeDelta {
        let days = match self.unit {
            DurationUnit::Days => i64::from(self.amount),
            DurationUnit::Weeks => i64::from(self.amount) * 7,
        };
        TimeDelta::days(days)
    }
}

impl fmt::Display for TwDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            DurationUnit::Days => 'd',
            DurationUnit::Weeks => 'w',
        };
        write!(f, "{}{}", self.amount, unit)
    }
}

impl FromStr for TwDuration {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let raw = s.trim();
        let (amount, unit) = if let Some(n) = raw.strip_suffix('d') {
            (n, DurationUnit::Days)
        } else if let Some(n) = raw.strip_suffix('w') {
            (n, DurationUnit::Weeks)
        } else {
            return Err(ParseSettingError::new(
                s,
                "expected a duration like 2d or 1w",
            ));
        };

        let amount: u32 = amount
            .parse()
            .map_err(|_| ParseSettingError::new(s, "expected a duration like 2d or 1w"))?;
        // Keeps `to_delta` well inside chrono's range.
        if amount > 100_000 {
            return Err(ParseSettingError::new(s, "duration is too large"));
        }
        Ok(Self { amount, unit })
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Validated filter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSettings {
    pub span: Span,
    pub lookahead: TwDuration,
    pub lookback: TwDuration,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            span: Span::default(),
            lookahead: TwDuration::days(2),
            lookback: TwDuration::weeks(1),
        }
    }
}

impl FilterSettings {
    /// Parse raw settings values.
    ///
    /// # Errors
    ///
    /// Returns [`NeedError::InvalidConfig`] naming the offending field.
    pub fn parse(span: &str, lookahead: &str, lookback: &str) -> Result<Self> {
        Ok(Self {
            span: span
                .parse()
                .map_err(|e: ParseSettingError| NeedError::invalid("span", e.to_string()))?,
            lookahead: lookahead
                .parse()
                .map_err(|e: ParseSettingError| NeedError::invalid("lookahead", e.to_string()))?,
            lookback: lookback
                .parse()
                .map_err(|e: ParseSettingError| NeedError::invalid("lookback", e.to_string()))?,
        })
    }

    /// Re-check invariants of a value built by hand.
    ///
    /// # Errors
    ///
    /// Returns [`NeedError::InvalidConfig`] for a zero span or an inverted range.
    pub fn validate(&self) -> Result<()> {
        self.span
            .validate()
            .map_err(|reason| NeedError::invalid("span", reason))
    }

    /// Oldest due date that is still shown.
    #[must_use]
    pub fn stale_cutoff(&self, today: DateTime<Utc>) -> DateTime<Utc> {
        today - self.lookback.to_delta()
    }

    /// True if the task is overdue by more than the lookback.
    #[must_use]
    pub fn is_suppressed(&self, task: &Task, today: DateTime<Utc>) -> bool {
        task.due.is_some_and(|due| due <= self.stale_cutoff(today))
    }
}

// ============================================================================
// Window and expression
// ============================================================================

/// Inclusive, non-empty range of tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub low: Tier,
    pub high: Tier,
}

impl Window {
    #[must_use]
    pub fn contains(&self, tier: Tier) -> bool {
        self.low <= tier && tier <= self.high
    }

    /// Tiers in the window, most urgent first.
    pub fn tiers(&self) -> impl Iterator<Item = Tier> + '_ {
        Tier::all().filter(move |t| self.contains(*t))
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}

/// The synthesized context filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterExpression {
    /// No open task carries a tier: the context is cleared and nothing is selected.
    Empty,
    /// Tier window plus due/scheduled bounds.
    Active {
        window: Window,
        lookahead: TwDuration,
        lookback: TwDuration,
    },
}

impl FilterExpression {
    #[must_use]
    pub fn window(&self) -> Option<Window> {
        match self {
            Self::Empty => None,
            Self::Active { window, .. } => Some(*window),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Evaluate the filter against one task, as the host would.
    ///
    /// `today` is the start of the current day. `before` and `after` are
    /// strict comparisons, as in the host's query grammar.
    #[must_use]
    pub fn matches(&self, task: &Task, today: DateTime<Utc>) -> bool {
        let Self::Active {
            window,
            lookahead,
            lookback,
        } = *self
        else {
            return false;
        };

        let horizon = today + lookahead.to_delta();
        let cutoff = today - lookback.to_delta();

        let in_window = task.tier().is_some_and(|t| window.contains(t));
        let due_soon = task.due.is_some_and(|d| d < horizon);
        let scheduled_soon = task.scheduled.is_some_and(|s| s < horizon && s > cutoff);
        let fresh = task.due.is_none_or(|d| d > cutoff);

        (in_window || due_soon || scheduled_soon) && fresh
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self::Active {
            window,
            lookahead,
            lookback,
        } = self
        else {
            return Ok(());
        };

        let mut terms: Vec<String> = window.tiers().map(|t| format!("priority:{t}")).collect();
        terms.push(format!("due.before:today+{lookahead}"));
        terms.push(format!(
            "( scheduled.before:today+{lookahead} and scheduled.after:today-{lookback} )"
        ));

        write!(
            f,
            "( {} ) and ( due.none: or due.after:today-{lookback} )",
            terms.join(" or ")
        )
    }
}

/// Most urgent tier among open tasks, preferring tasks that are not overdue
/// beyond the lookback.
///
/// Stale tasks only anchor when every open tiered task is stale; the
/// lookback clause of the filter still hides them.
#[must_use]
pub fn anchor_tier(
    open_tasks: &[Task],
    settings: &FilterSettings,
    today: DateTime<Utc>,
) -> Option<Tier> {
    let tiered = || {
        open_tasks
            .iter()
            .filter(|t| t.is_open())
            .filter_map(|t| t.tier().map(|tier| (t, tier)))
    };

    tiered()
        .filter(|(t, _)| !settings.is_suppressed(t, today))
        .map(|(_, tier)| tier)
        .min()
        .or_else(|| tiered().map(|(_, tier)| tier).min())
}

/// Compute the context filter for the given open tasks.
///
/// The filter is empty only when no open task carries a valid tier. See
/// [`anchor_tier`] for how the count window is anchored.
///
/// # Errors
///
/// Returns [`NeedError::InvalidConfig`] if `settings` fails validation.
pub fn synthesize(
    open_tasks: &[Task],
    settings: &FilterSettings,
    today: DateTime<Utc>,
) -> Result<FilterExpression> {
    settings.validate()?;

    let Some(lowest) = anchor_tier(open_tasks, settings, today) else {
        debug!("No open tiered tasks, filter is empty");
        return Ok(FilterExpression::Empty);
    };

    let window = match settings.span {
        Span::Count(n) => Window {
            low: lowest,
            high: Tier::clamped(i64::from(lowest.get()) + i64::from(n) - 1),
        },
        Span::Range(low, high) => Window { low, high },
    };
    debug!(%lowest, %window, span = %settings.span, "Computed tier window");

    Ok(FilterExpression::Active {
        window,
        lookahead: settings.lookahead,
        lookback: settings.lookback,
    })
}

/// Start of the current local day, the host's `today`.
#[must_use]
pub fn local_today() -> DateTime<Utc> {
    let now = Local::now();
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(Local).earliest())
        .map_or_else(|| now.with_timezone(&Utc), |dt| dt.with_timezone(&Utc))
}
