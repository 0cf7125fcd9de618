//! Priority tiers of the needs hierarchy.
//!
//! A [`Tier`] is an integer in `1..=6`, where 1 is the most urgent
//! (physiological needs) and 6 the least (aspirational goals).
//!
//! # Example
//!
//! ```rust
//! use need::Tier;
//!
//! let tier: Tier = "2".parse().unwrap();
//! assert_eq!(tier.get(), 2);
//! assert!(Tier::MOST_URGENT < tier);
//! assert_eq!(tier.urgency_coefficient(), 16.0);
//! assert!("7".parse::<Tier>().is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A priority tier in `1..=6`. Lower values are more urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tier(u8);

impl Tier {
    /// Smallest tier value.
    pub const MIN: u8 = 1;
    /// Largest tier value.
    pub const MAX: u8 = 6;

    /// Tier 1, physiological needs.
    pub const MOST_URGENT: Tier = Tier(1);
    /// Tier 6, higher goals.
    pub const LEAST_URGENT: Tier = Tier(6);
    /// Tier assigned when nothing else applies.
    pub const DEFAULT: Tier = Tier(4);

    /// Create a tier, returning `None` outside `1..=6`.
    #[must_use]
    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    /// Create a tier by clamping any integer into `1..=6`.
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(i64::from(Self::MIN), i64::from(Self::MAX)) as u8)
    }

    /// Numeric value of this tier.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// All tiers in evaluation order, most urgent first.
    pub fn all() -> impl DoubleEndedIterator<Item = Tier> + ExactSizeIterator {
        (Self::MIN..=Self::MAX).map(Tier)
    }

    /// Urgency boost this tier contributes to the host's own scoring.
    ///
    /// Fixed table: 1 → 20.0, 2 → 16.0, 3 → 12.0, 4 → 8.0, 5 → 4.0, 6 → 0.0.
    #[must_use]
    pub fn urgency_coefficient(self) -> f64 {
        f64::from(Self::MAX - self.0) * 4.0
    }

    /// Human-readable name of the need this tier stands for.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Physiological; Air, Water, Food & Shelter",
            2 => "Personal safety, security, health, financial",
            3 => "Love & Belonging, Friends & Family",
            4 => "Esteem, Respect & Recognition",
            5 => "Self Actualization",
            _ => "Higher Goals",
        }
    }
}

impl Default for Tier {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when parsing an invalid tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTierError {
    input: String,
}

impl fmt::Display for ParseTierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid tier '{}': expected an integer from {} to {}",
            self.input,
            Tier::MIN,
            Tier::MAX
        )
    }
}

impl std::error::Error for ParseTierError {}

impl FromStr for Tier {
    type Err = ParseTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(Tier::new)
            .ok_or_else(|| ParseTierError {
                input: s.to_string(),
            })
    }
}

impl TryFrom<String> for Tier {
    type Error = ParseTierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Tier> for String {
    fn from(tier: Tier) -> Self {
        tier.to_string()
    }
}
