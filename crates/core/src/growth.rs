//! Table growth policy
//!
//! Decides the preferred capacity when the handle table runs out of free
//! slots. Whatever the policy, the table falls back to growing by exactly one
//! slot when the preferred size cannot be allocated.

use serde::Deserialize;
use std::str::FromStr;

/// How the handle table grows when every slot is occupied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthPolicy {
    /// Double the capacity (default)
    #[default]
    Double,
    /// Add a fixed number of slots
    Linear { step: usize },
}

impl GrowthPolicy {
    /// Preferred capacity after growing from `current`
    ///
    /// Always strictly larger than `current` unless `current` is `usize::MAX`.
    pub fn next_capacity(&self, current: usize) -> usize {
        match *self {
            GrowthPolicy::Double => current.saturating_mul(2).max(current.saturating_add(1)),
            GrowthPolicy::Linear { step } => current.saturating_add(step.max(1)),
        }
    }
}

/// Error parsing a growth policy string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseGrowthError(String);

impl std::fmt::Display for ParseGrowthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid growth policy '{}' (expected 'double' or 'linear:<step>')",
            self.0
        )
    }
}

impl std::error::Error for ParseGrowthError {}

impl FromStr for GrowthPolicy {
    type Err = ParseGrowthError;

    /// Accepts `double` or `linear:<step>` (case-insensitive, step ≥ 1)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if lower == "double" {
            return Ok(GrowthPolicy::Double);
        }
        if let Some(step) = lower.strip_prefix("linear:") {
            return match step.trim().parse::<usize>() {
                Ok(step) if step > 0 => Ok(GrowthPolicy::Linear { step }),
                _ => Err(ParseGrowthError(s.to_string())),
            };
        }
        Err(ParseGrowthError(s.to_string()))
    }
}
