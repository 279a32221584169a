//! Handle table configuration
//!
//! ## Configuration (Environment Variables)
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HSTACK_INITIAL_CAPACITY` | `10` | Slots allocated when the first stack is created |
//! | `HSTACK_GROWTH` | `double` | Growth policy: `double` or `linear:<step>` |
//! | `HSTACK_MAX_CAPACITY` | unset | Slot ceiling; growing past it is treated as allocation failure |
//!
//! Unparseable values fall back to the defaults.
//!
//! ## TOML
//!
//! ```toml
//! initial_capacity = 16
//! max_capacity = 1024
//! growth = { linear = { step = 32 } }
//! ```

use crate::growth::GrowthPolicy;
use serde::Deserialize;

pub const ENV_INITIAL_CAPACITY: &str = "HSTACK_INITIAL_CAPACITY";
pub const ENV_GROWTH: &str = "HSTACK_GROWTH";
pub const ENV_MAX_CAPACITY: &str = "HSTACK_MAX_CAPACITY";

/// Preferred size of the first table allocation
pub const DEFAULT_INITIAL_CAPACITY: usize = 10;

/// Tunables for a [`crate::StackTable`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableConfig {
    /// Slots allocated when the first stack is created (at least 1)
    pub initial_capacity: usize,
    /// Preferred growth when every slot is occupied
    pub growth: GrowthPolicy,
    /// Hard ceiling on the slot count
    pub max_capacity: Option<usize>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            growth: GrowthPolicy::Double,
            max_capacity: None,
        }
    }
}

/// Error loading a [`TableConfig`]
#[derive(Debug)]
pub enum ConfigError {
    /// TOML syntax or schema error
    Toml(toml::de::Error),
    /// `initial_capacity` must be at least 1
    ZeroInitialCapacity,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Toml(e) => write!(f, "invalid table config: {}", e),
            ConfigError::ZeroInitialCapacity => {
                write!(f, "invalid table config: initial_capacity must be at least 1")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Toml(e) => Some(e),
            ConfigError::ZeroInitialCapacity => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Toml(e)
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity.max(1);
        self
    }

    pub fn with_growth(mut self, growth: GrowthPolicy) -> Self {
        self.growth = growth;
        self
    }

    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = Some(max_capacity);
        self
    }

    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: TableConfig = toml::from_str(s)?;
        if config.initial_capacity == 0 {
            return Err(ConfigError::ZeroInitialCapacity);
        }
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let initial_capacity = lookup(ENV_INITIAL_CAPACITY)
            .and_then(|s| s.trim().parse().ok())
            .filter(|&v: &usize| v > 0)
            .unwrap_or(DEFAULT_INITIAL_CAPACITY);

        let growth = lookup(ENV_GROWTH)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        let max_capacity = lookup(ENV_MAX_CAPACITY).and_then(|s| s.trim().parse().ok());

        Self {
            initial_capacity,
            growth,
            max_capacity,
        }
    }

    /// Whether a table of `capacity` slots is allowed by the ceiling
    #[inline]
    pub(crate) fn permits(&self, capacity: usize) -> bool {
        self.max_capacity.is_none_or(|max| capacity <= max)
    }
}
