//! Configuration loading and typed config structures for the auction.
//!
//! The auction is configured once, at initialization, through an
//! [`AuctionConfig`]. Hosts may load it from `chronos-config.yaml`; every
//! field has a default matching the reference auction (target slot
//! 600,000,001, a five minute decay from 10 to 2, a 30 second batch-build
//! window).

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but its values are inconsistent.
    #[error("invalid auction configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level auction configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuctionConfig {
    /// Slot simulator settings.
    #[serde(default)]
    pub slots: SlotConfig,

    /// Dutch price schedule and price tick settings.
    #[serde(default)]
    pub pricing: PricingConfig,

    /// When the auction started.
    #[serde(default)]
    pub start: StartInstant,

    /// Price chart sampling.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Seed for the random source. `None` seeds from the operating system.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl AuctionConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// The result is validated before it is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if the values are inconsistent.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if the values are inconsistent.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the cross-field constraints the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| -> Result<(), ConfigError> {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };

        if self.slots.initial_slot > self.slots.target_slot {
            return invalid("slots.initial_slot must not exceed slots.target_slot");
        }
        if self.slots.tick_interval_ms == 0 {
            return invalid("slots.tick_interval_ms must be at least 1");
        }
        if self.pricing.end_price.is_sign_negative() {
            return invalid("pricing.end_price must not be negative");
        }
        if self.pricing.end_price > self.pricing.start_price {
            return invalid("pricing.end_price must not exceed pricing.start_price");
        }
        if self.pricing.duration_ms == 0 {
            return invalid("pricing.duration_ms must be at least 1");
        }
        if self.pricing.tick_interval_ms == 0 {
            return invalid("pricing.tick_interval_ms must be at least 1");
        }
        if self.history.capacity == 0 {
            return invalid("history.capacity must be at least 1");
        }
        if self.history.sample_interval_ms == 0 {
            return invalid("history.sample_interval_ms must be at least 1");
        }
        Ok(())
    }
}

/// Slot simulator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlotConfig {
    /// Slot the auction executes at. The counter never passes it.
    #[serde(default = "default_target_slot")]
    pub target_slot: u64,

    /// Slot the counter starts from.
    #[serde(default = "default_initial_slot")]
    pub initial_slot: u64,

    /// Milliseconds between slot advances.
    #[serde(default = "default_slot_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            target_slot: default_target_slot(),
            initial_slot: default_initial_slot(),
            tick_interval_ms: default_slot_interval_ms(),
        }
    }
}

/// Dutch price schedule configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PricingConfig {
    /// Price at the start of the auction.
    #[serde(default = "default_start_price")]
    pub start_price: Decimal,

    /// Floor price reached at the end of the decay window.
    #[serde(default = "default_end_price")]
    pub end_price: Decimal,

    /// Length of the decay window in milliseconds.
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,

    /// Length of the batch-build window that follows the decay window.
    #[serde(default = "default_build_window_ms")]
    pub build_window_ms: u64,

    /// Milliseconds between price recomputations.
    #[serde(default = "default_price_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            start_price: default_start_price(),
            end_price: default_end_price(),
            duration_ms: default_duration_ms(),
            build_window_ms: default_build_window_ms(),
            tick_interval_ms: default_price_interval_ms(),
        }
    }
}

/// The auction start instant.
///
/// In YAML either `{ at_ms: 1700000000000 }` for an absolute instant or
/// `{ ago_ms: 120000 }` for "started this long before initialization".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StartInstant {
    /// Absolute start, milliseconds since the Unix epoch.
    At {
        /// Start instant in milliseconds since the Unix epoch.
        at_ms: i64,
    },
    /// Start relative to the moment the auction is initialized.
    Ago {
        /// How long before initialization the auction started.
        ago_ms: u64,
    },
}

impl Default for StartInstant {
    fn default() -> Self {
        Self::Ago {
            ago_ms: default_start_ago_ms(),
        }
    }
}

impl StartInstant {
    /// Resolve to an absolute instant given the current time.
    pub fn resolve(self, now_ms: i64) -> i64 {
        match self {
            Self::At { at_ms } => at_ms,
            Self::Ago { ago_ms } => {
                now_ms.saturating_sub(i64::try_from(ago_ms).unwrap_or(i64::MAX))
            }
        }
    }
}

/// Price chart sampling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of samples kept; older samples are dropped.
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,

    /// Milliseconds between samples.
    #[serde(default = "default_history_interval_ms")]
    pub sample_interval_ms: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
            sample_interval_ms: default_history_interval_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_target_slot() -> u64 {
    600_000_001
}

const fn default_initial_slot() -> u64 {
    599_999_800
}

const fn default_slot_interval_ms() -> u64 {
    400
}

const fn default_start_price() -> Decimal {
    Decimal::TEN
}

const fn default_end_price() -> Decimal {
    Decimal::TWO
}

const fn default_duration_ms() -> u64 {
    300_000
}

const fn default_build_window_ms() -> u64 {
    30_000
}

const fn default_price_interval_ms() -> u64 {
    100
}

const fn default_start_ago_ms() -> u64 {
    120_000
}

const fn default_history_capacity() -> usize {
    60
}

const fn default_history_interval_ms() -> u64 {
    1_000
}
