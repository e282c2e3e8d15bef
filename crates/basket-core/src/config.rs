//! # Diagnostics Configuration
//!
//! Debug-only simulated problems, used by QA to force a basket into error
//! states without touching the catalog.
//!
//! ## Load Order (later overrides earlier)
//! 1. Default values (disabled, no problems)
//! 2. TOML document handed in by the host application
//! 3. `BASKET_SIMULATE_PROBLEMS` environment variable (`enabled` only)
//!
//! ## Example
//! ```toml
//! enabled = true
//!
//! [[simulated]]
//! item_id = "30012345"
//! code = 1
//! message = "Simulated: not available"
//! ```
//!
//! Simulated problems are never persisted by the codec.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::collection::Items;
use crate::diag::{Problem, ProblemCode};
use crate::types::ItemId;

/// Environment variable toggling [`DiagnosticsConfig::enabled`].
pub const SIMULATE_PROBLEMS_ENV: &str = "BASKET_SIMULATE_PROBLEMS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid diagnostics config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// One problem to attach to every item with a matching catalog id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedProblem {
    pub item_id: ItemId,
    pub code: u32,
    pub message: String,
}

impl SimulatedProblem {
    pub fn to_problem(&self) -> Problem {
        Problem::new(ProblemCode::from_code(self.code), self.message.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub simulated: Vec<SimulatedProblem>,
}

impl DiagnosticsConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `BASKET_SIMULATE_PROBLEMS` when it is set.
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(SIMULATE_PROBLEMS_ENV) {
            Ok(value) => self.with_override(&value),
            Err(_) => self,
        }
    }

    fn with_override(mut self, value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "1" | "true" | "on" => self.enabled = true,
            "0" | "false" | "off" => self.enabled = false,
            _ => {
                warn!(value = %value, "Unknown {SIMULATE_PROBLEMS_ENV} value in environment");
                return self;
            }
        }
        debug!(enabled = self.enabled, "Overriding simulated problems from environment");
        self
    }

    /// Replaces the simulated problem list of every item. Items with no
    /// configured problems, or every item when disabled, get an empty list.
    pub fn apply(&self, items: &mut Items) {
        for item in items.iter_mut() {
            let problems = if self.enabled {
                self.simulated
                    .iter()
                    .filter(|s| &s.item_id == item.item_id())
                    .map(SimulatedProblem::to_problem)
                    .collect()
            } else {
                Vec::new()
            };
            item.set_simulated_problems(problems);
        }
    }
}
