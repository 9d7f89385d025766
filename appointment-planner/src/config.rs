//! planner.toml configuration.
//!
//! ```toml
//! [decay]
//! cadence_days = 7
//! factor = 2.5
//!
//! [search]
//! strategy = "branch-and-bound"   # or "exhaustive"
//! max_free_slots = 24
//! node_limit = 5000000
//! ```
//!
//! Every key is optional. The file named by `PLANNER_CONFIG` is read if set,
//! then `PLANNER_CADENCE_DAYS` and `PLANNER_DECAY_FACTOR` override the decay
//! section.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};
use crate::schedule::fairness::DecayPolicy;
use crate::schedule::search::{SearchOptions, SearchStrategy, DEFAULT_MAX_FREE_SLOTS};

pub const CONFIG_ENV: &str = "PLANNER_CONFIG";
pub const CADENCE_ENV: &str = "PLANNER_CADENCE_DAYS";
pub const FACTOR_ENV: &str = "PLANNER_DECAY_FACTOR";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub decay: DecayPolicy,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub strategy: SearchStrategy,
    pub max_free_slots: Option<usize>,
    pub node_limit: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: SearchStrategy::default(),
            max_free_slots: Some(DEFAULT_MAX_FREE_SLOTS),
            node_limit: None,
        }
    }
}

impl PlannerConfig {
    pub fn from_toml_str(content: &str) -> PlannerResult<Self> {
        let config: PlannerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> PlannerResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reads the file named by `PLANNER_CONFIG` (defaults when unset) and
    /// applies environment overrides.
    pub fn load() -> PlannerResult<Self> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(
            std::env::var(CADENCE_ENV).ok().as_deref(),
            std::env::var(FACTOR_ENV).ok().as_deref(),
        )?;
        Ok(config)
    }

    fn apply_overrides(&mut self, cadence: Option<&str>, factor: Option<&str>) -> PlannerResult<()> {
        if let Some(raw) = cadence {
            self.decay.cadence_days = raw
                .trim()
                .parse()
                .map_err(|_| PlannerError::InvalidConfig(format!("{CADENCE_ENV}={raw:?} is not a day count")))?;
        }
        if let Some(raw) = factor {
            self.decay.factor = raw
                .trim()
                .parse()
                .map_err(|_| PlannerError::InvalidConfig(format!("{FACTOR_ENV}={raw:?} is not a number")))?;
        }
        self.validate()
    }

    fn validate(&self) -> PlannerResult<()> {
        if !self.decay.factor.is_finite() || self.decay.factor < 1.0 {
            return Err(PlannerError::InvalidConfig(format!(
                "decay factor must be at least 1, got {}",
                self.decay.factor
            )));
        }
        if self.decay.cadence_days == 0 {
            return Err(PlannerError::InvalidConfig("decay cadence must be at least one day".to_string()));
        }
        Ok(())
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            strategy: self.search.strategy,
            max_free_slots: self.search.max_free_slots,
            node_limit: self.search.node_limit,
            cancel: None,
        }
    }

    pub fn to_toml_string(&self) -> PlannerResult<String> {
        toml::to_string_pretty(self).map_err(|e| PlannerError::InvalidConfig(e.to_string()))
    }
}
