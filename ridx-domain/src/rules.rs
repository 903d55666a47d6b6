//! Index rule configuration
//!
//! The rule set is loaded once per process and treated as read-only for the
//! lifetime of every calculation that uses it. The JSON document layout is:
//!
//! ```text
//! {
//!   "base_value": 1000.0,
//!   "screening":   { "min_market_cap", "min_dividend_yield",
//!                    "min_occupancy_rate", "max_debt_ratio" },
//!   "weighting":   { "dividend_weight", "market_cap_weight" },
//!   "constraints": { "single_position_max", "sector_limits": { sector: max } },
//!   "region_factors": { region: multiplier }      (optional)
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Region factor applied to any region missing from the table
pub const DEFAULT_REGION_FACTOR: f64 = 1.0;

// =============================================================================
// RuleSet
// =============================================================================

/// Complete rule set driving screening, scoring and constraints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Base value of the index
    pub base_value: f64,
    /// Eligibility thresholds
    pub screening: ScreeningRules,
    /// Score weights
    pub weighting: WeightingRules,
    /// Concentration limits
    pub constraints: ConstraintRules,
    /// Region → score multiplier
    #[serde(default = "RuleSet::default_region_factors")]
    pub region_factors: BTreeMap<String, f64>,
}

/// Screening thresholds, applied conjunctively
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreeningRules {
    /// Minimum market capitalization (inclusive)
    pub min_market_cap: f64,
    /// Minimum distribution yield (inclusive)
    pub min_dividend_yield: f64,
    /// Minimum occupancy rate (inclusive)
    pub min_occupancy_rate: f64,
    /// Maximum debt ratio (inclusive)
    pub max_debt_ratio: f64,
}

/// Weights of the two score terms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightingRules {
    /// Weight of the distribution yield term
    pub dividend_weight: f64,
    /// Weight of the `ln(market_cap + 1)` term
    pub market_cap_weight: f64,
}

/// Single-position and sector concentration caps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintRules {
    /// Cap on any single component weight, in (0, 1]
    pub single_position_max: f64,
    /// Sector → cap on aggregate sector weight, each in (0, 1]
    pub sector_limits: BTreeMap<String, f64>,
}

impl RuleSet {
    /// Region table used when a rule document does not provide one
    pub fn default_region_factors() -> BTreeMap<String, f64> {
        [
            ("Yangtze River Delta", 1.2),
            ("Pearl River Delta", 1.2),
            ("Beijing-Tianjin-Hebei", 1.1),
            ("Other", 1.0),
        ]
        .into_iter()
        .map(|(region, factor)| (region.to_string(), factor))
        .collect()
    }

    /// Parse and validate a rule set from its JSON document.
    ///
    /// # Errors
    /// Returns `DomainError::Configuration` if a required field is missing,
    /// malformed, or out of range.
    pub fn from_json_str(document: &str) -> DomainResult<Self> {
        let rules: RuleSet = serde_json::from_str(document)
            .map_err(|e| DomainError::Configuration(format!("invalid rule document: {}", e)))?;
        rules.validate()?;
        Ok(rules)
    }

    /// Region multiplier, `DEFAULT_REGION_FACTOR` for unlisted regions.
    pub fn region_factor(&self, region: &str) -> f64 {
        self.region_factors
            .get(region)
            .copied()
            .unwrap_or(DEFAULT_REGION_FACTOR)
    }

    /// Sector cap, `None` if the sector is unconstrained.
    pub fn sector_limit(&self, sector: &str) -> Option<f64> {
        self.constraints.sector_limits.get(sector).copied()
    }

    /// Check every threshold for range and finiteness.
    ///
    /// # Errors
    /// Returns `DomainError::Configuration` naming the first offending field.
    pub fn validate(&self) -> DomainResult<()> {
        require_finite("base_value", self.base_value)?;
        if self.base_value < 0.0 {
            return Err(config_error("base_value", self.base_value, "must not be negative"));
        }

        let s = &self.screening;
        require_finite("screening.min_market_cap", s.min_market_cap)?;
        require_finite("screening.min_dividend_yield", s.min_dividend_yield)?;
        if s.min_market_cap < 0.0 {
            return Err(config_error(
                "screening.min_market_cap",
                s.min_market_cap,
                "must not be negative",
            ));
        }
        if s.min_dividend_yield < 0.0 {
            return Err(config_error(
                "screening.min_dividend_yield",
                s.min_dividend_yield,
                "must not be negative",
            ));
        }
        require_fraction("screening.min_occupancy_rate", s.min_occupancy_rate)?;
        require_fraction("screening.max_debt_ratio", s.max_debt_ratio)?;

        let w = &self.weighting;
        require_finite("weighting.dividend_weight", w.dividend_weight)?;
        require_finite("weighting.market_cap_weight", w.market_cap_weight)?;
        if w.dividend_weight < 0.0 || w.market_cap_weight < 0.0 {
            return Err(DomainError::Configuration(
                "weighting: weights must not be negative".to_string(),
            ));
        }
        if w.dividend_weight == 0.0 && w.market_cap_weight == 0.0 {
            return Err(DomainError::Configuration(
                "weighting: at least one weight must be positive".to_string(),
            ));
        }

        require_cap("constraints.single_position_max", self.constraints.single_position_max)?;
        for (sector, limit) in &self.constraints.sector_limits {
            require_cap(&format!("constraints.sector_limits.{}", sector), *limit)?;
        }

        for (region, factor) in &self.region_factors {
            let field = format!("region_factors.{}", region);
            require_finite(&field, *factor)?;
            if *factor < 0.0 {
                return Err(config_error(&field, *factor, "must not be negative"));
            }
        }

        Ok(())
    }
}

fn config_error(field: &str, value: f64, reason: &str) -> DomainError {
    DomainError::Configuration(format!("{} = {} {}", field, value, reason))
}

fn require_finite(field: &str, value: f64) -> DomainResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(config_error(field, value, "must be finite"))
    }
}

fn require_fraction(field: &str, value: f64) -> DomainResult<()> {
    require_finite(field, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(config_error(field, value, "must be in [0, 1]"))
    }
}

fn require_cap(field: &str, value: f64) -> DomainResult<()> {
    require_finite(field, value)?;
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(config_error(field, value, "must be in (0, 1]"))
    }
}

// =============================================================================
// Tests
// =============================================================================
