//! Risk rule evaluators
//!
//! Pure functions from a basket to the alerts it triggers. The runtime
//! monitor in `ridxd` decides when to evaluate and where alerts go.
//!
//! ```text
//! position   weight ≥ critical         → Critical
//!            weight ≥ warning          → Warning
//! sector     Σ sector weight ≥ limit   → Warning
//! volatility mean(0.05 × (0.8 + 0.4 × (w − 0.05))) > threshold → Warning
//! ```
//!
//! The volatility estimate is a placeholder heuristic, not a statistical
//! model; with weights in [0, 1] it never reaches the default threshold.

use std::collections::BTreeMap;

use ridx_domain::{AlertKind, Basket, RiskAlert, Severity};

/// Thresholds used by the evaluators
#[derive(Debug, Clone, PartialEq)]
pub struct RiskLimits {
    /// Position weight at or above which a Warning fires
    pub position_warning: f64,
    /// Position weight at or above which a Critical fires
    pub position_critical: f64,
    /// Sector name → aggregate weight at or above which a Warning fires
    pub sector_limits: BTreeMap<String, f64>,
    /// Average estimated volatility above which a Warning fires
    pub volatility_threshold: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        let sector_limits = [
            ("Logistics & Warehousing", 0.30),
            ("Industrial Park", 0.25),
            ("Expressway", 0.20),
            ("Affordable Housing", 0.15),
        ]
        .into_iter()
        .map(|(sector, limit)| (sector.to_string(), limit))
        .collect();

        Self {
            position_warning: 0.08,
            position_critical: 0.10,
            sector_limits,
            volatility_threshold: 0.15,
        }
    }
}

/// Run every evaluator, in order: positions, sectors, volatility.
pub fn evaluate(basket: &Basket, limits: &RiskLimits) -> Vec<RiskAlert> {
    let mut alerts = check_positions(basket, limits);
    alerts.extend(check_sectors(basket, limits));
    alerts.extend(check_volatility(basket, limits));
    alerts
}

/// One alert per component at or above a position threshold.
pub fn check_positions(basket: &Basket, limits: &RiskLimits) -> Vec<RiskAlert> {
    basket
        .iter()
        .filter_map(|c| {
            let pct = c.weight * 100.0;
            if c.weight >= limits.position_critical {
                Some(RiskAlert::new(
                    Severity::Critical,
                    AlertKind::PositionConcentration,
                    format!("Position limit exceeded: {} ({}) at {:.2}%", c.security.name, c.code(), pct),
                ))
            } else if c.weight >= limits.position_warning {
                Some(RiskAlert::new(
                    Severity::Warning,
                    AlertKind::PositionConcentration,
                    format!("Position approaching limit: {} ({}) at {:.2}%", c.security.name, c.code(), pct),
                ))
            } else {
                None
            }
        })
        .collect()
}

/// One alert per listed sector whose aggregate weight reaches its limit.
///
/// Sectors not in the table are never alerted on.
pub fn check_sectors(basket: &Basket, limits: &RiskLimits) -> Vec<RiskAlert> {
    basket
        .sector_weights()
        .into_iter()
        .filter_map(|(sector, weight)| {
            let limit = limits.sector_limits.get(&sector)?;
            (weight >= *limit).then(|| {
                RiskAlert::new(
                    Severity::Warning,
                    AlertKind::SectorConcentration,
                    format!("Sector concentration: {} at {:.2}%", sector, weight * 100.0),
                )
            })
        })
        .collect()
}

/// Mean per-component volatility estimate, `None` for an empty basket.
pub fn estimated_volatility(basket: &Basket) -> Option<f64> {
    if basket.is_empty() {
        return None;
    }
    let sum: f64 = basket
        .iter()
        .map(|c| 0.05 * (0.8 + 0.4 * (c.weight - 0.05)))
        .sum();
    Some(sum / basket.len() as f64)
}

/// At most one alert when the estimated volatility is above threshold.
pub fn check_volatility(basket: &Basket, limits: &RiskLimits) -> Option<RiskAlert> {
    let volatility = estimated_volatility(basket)?;
    (volatility > limits.volatility_threshold).then(|| {
        RiskAlert::new(
            Severity::Warning,
            AlertKind::Volatility,
            format!("Volatility too high: {:.2}%", volatility * 100.0),
        )
    })
}
