//! Basket composition pipeline
//!
//! Deterministic six-stage transformation of a security universe into a
//! weighted basket:
//!
//! ```text
//! universe
//!   → 1. screen        (EligibilityFilter)
//!   → 2. score         (ScoringEngine; provisional weight = score)
//!   → 3. rank          (score desc, code asc)
//!   → 4. truncate      (top MAX_COMPONENTS)
//!   → 5. normalize     (weights sum to 1)
//!   → 6. constrain     (A: position cap, B: sector caps, then normalize)
//!   → Basket
//! ```
//!
//! # Known limitation
//!
//! Stage 6 ends with an unconditional renormalization. When caps shrink most
//! of the basket, that renormalization can push a weight back above its cap
//! (for example one dominant security after its sector peers were scaled
//! down). `ConstraintStrategy::SinglePass` keeps this behaviour;
//! `ConstraintStrategy::FixedPoint` iterates until every cap holds or reports
//! the constraints as infeasible.

use std::collections::BTreeMap;

use ridx_domain::{Basket, Component, RuleSet, Security, MAX_COMPONENTS};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::filter::EligibilityFilter;
use crate::index_value::index_value;
use crate::scoring::ScoringEngine;

/// Slack allowed when checking caps after a fixed-point iteration
pub const CAP_TOLERANCE: f64 = 1e-9;

// =============================================================================
// Constraint Strategy
// =============================================================================

/// How stage 6 applies the concentration caps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstraintStrategy {
    /// Pass A, pass B, renormalize once. Caps may be exceeded afterwards.
    #[default]
    SinglePass,
    /// Repeat the single pass until all caps hold within `CAP_TOLERANCE`.
    FixedPoint {
        /// Upper bound on passes before giving up
        max_iterations: usize,
    },
}

// =============================================================================
// Composition Builder
// =============================================================================

/// Builds baskets from a universe under a fixed rule set
#[derive(Debug, Clone)]
pub struct CompositionBuilder {
    rules: RuleSet,
    strategy: ConstraintStrategy,
}

impl CompositionBuilder {
    /// Create a builder with the default single-pass constraint strategy.
    ///
    /// # Errors
    /// Returns `EngineError::Domain` if the rule set fails validation.
    pub fn new(rules: RuleSet) -> EngineResult<Self> {
        rules.validate()?;
        Ok(Self {
            rules,
            strategy: ConstraintStrategy::default(),
        })
    }

    /// Use a different constraint strategy.
    pub fn with_strategy(mut self, strategy: ConstraintStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Rule set in use
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Constraint strategy in use
    pub fn strategy(&self) -> ConstraintStrategy {
        self.strategy
    }

    /// Run the full pipeline over a universe.
    ///
    /// An empty eligible set yields an empty basket.
    ///
    /// # Errors
    /// Only `ConstraintStrategy::FixedPoint` can fail, with
    /// `EngineError::InfeasibleConstraints`.
    pub fn build(&self, universe: &[Security]) -> EngineResult<Basket> {
        // 1. Screen
        let eligible = EligibilityFilter::new(self.rules.screening).apply(universe);
        if eligible.is_empty() {
            debug!(universe = universe.len(), "No eligible securities, basket is empty");
            return Ok(Basket::empty());
        }

        // 2. Score
        let scoring = ScoringEngine::new(&self.rules);
        let mut components: Vec<Component> = eligible
            .into_iter()
            .filter_map(|security| {
                let score = scoring.score(&security);
                if score.is_finite() {
                    Some(Component::new(security, score))
                } else {
                    warn!(code = %security.code, score, "Excluding security with non-finite score");
                    None
                }
            })
            .collect();

        // 3. Rank, 4. Truncate
        rank_by_score(&mut components);
        truncate(&mut components, MAX_COMPONENTS);

        // 5. Normalize
        normalize_weights(&mut components);

        // 6. Constrain
        self.apply_constraints(&mut components)?;

        debug!(components = components.len(), "Basket composed");
        Ok(Basket::new(components))
    }

    /// Published index value of a basket under this rule set's base value.
    pub fn index_value(&self, basket: &Basket) -> f64 {
        index_value(basket, self.rules.base_value)
    }

    fn apply_constraints(&self, components: &mut [Component]) -> EngineResult<()> {
        match self.strategy {
            ConstraintStrategy::SinglePass => {
                self.constrain_once(components);
                Ok(())
            }
            ConstraintStrategy::FixedPoint { max_iterations } => {
                let max_iterations = max_iterations.max(1);
                let mut violation = 0.0;

                for iteration in 1..=max_iterations {
                    self.constrain_once(components);
                    violation = max_cap_violation(components, &self.rules);
                    if violation <= CAP_TOLERANCE {
                        debug!(iterations = iteration, "Constraints converged");
                        return Ok(());
                    }
                }

                Err(EngineError::InfeasibleConstraints {
                    iterations: max_iterations,
                    max_violation: violation,
                })
            }
        }
    }

    fn constrain_once(&self, components: &mut [Component]) {
        apply_position_cap(components, self.rules.constraints.single_position_max);
        apply_sector_caps(components, &self.rules.constraints.sector_limits);
        normalize_weights(components);
    }
}

// =============================================================================
// Pipeline Stages
// =============================================================================

/// Sort by weight (the provisional score) descending, ties by code ascending.
///
/// Gives a total order, so identical input always ranks identically.
pub fn rank_by_score(components: &mut [Component]) {
    components.sort_by(|a, b| {
        b.weight
            .total_cmp(&a.weight)
            .then_with(|| a.code().cmp(b.code()))
    });
}

/// Keep only the first `limit` components.
pub fn truncate(components: &mut Vec<Component>, limit: usize) {
    if components.len() > limit {
        debug!(dropped = components.len() - limit, "Truncating ranked components");
        components.truncate(limit);
    }
}

/// Divide every weight by the weight sum so they sum to 1.
///
/// If the sum is zero (every score was zero) the components are weighted
/// equally instead. A sum that overflows is handled by first scaling every
/// weight by the largest one, which keeps the ratios. Returns the sum before
/// normalization.
pub fn normalize_weights(components: &mut [Component]) -> f64 {
    let total: f64 = components.iter().map(|c| c.weight).sum();

    if components.is_empty() {
        return total;
    }

    let mut sum = total;
    if total == f64::INFINITY {
        let largest = components.iter().map(|c| c.weight).fold(0.0_f64, f64::max);
        for component in components.iter_mut() {
            component.weight /= largest;
        }
        sum = components.iter().map(|c| c.weight).sum();
    }

    if sum > 0.0 && sum.is_finite() {
        for component in components.iter_mut() {
            component.weight /= sum;
        }
    } else {
        warn!(total, count = components.len(), "Degenerate weight sum, using equal weights");
        let equal = 1.0 / components.len() as f64;
        for component in components.iter_mut() {
            component.weight = equal;
        }
    }

    total
}

/// Pass A: clamp each weight to `cap`. Excess mass is not redistributed.
pub fn apply_position_cap(components: &mut [Component], cap: f64) {
    for component in components.iter_mut() {
        if component.weight > cap {
            debug!(code = %component.code(), weight = component.weight, cap, "Clamping position weight");
            component.weight = cap;
        }
    }
}

/// Pass B: scale every member of an over-limit sector by `limit / sector_total`.
///
/// Sector totals are taken once, before any scaling. Members of other
/// sectors are never touched.
pub fn apply_sector_caps(components: &mut [Component], sector_limits: &BTreeMap<String, f64>) {
    let totals = sector_totals(components);

    for (sector, limit) in sector_limits {
        let Some(total) = totals.get(sector).copied() else {
            continue;
        };
        if total <= *limit {
            continue;
        }

        let adjustment = limit / total;
        debug!(sector = %sector, total, limit, adjustment, "Scaling over-limit sector");

        for component in components.iter_mut().filter(|c| c.sector() == sector) {
            component.weight *= adjustment;
        }
    }
}

fn sector_totals(components: &[Component]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for component in components {
        *totals.entry(component.sector().to_string()).or_insert(0.0) += component.weight;
    }
    totals
}

/// Largest amount by which any position or sector cap is exceeded (0 if none).
pub fn max_cap_violation(components: &[Component], rules: &RuleSet) -> f64 {
    let cap = rules.constraints.single_position_max;
    let position = components
        .iter()
        .map(|c| c.weight - cap)
        .fold(0.0_f64, f64::max);

    let sector = sector_totals(components)
        .into_iter()
        .filter_map(|(name, total)| rules.sector_limit(&name).map(|limit| total - limit))
        .fold(0.0_f64, f64::max);

    position.max(sector)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ridx_testkit::{permissive_rules, SecurityBuilder};

    const EPS: f64 = 1e-9;

    fn weighted(code: &str, sector: &str, weight: f64) -> Component {
        Component::new(SecurityBuilder::new(code).sector(sector).build(), weight)
    }

    fn weights(components: &[Component]) -> Vec<f64> {
        components.iter().map(|c| c.weight).collect()
    }

    /// Rules where score == dividend yield, so scores are easy to dial in.
    fn yield_only_rules() -> RuleSet {
        let mut rules = permissive_rules();
        rules.weighting.dividend_weight = 1.0;
        rules.weighting.market_cap_weight = 0.0;
        rules
    }

    // =========================================================================
    // Stage functions
    // =========================================================================

    #[test]
    fn test_rank_breaks_ties_by_code() {
        let mut components = vec![
            weighted("C", "S", 2.0),
            weighted("B", "S", 5.0),
            weighted("A", "S", 2.0),
        ];

        rank_by_score(&mut components);
        let codes: Vec<&str> = components.iter().map(|c| c.code()).collect();

        assert_eq!(codes, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_truncate_keeps_top_entries() {
        let mut components: Vec<Component> = (0..60)
            .map(|i| weighted(&format!("S{:02}", i), "S", 1.0))
            .collect();

        truncate(&mut components, MAX_COMPONENTS);
        assert_eq!(components.len(), MAX_COMPONENTS);
        assert_eq!(components[0].code(), "S00");

        let mut few = vec![weighted("A", "S", 1.0)];
        truncate(&mut few, MAX_COMPONENTS);
        assert_eq!(few.len(), 1);
    }

    #[test]
    fn test_normalize_weights() {
        let mut components = vec![weighted("A", "S", 3.0), weighted("B", "S", 1.0)];

        let total = normalize_weights(&mut components);

        assert_eq!(total, 4.0);
        assert_eq!(weights(&components), vec![0.75, 0.25]);
    }

    #[test]
    fn test_normalize_zero_sum_falls_back_to_equal_weights() {
        let mut components = vec![weighted("A", "S", 0.0), weighted("B", "S", 0.0)];

        normalize_weights(&mut components);

        assert_eq!(weights(&components), vec![0.5, 0.5]);
    }

    #[test]
    fn test_normalize_empty_is_noop() {
        let mut components: Vec<Component> = Vec::new();
        assert_eq!(normalize_weights(&mut components), 0.0);
    }

    #[test]
    fn test_position_cap_clamps_without_redistributing() {
        let mut components = vec![weighted("A", "S", 0.7), weighted("B", "S", 0.3)];

        apply_position_cap(&mut components, 0.4);

        assert_eq!(weights(&components), vec![0.4, 0.3]);
    }

    #[test]
    fn test_sector_cap_scales_only_offending_sector() {
        let mut components = vec![
            weighted("A", "Expressway", 0.3),
            weighted("B", "Expressway", 0.2),
            weighted("C", "Industrial Park", 0.5),
        ];
        let limits: BTreeMap<String, f64> =
            [("Expressway".to_string(), 0.25), ("Industrial Park".to_string(), 0.6)]
                .into_iter()
                .collect();

        apply_sector_caps(&mut components, &limits);

        assert!((components[0].weight - 0.15).abs() < EPS);
        assert!((components[1].weight - 0.10).abs() < EPS);
        assert_eq!(components[2].weight, 0.5);
    }

    #[test]
    fn test_sector_cap_ignores_absent_sectors() {
        let mut components = vec![weighted("A", "Expressway", 1.0)];
        let limits: BTreeMap<String, f64> =
            [("Affordable Housing".to_string(), 0.15)].into_iter().collect();

        apply_sector_caps(&mut components, &limits);

        assert_eq!(components[0].weight, 1.0);
    }

    // =========================================================================
    // Cap violation after renormalization
    // =========================================================================

    #[test]
    fn test_two_securities_nine_and_one_end_at_half_each() {
        // Scores 9 and 1 with a 0.1 cap: 0.9/0.1 → clamp 0.1/0.1 → 0.5/0.5
        let mut components = vec![weighted("A", "S", 9.0), weighted("B", "S", 1.0)];

        rank_by_score(&mut components);
        normalize_weights(&mut components);
        assert!((components[0].weight - 0.9).abs() < EPS);

        apply_position_cap(&mut components, 0.1);
        assert!(components.iter().all(|c| c.weight <= 0.1));

        apply_sector_caps(&mut components, &BTreeMap::new());
        normalize_weights(&mut components);

        let total: f64 = components.iter().map(|c| c.weight).sum();
        assert!((total - 1.0).abs() < EPS);
        assert!((components[0].weight - 0.5).abs() < EPS);
        assert!((components[1].weight - 0.5).abs() < EPS);
        // Both finish well above the 0.1 cap
        assert!(components.iter().all(|c| c.weight > 0.1));
    }

    #[test]
    fn test_two_securities_through_full_pipeline() {
        let mut rules = yield_only_rules();
        rules.constraints.single_position_max = 0.1;
        let builder = CompositionBuilder::new(rules).unwrap();

        let universe = vec![
            SecurityBuilder::new("A").market_cap(1_000.0).dividend(90.0).build(),
            SecurityBuilder::new("B").market_cap(1_000.0).dividend(10.0).build(),
        ];

        let basket = builder.build(&universe).unwrap();

        assert_eq!(basket.len(), 2);
        assert!((basket.total_weight() - 1.0).abs() < EPS);
        assert!((basket.weight_of("A").unwrap() - 0.5).abs() < EPS);
        assert!((basket.weight_of("B").unwrap() - 0.5).abs() < EPS);
    }

    #[test]
    fn test_dominant_security_exceeds_cap_after_final_normalization() {
        // X: 0.5, Y: 0.25, Z: 0.25 with cap 0.4 and "Expressway" limited to 0.2
        // Pass A: X → 0.4. Pass B: Y, Z → 0.1 each. Normalize: X = 0.4 / 0.6.
        let mut rules = yield_only_rules();
        rules.constraints.single_position_max = 0.4;
        rules
            .constraints
            .sector_limits
            .insert("Expressway".to_string(), 0.2);
        let builder = CompositionBuilder::new(rules).unwrap();

        let universe = vec![
            SecurityBuilder::new("X").sector("Industrial Park").dividend(500.0).build(),
            SecurityBuilder::new("Y").sector("Expressway").dividend(250.0).build(),
            SecurityBuilder::new("Z").sector("Expressway").dividend(250.0).build(),
        ];

        let basket = builder.build(&universe).unwrap();

        let x = basket.weight_of("X").unwrap();
        assert!((x - 2.0 / 3.0).abs() < EPS);
        assert!(x > 0.4, "final renormalization pushes X above its cap");
        assert!((basket.total_weight() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_fixed_point_strategy_converges_when_feasible() {
        let mut rules = yield_only_rules();
        rules.constraints.single_position_max = 0.4;
        let builder = CompositionBuilder::new(rules)
            .unwrap()
            .with_strategy(ConstraintStrategy::FixedPoint { max_iterations: 200 });

        let universe = vec![
            SecurityBuilder::new("X").dividend(500.0).build(),
            SecurityBuilder::new("Y").dividend(250.0).build(),
            SecurityBuilder::new("Z").dividend(250.0).build(),
        ];

        let basket = builder.build(&universe).unwrap();

        assert!(basket.iter().all(|c| c.weight <= 0.4 + CAP_TOLERANCE));
        assert!((basket.total_weight() - 1.0).abs() < EPS);
        assert!((basket.weight_of("Y").unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_fixed_point_strategy_reports_infeasible_caps() {
        // Three securities can never fit under a 0.2 cap
        let mut rules = yield_only_rules();
        rules.constraints.single_position_max = 0.2;
        let builder = CompositionBuilder::new(rules)
            .unwrap()
            .with_strategy(ConstraintStrategy::FixedPoint { max_iterations: 10 });

        let universe = vec![
            SecurityBuilder::new("X").dividend(500.0).build(),
            SecurityBuilder::new("Y").dividend(250.0).build(),
            SecurityBuilder::new("Z").dividend(250.0).build(),
        ];

        match builder.build(&universe) {
            Err(EngineError::InfeasibleConstraints { iterations, max_violation }) => {
                assert_eq!(iterations, 10);
                assert!(max_violation > 0.1);
            }
            other => panic!("Expected InfeasibleConstraints, got {:?}", other),
        }
    }

    // =========================================================================
    // Builder
    // =========================================================================

    #[test]
    fn test_builder_rejects_invalid_rules() {
        let mut rules = permissive_rules();
        rules.constraints.single_position_max = 2.0;

        assert!(matches!(
            CompositionBuilder::new(rules),
            Err(EngineError::Domain(_))
        ));
    }

    #[test]
    fn test_empty_universe_yields_empty_basket() {
        let builder = CompositionBuilder::new(permissive_rules()).unwrap();

        let basket = builder.build(&[]).unwrap();

        assert!(basket.is_empty());
        assert_eq!(builder.index_value(&basket), 0.0);
    }

    #[test]
    fn test_nothing_eligible_yields_empty_basket() {
        let mut rules = permissive_rules();
        rules.screening.min_market_cap = 1e12;
        let builder = CompositionBuilder::new(rules).unwrap();

        let universe = vec![SecurityBuilder::new("A").build(), SecurityBuilder::new("B").build()];

        assert!(builder.build(&universe).unwrap().is_empty());
    }

    #[test]
    fn test_equal_scores_rank_by_code() {
        let builder = CompositionBuilder::new(permissive_rules()).unwrap();
        let universe = vec![
            SecurityBuilder::new("C").build(),
            SecurityBuilder::new("A").build(),
            SecurityBuilder::new("B").build(),
        ];

        let basket = builder.build(&universe).unwrap();
        let codes: Vec<&str> = basket.iter().map(|c| c.code()).collect();

        assert_eq!(codes, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_duplicate_codes_appear_once() {
        let builder = CompositionBuilder::new(permissive_rules()).unwrap();
        let universe = vec![
            SecurityBuilder::new("A").build(),
            SecurityBuilder::new("A").market_cap(5_000.0).build(),
            SecurityBuilder::new("B").build(),
        ];

        let basket = builder.build(&universe).unwrap();

        assert_eq!(basket.len(), 2);
        assert_eq!(basket.iter().filter(|c| c.code() == "A").count(), 1);
    }

    #[test]
    fn test_overflowing_yield_record_does_not_flatten_weights() {
        let builder = CompositionBuilder::new(yield_only_rules()).unwrap();
        let universe = vec![
            SecurityBuilder::new("A").market_cap(1_000.0).dividend(90.0).build(),
            SecurityBuilder::new("B").market_cap(1_000.0).dividend(10.0).build(),
            SecurityBuilder::new("Z").market_cap(1e-300).dividend(1e10).build(),
        ];

        let basket = builder.build(&universe).unwrap();

        assert_eq!(basket.len(), 2);
        assert_eq!(basket.weight_of("Z"), None);
        assert!((basket.weight_of("A").unwrap() - 0.9).abs() < EPS);
        assert!((basket.weight_of("B").unwrap() - 0.1).abs() < EPS);
    }

    #[test]
    fn test_normalize_overflowing_sum_keeps_ratios() {
        let mut components = vec![weighted("A", "S", f64::MAX), weighted("B", "S", f64::MAX / 3.0)];

        let total = normalize_weights(&mut components);

        assert_eq!(total, f64::INFINITY);
        assert!((components[0].weight - 0.75).abs() < EPS);
        assert!((components[1].weight - 0.25).abs() < EPS);
    }

    #[test]
    fn test_zero_region_factor_falls_back_to_equal_weights() {
        let mut rules = permissive_rules();
        rules.region_factors.insert("Dead Zone".to_string(), 0.0);
        let builder = CompositionBuilder::new(rules).unwrap();

        let universe = vec![
            SecurityBuilder::new("A").region("Dead Zone").build(),
            SecurityBuilder::new("B").region("Dead Zone").build(),
        ];

        let basket = builder.build(&universe).unwrap();
        assert_eq!(basket.weight_of("A"), Some(0.5));
        assert_eq!(basket.weight_of("B"), Some(0.5));
    }
}
