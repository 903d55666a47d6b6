//! Eligibility screening
//!
//! A security is eligible when all four thresholds hold:
//!
//! ```text
//! market_cap          >= min_market_cap
//! dividend / cap      >= min_dividend_yield   (cap must be > 0)
//! occupancy_rate      >= min_occupancy_rate
//! debt_ratio          <= max_debt_ratio
//! ```
//!
//! Degenerate records (see `Security::validate`) and duplicate codes are
//! excluded instead of failing the whole screen.

use std::collections::HashSet;

use ridx_domain::{ScreeningRules, Security};
use tracing::{debug, warn};

/// Screens a universe against a set of thresholds
#[derive(Debug, Clone, Copy)]
pub struct EligibilityFilter {
    rules: ScreeningRules,
}

impl EligibilityFilter {
    /// Create a filter for the given thresholds.
    pub fn new(rules: ScreeningRules) -> Self {
        Self { rules }
    }

    /// Check the four screening thresholds for one security.
    ///
    /// A zero market cap makes the yield undefined, so such a security is
    /// never eligible.
    pub fn is_eligible(&self, security: &Security) -> bool {
        let Some(dividend_yield) = security.dividend_yield() else {
            return false;
        };

        security.market_cap >= self.rules.min_market_cap
            && dividend_yield >= self.rules.min_dividend_yield
            && security.occupancy_rate >= self.rules.min_occupancy_rate
            && security.debt_ratio <= self.rules.max_debt_ratio
    }

    /// Return the eligible subset of the universe, preserving feed order.
    ///
    /// Invalid records are skipped with a warning. When a code appears more
    /// than once, only its first occurrence is considered.
    pub fn apply(&self, universe: &[Security]) -> Vec<Security> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(universe.len());
        let mut eligible = Vec::new();

        for security in universe {
            if let Err(e) = security.validate() {
                warn!(code = %security.code, error = %e, "Excluding invalid security record");
                continue;
            }

            if !seen.insert(security.code.as_str()) {
                warn!(code = %security.code, "Excluding duplicate security code");
                continue;
            }

            if self.is_eligible(security) {
                eligible.push(security.clone());
            } else {
                debug!(code = %security.code, "Security failed screening");
            }
        }

        debug!(
            universe = universe.len(),
            eligible = eligible.len(),
            "Screening complete"
        );

        eligible
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ridx_testkit::SecurityBuilder;

    fn rules() -> ScreeningRules {
        ScreeningRules {
            min_market_cap: 500.0,
            min_dividend_yield: 0.03,
            min_occupancy_rate: 0.8,
            max_debt_ratio: 0.6,
        }
    }

    fn passing() -> SecurityBuilder {
        SecurityBuilder::new("P1")
            .market_cap(1_000.0)
            .dividend(40.0)
            .occupancy(0.9)
            .debt_ratio(0.5)
    }

    #[test]
    fn test_passing_security_is_eligible() {
        let filter = EligibilityFilter::new(rules());
        assert!(filter.is_eligible(&passing().build()));
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let filter = EligibilityFilter::new(rules());
        let boundary = passing()
            .market_cap(500.0)
            .dividend(15.0) // exactly 3%
            .occupancy(0.8)
            .debt_ratio(0.6)
            .build();

        assert!(filter.is_eligible(&boundary));
    }

    #[test]
    fn test_each_threshold_excludes() {
        let filter = EligibilityFilter::new(rules());

        assert!(!filter.is_eligible(&passing().market_cap(499.0).build()));
        assert!(!filter.is_eligible(&passing().dividend(29.0).build()));
        assert!(!filter.is_eligible(&passing().occupancy(0.79).build()));
        assert!(!filter.is_eligible(&passing().debt_ratio(0.61).build()));
    }

    #[test]
    fn test_zero_market_cap_is_ineligible() {
        let filter = EligibilityFilter::new(ScreeningRules {
            min_market_cap: 0.0,
            min_dividend_yield: 0.0,
            min_occupancy_rate: 0.0,
            max_debt_ratio: 1.0,
        });

        assert!(!filter.is_eligible(&passing().market_cap(0.0).dividend(0.0).build()));
    }

    #[test]
    fn test_apply_skips_invalid_and_duplicates() {
        let filter = EligibilityFilter::new(rules());
        let universe = vec![
            passing().code("A").build(),
            passing().code("B").occupancy(f64::NAN).build(),
            passing().code("A").market_cap(9_000.0).build(),
            passing().code("C").debt_ratio(0.9).build(),
            passing().code("D").build(),
        ];

        let eligible = filter.apply(&universe);
        let codes: Vec<&str> = eligible.iter().map(|s| s.code.as_str()).collect();

        assert_eq!(codes, vec!["A", "D"]);
        // First occurrence wins
        assert_eq!(eligible[0].market_cap, 1_000.0);
    }

    #[test]
    fn test_apply_skips_record_with_overflowing_yield() {
        let filter = EligibilityFilter::new(rules());
        let universe = vec![
            passing().code("A").build(),
            passing().code("Z").market_cap(1e-300).dividend(1e10).build(),
        ];

        let eligible = filter.apply(&universe);

        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].code, "A");
    }

    #[test]
    fn test_apply_empty_universe() {
        let filter = EligibilityFilter::new(rules());
        assert!(filter.apply(&[]).is_empty());
    }
}
