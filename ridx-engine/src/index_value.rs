//! Index value computation
//!
//! ```text
//! total_value = Σ weight × market_cap
//! index_value = base × (1 + (total_value − base) / base)
//! ```
//!
//! Algebraically this equals `total_value` whenever `base > 0`; the formula
//! is kept in this shape so the published value matches historical output.

use ridx_domain::Basket;
use tracing::warn;

/// Weighted market-cap total of a basket.
pub fn total_value(basket: &Basket) -> f64 {
    basket
        .iter()
        .map(|c| c.weight * c.security.market_cap)
        .sum()
}

/// Published index level for a basket.
///
/// An empty basket has value 0. A non-positive base cannot be divided by,
/// so the weighted total is returned as-is.
pub fn index_value(basket: &Basket, base_value: f64) -> f64 {
    if basket.is_empty() {
        return 0.0;
    }

    let total = total_value(basket);

    if base_value <= 0.0 {
        warn!(base_value, total, "Non-positive base value, publishing weighted total");
        return total;
    }

    base_value * (1.0 + (total - base_value) / base_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridx_domain::Component;
    use ridx_testkit::SecurityBuilder;

    fn basket(entries: &[(&str, f64, f64)]) -> Basket {
        Basket::new(
            entries
                .iter()
                .map(|(code, cap, weight)| {
                    Component::new(SecurityBuilder::new(code).market_cap(*cap).build(), *weight)
                })
                .collect(),
        )
    }

    #[test]
    fn test_index_value_equals_weighted_total() {
        let b = basket(&[("A", 2_000.0, 0.5), ("B", 1_000.0, 0.5)]);

        assert!((total_value(&b) - 1_500.0).abs() < 1e-9);
        assert!((index_value(&b, 1_000.0) - 1_500.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_basket_is_zero() {
        assert_eq!(index_value(&Basket::empty(), 1_000.0), 0.0);
    }

    #[test]
    fn test_zero_base_returns_total() {
        let b = basket(&[("A", 800.0, 1.0)]);
        assert_eq!(index_value(&b, 0.0), 800.0);
    }
}
