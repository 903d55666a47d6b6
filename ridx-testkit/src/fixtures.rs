//! Security and rule set fixtures.

use std::collections::BTreeMap;

use ridx_domain::{ConstraintRules, RuleSet, ScreeningRules, Security, WeightingRules};

/// Builder for `Security` records with sensible defaults.
///
/// Defaults: sector "Diversified", region "Other", market cap 1000,
/// dividend 50 (a 5% yield), occupancy 0.95, debt ratio 0.3.
#[derive(Debug, Clone)]
pub struct SecurityBuilder {
    security: Security,
}

impl SecurityBuilder {
    /// Start a builder for the given code.
    pub fn new(code: &str) -> Self {
        Self {
            security: Security {
                code: code.to_string(),
                name: format!("{} REIT", code),
                sector: "Diversified".to_string(),
                region: "Other".to_string(),
                market_cap: 1_000.0,
                dividend_amt: 50.0,
                occupancy_rate: 0.95,
                debt_ratio: 0.3,
            },
        }
    }

    /// Override the code. The name is left unchanged.
    pub fn code(mut self, code: &str) -> Self {
        self.security.code = code.to_string();
        self
    }

    /// Override the display name.
    pub fn name(mut self, name: &str) -> Self {
        self.security.name = name.to_string();
        self
    }

    /// Override the sector label.
    pub fn sector(mut self, sector: &str) -> Self {
        self.security.sector = sector.to_string();
        self
    }

    /// Override the region label.
    pub fn region(mut self, region: &str) -> Self {
        self.security.region = region.to_string();
        self
    }

    /// Override the market cap.
    pub fn market_cap(mut self, market_cap: f64) -> Self {
        self.security.market_cap = market_cap;
        self
    }

    /// Annual distribution amount (not the yield).
    pub fn dividend(mut self, dividend_amt: f64) -> Self {
        self.security.dividend_amt = dividend_amt;
        self
    }

    /// Override the occupancy rate.
    pub fn occupancy(mut self, occupancy_rate: f64) -> Self {
        self.security.occupancy_rate = occupancy_rate;
        self
    }

    /// Override the debt ratio.
    pub fn debt_ratio(mut self, debt_ratio: f64) -> Self {
        self.security.debt_ratio = debt_ratio;
        self
    }

    /// Finish the record.
    pub fn build(self) -> Security {
        self.security
    }
}

/// Rule set that lets every valid security through.
///
/// Base value 1000, zero screening thresholds, equal scoring weights,
/// no position cap (1.0), no sector limits, default region factors.
pub fn permissive_rules() -> RuleSet {
    RuleSet {
        base_value: 1_000.0,
        screening: ScreeningRules {
            min_market_cap: 0.0,
            min_dividend_yield: 0.0,
            min_occupancy_rate: 0.0,
            max_debt_ratio: 1.0,
        },
        weighting: WeightingRules {
            dividend_weight: 0.5,
            market_cap_weight: 0.5,
        },
        constraints: ConstraintRules {
            single_position_max: 1.0,
            sector_limits: BTreeMap::new(),
        },
        region_factors: RuleSet::default_region_factors(),
    }
}

/// Deterministic universe of `n` distinct, valid securities.
///
/// Codes are `R0000`, `R0001`, ... Market caps, dividends, sectors and
/// regions vary with the index so scores are mostly distinct.
pub fn universe(n: usize) -> Vec<Security> {
    const SECTORS: [&str; 5] = [
        "Logistics & Warehousing",
        "Industrial Park",
        "Expressway",
        "Affordable Housing",
        "Data Center",
    ];
    const REGIONS: [&str; 4] = [
        "Yangtze River Delta",
        "Pearl River Delta",
        "Beijing-Tianjin-Hebei",
        "Other",
    ];

    (0..n)
        .map(|i| {
            let cap = 500.0 + ((i * 37) % 101) as f64 * 25.0;
            let dividend = cap * (0.02 + ((i * 13) % 17) as f64 * 0.004);
            SecurityBuilder::new(&format!("R{:04}", i))
                .sector(SECTORS[i % SECTORS.len()])
                .region(REGIONS[(i / 3) % REGIONS.len()])
                .market_cap(cap)
                .dividend(dividend)
                .occupancy(0.80 + ((i * 7) % 20) as f64 * 0.01)
                .debt_ratio(0.20 + ((i * 11) % 40) as f64 * 0.01)
                .build()
        })
        .collect()
}
