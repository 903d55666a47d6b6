//! Basket: the weighted composition produced by one cycle
//!
//! A `Basket` is an ordered sequence of `Component`s. After a successful
//! composition build:
//! - `len() <= MAX_COMPONENTS` and `len() <=` number of eligible securities
//! - weights sum to 1.0 (within floating-point epsilon)
//! - no two components share a security code
//!
//! Baskets are plain values. Readers (risk checks, reporting) only borrow
//! them and never mutate weights.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::security::Security;

/// Maximum number of components in a basket
pub const MAX_COMPONENTS: usize = 50;

// =============================================================================
// Component
// =============================================================================

/// A security and its weight within a basket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// The weighted security
    pub security: Security,
    /// Weight in [0, 1]
    pub weight: f64,
}

impl Component {
    /// Create a new component.
    pub fn new(security: Security, weight: f64) -> Self {
        Self { security, weight }
    }

    /// Security code of this component
    pub fn code(&self) -> &str {
        &self.security.code
    }

    /// Sector of this component
    pub fn sector(&self) -> &str {
        &self.security.sector
    }
}

// =============================================================================
// Basket
// =============================================================================

/// Ordered, weighted set of components
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Basket {
    components: Vec<Component>,
}

impl Basket {
    /// Wrap an ordered list of components.
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    /// The empty basket (valid result of a cycle with no eligible securities)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True if the basket has no components
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Components in rank order
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Iterate over components in rank order
    pub fn iter(&self) -> std::slice::Iter<'_, Component> {
        self.components.iter()
    }

    /// Consume the basket, returning its components
    pub fn into_components(self) -> Vec<Component> {
        self.components
    }

    /// Sum of all weights
    pub fn total_weight(&self) -> f64 {
        self.components.iter().map(|c| c.weight).sum()
    }

    /// Aggregate weight per sector, keyed in sector order
    pub fn sector_weights(&self) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        for component in &self.components {
            *totals.entry(component.sector().to_string()).or_insert(0.0) += component.weight;
        }
        totals
    }

    /// Weight of the component with the given code, if present
    pub fn weight_of(&self, code: &str) -> Option<f64> {
        self.components
            .iter()
            .find(|c| c.code() == code)
            .map(|c| c.weight)
    }
}

impl<'a> IntoIterator for &'a Basket {
    type Item = &'a Component;
    type IntoIter = std::slice::Iter<'a, Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}

impl From<Vec<Component>> for Basket {
    fn from(components: Vec<Component>) -> Self {
        Self::new(components)
    }
}

// =============================================================================
// Tests
// =============================================================================
