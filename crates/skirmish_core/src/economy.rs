//! Resource economy.
//!
//! Each player owns one [`ResourceLedger`]. Entities carry fixed
//! production/consumption [`ResourceRates`] that the simulation applies to
//! their owner's ledger every tick, scaled by the tick delta. The ledger
//! clamps instead of rejecting so continuous income and drain can never
//! push a stock out of `[0, capacity]`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::math::Fixed;

/// Closed set of resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Power generated by plants and spent by production.
    Energy,
    /// Raw material.
    Metal,
}

impl ResourceKind {
    /// Every kind, in display order.
    pub const ALL: [Self; 2] = [Self::Energy, Self::Metal];

    /// Get the display name for this resource.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Energy => "Energy",
            Self::Metal => "Metal",
        }
    }
}

/// Current quantity and capacity of one resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceStock {
    /// Current quantity, fractional mid-tick.
    pub amount: Fixed,
    /// Storage limit.
    pub capacity: i32,
}

/// Per-player store of typed resources.
///
/// Invariant: every stock satisfies `0 <= amount <= capacity` after any
/// mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLedger {
    stocks: BTreeMap<ResourceKind, ResourceStock>,
}

impl ResourceLedger {
    /// Create a ledger with every kind at `0/0`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stocks: ResourceKind::ALL
                .iter()
                .map(|kind| (*kind, ResourceStock::default()))
                .collect(),
        }
    }

    /// Add `amount` (may be negative) and clamp into `[0, capacity]`.
    pub fn add_resource(&mut self, kind: ResourceKind, amount: Fixed) {
        let stock = self.stocks.entry(kind).or_default();
        let limit = Fixed::from_num(stock.capacity.max(0));
        stock.amount = stock
            .amount
            .saturating_add(amount)
            .clamp(Fixed::ZERO, limit);
    }

    /// Raise the capacity for `kind`. The current amount is left alone.
    pub fn increment_capacity(&mut self, kind: ResourceKind, amount: i32) {
        let stock = self.stocks.entry(kind).or_default();
        stock.capacity = stock.capacity.saturating_add(amount).max(0);
    }

    /// Current quantity of `kind`.
    #[must_use]
    pub fn amount(&self, kind: ResourceKind) -> Fixed {
        self.stocks
            .get(&kind)
            .map_or(Fixed::ZERO, |stock| stock.amount)
    }

    /// Capacity of `kind`.
    #[must_use]
    pub fn capacity(&self, kind: ResourceKind) -> i32 {
        self.stocks.get(&kind).map_or(0, |stock| stock.capacity)
    }

    /// Stock for `kind`.
    #[must_use]
    pub fn stock(&self, kind: ResourceKind) -> ResourceStock {
        self.stocks.get(&kind).copied().unwrap_or_default()
    }

    /// Whole-unit current/limit pairs for presentation, in kind order.
    #[must_use]
    pub fn readouts(&self) -> Vec<ResourceReadout> {
        self.stocks
            .iter()
            .map(|(kind, stock)| ResourceReadout {
                kind: *kind,
                current: stock.amount.to_num::<i32>(),
                limit: stock.capacity,
            })
            .collect()
    }
}

impl Default for ResourceLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Whole-unit view of one stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceReadout {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Current quantity, rounded down.
    pub current: i32,
    /// Capacity.
    pub limit: i32,
}

/// One per-second rate as written in template data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRate {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Units per second.
    pub amount: i32,
}

/// Per-second rates keyed by resource kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceRates {
    rates: BTreeMap<ResourceKind, Fixed>,
}

impl ResourceRates {
    /// Empty rate table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a rate table from template data, summing duplicate kinds.
    #[must_use]
    pub fn from_rates(rates: &[ResourceRate]) -> Self {
        let mut table = Self::new();
        for rate in rates {
            table.add(rate.kind, Fixed::from_num(rate.amount));
        }
        table
    }

    /// Add `amount` to the rate for `kind`.
    pub fn add(&mut self, kind: ResourceKind, amount: Fixed) {
        let entry = self.rates.entry(kind).or_insert(Fixed::ZERO);
        *entry = entry.saturating_add(amount);
    }

    /// Merge another table into this one.
    pub fn accumulate(&mut self, other: &Self) {
        for (kind, amount) in other.iter() {
            self.add(kind, amount);
        }
    }

    /// Rate for `kind`, zero when absent.
    #[must_use]
    pub fn get(&self, kind: ResourceKind) -> Fixed {
        self.rates.get(&kind).copied().unwrap_or(Fixed::ZERO)
    }

    /// Whether no kind has a rate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Iterate rates in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, Fixed)> + '_ {
        self.rates.iter().map(|(kind, amount)| (*kind, *amount))
    }
}

/// Apply one tick of production and consumption to `ledger`.
///
/// Production is credited before consumption so an entity that makes and
/// spends the same kind nets out within the tick.
pub fn apply_rates(
    ledger: &mut ResourceLedger,
    production: &ResourceRates,
    consumption: &ResourceRates,
    delta: Fixed,
) {
    for (kind, rate) in production.iter() {
        ledger.add_resource(kind, rate * delta);
    }
    for (kind, rate) in consumption.iter() {
        ledger.add_resource(kind, -(rate * delta));
    }
}
