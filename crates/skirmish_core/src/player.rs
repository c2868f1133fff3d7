//! Players: ownership, selection and placement state.
//!
//! A [`Player`] is a passive holder. The [`Simulation`](crate::simulation::Simulation)
//! performs every transition and keeps the selection and placement
//! references consistent with the entity arena.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, Viewport};
use crate::economy::{ResourceKind, ResourceLedger, ResourceRates, ResourceReadout};
use crate::math::Fixed;

/// Index of a player in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Position in the simulation's player list.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A structure preview waiting for confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingPlacement {
    /// The preview entity.
    pub structure: EntityId,
    /// The worker that requested it.
    pub worker: EntityId,
}

/// A participant in the match.
#[derive(Debug, Clone)]
pub struct Player {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub username: String,
    /// Whether input comes from a person rather than an AI.
    pub is_human: bool,
    /// Resource stocks.
    pub ledger: ResourceLedger,
    /// Playable screen area from the latest input frame.
    pub viewport: Viewport,
    /// Whether the rally-point toggle is active in the latest input frame.
    pub rally_mode: bool,
    pub(crate) selected: Option<EntityId>,
    pub(crate) placement: Option<PendingPlacement>,
    readouts: Vec<ResourceReadout>,
    production_rates: ResourceRates,
    consumption_rates: ResourceRates,
}

impl Player {
    /// Create a player with an empty ledger.
    #[must_use]
    pub fn new(id: PlayerId, username: impl Into<String>, is_human: bool) -> Self {
        let ledger = ResourceLedger::new();
        Self {
            id,
            username: username.into(),
            is_human,
            readouts: ledger.readouts(),
            ledger,
            viewport: Viewport::default(),
            rally_mode: false,
            selected: None,
            placement: None,
            production_rates: ResourceRates::new(),
            consumption_rates: ResourceRates::new(),
        }
    }

    /// Currently selected entity.
    #[must_use]
    pub const fn selected(&self) -> Option<EntityId> {
        self.selected
    }

    /// Pending structure preview, if placing.
    #[must_use]
    pub const fn placement(&self) -> Option<PendingPlacement> {
        self.placement
    }

    /// Check if a structure preview is following the cursor.
    #[must_use]
    pub const fn is_finding_placement(&self) -> bool {
        self.placement.is_some()
    }

    /// Add to (or with a negative amount, take from) a stock. Clamped.
    pub fn add_resource(&mut self, kind: ResourceKind, amount: Fixed) {
        self.ledger.add_resource(kind, amount);
    }

    /// Raise a stock's capacity.
    pub fn increment_capacity(&mut self, kind: ResourceKind, amount: i32) {
        self.ledger.increment_capacity(kind, amount);
    }

    /// Whole-unit current/limit pairs as of the last tick.
    #[must_use]
    pub fn readouts(&self) -> &[ResourceReadout] {
        &self.readouts
    }

    /// Combined production of operational owned entities, per second.
    #[must_use]
    pub const fn production_rates(&self) -> &ResourceRates {
        &self.production_rates
    }

    /// Combined consumption of operational owned entities, per second.
    #[must_use]
    pub const fn consumption_rates(&self) -> &ResourceRates {
        &self.consumption_rates
    }

    pub(crate) fn refresh(&mut self, production: ResourceRates, consumption: ResourceRates) {
        self.readouts = self.ledger.readouts();
        self.production_rates = production;
        self.consumption_rates = consumption;
    }
}
