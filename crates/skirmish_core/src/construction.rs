//! Structure self-construction and worker assistance.
//!
//! A placed structure starts at zero hit points and is built up by workers
//! standing next to it. Workers accumulate fractional progress and hand
//! it over in whole hit points.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, Health};
use crate::math::{fixed_serde, Fixed};

/// Lifecycle of a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConstructionPhase {
    /// Pending placement preview owned by a player.
    Placing,
    /// Placed and waiting for workers.
    NeedsBuilding,
    /// Built and operational.
    #[default]
    Complete,
}

/// Result of feeding hit points into a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructProgress {
    /// The structure was not under construction.
    Ignored,
    /// Hit points were added but the structure is not finished.
    Built,
    /// This call finished the structure.
    Completed,
}

/// Construction capability of structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Constructible {
    phase: ConstructionPhase,
}

impl Constructible {
    /// A structure that is already built.
    #[must_use]
    pub const fn complete() -> Self {
        Self {
            phase: ConstructionPhase::Complete,
        }
    }

    /// A placement preview.
    #[must_use]
    pub const fn placing() -> Self {
        Self {
            phase: ConstructionPhase::Placing,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> ConstructionPhase {
        self.phase
    }

    /// Check if still a placement preview.
    #[must_use]
    pub fn is_placing(&self) -> bool {
        self.phase == ConstructionPhase::Placing
    }

    /// Check if waiting for workers.
    #[must_use]
    pub fn needs_building(&self) -> bool {
        self.phase == ConstructionPhase::NeedsBuilding
    }

    /// Check if built.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == ConstructionPhase::Complete
    }

    /// Enter the building phase with zero hit points.
    ///
    /// Returns `false` if construction is already under way.
    pub fn begin(&mut self, health: &mut Health) -> bool {
        if self.needs_building() {
            return false;
        }
        self.phase = ConstructionPhase::NeedsBuilding;
        health.current = 0;
        true
    }

    /// Add `amount` hit points, finishing the structure at full health.
    pub fn construct(&mut self, health: &mut Health, amount: u32) -> ConstructProgress {
        if !self.needs_building() {
            return ConstructProgress::Ignored;
        }
        health.heal(amount);
        if health.is_full() {
            health.current = health.max;
            self.phase = ConstructionPhase::Complete;
            ConstructProgress::Completed
        } else {
            ConstructProgress::Built
        }
    }
}

/// Construction-assist capability of workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assister {
    /// Hit points contributed per second.
    #[serde(with = "fixed_serde")]
    pub build_speed: Fixed,
    target: Option<EntityId>,
    #[serde(with = "fixed_serde")]
    amount_built: Fixed,
    assisting: bool,
}

impl Assister {
    /// Create an idle assister.
    #[must_use]
    pub fn new(build_speed: i32) -> Self {
        Self {
            build_speed: Fixed::from_num(build_speed),
            target: None,
            amount_built: Fixed::ZERO,
            assisting: false,
        }
    }

    /// Structure being assisted, if any.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Check if currently assigned to a structure.
    #[must_use]
    pub const fn is_assisting(&self) -> bool {
        self.assisting
    }

    /// Fractional progress not yet handed to the structure.
    #[must_use]
    pub const fn amount_built(&self) -> Fixed {
        self.amount_built
    }

    /// Assign a structure to assist.
    pub fn assign(&mut self, target: EntityId) {
        self.target = Some(target);
        self.assisting = true;
    }

    /// Abandon the current structure and drop any fractional progress.
    pub fn stop(&mut self) {
        self.assisting = false;
        self.amount_built = Fixed::ZERO;
    }

    /// Accumulate `delta` seconds of work and take the whole hit points.
    pub fn accumulate(&mut self, delta: Fixed) -> u32 {
        self.amount_built = self.amount_built.saturating_add(self.build_speed * delta);
        let whole = self.amount_built.floor();
        self.amount_built -= whole;
        whole.to_num::<u32>()
    }
}
