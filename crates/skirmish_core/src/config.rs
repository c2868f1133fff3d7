//! Simulation tuning loaded from RON.
//!
//! # Example RON
//!
//! ```ron
//! SimConfig(
//!     tick_rate: 20,
//!     build_speed: 2,
//!     spawn_clearance: 10,
//!     placement_offset: 10,
//!     sell_resource: Energy,
//!     starting_resources: [
//!         (kind: Energy, amount: 0, capacity: 500),
//!     ],
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::economy::ResourceKind;
use crate::error::{GameError, Result};
use crate::math::Fixed;

/// Resources a player starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingResource {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Initial quantity (clamped to capacity).
    pub amount: i32,
    /// Initial capacity.
    pub capacity: i32,
}

/// Global simulation constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Ticks per second; the tick delta is its reciprocal.
    pub tick_rate: u32,
    /// Production accumulator gain per second of build time.
    pub build_speed: i32,
    /// Gap between a structure's edge and its spawn point.
    pub spawn_clearance: i32,
    /// Distance ahead of a worker where a new structure is proposed.
    pub placement_offset: i32,
    /// Kind credited when a structure is sold.
    pub sell_resource: ResourceKind,
    /// Stocks applied to every new player.
    pub starting_resources: Vec<StartingResource>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20,
            build_speed: 2,
            spawn_clearance: 10,
            placement_offset: 10,
            sell_resource: ResourceKind::Energy,
            starting_resources: vec![
                StartingResource {
                    kind: ResourceKind::Energy,
                    amount: 0,
                    capacity: 500,
                },
                StartingResource {
                    kind: ResourceKind::Metal,
                    amount: 0,
                    capacity: 500,
                },
            ],
        }
    }
}

impl SimConfig {
    /// Duration of one tick in seconds.
    #[must_use]
    pub fn tick_delta(&self) -> Fixed {
        Fixed::from_num(1) / Fixed::from_num(self.tick_rate.max(1))
    }

    /// Production accumulator gain per second.
    #[must_use]
    pub fn build_speed(&self) -> Fixed {
        Fixed::from_num(self.build_speed)
    }

    /// Parse a config from RON text. Missing fields take their defaults.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        ron::from_str(source).map_err(|e| GameError::parse("<inline>", &e))
    }

    /// Load a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GameError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        ron::from_str(&contents).map_err(|e| GameError::parse(path.display().to_string(), &e))
    }
}
