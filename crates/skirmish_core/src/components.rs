//! Shared component definitions.
//!
//! Components are pure data with no behavior. Capability modules that
//! carry a state machine live next to their systems in [`crate::movement`],
//! [`crate::construction`] and [`crate::production`].

use serde::{Deserialize, Serialize};

/// Unique identifier for entities.
pub type EntityId = u64;

/// Health component for damageable entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create new health component at full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Check if entity is at full health.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Heal the entity, returning actual amount healed.
    /// Uses saturating addition to prevent overflow.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let headroom = self.max.saturating_sub(self.current);
        let actual = amount.min(headroom);
        self.current = self.current.saturating_add(actual);
        actual
    }

    /// Get health as a percentage (0-100).
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.max == 0 {
            0
        } else {
            let percent = u64::from(self.current) * 100 / u64::from(self.max);
            u32::try_from(percent).unwrap_or(u32::MAX)
        }
    }
}

/// A point in screen space, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    /// Horizontal pixel.
    pub x: i32,
    /// Vertical pixel.
    pub y: i32,
}

impl ScreenPoint {
    /// Create a screen point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// The playable screen area, excluding menus and other chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Viewport {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Create a viewport.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Check if a screen point lies inside (right/bottom edges exclusive).
    #[must_use]
    pub fn contains(&self, point: ScreenPoint) -> bool {
        let dx = i64::from(point.x) - i64::from(self.x);
        let dy = i64::from(point.y) - i64::from(self.y);
        dx >= 0 && dy >= 0 && dx < i64::from(self.width) && dy < i64::from(self.height)
    }
}

/// How an entity should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Material {
    /// Normal materials.
    #[default]
    Standard,
    /// Placement preview, tinted by whether the spot is free.
    Placement {
        /// Whether the structure may be placed here.
        valid: bool,
    },
    /// Transparent while being built.
    Construction,
}
