//! Unit production queues for structures.
//!
//! Orders are template names processed strictly first in, first out. The
//! head order accumulates progress at the configured build speed and is
//! released once progress exceeds the structure's threshold.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed, Vec2Fixed, Vec3Fixed, ONE};

/// Production capability of structures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Producer {
    queue: VecDeque<String>,
    #[serde(with = "fixed_serde")]
    progress: Fixed,
    #[serde(with = "fixed_serde")]
    threshold: Fixed,
    spawn_point: Option<Vec2Fixed>,
    rally_point: Option<Vec2Fixed>,
}

impl Producer {
    /// Create an empty queue releasing orders past `threshold`.
    #[must_use]
    pub fn new(threshold: i32) -> Self {
        Self {
            queue: VecDeque::new(),
            progress: Fixed::ZERO,
            threshold: Fixed::from_num(threshold),
            spawn_point: None,
            rally_point: None,
        }
    }

    /// Append an order.
    pub fn enqueue(&mut self, template: impl Into<String>) {
        self.queue.push_back(template.into());
    }

    /// Queued orders, head first.
    #[must_use]
    pub fn queue_values(&self) -> Vec<String> {
        self.queue.iter().cloned().collect()
    }

    /// Number of queued orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Progress accumulated toward the head order.
    #[must_use]
    pub const fn progress(&self) -> Fixed {
        self.progress
    }

    /// Progress needed to release an order.
    #[must_use]
    pub const fn threshold(&self) -> Fixed {
        self.threshold
    }

    /// Completion of the head order in `[0, 1]`.
    #[must_use]
    pub fn build_percentage(&self) -> Fixed {
        if self.threshold <= Fixed::ZERO {
            return Fixed::ZERO;
        }
        (self.progress / self.threshold).min(ONE)
    }

    /// Where produced entities appear.
    #[must_use]
    pub const fn spawn_point(&self) -> Option<Vec2Fixed> {
        self.spawn_point
    }

    /// Where produced entities are sent after spawning.
    #[must_use]
    pub const fn rally_point(&self) -> Option<Vec2Fixed> {
        self.rally_point
    }

    /// Check if a spawn point has been computed.
    #[must_use]
    pub const fn has_spawn_point(&self) -> bool {
        self.spawn_point.is_some()
    }

    /// Set the spawn point and reset the rally point onto it.
    pub fn set_spawn_point(&mut self, point: Vec2Fixed) {
        self.spawn_point = Some(point);
        self.rally_point = Some(point);
    }

    /// Set the rally point.
    pub fn set_rally_point(&mut self, point: Vec2Fixed) {
        self.rally_point = Some(point);
    }

    /// Advance the head order by `delta` seconds at `build_speed`.
    ///
    /// Returns the released order once progress strictly exceeds the
    /// threshold; progress then restarts from zero for the next order.
    pub fn advance(&mut self, delta: Fixed, build_speed: Fixed) -> Option<String> {
        if self.queue.is_empty() {
            return None;
        }
        self.progress = self.progress.saturating_add(delta * build_speed);
        if self.progress > self.threshold {
            self.progress = Fixed::ZERO;
            self.queue.pop_front()
        } else {
            None
        }
    }
}

/// Spawn point in front of a structure: its centre pushed forward past its
/// extent along the facing, plus `clearance`.
#[must_use]
pub fn spawn_point_for(
    position: Vec2Fixed,
    heading: Fixed,
    extent: Vec3Fixed,
    clearance: Fixed,
) -> Vec2Fixed {
    position + Vec2Fixed::from_heading(heading).scale(extent.x + clearance)
}
