//! Turn-then-travel movement for mobile entities.
//!
//! A move order first turns the entity in place until it faces the
//! destination, then drives it in a straight line. Turning and travelling
//! never happen on the same tick.

use serde::{Deserialize, Serialize};

use crate::math::{
    degrees, fixed_serde, move_towards, rotate_towards, same_heading, Fixed, Vec2Fixed,
};

/// Phase of a move order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MoveState {
    /// No order in progress.
    #[default]
    Idle,
    /// Turning toward the destination.
    Rotating,
    /// Travelling toward the destination.
    Moving,
}

/// Movement capability of units and workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movable {
    /// Travel speed in units per second.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Turn speed in radians per second.
    #[serde(with = "fixed_serde")]
    pub rotate_speed: Fixed,
    state: MoveState,
    destination: Vec2Fixed,
    #[serde(with = "fixed_serde")]
    target_heading: Fixed,
}

impl Movable {
    /// Create an idle movable. `rotate_speed` is in degrees per second.
    #[must_use]
    pub fn new(speed: i32, rotate_speed: i32) -> Self {
        Self {
            speed: Fixed::from_num(speed),
            rotate_speed: degrees(rotate_speed),
            state: MoveState::Idle,
            destination: Vec2Fixed::ZERO,
            target_heading: Fixed::ZERO,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn state(&self) -> MoveState {
        self.state
    }

    /// Check if turning in place.
    #[must_use]
    pub fn is_rotating(&self) -> bool {
        self.state == MoveState::Rotating
    }

    /// Check if travelling.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.state == MoveState::Moving
    }

    /// Check if no order is in progress.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == MoveState::Idle
    }

    /// Destination of the current or last order.
    #[must_use]
    pub const fn destination(&self) -> Vec2Fixed {
        self.destination
    }

    /// Heading the entity is turning toward.
    #[must_use]
    pub const fn target_heading(&self) -> Fixed {
        self.target_heading
    }

    /// Begin a new order from `position`, replacing any order in progress.
    ///
    /// A destination equal to `position` keeps the current heading.
    pub fn start_move(&mut self, position: Vec2Fixed, heading: Fixed, destination: Vec2Fixed) {
        self.destination = destination;
        self.target_heading = (destination - position).heading().unwrap_or(heading);
        self.state = MoveState::Rotating;
    }

    /// Drop the current order.
    pub fn stop(&mut self) {
        self.state = MoveState::Idle;
    }
}

/// What one movement step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStep {
    /// Nothing to do.
    Unchanged,
    /// Heading changed.
    Turned,
    /// Position changed but the destination is still ahead.
    Advanced,
    /// Reached the destination; the order is finished.
    Arrived,
}

/// Advance one move order by `delta` seconds.
///
/// While rotating only the heading changes; the step that lands on the
/// target heading switches to moving. While moving only the position
/// changes; the step that lands on the destination goes idle.
pub fn advance_movement(
    movable: &mut Movable,
    position: &mut Vec2Fixed,
    heading: &mut Fixed,
    delta: Fixed,
) -> MoveStep {
    match movable.state {
        MoveState::Idle => MoveStep::Unchanged,
        MoveState::Rotating => {
            *heading = rotate_towards(*heading, movable.target_heading, movable.rotate_speed * delta);
            if same_heading(*heading, movable.target_heading) {
                movable.state = MoveState::Moving;
            }
            MoveStep::Turned
        }
        MoveState::Moving => {
            *position = move_towards(*position, movable.destination, movable.speed * delta);
            if *position == movable.destination {
                movable.state = MoveState::Idle;
                MoveStep::Arrived
            } else {
                MoveStep::Advanced
            }
        }
    }
}
