//! Command router: translates one frame of pointer input into simulation
//! operations.
//!
//! The router holds no state of its own. Hit testing belongs to the
//! presentation layer and is supplied through the [`Picker`] trait.
//!
//! # Example
//!
//! ```
//! use skirmish_core::components::{ScreenPoint, Viewport};
//! use skirmish_core::input::{dispatch_input, Hit, InputFrame, Picker};
//! use skirmish_core::math::{Fixed, Vec2Fixed};
//! use skirmish_core::simulation::Simulation;
//!
//! struct Ground;
//!
//! impl Picker for Ground {
//!     fn pick(&self, _sim: &Simulation, _cursor: ScreenPoint) -> Option<Hit> {
//!         Some(Hit::terrain(Vec2Fixed::from_ints(5, 5)))
//!     }
//! }
//!
//! let mut sim = Simulation::new();
//! let player = sim.add_player("alice", true);
//! let tank = sim
//!     .spawn_entity("Tank", Some(player), Vec2Fixed::ZERO, Fixed::ZERO)
//!     .unwrap();
//! sim.select(player, tank);
//!
//! let frame = InputFrame::new(ScreenPoint::new(10, 10), Viewport::new(0, 0, 640, 480))
//!     .with_left_click();
//! dispatch_input(&mut sim, player, &frame, &Ground);
//! assert!(!sim.entity(tank).unwrap().movable.unwrap().is_idle());
//! ```

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, ScreenPoint, Viewport};
use crate::math::Vec2Fixed;
use crate::player::PlayerId;
use crate::simulation::{Simulation, TickEvents};

/// What a hit test struck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitTarget {
    /// The ground.
    Terrain,
    /// A world entity.
    Entity(EntityId),
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hit {
    /// What was struck.
    pub target: HitTarget,
    /// World point struck, `None` when the ray produced no usable point.
    pub point: Option<Vec2Fixed>,
}

impl Hit {
    /// A terrain hit at `point`.
    #[must_use]
    pub const fn terrain(point: Vec2Fixed) -> Self {
        Self {
            target: HitTarget::Terrain,
            point: Some(point),
        }
    }

    /// An entity hit at `point`.
    #[must_use]
    pub const fn entity(entity: EntityId, point: Vec2Fixed) -> Self {
        Self {
            target: HitTarget::Entity(entity),
            point: Some(point),
        }
    }
}

/// Cursor shape requested for the current hover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CursorHint {
    /// Neutral hint over a selectable entity.
    Select,
    /// A move order would be issued.
    Move,
    /// A rally point would be set.
    RallyPoint,
}

/// External hit test mapping a screen point into the world.
pub trait Picker {
    /// What lies under `cursor`, or `None` if nothing was struck.
    fn pick(&self, sim: &Simulation, cursor: ScreenPoint) -> Option<Hit>;
}

/// One frame of pointer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputFrame {
    /// Cursor position.
    pub cursor: ScreenPoint,
    /// Playable screen area.
    pub viewport: Viewport,
    /// Left button went down this frame.
    pub left_pressed: bool,
    /// Right button went down this frame.
    pub right_pressed: bool,
    /// Alt is held.
    pub alt_held: bool,
    /// The rally-point toggle is active.
    pub rally_mode: bool,
}

impl InputFrame {
    /// A hover-only frame.
    #[must_use]
    pub const fn new(cursor: ScreenPoint, viewport: Viewport) -> Self {
        Self {
            cursor,
            viewport,
            left_pressed: false,
            right_pressed: false,
            alt_held: false,
            rally_mode: false,
        }
    }

    /// Builder method to press the left button.
    #[must_use]
    pub const fn with_left_click(mut self) -> Self {
        self.left_pressed = true;
        self
    }

    /// Builder method to press the right button.
    #[must_use]
    pub const fn with_right_click(mut self) -> Self {
        self.right_pressed = true;
        self
    }

    /// Builder method to hold Alt.
    #[must_use]
    pub const fn with_alt(mut self) -> Self {
        self.alt_held = true;
        self
    }

    /// Builder method to activate rally mode.
    #[must_use]
    pub const fn with_rally_mode(mut self) -> Self {
        self.rally_mode = true;
        self
    }
}

/// Apply one frame of input for `player` and return the hover hint.
///
/// Only human players are routed. Clicks and hover outside the viewport
/// are ignored. A left click takes precedence over a right click.
pub fn dispatch_input(
    sim: &mut Simulation,
    player: PlayerId,
    frame: &InputFrame,
    picker: &dyn Picker,
) -> Option<CursorHint> {
    let p = sim.player_mut(player)?;
    if !p.is_human {
        return None;
    }
    p.viewport = frame.viewport;
    p.rally_mode = frame.rally_mode;

    if !frame.viewport.contains(frame.cursor) {
        return None;
    }

    if frame.left_pressed {
        left_mouse_click(sim, player, frame, picker);
    } else if frame.right_pressed && !frame.alt_held {
        right_mouse_click(sim, player);
    }
    mouse_hover(sim, player, frame, picker)
}

fn left_mouse_click(
    sim: &mut Simulation,
    player: PlayerId,
    frame: &InputFrame,
    picker: &dyn Picker,
) {
    let Some((placing, selected)) = sim
        .player(player)
        .map(|p| (p.is_finding_placement(), p.selected()))
    else {
        return;
    };
    if placing {
        if sim.can_place_building(player) {
            sim.start_construction(player);
        }
        return;
    }

    let Some(hit) = picker.pick(sim, frame.cursor) else {
        return;
    };
    if hit.point.is_none() {
        return;
    }
    match (selected, hit.target) {
        (Some(entity), _) => {
            sim.mouse_click(entity, &hit, player);
        }
        (None, HitTarget::Entity(entity)) => {
            sim.select(player, entity);
        }
        (None, HitTarget::Terrain) => {}
    }
}

fn right_mouse_click(sim: &mut Simulation, player: PlayerId) {
    if sim.player(player).is_some_and(|p| p.is_finding_placement()) {
        sim.cancel_building_placement(player);
    } else {
        sim.deselect(player);
    }
}

fn mouse_hover(
    sim: &mut Simulation,
    player: PlayerId,
    frame: &InputFrame,
    picker: &dyn Picker,
) -> Option<CursorHint> {
    let (placing, selected) = sim
        .player(player)
        .map(|p| (p.is_finding_placement(), p.selected()))?;
    if placing {
        if let Some(point) = picker.pick(sim, frame.cursor).and_then(|hit| hit.point) {
            sim.find_building_location(player, point);
        }
        return None;
    }

    let hit = picker.pick(sim, frame.cursor)?;
    match (selected, hit.target) {
        (Some(entity), target) => sim.set_hover_state(entity, target, player),
        (None, HitTarget::Entity(entity)) if sim.is_owned_by(entity, player) => {
            Some(CursorHint::Select)
        }
        (None, _) => None,
    }
}

impl Simulation {
    /// Run one tick, then dispatch the frame's input for `player`.
    pub fn step(
        &mut self,
        player: PlayerId,
        frame: &InputFrame,
        picker: &dyn Picker,
    ) -> (TickEvents, Option<CursorHint>) {
        let events = self.tick();
        let hint = dispatch_input(self, player, frame, picker);
        (events, hint)
    }
}
