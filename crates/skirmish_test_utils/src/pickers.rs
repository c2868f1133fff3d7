//! Hit-test stand-ins for driving the command router without a renderer.

use skirmish_core::components::{EntityId, ScreenPoint};
use skirmish_core::input::{Hit, HitTarget, Picker};
use skirmish_core::math::Vec2Fixed;
use skirmish_core::simulation::Simulation;

/// Orthographic camera looking straight down.
///
/// Screen pixels map 1:1 onto world units, offset so that screen `(0, 0)`
/// lands on `origin`. The topmost collidable entity under the cursor is
/// struck, otherwise the terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopDownPicker {
    /// World point under the screen origin.
    pub origin: Vec2Fixed,
}

impl TopDownPicker {
    /// Camera with screen `(0, 0)` over `origin`.
    #[must_use]
    pub const fn new(origin: Vec2Fixed) -> Self {
        Self { origin }
    }

    /// World point under `cursor`.
    #[must_use]
    pub fn to_world(&self, cursor: ScreenPoint) -> Vec2Fixed {
        self.origin + Vec2Fixed::from_ints(cursor.x, cursor.y)
    }

    /// Screen point over the whole-unit world point `(x, y)`.
    ///
    /// Only exact for an origin on whole units.
    #[must_use]
    pub fn to_screen(&self, x: i32, y: i32) -> ScreenPoint {
        let ox: i32 = self.origin.x.to_num();
        let oy: i32 = self.origin.y.to_num();
        ScreenPoint::new(x - ox, y - oy)
    }
}

impl Default for TopDownPicker {
    fn default() -> Self {
        Self::new(Vec2Fixed::ZERO)
    }
}

impl Picker for TopDownPicker {
    fn pick(&self, sim: &Simulation, cursor: ScreenPoint) -> Option<Hit> {
        let point = self.to_world(cursor);
        Some(match sim.entity_at(point) {
            Some(entity) => Hit::entity(entity, point),
            None => Hit::terrain(point),
        })
    }
}

/// Returns the same hit regardless of cursor or world state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptedPicker {
    hit: Option<Hit>,
}

impl ScriptedPicker {
    /// Always report `hit`.
    #[must_use]
    pub const fn new(hit: Option<Hit>) -> Self {
        Self { hit }
    }

    /// Always strike nothing.
    #[must_use]
    pub const fn nothing() -> Self {
        Self { hit: None }
    }

    /// Always strike the terrain at `(x, y)`.
    #[must_use]
    pub fn terrain(x: i32, y: i32) -> Self {
        Self::new(Some(Hit::terrain(Vec2Fixed::from_ints(x, y))))
    }

    /// Always strike `entity` at `(x, y)`.
    #[must_use]
    pub fn entity(entity: EntityId, x: i32, y: i32) -> Self {
        Self::new(Some(Hit::entity(entity, Vec2Fixed::from_ints(x, y))))
    }

    /// Always strike `target` without a usable world point.
    #[must_use]
    pub const fn pointless(target: HitTarget) -> Self {
        Self::new(Some(Hit {
            target,
            point: None,
        }))
    }
}

impl Picker for ScriptedPicker {
    fn pick(&self, _sim: &Simulation, _cursor: ScreenPoint) -> Option<Hit> {
        self.hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::math::Fixed;

    #[test]
    fn test_top_down_hits_entity_then_terrain() {
        let mut sim = Simulation::new();
        let tank = sim
            .spawn_entity("Tank", None, Vec2Fixed::from_ints(50, 50), Fixed::ZERO)
            .unwrap();
        let picker = TopDownPicker::default();

        let hit = picker.pick(&sim, ScreenPoint::new(51, 50)).unwrap();
        assert_eq!(hit.target, HitTarget::Entity(tank));
        assert_eq!(hit.point, Some(Vec2Fixed::from_ints(51, 50)));

        let hit = picker.pick(&sim, ScreenPoint::new(10, 10)).unwrap();
        assert_eq!(hit.target, HitTarget::Terrain);
    }

    #[test]
    fn test_top_down_screen_round_trip() {
        let picker = TopDownPicker::new(Vec2Fixed::from_ints(-100, 20));
        let screen = picker.to_screen(5, 25);
        assert_eq!(screen, ScreenPoint::new(105, 5));
        assert_eq!(picker.to_world(screen), Vec2Fixed::from_ints(5, 25));
    }

    #[test]
    fn test_scripted_ignores_cursor() {
        let sim = Simulation::new();
        let picker = ScriptedPicker::terrain(3, 4);
        assert_eq!(
            picker.pick(&sim, ScreenPoint::new(0, 0)),
            picker.pick(&sim, ScreenPoint::new(700, 500))
        );
        assert_eq!(ScriptedPicker::nothing().pick(&sim, ScreenPoint::new(0, 0)), None);
    }
}
