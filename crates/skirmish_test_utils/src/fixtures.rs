//! Test fixtures and helpers.
//!
//! Pre-built matches and input frames for consistent testing.

use fixed::types::I32F32;
use skirmish_core::components::{EntityId, ScreenPoint, Viewport};
use skirmish_core::input::InputFrame;
use skirmish_core::math::Vec2Fixed;
use skirmish_core::player::PlayerId;
use skirmish_core::simulation::{Simulation, TickEvents};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a ground point from integer coordinates.
#[must_use]
pub fn vec2(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, y)
}

/// An 800x600 playing area anchored at the screen origin.
#[must_use]
pub fn test_viewport() -> Viewport {
    Viewport::new(0, 0, 800, 600)
}

/// A hover-only input frame with the cursor at `(x, y)`.
#[must_use]
pub fn frame_at(x: i32, y: i32) -> InputFrame {
    InputFrame::new(ScreenPoint::new(x, y), test_viewport())
}

/// A simulation with one human player using the default config.
#[must_use]
pub fn new_match() -> (Simulation, PlayerId) {
    let mut sim = Simulation::new();
    let player = sim.add_player("commander", true);
    (sim, player)
}

/// Spawn a built entity at integer coordinates facing along +X.
///
/// # Panics
///
/// Panics if `template` is not in the simulation's catalog.
pub fn spawn(
    sim: &mut Simulation,
    template: &str,
    owner: Option<PlayerId>,
    x: i32,
    y: i32,
) -> EntityId {
    sim.spawn_entity(template, owner, vec2(x, y), I32F32::ZERO)
        .unwrap_or_else(|| panic!("template '{template}' should exist"))
}

/// Tick `n` times, collecting every tick's events.
pub fn run_ticks(sim: &mut Simulation, n: u64) -> Vec<TickEvents> {
    (0..n).map(|_| sim.tick()).collect()
}

/// Tick until `done` holds, giving up after `max_ticks`.
///
/// Returns the number of ticks taken.
pub fn tick_until<F>(sim: &mut Simulation, max_ticks: u64, mut done: F) -> Option<u64>
where
    F: FnMut(&Simulation) -> bool,
{
    for ticks in 1..=max_ticks {
        sim.tick();
        if done(sim) {
            return Some(ticks);
        }
    }
    None
}

/// Have `worker` request `template`, move the preview to `at` and confirm.
///
/// Returns the structure's id once construction has started.
pub fn place_structure(
    sim: &mut Simulation,
    player: PlayerId,
    worker: EntityId,
    template: &str,
    at: Vec2Fixed,
) -> Option<EntityId> {
    if !sim.perform_action(worker, template) {
        return None;
    }
    let structure = sim.player(player)?.placement()?.structure;
    sim.find_building_location(player, at);
    sim.start_construction(player).then_some(structure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_match_has_one_human() {
        let (sim, player) = new_match();
        assert_eq!(sim.players().len(), 1);
        assert!(sim.player(player).unwrap().is_human);
    }

    #[test]
    fn test_tick_until_reports_ticks() {
        let (mut sim, _) = new_match();
        assert_eq!(tick_until(&mut sim, 10, |s| s.get_tick() == 4), Some(4));
        assert_eq!(tick_until(&mut sim, 3, |_| false), None);
    }

    #[test]
    fn test_place_structure_starts_construction() {
        let (mut sim, player) = new_match();
        let worker = spawn(&mut sim, "Worker", Some(player), 0, 0);

        let plant = place_structure(&mut sim, player, worker, "PowerPlant", vec2(0, 30)).unwrap();
        assert!(sim.entity(plant).unwrap().needs_building());
        assert!(!sim.player(player).unwrap().is_finding_placement());
    }
}
