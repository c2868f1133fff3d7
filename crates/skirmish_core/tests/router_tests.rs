//! Command router tests: pointer input through a top-down camera.
//!
//! Screen pixels map 1:1 onto world units, so `frame_at(x, y)` points at
//! world `(x, y)`.

use skirmish_core::input::{dispatch_input, CursorHint, HitTarget};
use skirmish_core::movement::MoveState;
use skirmish_core::player::PlayerId;
use skirmish_core::simulation::Simulation;
use skirmish_test_utils::fixtures::{frame_at, new_match, place_structure, spawn, vec2};
use skirmish_test_utils::init_test_tracing;
use skirmish_test_utils::pickers::{ScriptedPicker, TopDownPicker};

fn click(sim: &mut Simulation, player: PlayerId, x: i32, y: i32) -> Option<CursorHint> {
    dispatch_input(sim, player, &frame_at(x, y).with_left_click(), &TopDownPicker::default())
}

fn hover(sim: &mut Simulation, player: PlayerId, x: i32, y: i32) -> Option<CursorHint> {
    dispatch_input(sim, player, &frame_at(x, y), &TopDownPicker::default())
}

// =============================================================================
// Selection
// =============================================================================

#[test]
fn test_selection_moves_between_entities() {
    init_test_tracing();
    let (mut sim, player) = new_match();
    let first = spawn(&mut sim, "Tank", Some(player), 100, 100);
    let second = spawn(&mut sim, "Tank", Some(player), 200, 100);

    click(&mut sim, player, 100, 100);
    assert_eq!(sim.player(player).unwrap().selected(), Some(first));

    click(&mut sim, player, 200, 100);
    assert_eq!(sim.player(player).unwrap().selected(), Some(second));
    assert!(!sim.entity(first).unwrap().is_selected());
    assert!(sim.entity(second).unwrap().is_selected());
    assert_eq!(
        sim.entities().iter_sorted().filter(|e| e.is_selected()).count(),
        1
    );
    assert!(sim.check_invariants().is_ok());
}

#[test]
fn test_click_transfer_keeps_other_players_selection() {
    let mut sim = Simulation::new();
    let human = sim.add_player("human", true);
    let bot = sim.add_player("bot", false);
    let shared = spawn(&mut sim, "Tank", Some(bot), 100, 100);
    let own = spawn(&mut sim, "Tank", Some(human), 200, 100);

    assert!(sim.select(bot, shared));
    click(&mut sim, human, 100, 100);
    assert_eq!(sim.player(human).unwrap().selected(), Some(shared));

    click(&mut sim, human, 200, 100);
    assert_eq!(sim.player(human).unwrap().selected(), Some(own));
    assert_eq!(sim.player(bot).unwrap().selected(), Some(shared));
    assert!(sim.entity(shared).unwrap().is_selected());
    assert!(sim.check_invariants().is_ok());
}

#[test]
fn test_clicking_selection_again_changes_nothing() {
    let (mut sim, player) = new_match();
    let tank = spawn(&mut sim, "Tank", Some(player), 100, 100);

    click(&mut sim, player, 100, 100);
    click(&mut sim, player, 100, 100);
    assert_eq!(sim.player(player).unwrap().selected(), Some(tank));
    assert!(sim.entity(tank).unwrap().movable.unwrap().is_idle());
}

#[test]
fn test_selection_records_viewport() {
    let (mut sim, player) = new_match();
    let tank = spawn(&mut sim, "Tank", Some(player), 100, 100);

    click(&mut sim, player, 100, 100);
    assert_eq!(sim.entity(tank).unwrap().viewport(), frame_at(0, 0).viewport);
}

#[test]
fn test_right_click_deselects_unless_alt() {
    let (mut sim, player) = new_match();
    let tank = spawn(&mut sim, "Tank", Some(player), 100, 100);
    click(&mut sim, player, 100, 100);
    let picker = TopDownPicker::default();

    dispatch_input(&mut sim, player, &frame_at(5, 5).with_right_click().with_alt(), &picker);
    assert_eq!(sim.player(player).unwrap().selected(), Some(tank));

    dispatch_input(&mut sim, player, &frame_at(5, 5).with_right_click(), &picker);
    assert_eq!(sim.player(player).unwrap().selected(), None);
    assert!(!sim.entity(tank).unwrap().is_selected());
}

#[test]
fn test_input_outside_viewport_is_ignored() {
    let (mut sim, player) = new_match();
    spawn(&mut sim, "Tank", Some(player), 100, 100);

    assert_eq!(click(&mut sim, player, 900, 100), None);
    assert_eq!(click(&mut sim, player, 100, -5), None);
    assert_eq!(sim.player(player).unwrap().selected(), None);
}

#[test]
fn test_hit_without_point_is_ignored() {
    let (mut sim, player) = new_match();
    let tank = spawn(&mut sim, "Tank", Some(player), 100, 100);
    let picker = ScriptedPicker::pointless(HitTarget::Entity(tank));

    dispatch_input(&mut sim, player, &frame_at(1, 1).with_left_click(), &picker);
    assert_eq!(sim.player(player).unwrap().selected(), None);
}

#[test]
fn test_bots_are_not_routed() {
    let mut sim = Simulation::new();
    let bot = sim.add_player("bot", false);
    spawn(&mut sim, "Tank", Some(bot), 100, 100);

    assert_eq!(click(&mut sim, bot, 100, 100), None);
    assert_eq!(sim.player(bot).unwrap().selected(), None);
}

// =============================================================================
// Orders
// =============================================================================

#[test]
fn test_terrain_click_moves_selected_unit() {
    let (mut sim, player) = new_match();
    let tank = spawn(&mut sim, "Tank", Some(player), 100, 100);
    click(&mut sim, player, 100, 100);

    let hint = click(&mut sim, player, 300, 100);
    assert_eq!(hint, Some(CursorHint::Move));
    let movable = sim.entity(tank).unwrap().movable.unwrap();
    assert_eq!(movable.state(), MoveState::Rotating);
    assert_eq!(movable.destination(), vec2(300, 100));
}

#[test]
fn test_foreign_units_ignore_orders() {
    let mut sim = Simulation::new();
    let human = sim.add_player("human", true);
    let bot = sim.add_player("bot", false);
    let enemy = spawn(&mut sim, "Tank", Some(bot), 100, 100);

    // Anything may be selected, but only owned entities take orders.
    click(&mut sim, human, 100, 100);
    assert_eq!(sim.player(human).unwrap().selected(), Some(enemy));

    assert_eq!(click(&mut sim, human, 300, 100), None);
    assert!(sim.entity(enemy).unwrap().movable.unwrap().is_idle());
}

#[test]
fn test_worker_click_resumes_construction() {
    let (mut sim, player) = new_match();
    let worker = spawn(&mut sim, "Worker", Some(player), 100, 100);
    click(&mut sim, player, 100, 100);
    let plant = place_structure(&mut sim, player, worker, "PowerPlant", vec2(100, 150)).unwrap();

    click(&mut sim, player, 40, 100);
    let assister = sim.entity(worker).unwrap().assister.unwrap();
    assert!(!assister.is_assisting());

    click(&mut sim, player, 100, 150);
    let e = sim.entity(worker).unwrap();
    assert!(e.assister.unwrap().is_assisting());
    assert_eq!(e.assister.unwrap().target(), Some(plant));
    assert_eq!(e.movable.unwrap().destination(), vec2(100, 150));
    assert_eq!(sim.player(player).unwrap().selected(), Some(worker));
}

#[test]
fn test_rally_mode_sets_rally_point() {
    let (mut sim, player) = new_match();
    let factory = spawn(&mut sim, "WarFactory", Some(player), 300, 300);
    click(&mut sim, player, 300, 300);
    let picker = TopDownPicker::default();

    // Outside rally mode a terrain click does nothing for a structure.
    assert_eq!(click(&mut sim, player, 300, 400), None);
    let producer = sim.entity(factory).unwrap().producer.clone().unwrap();
    assert_eq!(producer.rally_point(), Some(vec2(315, 300)));

    let hint = dispatch_input(
        &mut sim,
        player,
        &frame_at(300, 400).with_left_click().with_rally_mode(),
        &picker,
    );
    assert_eq!(hint, Some(CursorHint::RallyPoint));
    let view = sim.selected_view(player).unwrap().structure.unwrap();
    assert_eq!(view.rally_point, Some(vec2(300, 400)));
    assert_eq!(view.rally_flag, Some(vec2(300, 400)));
}

// =============================================================================
// Placement
// =============================================================================

#[test]
fn test_placement_follows_cursor_and_confirms() {
    let (mut sim, player) = new_match();
    let worker = spawn(&mut sim, "Worker", Some(player), 100, 100);
    click(&mut sim, player, 100, 100);
    assert!(sim.perform_action(worker, "PowerPlant"));
    let structure = sim.player(player).unwrap().placement().unwrap().structure;

    assert_eq!(hover(&mut sim, player, 400, 400), None);
    assert_eq!(sim.entity(structure).unwrap().position, vec2(400, 400));

    click(&mut sim, player, 400, 400);
    assert!(!sim.player(player).unwrap().is_finding_placement());
    assert!(sim.entity(structure).unwrap().needs_building());
    assert_eq!(
        sim.entity(worker).unwrap().assister.unwrap().target(),
        Some(structure)
    );
}

#[test]
fn test_blocked_placement_click_keeps_placing() {
    let (mut sim, player) = new_match();
    spawn(&mut sim, "WarFactory", Some(player), 400, 400);
    let worker = spawn(&mut sim, "Worker", Some(player), 100, 100);
    sim.perform_action(worker, "PowerPlant");

    hover(&mut sim, player, 402, 402);
    click(&mut sim, player, 402, 402);
    assert!(sim.player(player).unwrap().is_finding_placement());
}

#[test]
fn test_right_click_cancels_placement_first() {
    let (mut sim, player) = new_match();
    let worker = spawn(&mut sim, "Worker", Some(player), 100, 100);
    click(&mut sim, player, 100, 100);
    sim.perform_action(worker, "PowerPlant");
    let picker = TopDownPicker::default();

    dispatch_input(&mut sim, player, &frame_at(5, 5).with_right_click(), &picker);
    assert!(!sim.player(player).unwrap().is_finding_placement());
    assert_eq!(sim.player(player).unwrap().selected(), Some(worker));

    dispatch_input(&mut sim, player, &frame_at(5, 5).with_right_click(), &picker);
    assert_eq!(sim.player(player).unwrap().selected(), None);
}

// =============================================================================
// Hover
// =============================================================================

#[test]
fn test_hover_hints() {
    let mut sim = Simulation::new();
    let human = sim.add_player("human", true);
    let bot = sim.add_player("bot", false);
    spawn(&mut sim, "Tank", Some(human), 100, 100);
    spawn(&mut sim, "Tank", Some(bot), 200, 100);
    spawn(&mut sim, "WarFactory", Some(human), 300, 300);

    assert_eq!(hover(&mut sim, human, 100, 100), Some(CursorHint::Select));
    assert_eq!(hover(&mut sim, human, 200, 100), None);
    assert_eq!(hover(&mut sim, human, 50, 50), None);

    click(&mut sim, human, 100, 100);
    assert_eq!(hover(&mut sim, human, 50, 50), Some(CursorHint::Move));
    assert_eq!(hover(&mut sim, human, 200, 100), Some(CursorHint::Select));

    click(&mut sim, human, 300, 300);
    assert_eq!(hover(&mut sim, human, 50, 50), None);
    let picker = TopDownPicker::default();
    assert_eq!(
        dispatch_input(&mut sim, human, &frame_at(50, 50).with_rally_mode(), &picker),
        Some(CursorHint::RallyPoint)
    );
}

#[test]
fn test_step_ticks_before_dispatch() {
    let (mut sim, player) = new_match();
    let tank = spawn(&mut sim, "Tank", Some(player), 100, 100);

    let (events, hint) = sim.step(
        player,
        &frame_at(100, 100).with_left_click(),
        &TopDownPicker::default(),
    );
    assert_eq!(sim.get_tick(), 1);
    assert_eq!(events.spawned, vec![tank]);
    assert_eq!(hint, Some(CursorHint::Select));
    assert_eq!(sim.player(player).unwrap().selected(), Some(tank));
}
