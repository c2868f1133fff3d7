//! Production tests: build queues, spawn and rally points, construction gating.

use skirmish_core::math::Fixed;
use skirmish_core::movement::MoveState;
use skirmish_core::simulation::Simulation;
use skirmish_test_utils::determinism::strategies::arb_build_queue;
use skirmish_test_utils::fixtures::{new_match, run_ticks, spawn, tick_until, vec2};
use skirmish_test_utils::proptest::prelude::*;

/// Templates of everything spawned over `ticks` ticks, in spawn order.
fn spawned_templates(sim: &mut Simulation, ticks: u64) -> Vec<String> {
    run_ticks(sim, ticks)
        .into_iter()
        .flat_map(|events| events.spawned)
        .map(|id| sim.entity(id).unwrap().template.clone())
        .collect()
}

#[test]
fn test_queue_spawns_in_order() {
    let (mut sim, player) = new_match();
    let factory = spawn(&mut sim, "WarFactory", Some(player), 0, 0);
    sim.tick();

    assert!(sim.create_unit(factory, "Tank"));
    assert!(sim.create_unit(factory, "Worker"));
    assert!(sim.create_unit(factory, "Tank"));
    assert_eq!(
        sim.entity(factory).unwrap().producer.as_ref().unwrap().queue_values(),
        vec!["Tank", "Worker", "Tank"]
    );

    // Each order needs a little over five seconds at 2 progress per second.
    assert_eq!(spawned_templates(&mut sim, 95), Vec::<String>::new());
    assert_eq!(spawned_templates(&mut sim, 10), vec!["Tank"]);
    assert_eq!(spawned_templates(&mut sim, 350), vec!["Worker", "Tank"]);
    assert!(sim.entity(factory).unwrap().producer.as_ref().unwrap().is_empty());
}

#[test]
fn test_progress_resets_after_each_spawn() {
    let (mut sim, player) = new_match();
    let factory = spawn(&mut sim, "WarFactory", Some(player), 0, 0);
    sim.create_unit(factory, "Tank");
    sim.create_unit(factory, "Tank");

    tick_until(&mut sim, 200, |s| s.entities().len() == 2).unwrap();
    let producer = sim.entity(factory).unwrap().producer.clone().unwrap();
    assert_eq!(producer.progress(), Fixed::ZERO);
    assert_eq!(producer.build_percentage(), Fixed::ZERO);
    assert_eq!(producer.len(), 1);
}

#[test]
fn test_unit_spawns_at_spawn_point() {
    let (mut sim, player) = new_match();
    let factory = spawn(&mut sim, "WarFactory", Some(player), 0, 0);
    sim.create_unit(factory, "Tank");

    tick_until(&mut sim, 200, |s| s.entities().len() == 2).unwrap();
    let tank = sim
        .entities()
        .iter_sorted()
        .find(|e| e.template == "Tank")
        .unwrap();
    assert_eq!(tank.position, vec2(15, 0));
    assert!(tank.is_owned_by(player));
    assert_eq!(tank.movable.unwrap().state(), MoveState::Idle);
}

#[test]
fn test_unit_heads_for_rally_point() {
    let (mut sim, player) = new_match();
    let factory = spawn(&mut sim, "WarFactory", Some(player), 0, 0);
    sim.select(player, factory);
    assert!(sim.set_rally_point(factory, vec2(15, 40)));
    sim.create_unit(factory, "Tank");

    tick_until(&mut sim, 200, |s| s.entities().len() == 2).unwrap();
    let tank = sim.entities().sorted_ids()[1];
    assert_ne!(
        sim.entity(tank).unwrap().movable.unwrap().state(),
        MoveState::Idle
    );

    tick_until(&mut sim, 300, |s| {
        s.entity(tank).unwrap().movable.unwrap().is_idle()
    })
    .unwrap();
    assert_eq!(sim.entity(tank).unwrap().position, vec2(15, 40));
}

#[test]
fn test_rally_point_needs_human_owner_and_selection() {
    let mut sim = Simulation::new();
    let bot = sim.add_player("bot", false);
    let human = sim.add_player("human", true);
    let bot_factory = spawn(&mut sim, "WarFactory", Some(bot), 0, 0);
    let factory = spawn(&mut sim, "WarFactory", Some(human), 50, 0);

    sim.select(bot, bot_factory);
    assert!(!sim.set_rally_point(bot_factory, vec2(0, 40)));
    assert!(!sim.set_rally_point(factory, vec2(50, 40)));

    sim.select(human, factory);
    assert!(sim.set_rally_point(factory, vec2(50, 40)));
}

#[test]
fn test_orders_need_owner_and_action() {
    let (mut sim, player) = new_match();
    let neutral = spawn(&mut sim, "WarFactory", None, 0, 0);
    let factory = spawn(&mut sim, "WarFactory", Some(player), 50, 0);

    assert!(!sim.create_unit(neutral, "Tank"));
    assert!(!sim.create_unit(factory, "PowerPlant"));
    assert!(!sim.create_unit(factory, "Battleship"));
    assert!(sim.entity(factory).unwrap().producer.as_ref().unwrap().is_empty());
}

#[test]
fn test_no_spawns_while_under_construction() {
    let (mut sim, player) = new_match();
    let factory = spawn(&mut sim, "WarFactory", Some(player), 0, 0);
    sim.create_unit(factory, "Tank");
    assert!(sim.start_structure_construction(factory));
    sim.tick();

    // Hidden actions refuse further orders.
    assert!(!sim.create_unit(factory, "Tank"));
    assert!(spawned_templates(&mut sim, 400).is_empty());
    assert_eq!(sim.entity(factory).unwrap().producer.as_ref().unwrap().len(), 1);

    sim.construct(factory, 400);
    assert!(sim.entity(factory).unwrap().is_operational());
    assert!(tick_until(&mut sim, 200, |s| s.entities().len() == 2).is_some());
}

#[test]
fn test_perform_action_queues_at_producer() {
    let (mut sim, player) = new_match();
    let factory = spawn(&mut sim, "WarFactory", Some(player), 0, 0);

    assert!(sim.perform_action(factory, "Worker"));
    assert!(!sim.perform_action(factory, "WarFactory"));
    assert_eq!(
        sim.entity(factory).unwrap().producer.as_ref().unwrap().queue_values(),
        vec!["Worker"]
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Any queue drains in FIFO order.
    #[test]
    fn prop_queue_is_fifo(orders in arb_build_queue(5)) {
        let (mut sim, player) = new_match();
        let factory = spawn(&mut sim, "WarFactory", Some(player), 0, 0);
        sim.tick();
        for order in &orders {
            prop_assert!(sim.create_unit(factory, order));
        }

        let ticks = 110 * orders.len() as u64;
        let produced = spawned_templates(&mut sim, ticks);
        let expected: Vec<String> = orders.iter().map(|o| (*o).to_string()).collect();
        prop_assert_eq!(produced, expected);
    }
}
