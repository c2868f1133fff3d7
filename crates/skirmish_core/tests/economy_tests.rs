//! Economy tests: ledger clamping, entity income and drain, selling.

use skirmish_core::economy::{ResourceKind, ResourceLedger};
use skirmish_core::math::Fixed;
use skirmish_test_utils::determinism::strategies::{arb_ledger_ops, LedgerOp};
use skirmish_test_utils::fixtures::{fixed, fixed_f, new_match, run_ticks, spawn};
use skirmish_test_utils::proptest::prelude::*;

// =============================================================================
// Ledger
// =============================================================================

#[test]
fn test_capacity_then_overflow_clamps() {
    let mut ledger = ResourceLedger::new();
    assert_eq!(ledger.amount(ResourceKind::Energy), Fixed::ZERO);
    assert_eq!(ledger.capacity(ResourceKind::Energy), 0);

    ledger.increment_capacity(ResourceKind::Energy, 100);
    ledger.add_resource(ResourceKind::Energy, fixed(150));

    assert_eq!(ledger.amount(ResourceKind::Energy), fixed(100));
    assert_eq!(ledger.capacity(ResourceKind::Energy), 100);
}

#[test]
fn test_adding_without_capacity_stores_nothing() {
    let mut ledger = ResourceLedger::new();
    ledger.add_resource(ResourceKind::Metal, fixed(40));
    assert_eq!(ledger.amount(ResourceKind::Metal), Fixed::ZERO);
}

#[test]
fn test_overdraw_floors_at_zero() {
    let mut ledger = ResourceLedger::new();
    ledger.increment_capacity(ResourceKind::Metal, 50);
    ledger.add_resource(ResourceKind::Metal, fixed(30));
    ledger.add_resource(ResourceKind::Metal, fixed(-45));
    assert_eq!(ledger.amount(ResourceKind::Metal), Fixed::ZERO);
}

proptest! {
    /// Every mutation leaves each stock within `[0, capacity]`.
    #[test]
    fn prop_ledger_stays_within_capacity(ops in arb_ledger_ops(64)) {
        let mut ledger = ResourceLedger::new();
        for op in ops {
            match op {
                LedgerOp::Add(kind, amount) => ledger.add_resource(kind, fixed(amount)),
                LedgerOp::Capacity(kind, amount) => ledger.increment_capacity(kind, amount),
            }
            for kind in ResourceKind::ALL {
                let amount = ledger.amount(kind);
                prop_assert!(amount >= Fixed::ZERO);
                prop_assert!(amount <= Fixed::from_num(ledger.capacity(kind)));
            }
        }
    }
}

// =============================================================================
// Entity rates
// =============================================================================

#[test]
fn test_power_plant_income_and_capacity() {
    let (mut sim, player) = new_match();
    spawn(&mut sim, "PowerPlant", Some(player), 0, 0);

    let ledger = &sim.player(player).unwrap().ledger;
    assert_eq!(ledger.capacity(ResourceKind::Energy), 1000);
    assert_eq!(ledger.amount(ResourceKind::Energy), Fixed::ZERO);

    // One second of production at 5 per second.
    run_ticks(&mut sim, 20);
    let energy = sim.player(player).unwrap().ledger.amount(ResourceKind::Energy);
    assert!(energy > fixed_f(4.99) && energy <= fixed(5), "energy = {energy}");
}

#[test]
fn test_consumption_never_goes_negative() {
    let (mut sim, player) = new_match();
    spawn(&mut sim, "WarFactory", Some(player), 0, 0);

    run_ticks(&mut sim, 40);
    let p = sim.player(player).unwrap();
    assert_eq!(p.ledger.amount(ResourceKind::Energy), Fixed::ZERO);
    assert_eq!(p.consumption_rates().get(ResourceKind::Energy), fixed(2));
}

#[test]
fn test_unowned_entities_have_no_economy() {
    let (mut sim, player) = new_match();
    spawn(&mut sim, "PowerPlant", None, 0, 0);

    run_ticks(&mut sim, 20);
    let p = sim.player(player).unwrap();
    assert_eq!(p.ledger.amount(ResourceKind::Energy), Fixed::ZERO);
    assert_eq!(p.ledger.capacity(ResourceKind::Energy), 500);
    assert!(p.production_rates().is_empty());
}

#[test]
fn test_structures_under_construction_produce_nothing() {
    let (mut sim, player) = new_match();
    let plant = spawn(&mut sim, "PowerPlant", Some(player), 0, 0);
    assert!(sim.start_structure_construction(plant));

    run_ticks(&mut sim, 20);
    let p = sim.player(player).unwrap();
    assert_eq!(p.ledger.amount(ResourceKind::Energy), Fixed::ZERO);
    assert!(p.production_rates().is_empty());
}

#[test]
fn test_readouts_report_whole_units() {
    let (mut sim, player) = new_match();
    sim.player_mut(player)
        .unwrap()
        .add_resource(ResourceKind::Metal, fixed_f(12.75));
    sim.tick();

    let readouts = sim.player(player).unwrap().readouts();
    let metal = readouts
        .iter()
        .find(|r| r.kind == ResourceKind::Metal)
        .unwrap();
    assert_eq!((metal.current, metal.limit), (12, 500));
}

// =============================================================================
// Selling
// =============================================================================

#[test]
fn test_sell_credits_owner_and_removes_structure() {
    let (mut sim, player) = new_match();
    let plant = spawn(&mut sim, "PowerPlant", Some(player), 0, 0);
    sim.select(player, plant);

    assert!(sim.sell(plant));
    assert!(sim.entity(plant).is_none());
    assert_eq!(sim.player(player).unwrap().selected(), None);
    assert_eq!(
        sim.player(player).unwrap().ledger.amount(ResourceKind::Energy),
        fixed(100)
    );
    assert!(sim.check_invariants().is_ok());
}

#[test]
fn test_units_cannot_be_sold() {
    let (mut sim, player) = new_match();
    let tank = spawn(&mut sim, "Tank", Some(player), 0, 0);

    assert!(!sim.sell(tank));
    assert!(sim.entity(tank).is_some());
}
