//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism the simulation guards against:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`skirmish_core::math::Fixed`],
//!   including for headings and trigonometry.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   We always iterate in sorted entity ID order.
//!
//! - **System randomness**: The simulation has none.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual state machines (movement, construction)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full scenarios are reproducible
//! 4. **Parallel tests**: Running N simulations in parallel all match

use std::thread;

use skirmish_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for tick in 0..ticks {
            step(&mut state, tick);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Simplified determinism verification for [`Simulation`].
///
/// Runs the simulation twice with identical setup and verifies the final
/// state hashes match exactly.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let result = verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim, _| {
            sim.tick();
        },
        Simulation::state_hash,
    );
    result.is_deterministic
}

/// Run N simulations on scoped threads and collect their final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling
/// or memory layout differences.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations<F>(setup_fn: F, num_sims: usize, num_ticks: u64) -> DeterminismResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.tick();
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if simulations are deterministic, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        sim1.tick();
        sim2.tick();

        if sim1.state_hash() != sim2.state_hash() {
            tracing::warn!(tick, "Simulations diverged");
            return Some(tick);
        }
    }

    None
}

/// Proptest strategies for simulation inputs.
pub mod strategies {
    use proptest::prelude::*;
    use skirmish_core::economy::ResourceKind;
    use skirmish_core::math::{degrees, Fixed, Vec2Fixed};

    /// Generate a fixed-point coordinate within a small battlefield.
    ///
    /// Range: -500 to 500
    pub fn arb_fixed_position() -> impl Strategy<Value = Fixed> {
        (-500i32..500i32).prop_map(Fixed::from_num)
    }

    /// Generate a ground point within a small battlefield.
    pub fn arb_vec2_position() -> impl Strategy<Value = Vec2Fixed> {
        (arb_fixed_position(), arb_fixed_position()).prop_map(|(x, y)| Vec2Fixed::new(x, y))
    }

    /// Generate a heading in whole degrees, as radians.
    pub fn arb_heading() -> impl Strategy<Value = Fixed> {
        (-179i32..=180i32).prop_map(degrees)
    }

    /// Generate a resource kind.
    pub fn arb_resource_kind() -> impl Strategy<Value = ResourceKind> {
        prop_oneof![Just(ResourceKind::Energy), Just(ResourceKind::Metal)]
    }

    /// One mutation of a resource ledger.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum LedgerOp {
        /// Add (or with a negative amount, take) resources.
        Add(ResourceKind, i32),
        /// Raise capacity.
        Capacity(ResourceKind, i32),
    }

    /// Generate a ledger mutation.
    pub fn arb_ledger_op() -> impl Strategy<Value = LedgerOp> {
        prop_oneof![
            (arb_resource_kind(), -1000i32..1000i32).prop_map(|(k, n)| LedgerOp::Add(k, n)),
            (arb_resource_kind(), 0i32..500i32).prop_map(|(k, n)| LedgerOp::Capacity(k, n)),
        ]
    }

    /// Generate a sequence of ledger mutations.
    pub fn arb_ledger_ops(max_len: usize) -> impl Strategy<Value = Vec<LedgerOp>> {
        proptest::collection::vec(arb_ledger_op(), 0..max_len)
    }

    /// Generate a production order a war factory accepts.
    pub fn arb_unit_order() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just("Tank"), Just("Worker")]
    }

    /// Generate a queue of production orders.
    pub fn arb_build_queue(max_len: usize) -> impl Strategy<Value = Vec<&'static str>> {
        proptest::collection::vec(arb_unit_order(), 1..max_len)
    }
}
