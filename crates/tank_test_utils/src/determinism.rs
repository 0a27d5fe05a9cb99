//! Determinism testing utilities.
//!
//! Matches must replay bit-for-bit: the replay format stores only the
//! starting state and the intents, and desync detection compares state
//! hashes. Things that would break this:
//!
//! - **Unseeded randomness**: spawn points and item rolls must come from the
//!   world's seeded generator.
//! - **Hash map iteration**: bookkeeping is kept in `BTreeMap`s and entity
//!   vectors in creation order.
//! - **Floating point**: fractional awards use [`tank_core::math::Fixed`]
//!   and visibility geometry is integer.

use std::panic;
use std::thread;

use tank_core::simulation::Simulation;

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
    /// Distinct hashes (1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Panic with a readable report if the runs diverged.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic,
            "Simulation is non-deterministic!\n\
             Runs: {}\n\
             Ticks: {}\n\
             Unique hashes: {} (expected 1)\n\
             All hashes: {:?}",
            self.hashes.len(),
            self.ticks,
            self.unique_hashes().len(),
            self.hashes
        );
    }
}

/// Run a setup/step pair several times and compare final hashes.
///
/// * `runs` - how many independent runs
/// * `ticks` - steps per run
/// * `setup` - builds the initial state
/// * `step` - advances by one tick
/// * `hash` - fingerprints the final state
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
    let hashes: Vec<u64> = (0..runs)
        .map(|_| {
            let mut state = setup();
            for tick in 0..ticks {
                step(&mut state, tick);
            }
            hash(&state)
        })
        .collect();

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks,
    }
}

/// Run a simulation twice without intents and compare hashes.
///
/// A tick that fails counts as non-deterministic.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let result = verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim, _| {
            if let Err(err) = sim.tick() {
                tracing::warn!(%err, "tick failed");
            }
        },
        Simulation::state_hash,
    );
    result.is_deterministic
}

/// Run `num_sims` copies of a match on separate threads and collect the
/// final hashes.
///
/// # Panics
///
/// Re-raises the panic of any run that panicked.
pub fn run_parallel_simulations<F>(setup_fn: F, num_sims: usize, num_ticks: u64) -> Vec<u64>
where
    F: Fn() -> Simulation + Sync,
{
    thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        if sim.tick().is_err() {
                            break;
                        }
                    }
                    sim.state_hash()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
            .collect()
    })
}

/// First tick at which two identically built matches differ.
///
/// `None` means they stayed in lockstep for `num_ticks` ticks.
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
        let first = sim1.tick().map(|e| e.events);
        let second = sim2.tick().map(|e| e.events);
        let same_outcome = match (&first, &second) {
            (Ok(a), Ok(b)) => a == b,
            (Err(_), Err(_)) => true,
            _ => false,
        };
        if !same_outcome || sim1.state_hash() != sim2.state_hash() {
            tracing::debug!(tick, "simulations diverged");
            return Some(tick);
        }
    }
    None
}

/// Whether a serialize/deserialize round trip keeps the state hash, and
/// whether both copies then stay in lockstep for another `num_ticks`.
pub fn verify_serialization_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup_fn();
    for _ in 0..num_ticks {
        if sim.tick().is_err() {
            return false;
        }
    }

    let Ok(bytes) = sim.serialize() else {
        return false;
    };
    let Ok(mut restored) = Simulation::deserialize(&bytes) else {
        return false;
    };
    if sim.state_hash() != restored.state_hash() {
        return false;
    }

    for _ in 0..num_ticks {
        if sim.tick().is_err() || restored.tick().is_err() {
            return false;
        }
    }
    sim.state_hash() == restored.state_hash()
}

/// Proptest strategies over the arena's wire types.
pub mod strategies {
    use proptest::prelude::*;
    use tank_core::components::{
        AbilityType, Direction, Intent, MovementDirection, Rotation, StunFlags,
    };
    use tank_core::math::Fixed;

    /// Any of the four facings.
    pub fn arb_direction() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Up),
            Just(Direction::Right),
            Just(Direction::Down),
            Just(Direction::Left),
        ]
    }

    /// Either rotation step.
    pub fn arb_rotation() -> impl Strategy<Value = Rotation> {
        prop_oneof![Just(Rotation::Left), Just(Rotation::Right)]
    }

    /// Any non-empty combination of stun flags.
    pub fn arb_stun_flags() -> impl Strategy<Value = StunFlags> {
        (1u8..16).prop_map(StunFlags::from_bits_truncate)
    }

    /// Any ability.
    pub fn arb_ability() -> impl Strategy<Value = AbilityType> {
        (0u8..7).prop_filter_map("valid ability", |raw| AbilityType::try_from(raw).ok())
    }

    /// Any intent a player might send.
    pub fn arb_intent() -> impl Strategy<Value = Intent> {
        prop_oneof![
            Just(Intent::Pass),
            Just(Intent::Move(MovementDirection::Forward)),
            Just(Intent::Move(MovementDirection::Backward)),
            (
                proptest::option::of(arb_rotation()),
                proptest::option::of(arb_rotation())
            )
                .prop_map(|(tank, turret)| Intent::Rotate { tank, turret }),
            arb_ability().prop_map(Intent::UseAbility),
        ]
    }

    /// A script of intents, one per tick.
    pub fn arb_intent_script(max_len: usize) -> impl Strategy<Value = Vec<Intent>> {
        proptest::collection::vec(arb_intent(), 0..max_len)
    }

    /// A non-negative fractional award below 2.
    pub fn arb_fraction() -> impl Strategy<Value = Fixed> {
        (0i64..2_000).prop_map(|milli| Fixed::from_num(milli) / Fixed::from_num(1_000))
    }

    /// Stun lengths in ticks.
    pub fn arb_stun_ticks() -> impl Strategy<Value = u32> {
        1u32..64
    }
}
