//! RNG oracle for deterministic random number generation.
//!
//! Every roll in a battle derives its seed from the battle seed, the round,
//! the participant and a [`RollContext`], so resolving the same state with the
//! same pending actions always produces the same outcome.

/// RNG oracle for deterministic random number generation.
///
/// Implementations must be deterministic and produce the same values
/// given the same seed.
pub trait RngOracle: Send + Sync {
    /// Generate a random u32 value from a seed.
    fn next_u32(&self, seed: u64) -> u32;

    /// Roll a d20 (1-20 inclusive). Drives the attack-roll multiplier.
    fn roll_d20(&self, seed: u64) -> u32 {
        self.roll_die(seed, 20)
    }

    /// Roll a d100 (1-100 inclusive). Drives critical hits.
    fn roll_d100(&self, seed: u64) -> u32 {
        self.roll_die(seed, 100)
    }

    /// Roll a die with N sides (1-N inclusive).
    fn roll_die(&self, seed: u64, sides: u32) -> u32 {
        (self.next_u32(seed) % sides.max(1)) + 1
    }

    /// Uniform draw in `[0, 1)`.
    fn unit(&self, seed: u64) -> f64 {
        f64::from(self.next_u32(seed)) / (f64::from(u32::MAX) + 1.0)
    }

    /// Uniform index in `[0, len)`. Returns 0 for empty slices.
    fn choose_index(&self, seed: u64, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.next_u32(seed) as usize % len
    }
}

/// PCG random number generator (PCG-XSH-RR, 64-bit state, 32-bit output).
///
/// Stateless: each call hashes its seed through one LCG step and the
/// XSH-RR permutation.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn pcg_step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn pcg_output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::pcg_output(Self::pcg_step(seed))
    }
}

/// Oracle that pins the d20 and d100 rolls and defers everything else to PCG.
///
/// Useful for scripted encounters and tests that need "average" rolls
/// without critical hits.
#[derive(Clone, Copy, Debug)]
pub struct FixedRng {
    pub d20: u32,
    pub d100: u32,
}

impl FixedRng {
    /// d20 of 8 (multiplier 1.0) and d100 of 100 (never critical).
    pub const AVERAGE: Self = Self { d20: 8, d100: 100 };

    pub const fn new(d20: u32, d100: u32) -> Self {
        Self { d20, d100 }
    }
}

impl RngOracle for FixedRng {
    fn next_u32(&self, seed: u64) -> u32 {
        PcgRng.next_u32(seed)
    }

    fn roll_d20(&self, _seed: u64) -> u32 {
        self.d20
    }

    fn roll_d100(&self, _seed: u64) -> u32 {
        self.d100
    }
}

/// Distinguishes independent rolls made by the same participant in one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum RollContext {
    AttackRoll = 0,
    Critical = 1,
    Retarget = 2,
    MonsterAction = 3,
    MonsterAttackRoll = 4,
    Loot = 5,
    TimeoutTarget = 6,
}

/// Compute a deterministic seed for one roll.
///
/// * `battle_seed` - seed fixed at battle creation
/// * `round` - round number the roll belongs to
/// * `participant` - raw id of the rolling participant
/// * `context` - which roll within the participant's turn
pub fn compute_seed(battle_seed: u64, round: u32, participant: u64, context: RollContext) -> u64 {
    let mut hash = battle_seed;

    hash ^= u64::from(round).wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= participant.wrapping_mul(0x517cc1b727220a95);
    hash ^= (context as u64).wrapping_mul(0x85ebca6b);

    // Final avalanche step
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;

    hash
}
