//! Injectable randomness (spec.md §4.5 "Determinism").
//!
//! The pipeline and the script runtime never call `rand::thread_rng()`
//! directly; they hold a `Box<dyn Rng>` so tests can pin every stochastic
//! draw to a known sequence.

/// A source of the two kinds of draws spec.md §4.2 needs: a uniform real
/// in `[0, 1)` (damage variance) and a uniform integer in an inclusive
/// range (momentum cost).
pub trait Rng: Send {
    /// Uniform real in `[0.0, 1.0)`.
    fn uniform(&mut self) -> f64;

    /// Uniform integer in `[low, high]` inclusive. `low` must be `<= high`.
    fn uniform_range_inclusive(&mut self, low: i64, high: i64) -> i64 {
        if low >= high {
            return low;
        }
        let span = (high - low + 1) as f64;
        let draw = (self.uniform() * span).floor() as i64;
        low + draw.clamp(0, high - low)
    }
}

/// Production RNG backed by `rand`'s OS-seeded, `Send`-able generator.
pub struct SystemRng(rand::rngs::StdRng);

impl Default for SystemRng {
    fn default() -> Self {
        use rand::SeedableRng as _;
        Self(rand::rngs::StdRng::from_os_rng())
    }
}

impl Rng for SystemRng {
    fn uniform(&mut self) -> f64 {
        use rand::Rng as _;
        self.0.random::<f64>()
    }
}

/// Deterministic test double: a fixed sequence of `[0,1)` draws, cycling
/// if exhausted. Lets tests pin exactly which draw answers which call.
pub struct ScriptedRng {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedRng {
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "ScriptedRng needs at least one value");
        Self { values, cursor: 0 }
    }

    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl Rng for ScriptedRng {
    fn uniform(&mut self) -> f64 {
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v
    }
}
