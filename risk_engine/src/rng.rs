//! rng.rs — Injectable random streams
//!
//! The simulator never touches a global generator. Callers hand it a
//! [`RandomStreams`] factory and every path pulls its own independent
//! [`RandomSource`] by index, so paths can run on any thread in any order
//! and still reproduce bit-for-bit under a fixed seed.
//!
//! BOX–MULLER (standard normal from two uniforms):
//!
//!   u₁ ∈ (0, 1],  u₂ ∈ [0, 1)
//!   Z = √(−2·ln u₁) · cos(2π·u₂)
//!
//! Both uniforms are drawn fresh for every normal variate; the sine branch
//! is discarded.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A stream of uniform draws on `[0, 1)`.
pub trait RandomSource {
    fn next_uniform(&mut self) -> f64;

    /// Standard normal variate via Box–Muller.
    fn next_standard_normal(&mut self) -> f64 {
        // 1 − u maps [0,1) onto (0,1] so ln never sees zero
        let u1 = 1.0 - self.next_uniform();
        let u2 = self.next_uniform();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

/// Factory of independent streams, one per path index.
pub trait RandomStreams: Sync {
    type Stream: RandomSource + Send;

    fn stream(&self, index: u64) -> Self::Stream;
}

/// `StdRng`-backed source.
#[derive(Debug, Clone)]
pub struct StdRandom(StdRng);

impl StdRandom {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }
}

impl RandomSource for StdRandom {
    fn next_uniform(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// Deterministic streams: stream `i` is seeded with `seed + i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededStreams {
    pub seed: u64,
}

impl SeededStreams {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl RandomStreams for SeededStreams {
    type Stream = StdRandom;

    fn stream(&self, index: u64) -> StdRandom {
        StdRandom::seeded(self.seed.wrapping_add(index))
    }
}

/// Non-reproducible streams for production runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntropyStreams;

impl RandomStreams for EntropyStreams {
    type Stream = StdRandom;

    fn stream(&self, _index: u64) -> StdRandom {
        StdRandom::from_entropy()
    }
}

/// Replays a fixed list of uniforms, wrapping around at the end.
#[derive(Debug, Clone)]
pub struct CyclicStream {
    values: Vec<f64>,
    pos: usize,
}

impl CyclicStream {
    /// Values outside `[0, 1)` are clamped into it; an empty list replays 0.5.
    pub fn new(values: &[f64]) -> Self {
        let values = if values.is_empty() {
            vec![0.5]
        } else {
            values
                .iter()
                .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
                .collect()
        };
        Self { values, pos: 0 }
    }

    fn starting_at(mut self, offset: usize) -> Self {
        self.pos = offset % self.values.len();
        self
    }
}

impl RandomSource for CyclicStream {
    fn next_uniform(&mut self) -> f64 {
        let v = self.values[self.pos];
        self.pos = (self.pos + 1) % self.values.len();
        v
    }
}

/// Hands every path a [`CyclicStream`] over the same values, with the
/// starting offset rotated by the path index.
#[derive(Debug, Clone)]
pub struct CyclicStreams {
    template: CyclicStream,
}

impl CyclicStreams {
    pub fn new(values: &[f64]) -> Self {
        Self { template: CyclicStream::new(values) }
    }
}

impl RandomStreams for CyclicStreams {
    type Stream = CyclicStream;

    fn stream(&self, index: u64) -> CyclicStream {
        let len = self.template.values.len() as u64;
        self.template.clone().starting_at((index % len) as usize)
    }
}
