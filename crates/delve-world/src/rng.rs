//! The single seeded source behind every stochastic decision in generation.
//!
//! Uniform and normal samples come from one ChaCha8 stream; coherent noise
//! comes from a noise field seeded from the same world seed. Re-seeding only
//! happens on an explicit world reset.

use std::time::{SystemTime, UNIX_EPOCH};

use delve_core::config::NoiseKind;
use noise::{NoiseFn, OpenSimplex, Perlin, Simplex, SuperSimplex, Value, Worley};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Seeded coherent noise, one variant per supported noise family.
enum NoiseField {
    Value(Value),
    Perlin(Perlin),
    OpenSimplex(OpenSimplex),
    SuperSimplex(SuperSimplex),
    Simplex(Simplex),
    Worley(Worley),
}

impl NoiseField {
    fn new(kind: NoiseKind, seed: u32) -> Self {
        match kind {
            NoiseKind::Value => NoiseField::Value(Value::new(seed)),
            NoiseKind::Perlin => NoiseField::Perlin(Perlin::new(seed)),
            NoiseKind::OpenSimplex => NoiseField::OpenSimplex(OpenSimplex::new(seed)),
            NoiseKind::SuperSimplex => NoiseField::SuperSimplex(SuperSimplex::new(seed)),
            NoiseKind::Simplex => NoiseField::Simplex(Simplex::new(seed)),
            NoiseKind::Worley => NoiseField::Worley(Worley::new(seed)),
        }
    }

    fn get(&self, point: [f64; 2]) -> f64 {
        match self {
            NoiseField::Value(n) => n.get(point),
            NoiseField::Perlin(n) => n.get(point),
            NoiseField::OpenSimplex(n) => n.get(point),
            NoiseField::SuperSimplex(n) => n.get(point),
            NoiseField::Simplex(n) => n.get(point),
            NoiseField::Worley(n) => n.get(point),
        }
    }
}

/// Seeded uniform/normal sampler plus coherent noise.
pub struct RandomSource {
    seed: u64,
    rng: ChaCha8Rng,
    noise: NoiseField,
    frequency: f64,
}

impl RandomSource {
    /// Build a source for `seed`. A seed of 0 is replaced by one derived from
    /// the clock; [`RandomSource::seed`] reports the seed actually used.
    pub fn new(seed: u64, noise_kind: NoiseKind, frequency: f64) -> Self {
        let seed = resolve_seed(seed);
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            noise: NoiseField::new(noise_kind, fold_seed(seed)),
            frequency,
        }
    }

    /// The effective (never zero) seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform float in [0, 1).
    pub fn randf(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    /// Uniform u32.
    pub fn randu32(&mut self) -> u32 {
        self.rng.gen::<u32>()
    }

    /// Normal sample. An unusable sigma degrades to returning `mean`.
    pub fn randfn(&mut self, mean: f32, sigma: f32) -> f32 {
        match Normal::new(mean, sigma) {
            Ok(normal) => normal.sample(&mut self.rng),
            Err(_) => mean,
        }
    }

    /// Coherent noise at `(x, y)` after frequency scaling, roughly in [-1, 1].
    pub fn noise2d(&self, x: f64, y: f64) -> f64 {
        self.noise.get([x * self.frequency, y * self.frequency])
    }
}

/// The seed a world built from `seed` will use: `seed` itself, or a
/// clock-derived one when `seed` is 0.
pub fn resolve_seed(seed: u64) -> u64 {
    if seed == 0 {
        clock_seed()
    } else {
        seed
    }
}

/// Clock-derived seed for "random world" requests. Never zero.
fn clock_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x9E37_79B9_7F4A_7C15);
    nanos | 1
}

/// Fold a 64-bit seed into the 32 bits the noise crate takes.
fn fold_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}
