use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use ndarray::Array1;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::StandardNormal;
use rand_mt::Mt64;
use serde::{Deserialize, Serialize};

use crate::common::models::impl_from_str;

/// Independent N(0, 1) draws on demand.
pub trait VariateSource {
    fn next_standard_normal(&mut self) -> f64;

    /// `nr_samples` draws at once, in the order single draws would have produced them.
    fn standard_normals(&mut self, nr_samples: usize) -> Array1<f64> {
        Array1::from_iter((0..nr_samples).map(|_| self.next_standard_normal()))
    }

    /// Name of the generating engine, for reporting.
    fn engine_name(&self) -> &'static str;
}

/// The generator back-ends. Only period and quality differ, not the distribution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum RngEngine {
    #[default]
    Default,
    MersenneTwister,
}

impl RngEngine {
    pub fn name(&self) -> &'static str {
        match self {
            RngEngine::Default => "Default Random Engine",
            RngEngine::MersenneTwister => "Mersenne Twister",
        }
    }

    fn seeded(&self, seed_nr: u64) -> EngineRng {
        match self {
            RngEngine::Default => EngineRng::Std(StdRng::seed_from_u64(seed_nr)),
            RngEngine::MersenneTwister => EngineRng::MersenneTwister(Mt64::new(seed_nr)),
        }
    }
}

impl fmt::Display for RngEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl_from_str!(RngEngine, "random engine", {
    "default" => RngEngine::Default,
    "mersenne-twister" => RngEngine::MersenneTwister,
    "mt" => RngEngine::MersenneTwister,
});

enum EngineRng {
    Std(StdRng),
    MersenneTwister(Mt64),
}

impl RngCore for EngineRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        match self {
            EngineRng::Std(rng) => rng.next_u32(),
            EngineRng::MersenneTwister(rng) => rng.next_u32(),
        }
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        match self {
            EngineRng::Std(rng) => rng.next_u64(),
            EngineRng::MersenneTwister(rng) => rng.next_u64(),
        }
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        match self {
            EngineRng::Std(rng) => rng.fill_bytes(dest),
            EngineRng::MersenneTwister(rng) => rng.fill_bytes(dest),
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Nanoseconds since the epoch, the seed used when none is given.
pub fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

/// Standard normal variates from one explicitly seeded engine.
/// Two sources with the same engine and seed produce the same sequence.
pub struct StandardNormalSource {
    engine: RngEngine,
    seed_nr: u64,
    rng: EngineRng,
}

impl StandardNormalSource {
    pub fn from_seed(engine: RngEngine, seed_nr: u64) -> Self {
        Self {
            engine,
            seed_nr,
            rng: engine.seeded(seed_nr),
        }
    }

    /// Seeded from the clock so that successive program runs do not repeat.
    pub fn from_clock(engine: RngEngine) -> Self {
        Self::from_seed(engine, clock_seed())
    }

    pub fn engine(&self) -> RngEngine {
        self.engine
    }

    pub fn seed_nr(&self) -> u64 {
        self.seed_nr
    }
}

impl VariateSource for StandardNormalSource {
    #[inline]
    fn next_standard_normal(&mut self) -> f64 {
        self.rng.sample(StandardNormal)
    }

    fn standard_normals(&mut self, nr_samples: usize) -> Array1<f64> {
        Array1::random_using(nr_samples, StandardNormal, &mut self.rng)
    }

    fn engine_name(&self) -> &'static str {
        self.engine.name()
    }
}
