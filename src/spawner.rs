use std::ops::Range;

use nalgebra::Vector3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::{BodyConfig, PALETTE};

pub const DEFAULT_SPAWN_MASS: Range<f64> = f64::EPSILON..100.0;
pub const DEFAULT_SPAWN_RADIUS: Range<f64> = 0.0..15.0;
pub const DEFAULT_SPAWN_MAX_SPEED: f64 = 5.0;

/// Ranges the spawner draws new bodies from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnParams {
    /// Half-open, must stay above zero.
    pub mass: Range<f64>,
    pub radius: Range<f64>,
    /// Each velocity component is drawn from `[-max_speed, max_speed)`.
    pub max_speed: f64,
}

impl Default for SpawnParams {
    fn default() -> Self {
        Self {
            mass: DEFAULT_SPAWN_MASS,
            radius: DEFAULT_SPAWN_RADIUS,
            max_speed: DEFAULT_SPAWN_MAX_SPEED,
        }
    }
}

impl SpawnParams {
    /// Ranges `gen_range` can sample without panicking, and a mass floor that
    /// keeps every spawned body valid.
    pub fn validate(&self) -> Result<(), SimError> {
        check_range("mass", &self.mass)?;
        if !(self.mass.start > 0.0) {
            return Err(SimError::InvalidSpawn { field: "mass", reason: "lower bound must be above zero" });
        }
        check_range("radius", &self.radius)?;
        if self.radius.start < 0.0 {
            return Err(SimError::InvalidSpawn { field: "radius", reason: "lower bound must not be negative" });
        }
        if !(2.0 * self.max_speed).is_finite() {
            return Err(SimError::InvalidSpawn { field: "max_speed", reason: "speed span must be finite" });
        }
        Ok(())
    }
}

fn check_range(field: &'static str, range: &Range<f64>) -> Result<(), SimError> {
    if !(range.start.is_finite() && range.end.is_finite()) {
        return Err(SimError::InvalidSpawn { field, reason: "bounds must be finite" });
    }
    if range.start > range.end {
        return Err(SimError::InvalidSpawn { field, reason: "lower bound exceeds upper bound" });
    }
    if !(range.end - range.start).is_finite() {
        return Err(SimError::InvalidSpawn { field, reason: "span must be finite" });
    }
    Ok(())
}

/// Produces randomized bodies from an explicitly owned RNG, so a given seed
/// replays the same sequence of spawns.
#[derive(Debug, Clone)]
pub struct Spawner {
    rng: SmallRng,
    pub params: SpawnParams,
}

impl Spawner {
    pub fn seeded(seed: u64, params: SpawnParams) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            params,
        }
    }

    pub fn from_entropy(params: SpawnParams) -> Self {
        let seed: u64 = rand::random();
        Self::seeded(seed, params)
    }

    pub fn from_seed(seed: Option<u64>, params: SpawnParams) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed, params),
            None => Self::from_entropy(params),
        }
    }

    /// A new body at `position` with random velocity, mass, radius and color.
    /// `params` must pass [`SpawnParams::validate`].
    pub fn sample(&mut self, position: Vector3<f64>) -> BodyConfig {
        let mass = sample_range(&mut self.rng, &self.params.mass);
        let radius = sample_range(&mut self.rng, &self.params.radius);
        let s = self.params.max_speed.abs();
        let mut velocity = Vector3::zeros();
        if s > 0.0 {
            for k in 0..3 {
                velocity[k] = self.rng.gen_range(-s..s);
            }
        }
        let color = PALETTE[self.rng.gen_range(0..PALETTE.len())];

        BodyConfig {
            mass,
            state: [position.x, position.y, position.z, velocity.x, velocity.y, velocity.z],
            radius,
            color,
        }
    }
}

// gen_range panics on an empty range; a degenerate range pins the value instead.
fn sample_range(rng: &mut SmallRng, range: &Range<f64>) -> f64 {
    if range.start < range.end {
        rng.gen_range(range.clone())
    } else {
        range.start
    }
}
