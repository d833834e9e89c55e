use serde::{Deserialize, Serialize};

use crate::spawner::SpawnParams;

pub const DEFAULT_G: f64 = 1.0;
/// Simulated time per rendered frame, independent of wall-clock frame time.
pub const DEFAULT_DT: f64 = 0.1;
pub const DEFAULT_MIN_SEPARATION: f64 = 1.0e-9;

/// Projection policy applied before each integration step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimMode {
    /// z position and z velocity are zeroed on every body before each step.
    Planar,
    #[default]
    Spatial,
}

impl SimMode {
    pub fn toggled(self) -> Self {
        match self {
            SimMode::Planar => SimMode::Spatial,
            SimMode::Spatial => SimMode::Planar,
        }
    }
}

/// Tunables for a simulation run. Every field falls back to its default when
/// missing from the JSON / JS object it is read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Gravitational constant, fixed for the simulation's lifetime.
    pub g: f64,
    pub dt: f64,
    pub mode: SimMode,
    /// Separations at or below this are a numeric fault.
    pub min_separation: f64,
    /// Spawner seed; `None` draws one from entropy.
    pub seed: Option<u64>,
    pub spawn: SpawnParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            g: DEFAULT_G,
            dt: DEFAULT_DT,
            mode: SimMode::default(),
            min_separation: DEFAULT_MIN_SEPARATION,
            seed: None,
            spawn: SpawnParams::default(),
        }
    }
}

impl SimConfig {
    pub fn with_g(mut self, g: f64) -> Self {
        self.g = g;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
