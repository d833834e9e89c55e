use nalgebra::{SVector, Vector3};
use serde::{Deserialize, Serialize};

pub mod algorithms;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod sim;
pub mod spawner;
pub mod trail;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use config::{SimConfig, SimMode};
pub use engine::Engine;
pub use error::SimError;
pub use sim::{BodySnapshot, DerivativeField, Simulator};
pub use spawner::{SpawnParams, Spawner};
pub use trail::{Trail, TrailBuffer, TRAIL_CAPACITY};

/// Body state `[x, y, z, vx, vy, vz]`.
pub type State = SVector<f64, 6>;

/// Bodies heavier than this are treated as stars: they keep a trail history
/// but renderers skip drawing it.
pub const STELLAR_MASS_THRESHOLD: f64 = 198_900.0;

/// Opaque display tag carried alongside each body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::rgb(255, 255, 255)
    }
}

pub const RED: Color = Color::rgb(230, 41, 55);
pub const ORANGE: Color = Color::rgb(255, 161, 0);
pub const YELLOW: Color = Color::rgb(253, 249, 0);
pub const GREEN: Color = Color::rgb(0, 228, 48);
pub const SKY_BLUE: Color = Color::rgb(102, 191, 255);
pub const BLUE: Color = Color::rgb(0, 121, 241);
pub const VIOLET: Color = Color::rgb(135, 60, 190);
pub const BROWN: Color = Color::rgb(127, 106, 79);

/// Colors handed out to spawned bodies.
pub const PALETTE: [Color; 8] = [RED, ORANGE, YELLOW, GREEN, SKY_BLUE, BLUE, VIOLET, BROWN];

/// Initial configuration of one body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    pub mass: f64,
    /// state = [x, y, z, vx, vy, vz]
    pub state: [f64; 6],
    #[serde(default)]
    pub radius: f64,
    #[serde(default)]
    pub color: Color,
}

impl BodyConfig {
    pub fn new(mass: f64, state: [f64; 6]) -> Self {
        Self {
            mass,
            state,
            radius: 0.0,
            color: Color::default(),
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn at_rest(mass: f64, position: Vector3<f64>) -> Self {
        Self::new(mass, [position.x, position.y, position.z, 0.0, 0.0, 0.0])
    }
}

/// Point mass with state = [x, y, z, vx, vy, vz].
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    state: State,
    mass: f64,
    radius: f64,
    color: Color,
}

impl Body {
    /// Builds a body, checking the physical invariants. `index` only labels the error.
    pub fn from_config(index: usize, config: &BodyConfig) -> Result<Self, SimError> {
        if !(config.mass.is_finite() && config.mass > 0.0) {
            return Err(SimError::InvalidBody { index, reason: "mass must be finite and positive" });
        }
        if !(config.radius.is_finite() && config.radius >= 0.0) {
            return Err(SimError::InvalidBody { index, reason: "radius must be finite and non-negative" });
        }
        if config.state.iter().any(|c| !c.is_finite()) {
            return Err(SimError::InvalidBody { index, reason: "state must be finite" });
        }
        Ok(Self {
            state: State::from_row_slice(&config.state),
            mass: config.mass,
            radius: config.radius,
            color: config.color,
        })
    }

    pub fn state(&self) -> &State { &self.state }

    pub(crate) fn set_state(&mut self, state: State) { self.state = state; }

    /// Position [x, y, z].
    pub fn position(&self) -> Vector3<f64> {
        self.state.fixed_rows::<3>(0).into()
    }

    /// Velocity [vx, vy, vz].
    pub fn velocity(&self) -> Vector3<f64> {
        self.state.fixed_rows::<3>(3).into()
    }

    pub fn mass(&self) -> f64 { self.mass }
    pub fn radius(&self) -> f64 { self.radius }
    pub fn color(&self) -> Color { self.color }

    /// Stellar-mass bodies keep recording a trail but are not drawn with one.
    pub fn renders_trail(&self) -> bool {
        self.mass <= STELLAR_MASS_THRESHOLD
    }

    /// Snapshot of the state as [x, y, z, vx, vy, vz].
    pub fn state_array(&self) -> [f64; 6] {
        let mut out = [0.0; 6];
        out.copy_from_slice(self.state.as_slice());
        out
    }

    pub fn to_config(&self) -> BodyConfig {
        BodyConfig {
            mass: self.mass,
            state: self.state_array(),
            radius: self.radius,
            color: self.color,
        }
    }
}
