use nalgebra::Vector3;

use crate::algorithms::pairs::PairSet;
use crate::config::DEFAULT_MIN_SEPARATION;
use crate::error::SimError;
use crate::State;

/// Pairwise Newtonian gravity with a hard floor on separation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    g: f64,
    min_separation: f64,
}

impl Gravity {
    pub fn new(g: f64) -> Result<Self, SimError> {
        Self::with_min_separation(g, DEFAULT_MIN_SEPARATION)
    }

    pub fn with_min_separation(g: f64, min_separation: f64) -> Result<Self, SimError> {
        if !g.is_finite() {
            return Err(SimError::InvalidConstant(g));
        }
        Ok(Self {
            g,
            min_separation: min_separation.max(0.0),
        })
    }

    pub fn g(&self) -> f64 { self.g }
    pub fn min_separation(&self) -> f64 { self.min_separation }

    /// Force exerted on body `i` by body `j`.
    ///
    /// `m_i * m_j` is formed before scaling by `G`, and float multiplication
    /// commutes, so the magnitude is bit-identical for `(i, j)` and `(j, i)`
    /// while the displacement flips sign: the result is exactly antisymmetric.
    pub fn pair_force(
        &self,
        (i, j): (usize, usize),
        states: &[State],
        masses: &[f64],
    ) -> Result<Vector3<f64>, SimError> {
        let d = position(&states[j]) - position(&states[i]);
        let r2 = d.norm_squared();
        let r = r2.sqrt();
        // NaN separations fail this comparison too.
        if !(r > self.min_separation) {
            return Err(SimError::NumericFault { i, j, separation: r });
        }
        let f = self.g * (masses[i] * masses[j]) / r2;
        Ok(d * (f / r))
    }

    /// Time derivative `[vx, vy, vz, ax, ay, az]` of every state. Pure: the
    /// inputs are only read.
    pub fn derivative(
        &self,
        states: &[State],
        masses: &[f64],
        pairs: &PairSet,
    ) -> Result<Vec<State>, SimError> {
        if masses.len() != states.len() {
            return Err(SimError::LengthMismatch {
                what: "masses",
                expected: states.len(),
                actual: masses.len(),
            });
        }
        if !pairs.covers(states.len()) {
            return Err(SimError::StalePairs {
                pairs_for: pairs.body_count(),
                bodies: states.len(),
            });
        }

        let mut out: Vec<State> = states
            .iter()
            .map(|s| State::from_row_slice(&[s[3], s[4], s[5], 0.0, 0.0, 0.0]))
            .collect();

        for &(i, j) in pairs.iter() {
            let f = self.pair_force((i, j), states, masses)?;
            let a_i = f / masses[i];
            let a_j = -f / masses[j];
            for k in 0..3 {
                out[i][3 + k] += a_i[k];
                out[j][3 + k] += a_j[k];
            }
        }

        Ok(out)
    }
}

fn position(s: &State) -> Vector3<f64> {
    Vector3::new(s[0], s[1], s[2])
}
