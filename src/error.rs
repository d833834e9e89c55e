use thiserror::Error;

/// Failures surfaced by the simulation core.
///
/// Construction problems are rejected before any state exists; numeric faults
/// stop a step before it is committed, so the body store never holds the
/// partially-advanced result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("a simulation needs at least one body")]
    EmptySystem,
    #[error("{what} has {actual} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("state vector of body {index} has {len} components, expected 6")]
    MalformedState { index: usize, len: usize },
    #[error("body {index} is invalid: {reason}")]
    InvalidBody { index: usize, reason: &'static str },
    #[error("gravitational constant must be finite, got {0}")]
    InvalidConstant(f64),
    #[error("time step must be finite and positive, got {0}")]
    InvalidStep(f64),
    #[error("pair set was generated for {pairs_for} bodies but the state holds {bodies}")]
    StalePairs { pairs_for: usize, bodies: usize },
    #[error("bodies {i} and {j} are {separation:e} apart, force is singular")]
    NumericFault { i: usize, j: usize, separation: f64 },
    #[error("body {index} left the step with a non-finite state")]
    NonFinite { index: usize },
    #[error("spawn {field} is invalid: {reason}")]
    InvalidSpawn { field: &'static str, reason: &'static str },
    #[error("unknown scenario id '{0}'")]
    UnknownScenario(String),
}
