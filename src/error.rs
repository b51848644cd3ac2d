use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the transition samplers.
///
/// All of these are fatal to the current sweep: the caller decides whether to
/// re-run with corrected input. Degenerate input (empty sequence lists,
/// singleton sequences, all-zero counts) is *not* an error and falls back to
/// prior draws instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A construction-time hyperparameter outside its domain
    /// (non-positive concentration, malformed prior pair, truncation < 2).
    #[error("invalid hyperparameter `{name}`: {value}")]
    InvalidHyperParam { name: &'static str, value: f64 },

    /// A distribution draw or normalization produced a NaN, infinite or
    /// negative value. Checked immediately after every draw; never masked.
    #[error("numeric domain violation in {context}: {value}")]
    NumericDomain { context: &'static str, value: f64 },

    /// A sequence label is outside `[0, n_states)`.
    #[error("state label {label} out of range for {n_states} states")]
    LabelOutOfRange { label: usize, n_states: usize },

    /// A left-to-right model observed a backward transition. This signals a
    /// caller/data bug, not a recoverable condition.
    #[error("backward transition {from} -> {to} in left-to-right input")]
    BackwardTransition { from: usize, to: usize },

    /// A pre-seeded vector or matrix has the wrong dimension for the
    /// truncation level.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error(transparent)]
    Stats(#[from] statrs::StatsError),
}
