#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};

/// Structural constraint applied to the transition matrix.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Structure {
    /// Full-Markov HDP-HMM: no structural constraint.
    Ergodic,
    /// Feed-forward model: transitions may never decrease the state index.
    /// `A` is strictly upper triangular after renormalization; the
    /// unconstrained draw is kept as `fullA`.
    LeftToRight,
    /// Explicit-duration HDP-HSMM: self-transitions are forbidden. `A` has a
    /// zero diagonal; the unconstrained draw is kept as `fullA`. Input
    /// sequences are expected to be run-length collapsed (no two consecutive
    /// equal labels).
    SemiMarkov,
}

impl Structure {
    /// Whether this structure maintains an unconstrained `fullA` alongside `A`.
    pub fn keeps_full_matrix(&self) -> bool {
        !matches!(self, Structure::Ergodic)
    }
}

/// Options for a [`TransitionModel`](crate::TransitionModel).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionOptions {
    /// Truncation level of the weak-limit approximation (number of states).
    pub n_states: usize,
    /// Row-level mass parameter: concentration of each row of `A` around `beta`.
    pub alpha: f64,
    /// Concentration of `beta` itself around uniform.
    pub gamma: f64,
    /// Extra self-transition mass; `Some` selects the sticky variant.
    pub kappa: Option<f64>,
    /// Structural constraint on the transition matrix.
    pub structure: Structure,
}

impl TransitionOptions {
    /// Default options: ergodic, non-sticky, unit concentrations.
    pub fn new(n_states: usize) -> Self {
        Self {
            n_states,
            alpha: 1.0,
            gamma: 1.0,
            kappa: None,
            structure: Structure::Ergodic,
        }
    }

    pub fn structure(mut self, structure: Structure) -> Self {
        self.structure = structure;
        self
    }

    pub fn concentrations(mut self, alpha: f64, gamma: f64) -> Self {
        self.alpha = alpha;
        self.gamma = gamma;
        self
    }

    pub fn sticky(mut self, kappa: f64) -> Self {
        self.kappa = Some(kappa);
        self
    }

    pub fn validate(&self) -> Result<()> {
        // statrs Dirichlet needs at least two categories
        if self.n_states < 2 {
            return Err(Error::InvalidHyperParam {
                name: "n_states",
                value: self.n_states as f64,
            });
        }
        if !(self.alpha > 0.0) || !self.alpha.is_finite() {
            return Err(Error::InvalidHyperParam { name: "alpha", value: self.alpha });
        }
        if !(self.gamma > 0.0) || !self.gamma.is_finite() {
            return Err(Error::InvalidHyperParam { name: "gamma", value: self.gamma });
        }
        if let Some(kappa) = self.kappa {
            if !(kappa >= 0.0) || !kappa.is_finite() {
                return Err(Error::InvalidHyperParam { name: "kappa", value: kappa });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(TransitionOptions::new(10).validate().is_ok());
        assert!(TransitionOptions::new(1).validate().is_err());
        assert!(TransitionOptions::new(10).concentrations(-1.0, 1.0).validate().is_err());
        assert!(TransitionOptions::new(10).concentrations(1.0, f64::NAN).validate().is_err());
        assert!(TransitionOptions::new(10).sticky(-0.5).validate().is_err());
        assert!(TransitionOptions::new(10).sticky(0.0).validate().is_ok());
    }

    #[test]
    fn test_full_matrix_structures() {
        assert!(!Structure::Ergodic.keeps_full_matrix());
        assert!(Structure::LeftToRight.keeps_full_matrix());
        assert!(Structure::SemiMarkov.keeps_full_matrix());
    }
}
