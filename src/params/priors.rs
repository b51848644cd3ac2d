use rand::distributions::Distribution;
use rand::Rng;
use statrs::distribution::{Beta, Gamma};
#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};

/// Shape/rate pair of a Gamma prior over a concentration parameter.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GammaPrior {
    pub shape: f64,
    pub rate: f64,
}

impl GammaPrior {
    pub fn new(shape: f64, rate: f64) -> Result<Self> {
        if !(shape > 0.0) || !shape.is_finite() {
            return Err(Error::InvalidHyperParam { name: "shape", value: shape });
        }
        if !(rate > 0.0) || !rate.is_finite() {
            return Err(Error::InvalidHyperParam { name: "rate", value: rate });
        }
        Ok(Self { shape, rate })
    }

    /// Analytic mean `shape / rate` of the prior.
    pub fn mean(&self) -> f64 {
        self.shape / self.rate
    }

    /// Draws a concentration value from the prior.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        let value = Gamma::new(self.shape, self.rate)?.sample(rng);
        if !value.is_finite() || value <= 0.0 {
            return Err(Error::NumericDomain { context: "gamma prior draw", value });
        }
        Ok(value)
    }
}

/// Shape pair of a Beta prior, used for the sticky mass fraction `rho`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetaPrior {
    pub a: f64,
    pub b: f64,
}

impl BetaPrior {
    pub fn new(a: f64, b: f64) -> Result<Self> {
        if !(a > 0.0) || !a.is_finite() {
            return Err(Error::InvalidHyperParam { name: "a", value: a });
        }
        if !(b > 0.0) || !b.is_finite() {
            return Err(Error::InvalidHyperParam { name: "b", value: b });
        }
        Ok(Self { a, b })
    }

    /// Draws a fraction from the prior, rejecting degenerate endpoint values.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        let value = Beta::new(self.a, self.b)?.sample(rng);
        if !value.is_finite() || value <= 0.0 || value >= 1.0 {
            return Err(Error::NumericDomain { context: "beta prior draw", value });
        }
        Ok(value)
    }
}
