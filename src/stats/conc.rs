use nalgebra::{DMatrix, DVector};
use rand::distributions::Distribution;
use rand::Rng;
use statrs::distribution::{Beta, Gamma};
use crate::error::{Error, Result};
use crate::params::GammaPrior;

/// Auxiliary-variable Gibbs sampler for the concentration parameter of a
/// Gamma-compound-Dirichlet (the weak-limit DP concentration), following the
/// Escobar/West and Teh et al. scheme.
///
/// The sampler works in DP scaling: its `concentration` corresponds to the
/// Dirichlet-process mass before the weak-limit `1/K` truncation split, so
/// transition models multiply it by the truncation level `K` when reading it
/// back.
#[derive(Debug, Clone)]
pub struct DirConcentration {
    truncation: usize,
    prior: GammaPrior,
    concentration: f64,
}

impl DirConcentration {
    /// Creates the sampler and seeds the concentration with a prior draw.
    pub fn new<R: Rng + ?Sized>(truncation: usize, prior: GammaPrior, rng: &mut R) -> Result<Self> {
        if truncation == 0 {
            return Err(Error::InvalidHyperParam { name: "truncation", value: 0.0 });
        }
        let concentration = prior.sample(rng)?;
        Ok(Self { truncation, prior, concentration })
    }

    /// Current concentration value (DP scaling, not weak-limit scaling).
    pub fn concentration(&self) -> f64 {
        self.concentration
    }

    /// Resamples the concentration given a matrix of Dirichlet-multinomial
    /// counts, one restaurant per row.
    ///
    /// When the counts are all zero the concentration is simply redrawn from
    /// its Gamma prior (this also serves construction-time seeding).
    /// Otherwise `niter` sweeps are run, each drawing CRP table totals under
    /// the per-column weight `concentration * K * w_j`, the per-restaurant
    /// Beta/Bernoulli auxiliary variables, and finally a new concentration
    /// from its Gamma posterior.
    ///
    /// # Arguments:
    ///
    /// * `counts`: the count matrix (rows are restaurants)
    /// * `weighted_cols`: optional per-column base-measure weights
    ///   (uniform when absent)
    /// * `niter`: number of internal auxiliary sweeps
    /// * `rng`: a random number generator
    pub fn resample<R: Rng + ?Sized>(
        &mut self,
        counts: &DMatrix<u64>,
        weighted_cols: Option<&DVector<f64>>,
        niter: usize,
        rng: &mut R,
    ) -> Result<f64> {
        if counts.sum() == 0 {
            self.concentration = self.prior.sample(rng)?;
            return Ok(self.concentration);
        }

        if let Some(weights) = weighted_cols {
            if weights.len() != counts.ncols() {
                return Err(Error::DimensionMismatch {
                    expected: counts.ncols(),
                    got: weights.len(),
                });
            }
        }

        let row_totals: Vec<u64> = (0..counts.nrows())
            .map(|i| counts.row(i).iter().sum())
            .collect();

        for _ in 0..niter {
            let tables = self.count_tables(counts, weighted_cols, rng)?;

            // Teh et al. auxiliary variables, all w draws before all s draws
            let mut shape = self.prior.shape + tables as f64;
            let mut rate = self.prior.rate;
            for &n in row_totals.iter().filter(|&&n| n > 0) {
                let w = Beta::new(self.concentration + 1.0, n as f64)?.sample(rng);
                if !w.is_finite() || w <= 0.0 {
                    return Err(Error::NumericDomain { context: "concentration aux w", value: w });
                }
                rate -= w.ln();
            }
            for &n in row_totals.iter().filter(|&&n| n > 0) {
                if rng.gen::<f64>() < n as f64 / (n as f64 + self.concentration) {
                    shape -= 1.0;
                }
            }

            if !shape.is_finite() || shape <= 0.0 || !rate.is_finite() || rate <= 0.0 {
                return Err(Error::NumericDomain {
                    context: "concentration posterior parameters",
                    value: if shape <= 0.0 { shape } else { rate },
                });
            }
            let draw = Gamma::new(shape, rate)?.sample(rng);
            if !draw.is_finite() || draw <= 0.0 {
                return Err(Error::NumericDomain { context: "concentration draw", value: draw });
            }
            self.concentration = draw;
        }
        Ok(self.concentration)
    }

    /// Total CRP table count over all cells, with new-table weight
    /// `concentration * K * w_j` for column `j`.
    fn count_tables<R: Rng + ?Sized>(
        &self,
        counts: &DMatrix<u64>,
        weighted_cols: Option<&DVector<f64>>,
        rng: &mut R,
    ) -> Result<u64> {
        let mut tables = 0u64;
        for i in 0..counts.nrows() {
            for j in 0..counts.ncols() {
                let n = counts[(i, j)];
                if n == 0 {
                    continue;
                }
                let col_weight = weighted_cols.map_or(1.0, |w| w[j]);
                let weight = self.concentration * self.truncation as f64 * col_weight;
                if !weight.is_finite() || weight <= 0.0 {
                    return Err(Error::NumericDomain { context: "table weight", value: weight });
                }
                for k in 0..n {
                    if rng.gen::<f64>() < weight / (k as f64 + weight) {
                        tables += 1;
                    }
                }
            }
        }
        Ok(tables)
    }
}
