use nalgebra::DVector;
use rand::Rng;
use crate::error::Result;
use crate::params::{BetaPrior, GammaPrior, Structure, TransitionOptions};
use crate::stats::DirConcentration;
use crate::trans::{SweepStats, TransitionModel};

/// Internal iteration count of each concentration auxiliary sampler per sweep.
const CONC_ITERS: usize = 10;

/// Resamples the two concentration hyperparameters of a transition model:
/// `alpha` (row-level mass) from the transition counts weighted by `beta`,
/// and `gamma` (shared-weight concentration) from the table counts.
///
/// The wrapped samplers work in DP scaling, so both values are multiplied by
/// the truncation level on read to undo the weak-limit `1/L` split applied
/// inside the transition models.
#[derive(Debug, Clone)]
pub struct ConcentrationResampler {
    n_states: usize,
    alpha_side: DirConcentration,
    gamma_side: DirConcentration,
}

impl ConcentrationResampler {
    /// Creates both samplers and seeds their concentrations from the priors.
    pub fn new<R: Rng + ?Sized>(
        n_states: usize,
        alpha_prior: GammaPrior,
        gamma_prior: GammaPrior,
        rng: &mut R,
    ) -> Result<Self> {
        Ok(Self {
            n_states,
            alpha_side: DirConcentration::new(n_states, alpha_prior, rng)?,
            gamma_side: DirConcentration::new(n_states, gamma_prior, rng)?,
        })
    }

    /// Weak-limit-scaled `alpha` (or, for sticky models, the total
    /// `alpha + kappa` mass).
    pub fn alpha(&self) -> f64 {
        self.alpha_side.concentration() * self.n_states as f64
    }

    /// Weak-limit-scaled `gamma`.
    pub fn gamma(&self) -> f64 {
        self.gamma_side.concentration() * self.n_states as f64
    }

    /// Updates both concentrations from the artifacts of a finished sweep:
    /// the alpha side first (weighted by `beta`), then the gamma side on the
    /// table counts. Returns the rescaled `(alpha, gamma)` pair.
    pub fn resample<R: Rng + ?Sized>(
        &mut self,
        stats: &SweepStats,
        beta: &DVector<f64>,
        rng: &mut R,
    ) -> Result<(f64, f64)> {
        self.alpha_side.resample(&stats.trans_counts, Some(beta), CONC_ITERS, rng)?;
        self.gamma_side.resample(&stats.m, None, CONC_ITERS, rng)?;
        Ok((self.alpha(), self.gamma()))
    }
}

/// Sticky mass split: `rho` is the fraction of the total `alpha + kappa`
/// mass allocated to the self-transition bias.
#[derive(Debug, Clone, Copy)]
struct RhoSplit {
    prior: BetaPrior,
    value: f64,
}

/// A transition model whose concentration hyperparameters are themselves
/// resampled every sweep.
///
/// Construction runs the concentration samplers once to seed `alpha` and
/// `gamma` (rescaled by the truncation level); every subsequent
/// [`resample`](Self::resample) runs the transition-model sweep first and
/// then feeds that sweep's counts and table counts to the concentration
/// resampler. Sticky variants additionally maintain the mass-split fraction
/// `rho` with a Beta posterior fed by the sweep's `m`/`newm` table split.
///
/// # Example:
/// ```
/// use hdptrans::{CoupledTransitionModel, GammaPrior, Structure};
///
/// let mut rng = rand::thread_rng();
/// let prior = GammaPrior::new(1.0, 1.0).unwrap();
/// let mut model = CoupledTransitionModel::new(
///     4, Structure::Ergodic, prior, prior, &mut rng,
/// ).unwrap();
///
/// assert!(model.alpha() > 0.0 && model.gamma() > 0.0);
/// model.resample(&[vec![0, 1, 2, 1, 3]], &mut rng).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct CoupledTransitionModel {
    model: TransitionModel,
    resampler: ConcentrationResampler,
    rho: Option<RhoSplit>,
}

impl CoupledTransitionModel {
    /// Non-sticky coupled model: `alpha` and `gamma` are seeded from the
    /// concentration priors and resampled every sweep.
    pub fn new<R: Rng + ?Sized>(
        n_states: usize,
        structure: Structure,
        alpha_prior: GammaPrior,
        gamma_prior: GammaPrior,
        rng: &mut R,
    ) -> Result<Self> {
        let resampler = ConcentrationResampler::new(n_states, alpha_prior, gamma_prior, rng)?;
        let mut options = TransitionOptions::new(n_states).structure(structure);
        options.alpha = resampler.alpha();
        options.gamma = resampler.gamma();
        let model = TransitionModel::from_options(options, rng)?;
        Ok(Self { model, resampler, rho: None })
    }

    /// Sticky coupled model, parameterized as in Fox's thesis by the total
    /// mass `alpha + kappa` and the split fraction `rho`: the alpha-side
    /// sampler carries the total mass, `rho` is drawn from its Beta prior at
    /// construction, and `alpha = (1-rho) * mass`, `kappa = rho * mass`.
    pub fn new_sticky<R: Rng + ?Sized>(
        n_states: usize,
        structure: Structure,
        rho_prior: BetaPrior,
        alphakappa_prior: GammaPrior,
        gamma_prior: GammaPrior,
        rng: &mut R,
    ) -> Result<Self> {
        let rho = rho_prior.sample(rng)?;
        let resampler = ConcentrationResampler::new(n_states, alphakappa_prior, gamma_prior, rng)?;
        let mass = resampler.alpha();
        let mut options = TransitionOptions::new(n_states)
            .structure(structure)
            .sticky(rho * mass);
        options.alpha = (1.0 - rho) * mass;
        options.gamma = resampler.gamma();
        let model = TransitionModel::from_options(options, rng)?;
        Ok(Self {
            model,
            resampler,
            rho: Some(RhoSplit { prior: rho_prior, value: rho }),
        })
    }

    /// The wrapped transition model (read surface for `beta`, `A`, `fullA`).
    pub fn model(&self) -> &TransitionModel {
        &self.model
    }

    pub fn alpha(&self) -> f64 {
        self.model.alpha()
    }

    pub fn gamma(&self) -> f64 {
        self.model.gamma()
    }

    pub fn kappa(&self) -> Option<f64> {
        self.model.kappa()
    }

    /// Current sticky mass-split fraction, when this is a sticky model.
    pub fn rho(&self) -> Option<f64> {
        self.rho.map(|split| split.value)
    }

    /// One full sweep: transition-model resample, then concentration
    /// resampling from that sweep's artifacts, then (sticky only) the rho
    /// posterior update and the `alpha`/`kappa` mass re-split.
    pub fn resample<R: Rng + ?Sized>(
        &mut self,
        sequences: &[Vec<usize>],
        rng: &mut R,
    ) -> Result<SweepStats> {
        let stats = self.model.resample(sequences, rng)?;
        let (mass, gamma) = self.resampler.resample(&stats, self.model.beta(), rng)?;

        match &mut self.rho {
            None => {
                self.model.set_concentrations(mass, gamma)?;
            }
            Some(split) => {
                let newm = match &stats.newm {
                    Some(newm) => newm,
                    None => unreachable!("sticky sweeps always produce a table split"),
                };
                let dp_tables = newm.sum();
                let sticky_tables = stats.m.sum() - dp_tables;
                let posterior = BetaPrior::new(
                    split.prior.a + sticky_tables as f64,
                    split.prior.b + dp_tables as f64,
                )?;
                split.value = posterior.sample(rng)?;
                let rho = split.value;
                self.model.set_concentrations((1.0 - rho) * mass, gamma)?;
                self.model.set_kappa(rho * mass)?;
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use statrs::assert_almost_eq;
    use super::*;

    #[test]
    fn test_construction_seeds_positive_concentrations() {
        let mut rng = SmallRng::seed_from_u64(42);
        let prior = GammaPrior::new(1.0, 1.0).unwrap();
        let model = CoupledTransitionModel::new(
            4, Structure::Ergodic, prior, prior, &mut rng,
        ).unwrap();
        assert!(model.alpha() > 0.0);
        assert!(model.gamma() > 0.0);
        assert!(model.rho().is_none());
    }

    #[test]
    fn test_construction_matches_prior_mean() {
        let mut rng = SmallRng::seed_from_u64(42);
        let prior = GammaPrior::new(1.0, 1.0).unwrap();
        let n = 2000;
        let mut total = 0.0;
        for _ in 0..n {
            let model = CoupledTransitionModel::new(
                4, Structure::Ergodic, prior, prior, &mut rng,
            ).unwrap();
            total += model.alpha();
        }
        let mean = total / n as f64;
        // alpha = concentration * L with concentration ~ Gamma(1, 1)
        assert!((mean - 4.0).abs() < 1.0, "empirical mean {} off prior mean 4", mean);
    }

    #[test]
    fn test_resample_updates_hyperparameters() {
        let mut rng = SmallRng::seed_from_u64(42);
        let prior = GammaPrior::new(2.0, 2.0).unwrap();
        let mut model = CoupledTransitionModel::new(
            3, Structure::SemiMarkov, prior, prior, &mut rng,
        ).unwrap();

        let sequences = vec![vec![0, 1, 2, 0, 1, 2, 1, 0]];
        for _ in 0..10 {
            let stats = model.resample(&sequences, &mut rng).unwrap();
            assert!(model.alpha() > 0.0 && model.alpha().is_finite());
            assert!(model.gamma() > 0.0 && model.gamma().is_finite());
            assert!(stats.trans_counts.sum() > 0);
            for i in 0..3 {
                assert_eq!(model.model().a()[(i, i)], 0.0);
            }
        }
    }

    #[test]
    fn test_sticky_coupled_mass_split() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mass_prior = GammaPrior::new(1.0, 0.25).unwrap();
        let gamma_prior = GammaPrior::new(1.0, 1.0).unwrap();
        let rho_prior = BetaPrior::new(5.0, 5.0).unwrap();
        let mut model = CoupledTransitionModel::new_sticky(
            4, Structure::Ergodic, rho_prior, mass_prior, gamma_prior, &mut rng,
        ).unwrap();

        let check_split = |model: &CoupledTransitionModel| {
            let rho = model.rho().unwrap();
            assert!(rho > 0.0 && rho < 1.0);
            let kappa = model.kappa().unwrap();
            let total = model.alpha() + kappa;
            assert_almost_eq!(kappa / total, rho, 1e-8);
        };
        check_split(&model);

        let sequences = vec![vec![0, 0, 1, 1, 2, 2, 3, 3, 0, 1]];
        for _ in 0..10 {
            model.resample(&sequences, &mut rng).unwrap();
            check_split(&model);
        }
    }

    #[test]
    fn test_sticky_left_to_right_composition() {
        let mut rng = SmallRng::seed_from_u64(42);
        let prior = GammaPrior::new(1.0, 1.0).unwrap();
        let rho_prior = BetaPrior::new(2.0, 2.0).unwrap();
        let mut model = CoupledTransitionModel::new_sticky(
            4, Structure::LeftToRight, rho_prior, prior, prior, &mut rng,
        ).unwrap();

        let sequences = vec![vec![0, 0, 1, 2, 2, 3]];
        for _ in 0..5 {
            model.resample(&sequences, &mut rng).unwrap();
            let a = model.model().a();
            for i in 0..4 {
                assert_almost_eq!(a.row(i).iter().sum::<f64>(), 1.0, 1e-8);
                for j in 0..i {
                    assert_eq!(a[(i, j)], 0.0);
                }
            }
        }
    }
}
