use itertools::izip;
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use crate::error::{Error, Result};
use crate::params::{Structure, TransitionOptions};
use crate::stats::{
    dirichlet_sample, gamma_row_sample, sticky_table_split, table_counts, SHAPE_FLOOR,
};
use crate::utils::{row_normalize, upper_row_sum, upper_triangular};

/// Per-sweep auxiliary statistics, returned by value from
/// [`TransitionModel::resample`] so downstream hyperparameter updates always
/// consume the artifacts of the sweep they belong to.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepStats {
    /// Observed-plus-augmented transition counts for the sweep.
    pub trans_counts: DMatrix<u64>,
    /// CRP table counts derived from `trans_counts`.
    pub m: DMatrix<u64>,
    /// Sticky variants only: `m` with diagonal entries redrawn to keep the
    /// DP-attributable share; `m - newm` is the sticky-attributable share.
    pub newm: Option<DMatrix<u64>>,
}

/// Transition distribution of a weak-limit HDP-HMM.
///
/// Holds the shared stick-breaking weight vector `beta`, the row-stochastic
/// transition matrix `A` (and, for structural variants, the unconstrained
/// `fullA`), and the concentration hyperparameters. Each call to
/// [`resample`](Self::resample) runs one Gibbs sweep
/// (count, augment, resample beta, resample A) conditioned on the given state
/// sequences and commits the new state only after every draw has been
/// validated.
///
/// Variants are selected by composition rather than layered overrides: the
/// [`Structure`] picks the counting augmentation and the A post-processing,
/// and a `Some(kappa)` in the options selects the sticky self-transition
/// bias.
///
/// # Example:
/// ```
/// use hdptrans::{TransitionModel, TransitionOptions};
///
/// let mut rng = rand::thread_rng();
/// let options = TransitionOptions::new(4);
/// let mut model = TransitionModel::from_options(options, &mut rng).unwrap();
///
/// let sequences = vec![vec![0, 1, 2, 1, 0], vec![2, 3, 3, 1]];
/// model.resample(&sequences, &mut rng).unwrap();
/// assert_eq!(model.a().nrows(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct TransitionModel {
    n_states: usize,
    structure: Structure,
    alpha: f64,
    gamma: f64,
    kappa: Option<f64>,
    beta: DVector<f64>,
    a: DMatrix<f64>,
    full_a: Option<DMatrix<f64>>,
}

impl TransitionModel {
    /// Creates a model and seeds `beta`, `A` (and `fullA`) with a prior-only
    /// sweep, so structural variants see an initialized `fullA` before any
    /// counting-dependent augmentation runs.
    pub fn from_options<R: Rng + ?Sized>(
        options: TransitionOptions, rng: &mut R,
    ) -> Result<Self> {
        options.validate()?;
        let l = options.n_states;
        let mut model = Self {
            n_states: l,
            structure: options.structure,
            alpha: options.alpha,
            gamma: options.gamma,
            kappa: options.kappa,
            beta: DVector::zeros(l),
            a: DMatrix::zeros(l, l),
            full_a: options.structure.keeps_full_matrix().then(|| DMatrix::zeros(l, l)),
        };
        model.resample(&[], rng)?;
        Ok(model)
    }

    /// Creates a model from pre-seeded parameters. Structural variants
    /// require `full_a`; the ergodic variant ignores it.
    pub fn with_params(
        options: TransitionOptions,
        beta: DVector<f64>,
        a: DMatrix<f64>,
        full_a: Option<DMatrix<f64>>,
    ) -> Result<Self> {
        options.validate()?;
        let l = options.n_states;
        if beta.len() != l {
            return Err(Error::DimensionMismatch { expected: l, got: beta.len() });
        }
        if a.nrows() != l || a.ncols() != l {
            return Err(Error::DimensionMismatch { expected: l, got: a.nrows().max(a.ncols()) });
        }
        let full_a = if options.structure.keeps_full_matrix() {
            let full = full_a.ok_or(Error::DimensionMismatch { expected: l, got: 0 })?;
            if full.nrows() != l || full.ncols() != l {
                return Err(Error::DimensionMismatch {
                    expected: l,
                    got: full.nrows().max(full.ncols()),
                });
            }
            Some(full)
        } else {
            None
        };
        Ok(Self {
            n_states: l,
            structure: options.structure,
            alpha: options.alpha,
            gamma: options.gamma,
            kappa: options.kappa,
            beta,
            a,
            full_a,
        })
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    pub fn structure(&self) -> Structure {
        self.structure
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn kappa(&self) -> Option<f64> {
        self.kappa
    }

    /// Shared transition-weight vector (a probability simplex point).
    pub fn beta(&self) -> &DVector<f64> {
        &self.beta
    }

    /// Row-stochastic transition matrix read by downstream state samplers.
    pub fn a(&self) -> &DMatrix<f64> {
        &self.a
    }

    /// Unconstrained row-stochastic matrix kept by the left-to-right and
    /// semi-Markov variants.
    pub fn full_a(&self) -> Option<&DMatrix<f64>> {
        self.full_a.as_ref()
    }

    pub(crate) fn set_concentrations(&mut self, alpha: f64, gamma: f64) -> Result<()> {
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(Error::InvalidHyperParam { name: "alpha", value: alpha });
        }
        if !gamma.is_finite() || gamma <= 0.0 {
            return Err(Error::InvalidHyperParam { name: "gamma", value: gamma });
        }
        self.alpha = alpha;
        self.gamma = gamma;
        Ok(())
    }

    pub(crate) fn set_kappa(&mut self, kappa: f64) -> Result<()> {
        if self.kappa.is_none() {
            return Err(Error::InvalidHyperParam { name: "kappa", value: kappa });
        }
        if !kappa.is_finite() || kappa < 0.0 {
            return Err(Error::InvalidHyperParam { name: "kappa", value: kappa });
        }
        self.kappa = Some(kappa);
        Ok(())
    }

    /// Runs one Gibbs sweep conditioned on the given state sequences and
    /// returns the sweep's auxiliary statistics.
    ///
    /// Sequences shorter than two states contribute nothing; an empty
    /// sequence list yields all-zero counts and the draws fall back to the
    /// prior. For the semi-Markov variant the input is expected to be
    /// run-length collapsed already (no two consecutive equal labels).
    pub fn resample<R: Rng + ?Sized>(
        &mut self,
        sequences: &[Vec<usize>],
        rng: &mut R,
    ) -> Result<SweepStats> {
        let mut trans_counts = self.count_transitions(sequences)?;
        self.augment_counts(&mut trans_counts, rng)?;

        let m = table_counts(&trans_counts, self.alpha, &self.beta, rng)?;
        let newm = match self.kappa {
            Some(kappa) => Some(sticky_table_split(&m, self.alpha, kappa, &self.beta, rng)?),
            None => None,
        };

        let beta = self.resample_beta(newm.as_ref().unwrap_or(&m), rng)?;
        let (a, full_a) = self.resample_a(&trans_counts, &beta, rng)?;

        self.beta = beta;
        self.a = a;
        self.full_a = full_a;

        Ok(SweepStats { trans_counts, m, newm })
    }

    /// Counts adjacent state pairs across all sequences.
    fn count_transitions(&self, sequences: &[Vec<usize>]) -> Result<DMatrix<u64>> {
        let l = self.n_states;
        let mut counts = DMatrix::zeros(l, l);
        for sequence in sequences {
            for &label in sequence {
                if label >= l {
                    return Err(Error::LabelOutOfRange { label, n_states: l });
                }
            }
            for pair in sequence.windows(2) {
                counts[(pair[0], pair[1])] += 1;
            }
        }
        Ok(counts)
    }

    fn augment_counts<R: Rng + ?Sized>(
        &self, counts: &mut DMatrix<u64>, rng: &mut R,
    ) -> Result<()> {
        match (self.structure, self.full_a.as_ref()) {
            (Structure::Ergodic, _) => Ok(()),
            (Structure::SemiMarkov, Some(full_a)) => {
                Self::augment_self_transitions(counts, full_a, rng)
            }
            (Structure::LeftToRight, Some(full_a)) => {
                Self::augment_backward_mass(counts, full_a, rng)
            }
            _ => unreachable!("structural variants are constructed with fullA"),
        }
    }

    /// Explicit-duration augmentation: the run-length collapse hides the
    /// self-transitions, so for each state the total is reconstructed from a
    /// geometric duration model under the current `fullA` diagonal.
    fn augment_self_transitions<R: Rng + ?Sized>(
        counts: &mut DMatrix<u64>, full_a: &DMatrix<f64>, rng: &mut R,
    ) -> Result<()> {
        if counts.sum() == 0 {
            return Ok(());
        }
        let froms: Vec<u64> = (0..counts.nrows())
            .map(|i| counts.row(i).iter().sum())
            .collect();
        for (i, (&from, pi_ii)) in izip!(&froms, full_a.diagonal().iter()).enumerate() {
            if from == 0 || *pi_ii >= 1.0 {
                continue;
            }
            counts[(i, i)] += crate::stats::geometric_total(1.0 - pi_ii, from, rng)?;
        }
        Ok(())
    }

    /// Feed-forward augmentation: observed counts must be upper triangular
    /// (backward transitions are a caller bug); the strictly-lower triangle
    /// is then repopulated with the probability mass the truncation returned
    /// to the forward columns, preserving exchangeability of the underlying
    /// full-Markov sampler.
    fn augment_backward_mass<R: Rng + ?Sized>(
        counts: &mut DMatrix<u64>, full_a: &DMatrix<f64>, rng: &mut R,
    ) -> Result<()> {
        for i in 0..counts.nrows() {
            for j in 0..i {
                if counts[(i, j)] > 0 {
                    return Err(Error::BackwardTransition { from: i, to: j });
                }
            }
        }
        let froms: Vec<u64> = (0..counts.nrows())
            .map(|i| counts.row(i).iter().sum())
            .collect();
        for (i, &from) in froms.iter().enumerate() {
            // forward mass includes the diagonal
            let forward_weight = upper_row_sum(full_a, i).min(1.0);
            let total = crate::stats::geometric_total(forward_weight, from, rng)?;
            if i == 0 || total == 0 {
                continue;
            }
            let backward: Vec<f64> = (0..i).map(|j| full_a[(i, j)]).collect();
            let allocation = crate::stats::multinomial_split(total, &backward, rng)?;
            for (j, &count) in allocation.iter().enumerate() {
                counts[(i, j)] = count;
            }
        }
        Ok(())
    }

    /// Draws `beta ~ Dirichlet(gamma/L + column_sums(m) + floor)`.
    fn resample_beta<R: Rng + ?Sized>(
        &self, m: &DMatrix<u64>, rng: &mut R,
    ) -> Result<DVector<f64>> {
        let l = self.n_states;
        let params = DVector::from_fn(l, |j, _| {
            let col_sum: u64 = m.column(j).iter().sum();
            self.gamma / l as f64 + col_sum as f64 + SHAPE_FLOOR
        });
        dirichlet_sample(&params, rng)
    }

    /// Draws each row of `A` as normalized independent Gamma variates with
    /// shapes `alpha*beta[j] + counts[i][j] (+ kappa on the diagonal) +
    /// floor`, then applies the structural post-processing.
    fn resample_a<R: Rng + ?Sized>(
        &self,
        counts: &DMatrix<u64>,
        beta: &DVector<f64>,
        rng: &mut R,
    ) -> Result<(DMatrix<f64>, Option<DMatrix<f64>>)> {
        let l = self.n_states;
        let mut raw = DMatrix::zeros(l, l);
        for i in 0..l {
            let shapes = DVector::from_fn(l, |j, _| {
                let sticky = match self.kappa {
                    Some(kappa) if i == j => kappa,
                    _ => 0.0,
                };
                self.alpha * beta[j] + counts[(i, j)] as f64 + sticky + SHAPE_FLOOR
            });
            let row = gamma_row_sample(&shapes, rng)?;
            for (j, &value) in row.iter().enumerate() {
                raw[(i, j)] = value;
            }
        }

        match self.structure {
            Structure::Ergodic => {
                let a = row_normalize(raw, "transition rows")?;
                Ok((a, None))
            }
            Structure::SemiMarkov => {
                let full = row_normalize(raw, "full transition rows")?;
                let mut masked = full.clone();
                masked.fill_diagonal(0.0);
                let a = row_normalize(masked, "no-self-transition rows")?;
                Ok((a, Some(full)))
            }
            Structure::LeftToRight => {
                let full = row_normalize(raw, "full transition rows")?;
                let a = row_normalize(upper_triangular(&full), "feed-forward rows")?;
                Ok((a, Some(full)))
            }
        }
    }
}
