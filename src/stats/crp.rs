use nalgebra::{DMatrix, DVector};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use statrs::distribution::{Binomial, Geometric};
use crate::error::{Error, Result};

/// Chinese-Restaurant-Process table-count augmentation (Antoniak's formula).
///
/// For each cell with count `n`, runs `n` Bernoulli trials with success
/// probability `w / (k + w)` for `k = 0..n-1` where `w = alpha * beta[j]`,
/// and records the number of successes (new tables). Cells are visited in
/// row-major order and each cell's trial sequence is drawn in increasing `k`;
/// this draw order is part of the reproducibility contract.
///
/// The first trial of a nonempty cell always succeeds, so `m[(i, j)] == 0`
/// exactly when `trans_counts[(i, j)] == 0`.
pub fn table_counts<R: Rng + ?Sized>(
    trans_counts: &DMatrix<u64>,
    alpha: f64,
    beta: &DVector<f64>,
    rng: &mut R,
) -> Result<DMatrix<u64>> {
    let mut m = DMatrix::zeros(trans_counts.nrows(), trans_counts.ncols());
    if trans_counts.sum() == 0 {
        return Ok(m);
    }

    for i in 0..trans_counts.nrows() {
        for j in 0..trans_counts.ncols() {
            let n = trans_counts[(i, j)];
            if n == 0 {
                continue;
            }
            let weight = alpha * beta[j];
            if !weight.is_finite() || weight <= 0.0 {
                return Err(Error::NumericDomain { context: "table weight", value: weight });
            }
            let mut tables = 0;
            for k in 0..n {
                if rng.gen::<f64>() < weight / (k as f64 + weight) {
                    tables += 1;
                }
            }
            m[(i, j)] = tables;
        }
    }
    Ok(m)
}

/// Splits the diagonal of a table-count matrix between DP-attributable and
/// sticky-attributable tables.
///
/// Each nonzero diagonal entry is redrawn as
/// `Binomial(m_ii, beta_i * alpha / (beta_i * alpha + kappa))`; the result is
/// the DP share, and `m - newm` (nonzero only on the diagonal) is the share
/// owed to the sticky mass `kappa`. Off-diagonal entries pass through.
pub fn sticky_table_split<R: Rng + ?Sized>(
    m: &DMatrix<u64>,
    alpha: f64,
    kappa: f64,
    beta: &DVector<f64>,
    rng: &mut R,
) -> Result<DMatrix<u64>> {
    let mut newm = m.clone();
    if m.sum() == 0 {
        return Ok(newm);
    }

    for i in 0..m.nrows().min(m.ncols()) {
        let n = m[(i, i)];
        if n == 0 {
            continue;
        }
        let weight = beta[i] * alpha;
        let p = weight / (weight + kappa);
        if !p.is_finite() || p < 0.0 || p > 1.0 {
            return Err(Error::NumericDomain { context: "sticky split probability", value: p });
        }
        newm[(i, i)] = Binomial::new(p, n)?.sample(rng) as u64;
    }
    Ok(newm)
}

/// Sum of `n` independent Geometric(`p`) draws, with support starting at 1
/// (the numpy convention). Returns 0 when `n == 0`.
pub fn geometric_total<R: Rng + ?Sized>(p: f64, n: u64, rng: &mut R) -> Result<u64> {
    if n == 0 {
        return Ok(0);
    }
    if !p.is_finite() || p <= 0.0 || p > 1.0 {
        return Err(Error::NumericDomain { context: "geometric success probability", value: p });
    }
    if p == 1.0 {
        // every draw is exactly one trial
        return Ok(n);
    }
    let geo = Geometric::new(p)?;
    let mut total = 0u64;
    for _ in 0..n {
        let draw = geo.sample(rng);
        if !draw.is_finite() || draw < 1.0 {
            return Err(Error::NumericDomain { context: "geometric draw", value: draw });
        }
        total += draw as u64;
    }
    Ok(total)
}

/// Allocates `total` counts among categories with the given unnormalized
/// weights (a multinomial draw via repeated categorical sampling).
pub fn multinomial_split<R: Rng + ?Sized>(
    total: u64, weights: &[f64], rng: &mut R,
) -> Result<Vec<u64>> {
    let mut out = vec![0u64; weights.len()];
    if total == 0 || weights.is_empty() {
        return Ok(out);
    }
    for &w in weights {
        if !w.is_finite() || w < 0.0 {
            return Err(Error::NumericDomain { context: "multinomial weight", value: w });
        }
    }
    let index = WeightedIndex::new(weights.iter().cloned()).map_err(|_| {
        Error::NumericDomain {
            context: "multinomial weight total",
            value: weights.iter().sum(),
        }
    })?;
    for _ in 0..total {
        out[index.sample(rng)] += 1;
    }
    Ok(out)
}
