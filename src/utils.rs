use nalgebra::DMatrix;
use crate::error::{Error, Result};

/// Returns a copy of the matrix with the strictly-lower triangle zeroed
/// (the diagonal is kept).
///
/// # Example:
/// ```
/// use nalgebra::DMatrix;
/// use hdptrans::utils::upper_triangular;
///
/// let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
/// let u = upper_triangular(&m);
/// assert_eq!(u[(1, 0)], 0.0);
/// assert_eq!(u[(1, 1)], 4.0);
/// ```
pub fn upper_triangular(m: &DMatrix<f64>) -> DMatrix<f64> {
    let mut out = m.clone();
    for i in 0..out.nrows() {
        for j in 0..i.min(out.ncols()) {
            out[(i, j)] = 0.0;
        }
    }
    out
}

/// Sum of row `i` restricted to columns `i..` (diagonal included).
pub fn upper_row_sum(m: &DMatrix<f64>, i: usize) -> f64 {
    (i..m.ncols()).map(|j| m[(i, j)]).sum()
}

/// Normalizes each row of the matrix to sum to one.
///
/// Fails with [`Error::NumericDomain`] when a row sum is non-positive or not
/// finite, so a degenerate draw is surfaced at the point of violation rather
/// than propagated as an invalid probability row.
pub fn row_normalize(mut m: DMatrix<f64>, context: &'static str) -> Result<DMatrix<f64>> {
    for i in 0..m.nrows() {
        let total: f64 = m.row(i).iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(Error::NumericDomain { context, value: total });
        }
        for j in 0..m.ncols() {
            m[(i, j)] /= total;
        }
    }
    Ok(m)
}
