use nalgebra::DVector;
use rand::distributions::Distribution;
use rand::Rng;
use statrs::distribution::{Dirichlet, Gamma};
use crate::error::{Error, Result};

/// Additive floor applied to every Dirichlet/Gamma shape parameter in the
/// transition resampling pipeline. A fixed numerical smoothing constant, not
/// a modeling choice.
pub const SHAPE_FLOOR: f64 = 1e-2;

/// Draws a point on the probability simplex from a Dirichlet distribution.
///
/// Every shape parameter must be positive and finite; the returned vector is
/// validated entry-wise so an invalid draw surfaces immediately as
/// [`Error::NumericDomain`] instead of flowing downstream.
///
/// # Arguments:
///
/// * `params`: the Dirichlet shape parameters (length >= 2)
/// * `rng`: a random number generator
///
/// # Returns:
///
/// A nonnegative vector of the same length summing to one.
pub fn dirichlet_sample<R: Rng + ?Sized>(
    params: &DVector<f64>, rng: &mut R,
) -> Result<DVector<f64>> {
    for &p in params.iter() {
        if !p.is_finite() || p <= 0.0 {
            return Err(Error::NumericDomain { context: "dirichlet shape", value: p });
        }
    }

    let dir = Dirichlet::new(params.iter().cloned().collect())?;
    let draw = dir.sample(rng);
    let out = DVector::from_iterator(params.len(), draw.iter().cloned());

    let mut total = 0.0;
    for &v in out.iter() {
        if !v.is_finite() || v < 0.0 {
            return Err(Error::NumericDomain { context: "dirichlet draw", value: v });
        }
        total += v;
    }
    if (total - 1.0).abs() > 1e-8 {
        return Err(Error::NumericDomain { context: "dirichlet draw sum", value: total });
    }
    Ok(out)
}

/// Draws a vector of independent Gamma(shape, 1) variates.
///
/// Left unnormalized on purpose: structural variants mask entries before
/// renormalizing, and normalized independent Gamma draws with a shared scale
/// are distributionally equal to a Dirichlet draw.
pub fn gamma_row_sample<R: Rng + ?Sized>(
    shapes: &DVector<f64>, rng: &mut R,
) -> Result<DVector<f64>> {
    let mut out = DVector::zeros(shapes.len());
    for (o, &shape) in out.iter_mut().zip(shapes.iter()) {
        if !shape.is_finite() || shape <= 0.0 {
            return Err(Error::NumericDomain { context: "gamma shape", value: shape });
        }
        let value = Gamma::new(shape, 1.0)?.sample(rng);
        if !value.is_finite() || value < 0.0 {
            return Err(Error::NumericDomain { context: "gamma draw", value });
        }
        *o = value;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use nalgebra::DVector;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use statrs::assert_almost_eq;
    use super::*;

    #[test]
    fn test_dirichlet_sample_simplex() {
        let mut rng = SmallRng::seed_from_u64(42);
        let params = DVector::from_vec(vec![0.51, 1.01, 3.01, 2.01]);
        for _ in 0..50 {
            let draw = dirichlet_sample(&params, &mut rng).unwrap();
            assert_almost_eq!(draw.iter().sum::<f64>(), 1.0, 1e-8);
            assert!(draw.iter().all(|&v| v >= 0.0));
        }
    }

    #[test]
    fn test_dirichlet_sample_rejects_bad_shape() {
        let mut rng = SmallRng::seed_from_u64(42);
        let params = DVector::from_vec(vec![1.0, 0.0, 1.0]);
        assert!(dirichlet_sample(&params, &mut rng).is_err());
        let params = DVector::from_vec(vec![1.0, f64::NAN, 1.0]);
        assert!(dirichlet_sample(&params, &mut rng).is_err());
    }

    #[test]
    fn test_gamma_row_sample() {
        let mut rng = SmallRng::seed_from_u64(42);
        let shapes = DVector::from_vec(vec![0.5, 1.0, 10.0]);
        let row = gamma_row_sample(&shapes, &mut rng).unwrap();
        assert!(row.iter().all(|&v| v >= 0.0 && v.is_finite()));
        assert!(gamma_row_sample(&DVector::from_vec(vec![1.0, -1.0]), &mut rng).is_err());
    }
}
