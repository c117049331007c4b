
use anyhow::{anyhow, bail};
use nalgebra::{DMatrix, DVector};

/// Numerical tolerance for the active set bookkeeping
const TOLERANCE: f64 = 1e-10;

/// Solves `min ||A x - b||^2` subject to `x >= 0` with the Lawson-Hanson active set
/// method. Deterministic: ties in the gradient pick the lowest column index, so
/// repeated runs on identical inputs return identical solutions.
/// # Arguments
/// * `a` - the design matrix, one row per observation
/// * `b` - the observation vector, length = rows of `a`
/// # Errors
/// * if the dimensions disagree or an inner least squares solve fails
pub fn nnls(a: &DMatrix<f64>, b: &DVector<f64>) -> anyhow::Result<DVector<f64>> {
    let num_cols = a.ncols();
    if a.nrows() != b.len() {
        bail!("design matrix has {} rows but observation vector has {}", a.nrows(), b.len());
    }

    let mut passive = vec![false; num_cols];
    let mut x: DVector<f64> = DVector::zeros(num_cols);

    // each outer iteration moves one column into the passive set, so the loop
    // count is bounded in exact arithmetic; the cap guards against fp stalls
    let max_iterations = 3 * num_cols.max(1);
    for _ in 0..max_iterations {
        // gradient of the objective at the current point
        let w = a.transpose() * (b - a * &x);

        // most-improving column still clamped at zero; lowest index wins ties
        let mut entering: Option<usize> = None;
        for j in (0..num_cols).filter(|&j| !passive[j]) {
            if w[j] > TOLERANCE && entering.map_or(true, |best| w[j] > w[best]) {
                entering = Some(j);
            }
        }
        let entering = match entering {
            Some(j) => j,
            None => return Ok(x)
        };
        passive[entering] = true;

        loop {
            let columns: Vec<usize> = (0..num_cols).filter(|&j| passive[j]).collect();
            if columns.is_empty() {
                break;
            }
            let z = least_squares(&a.select_columns(columns.iter()), b)?;

            if z.iter().all(|&value| value > TOLERANCE) {
                x.fill(0.0);
                for (&j, &value) in columns.iter().zip(z.iter()) {
                    x[j] = value;
                }
                break;
            }

            // step as far toward z as possible without leaving the feasible region
            let mut alpha = f64::INFINITY;
            for (&j, &value) in columns.iter().zip(z.iter()) {
                if value <= TOLERANCE {
                    alpha = alpha.min(x[j] / (x[j] - value));
                }
            }
            for (&j, &value) in columns.iter().zip(z.iter()) {
                x[j] += alpha * (value - x[j]);
            }

            // anything driven to zero leaves the passive set
            for &j in columns.iter() {
                if x[j] <= TOLERANCE {
                    x[j] = 0.0;
                    passive[j] = false;
                }
            }
        }
    }

    Ok(x)
}

/// Unconstrained least squares via SVD
fn least_squares(a: &DMatrix<f64>, b: &DVector<f64>) -> anyhow::Result<DVector<f64>> {
    let svd = a.clone().svd(true, true);
    let solution = svd.solve(b, TOLERANCE)
        .map_err(|message| anyhow!("least squares solve failed: {message}"))?;
    Ok(DVector::from_column_slice(solution.as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;

    #[test]
    fn test_exact_fit() {
        // consistent system with a non-negative exact solution
        let a = DMatrix::from_row_slice(2, 2, &[
            1.0, 0.0,
            1.0, 1.0
        ]);
        let b = DVector::from_column_slice(&[0.8, 0.9]);
        let x = nnls(&a, &b).unwrap();
        assert_approx_eq!(x[0], 0.8);
        assert_approx_eq!(x[1], 0.1);
    }

    #[test]
    fn test_clamps_negative_coefficients() {
        // unconstrained optimum would put the first coefficient below zero
        let a = DMatrix::from_row_slice(2, 2, &[
            1.0, 1.0,
            0.0, 1.0
        ]);
        let b = DVector::from_column_slice(&[0.9, 1.0]);
        let x = nnls(&a, &b).unwrap();
        assert!(x[0] >= 0.0);
        assert!(x[1] >= 0.0);
        // with x0 clamped at 0, x1 fits both rows: min (x1-0.9)^2 + (x1-1.0)^2
        assert!(x[0].abs() < 1e-9);
        assert_approx_eq!(x[1], 0.95);
    }

    #[test]
    fn test_active_set_exchange() {
        // the first column enters early on the tied gradient, then has to leave again
        let a = DMatrix::from_row_slice(2, 2, &[
            1.0, 0.0,
            1.0, 1.0
        ]);
        let b = DVector::from_column_slice(&[0.0, 0.9]);
        let x = nnls(&a, &b).unwrap();
        assert!(x[0].abs() < 1e-9);
        assert_approx_eq!(x[1], 0.9);
    }

    #[test]
    fn test_all_zero_observation() {
        let a = DMatrix::from_row_slice(2, 2, &[
            1.0, 0.0,
            0.0, 1.0
        ]);
        let b = DVector::from_column_slice(&[0.0, 0.0]);
        let x = nnls(&a, &b).unwrap();
        assert_eq!(x, DVector::from_column_slice(&[0.0, 0.0]));
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = DMatrix::from_row_slice(2, 1, &[1.0, 1.0]);
        let b = DVector::from_column_slice(&[1.0, 2.0, 3.0]);
        assert!(nnls(&a, &b).is_err());
    }
}
