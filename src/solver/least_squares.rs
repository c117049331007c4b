/*!
# Bounded least squares strategy
Fits non-negative mixture coefficients by least squares. The fit has no upper bound,
so the coefficients can sum past 1 when lineage profiles share few covered mutations;
that infeasible outcome triggers a repair loop that tries dropping one zero-frequency
mutation at a time, accepting the first refit that is both feasible and still scores
well against the *original* system. A lineage missing a single catalogued mutation in
the sample is the case this rescues.

If no removal qualifies, the infeasible fit is kept and flagged; a poor mixture is
still more useful downstream than an aborted sample.
*/
use log::warn;
use nalgebra::{DMatrix, DVector};

use crate::data_types::abundance::AbundanceEstimate;
use crate::profile::ProfileMatrix;
use crate::solver::round_fraction;
use crate::util::nnls::nnls;

/// Result of one repair attempt over a fitted system
#[derive(Clone, Debug)]
pub struct RepairOutcome {
    /// the accepted coefficients, possibly the unmodified original fit
    pub coefficients: DVector<f64>,
    /// false if the coefficients still sum past 1
    pub feasible: bool
}

/// Runs the least squares strategy over a profile matrix.
/// # Arguments
/// * `profile` - the merged incidence matrix and observed frequencies
/// * `score_floor` - minimum R^2 against the full system for accepting a repair
/// # Errors
/// * if the inner least squares solves fail
pub fn solve(profile: &ProfileMatrix, score_floor: f64) -> anyhow::Result<AbundanceEstimate> {
    let design = design_matrix(profile);
    let observed = DVector::from_column_slice(profile.observed());

    let fit = nnls(&design, &observed)?;
    let outcome = if fit.sum() > 1.0 {
        let repaired = repair_infeasible_fit(&design, &observed, &fit, score_floor)?;
        if !repaired.feasible {
            warn!(
                "Estimated fractions sum to {:.3} > 1 and no repair qualified; reporting the unrepaired fit",
                repaired.coefficients.sum()
            );
        }
        repaired
    } else {
        RepairOutcome { coefficients: fit, feasible: true }
    };

    let fractions = profile.labels().iter()
        .zip(outcome.coefficients.iter())
        .map(|(label, &coefficient)| (label.clone(), round_fraction(coefficient)))
        .collect();
    Ok(AbundanceEstimate::new(fractions, None, !outcome.feasible))
}

/// Tries to repair an infeasible fit by dropping one zero-frequency observation row.
/// Rows are tried in encounter order and the first removal that brings the
/// coefficient sum to <= 1 while keeping R^2 against the original system above the
/// floor wins; identical scores therefore resolve to the lowest row index. When no
/// removal qualifies the original fit is returned with `feasible = false`.
/// # Arguments
/// * `design` - the full design matrix
/// * `observed` - the full observation vector
/// * `fit` - the infeasible coefficients fitted on the full system
/// * `score_floor` - minimum acceptable R^2 of a refit, evaluated on the full system
/// # Errors
/// * if a refit solve fails
pub fn repair_infeasible_fit(
    design: &DMatrix<f64>,
    observed: &DVector<f64>,
    fit: &DVector<f64>,
    score_floor: f64
) -> anyhow::Result<RepairOutcome> {
    for row in 0..design.nrows() {
        if observed[row] != 0.0 {
            continue;
        }

        let reduced_design = design.clone().remove_row(row);
        let reduced_observed = observed.clone().remove_row(row);
        let refit = nnls(&reduced_design, &reduced_observed)?;

        // score against the original system, not the reduced one
        let score = r_squared(design, observed, &refit);
        if refit.sum() <= 1.0 && score > score_floor {
            return Ok(RepairOutcome { coefficients: refit, feasible: true });
        }
    }

    Ok(RepairOutcome { coefficients: fit.clone(), feasible: false })
}

/// Coefficient of determination of a coefficient vector over a system
pub fn r_squared(design: &DMatrix<f64>, observed: &DVector<f64>, coefficients: &DVector<f64>) -> f64 {
    let residual = observed - design * coefficients;
    let ss_res: f64 = residual.iter().map(|r| r * r).sum();
    let mean = observed.mean();
    let ss_tot: f64 = observed.iter().map(|y| (y - mean) * (y - mean)).sum();
    if ss_tot == 0.0 {
        // constant observations: perfect iff the residual vanishes
        return if ss_res < 1e-12 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

fn design_matrix(profile: &ProfileMatrix) -> DMatrix<f64> {
    DMatrix::from_fn(profile.num_mutations(), profile.num_groups(), |row, column| {
        f64::from(profile.profiles()[column][row])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::two_lineage_catalog;
    use crate::data_types::observations::{MutationCounts, SampleObservations};
    use crate::profile::build_profile_matrix;
    use approx_eq::assert_approx_eq;

    fn solve_counts(n501y: (u64, u64), e484k: (u64, u64)) -> AbundanceEstimate {
        let catalog = two_lineage_catalog();
        let observations = SampleObservations::from_iter([
            ("S:N501Y".to_string(), MutationCounts::new(n501y.0, n501y.1)),
            ("S:E484K".to_string(), MutationCounts::new(e484k.0, e484k.1))
        ]);
        let profile = build_profile_matrix(&catalog, &[], &observations, 40, false).unwrap();
        solve(&profile, 0.8).unwrap()
    }

    #[test]
    fn test_exact_two_lineage_mixture() {
        // incidence rows [1,1] and [0,1] with observed [0.8, 0.9] solve exactly
        let estimate = solve_counts((80, 20), (90, 10));
        assert_approx_eq!(estimate.fractions()["LinA"], 0.8);
        assert_approx_eq!(estimate.fractions()["LinB"], 0.1);
        assert!(!estimate.is_infeasible());
        assert!(estimate.fraction_sum() <= 1.0 + 1e-9);
    }

    #[test]
    fn test_absent_lineage() {
        let estimate = solve_counts((0, 100), (90, 10));
        assert!(estimate.fractions()["LinA"].abs() < 1e-9);
        assert_approx_eq!(estimate.fractions()["LinB"], 0.9);
    }

    #[test]
    fn test_unrepairable_infeasible_fit_warns_not_fails() {
        // disjoint unique markers at high frequency: sum = 1.7 with no zero row to drop
        let mut mutations = indexmap::IndexMap::new();
        mutations.insert("S:N501Y".to_string(), indexmap::IndexMap::from([
            ("LinA".to_string(), 1.0), ("LinB".to_string(), 0.0)
        ]));
        mutations.insert("S:E484K".to_string(), indexmap::IndexMap::from([
            ("LinA".to_string(), 0.0), ("LinB".to_string(), 1.0)
        ]));
        let catalog = crate::catalog::LineageCatalog::new(mutations).unwrap();
        let observations = SampleObservations::from_iter([
            ("S:N501Y".to_string(), MutationCounts::new(90, 10)),
            ("S:E484K".to_string(), MutationCounts::new(80, 20))
        ]);
        let profile = build_profile_matrix(&catalog, &[], &observations, 40, false).unwrap();

        let estimate = solve(&profile, 0.8).unwrap();
        assert!(estimate.is_infeasible());
        assert_approx_eq!(estimate.fractions()["LinA"], 0.9);
        assert_approx_eq!(estimate.fractions()["LinB"], 0.8);
    }

    #[test]
    fn test_repair_accepts_zero_row_removal() {
        // six clean observations per marker anchor the fit; the final row couples the
        // two coefficients and drags the full solve to sum > 1, and dropping it
        // restores the exact marker frequencies
        let mut rows = vec![];
        let mut observed = vec![];
        for _ in 0..6 {
            rows.push([1.0, 0.0]);
            observed.push(0.9);
        }
        for _ in 0..6 {
            rows.push([0.0, 1.0]);
            observed.push(0.05);
        }
        rows.push([1.0, -6.0]);
        observed.push(0.0);

        let design = DMatrix::from_fn(rows.len(), 2, |r, c| rows[r][c]);
        let observed = DVector::from_vec(observed);

        let fit = nnls(&design, &observed).unwrap();
        assert!(fit.sum() > 1.0, "test premise: full fit must be infeasible, got {}", fit.sum());

        let outcome = repair_infeasible_fit(&design, &observed, &fit, 0.8).unwrap();
        assert!(outcome.feasible);
        assert_approx_eq!(outcome.coefficients[0], 0.9);
        assert_approx_eq!(outcome.coefficients[1], 0.05);
    }

    #[test]
    fn test_repair_keeps_original_when_no_removal_qualifies() {
        // the only zero row is shared by both groups; removing it inflates the fit
        // further, so the original coefficients come back flagged infeasible
        let design = DMatrix::from_row_slice(3, 2, &[
            1.0, 0.0,
            0.0, 1.0,
            1.0, 1.0
        ]);
        let observed = DVector::from_column_slice(&[0.9, 0.8, 0.0]);
        let fit = DVector::from_column_slice(&[1.2, 1.1]); // synthetic infeasible input

        let outcome = repair_infeasible_fit(&design, &observed, &fit, 0.8).unwrap();
        assert!(!outcome.feasible);
        assert_eq!(outcome.coefficients, fit);
    }

    #[test]
    fn test_r_squared() {
        let design = DMatrix::from_row_slice(2, 1, &[1.0, 1.0]);
        let observed = DVector::from_column_slice(&[1.0, 0.0]);

        // fitted mean gives R^2 = 0 against a two-point spread
        let coefficients = DVector::from_column_slice(&[0.5]);
        assert!(r_squared(&design, &observed, &coefficients).abs() < 1e-9);
    }
}
