/*!
# Linear program strategy
Estimates the mixture by minimizing the summed absolute residual across covered
mutations, with the simplex constraints enforced directly: every group fraction in
[0, 1] and the total at most 1. One slack variable per mutation carries the absolute
residual, so the program is always feasible and no repair loop is needed.

The per-mutation residuals (observed - predicted) come back as a diagnostic; a large
residual flags a mutation no catalogued lineage combination can explain.
*/
use anyhow::Context;
use indexmap::IndexMap;

use crate::data_types::abundance::AbundanceEstimate;
use crate::profile::ProfileMatrix;
use crate::solver::round_fraction;
use crate::util::simplex::{minimize, Constraint, Relation};

/// Runs the linear program strategy over a profile matrix.
/// # Arguments
/// * `profile` - the merged incidence matrix and observed frequencies
/// # Errors
/// * if the simplex solve fails; the program is feasible by construction, so any
///   failure indicates a numerical problem rather than bad input
pub fn solve(profile: &ProfileMatrix) -> anyhow::Result<AbundanceEstimate> {
    let num_groups = profile.num_groups();
    let num_mutations = profile.num_mutations();

    // variables: group fractions c_0..c_{g-1}, then one residual slack per mutation
    let num_vars = num_groups + num_mutations;
    let mut objective = vec![0.0; num_vars];
    for slack in objective[num_groups..].iter_mut() {
        *slack = 1.0;
    }

    let mut constraints = vec![];
    for (m, &observed) in profile.observed().iter().enumerate() {
        let mut row = vec![0.0; num_vars];
        for g in 0..num_groups {
            row[g] = f64::from(profile.profiles()[g][m]);
        }

        // -t_m <= predicted - observed <= t_m
        let mut upper = row.clone();
        upper[num_groups + m] = -1.0;
        constraints.push(Constraint::new(upper, Relation::LessEq, observed));

        let mut lower = row;
        lower[num_groups + m] = 1.0;
        constraints.push(Constraint::new(lower, Relation::GreaterEq, observed));
    }

    // fractions stay on the probability simplex
    let mut total = vec![0.0; num_vars];
    for coefficient in total[..num_groups].iter_mut() {
        *coefficient = 1.0;
    }
    constraints.push(Constraint::new(total, Relation::LessEq, 1.0));

    for g in 0..num_groups {
        let mut bound = vec![0.0; num_vars];
        bound[g] = 1.0;
        constraints.push(Constraint::new(bound, Relation::LessEq, 1.0));
    }

    let solution = minimize(&objective, &constraints)
        .context("Error while solving the abundance linear program:")?;

    let fractions: IndexMap<String, f64> = profile.labels().iter()
        .zip(solution.variables[..num_groups].iter())
        .map(|(label, &fraction)| (label.clone(), round_fraction(fraction)))
        .collect();

    // observed - predicted per mutation
    let residuals: IndexMap<String, f64> = profile.mutations().iter().enumerate()
        .map(|(m, mutation)| {
            let predicted: f64 = (0..num_groups)
                .map(|g| f64::from(profile.profiles()[g][m]) * solution.variables[g])
                .sum();
            (mutation.clone(), profile.observed()[m] - predicted)
        })
        .collect();

    Ok(AbundanceEstimate::new(fractions, Some(residuals), false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::two_lineage_catalog;
    use crate::data_types::observations::{MutationCounts, SampleObservations};
    use crate::profile::build_profile_matrix;
    use approx_eq::assert_approx_eq;

    fn profile_for(n501y: (u64, u64), e484k: (u64, u64)) -> ProfileMatrix {
        let catalog = two_lineage_catalog();
        let observations = SampleObservations::from_iter([
            ("S:N501Y".to_string(), MutationCounts::new(n501y.0, n501y.1)),
            ("S:E484K".to_string(), MutationCounts::new(e484k.0, e484k.1))
        ]);
        build_profile_matrix(&catalog, &[], &observations, 40, false).unwrap()
    }

    #[test]
    fn test_exact_two_lineage_mixture() {
        let estimate = solve(&profile_for((80, 20), (90, 10))).unwrap();
        assert_approx_eq!(estimate.fractions()["LinA"], 0.8);
        assert_approx_eq!(estimate.fractions()["LinB"], 0.1);

        // the exact fit leaves no residual
        for residual in estimate.residuals().unwrap().values() {
            assert!(residual.abs() < 1e-6);
        }
    }

    #[test]
    fn test_absent_lineage() {
        let estimate = solve(&profile_for((0, 100), (90, 10))).unwrap();
        assert!(estimate.fractions()["LinA"].abs() < 1e-9);
        assert_approx_eq!(estimate.fractions()["LinB"], 0.9);
    }

    #[test]
    fn test_simplex_membership() {
        // conflicting high frequencies cannot push the total past 1 here,
        // unlike the least squares strategy
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

        let estimate = solve(&profile).unwrap();
        assert!(estimate.fraction_sum() <= 1.0 + 1e-6);
        for &fraction in estimate.fractions().values() {
            assert!(fraction >= -1e-9);
        }
        assert!(!estimate.is_infeasible());

        // the unexplainable mass shows up as residual instead
        let residual_total: f64 = estimate.residuals().unwrap().values().map(|r| r.abs()).sum();
        assert_approx_eq!(residual_total, 0.7);
    }

    #[test]
    fn test_determinism() {
        let profile = profile_for((55, 45), (70, 30));
        let first = solve(&profile).unwrap();
        let second = solve(&profile).unwrap();
        assert_eq!(first, second);
    }
}
