/*!
# Dense two-phase simplex
A small, deterministic linear program solver for the abundance estimation problems,
which involve at most a few hundred variables and constraints. All variables are
implicitly non-negative; upper bounds are expressed as explicit constraints.

Pivot selection uses Bland's rule, so the solver cannot cycle and identical inputs
always produce identical solutions.
*/

/// Numerical tolerance for pivot and feasibility checks
const TOLERANCE: f64 = 1e-9;
/// Hard cap on pivots; Bland's rule terminates well before this on our problem sizes
const MAX_PIVOTS: usize = 10_000;

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum SimplexError {
    #[error("linear program has no feasible solution")]
    Infeasible,
    #[error("linear program is unbounded")]
    Unbounded,
    #[error("pivot limit exceeded")]
    PivotLimit
}

/// Which way a constraint row binds
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Relation {
    LessEq,
    GreaterEq,
    Equal
}

/// One linear constraint `coefficients . x [relation] rhs`
#[derive(Clone, Debug)]
pub struct Constraint {
    pub coefficients: Vec<f64>,
    pub relation: Relation,
    pub rhs: f64
}

impl Constraint {
    pub fn new(coefficients: Vec<f64>, relation: Relation, rhs: f64) -> Self {
        Self { coefficients, relation, rhs }
    }
}

/// An optimal solution to a linear program
#[derive(Clone, Debug)]
pub struct Solution {
    /// optimal values for the structural variables, in input order
    pub variables: Vec<f64>,
    /// objective value at the optimum
    pub objective: f64
}

/// Minimizes `objective . x` subject to the constraints and `x >= 0`.
/// # Arguments
/// * `objective` - cost coefficient per structural variable
/// * `constraints` - the constraint rows; coefficient vectors must match the objective length
/// # Errors
/// * if the program is infeasible or unbounded, or the pivot cap is hit
pub fn minimize(objective: &[f64], constraints: &[Constraint]) -> Result<Solution, SimplexError> {
    let num_vars = objective.len();
    let num_rows = constraints.len();

    // normalize rows so every right-hand side is non-negative
    let mut rows: Vec<(Vec<f64>, Relation, f64)> = constraints.iter()
        .map(|c| {
            assert_eq!(c.coefficients.len(), num_vars, "constraint width must match the objective");
            if c.rhs < 0.0 {
                let flipped = match c.relation {
                    Relation::LessEq => Relation::GreaterEq,
                    Relation::GreaterEq => Relation::LessEq,
                    Relation::Equal => Relation::Equal
                };
                (c.coefficients.iter().map(|&v| -v).collect(), flipped, -c.rhs)
            } else {
                (c.coefficients.clone(), c.relation, c.rhs)
            }
        })
        .collect();

    // column layout: structural vars, then one slack/surplus per inequality,
    // then one artificial per >= or == row
    let num_slacks = rows.iter().filter(|(_c, rel, _r)| *rel != Relation::Equal).count();
    let num_artificials = rows.iter().filter(|(_c, rel, _r)| *rel != Relation::LessEq).count();
    let total_cols = num_vars + num_slacks + num_artificials;

    let mut tableau: Vec<Vec<f64>> = vec![vec![0.0; total_cols + 1]; num_rows];
    let mut basis: Vec<usize> = vec![0; num_rows];
    let mut slack_idx = num_vars;
    let mut artificial_idx = num_vars + num_slacks;
    let artificial_start = num_vars + num_slacks;

    for (i, (coefficients, relation, rhs)) in rows.drain(..).enumerate() {
        tableau[i][..num_vars].copy_from_slice(&coefficients);
        tableau[i][total_cols] = rhs;
        match relation {
            Relation::LessEq => {
                tableau[i][slack_idx] = 1.0;
                basis[i] = slack_idx;
                slack_idx += 1;
            },
            Relation::GreaterEq => {
                tableau[i][slack_idx] = -1.0;
                slack_idx += 1;
                tableau[i][artificial_idx] = 1.0;
                basis[i] = artificial_idx;
                artificial_idx += 1;
            },
            Relation::Equal => {
                tableau[i][artificial_idx] = 1.0;
                basis[i] = artificial_idx;
                artificial_idx += 1;
            }
        }
    }

    // phase 1: minimize the sum of artificials to find a feasible basis
    if num_artificials > 0 {
        let mut phase1_cost = vec![0.0; total_cols];
        for cost in phase1_cost[artificial_start..].iter_mut() {
            *cost = 1.0;
        }
        optimize(&mut tableau, &mut basis, &phase1_cost)?;

        let phase1_objective: f64 = basis.iter().enumerate()
            .filter(|(_i, &b)| b >= artificial_start)
            .map(|(i, _b)| tableau[i][total_cols])
            .sum();
        if phase1_objective > TOLERANCE {
            return Err(SimplexError::Infeasible);
        }

        // drive any degenerate artificials out of the basis before phase 2
        for i in 0..num_rows {
            if basis[i] >= artificial_start {
                let pivot_col = (0..artificial_start).find(|&j| tableau[i][j].abs() > TOLERANCE);
                if let Some(j) = pivot_col {
                    pivot(&mut tableau, &mut basis, i, j);
                }
                // rows with no eligible column are redundant and stay at zero
            }
        }
    }

    // phase 2: minimize the real objective with the artificial columns frozen out
    let mut phase2_cost = vec![0.0; total_cols];
    phase2_cost[..num_vars].copy_from_slice(objective);
    optimize_bounded(&mut tableau, &mut basis, &phase2_cost, artificial_start)?;

    let mut variables = vec![0.0; num_vars];
    for (i, &b) in basis.iter().enumerate() {
        if b < num_vars {
            variables[b] = tableau[i][total_cols];
        }
    }
    let objective_value = objective.iter().zip(variables.iter()).map(|(c, x)| c * x).sum();
    Ok(Solution { variables, objective: objective_value })
}

fn optimize(tableau: &mut [Vec<f64>], basis: &mut [usize], cost: &[f64]) -> Result<(), SimplexError> {
    optimize_bounded(tableau, basis, cost, cost.len())
}

/// Runs simplex iterations, only considering entering columns below `col_limit`
fn optimize_bounded(
    tableau: &mut [Vec<f64>], basis: &mut [usize], cost: &[f64], col_limit: usize
) -> Result<(), SimplexError> {
    let rhs_col = cost.len();

    for _ in 0..MAX_PIVOTS {
        // reduced costs from the current basis; Bland's rule takes the first negative
        let entering = (0..col_limit).find(|&j| {
            let reduced: f64 = cost[j] - basis.iter().enumerate()
                .map(|(i, &b)| cost[b] * tableau[i][j])
                .sum::<f64>();
            reduced < -TOLERANCE
        });
        let entering = match entering {
            Some(j) => j,
            None => return Ok(())
        };

        // ratio test; ties take the lowest basis index, completing Bland's rule
        let mut leaving: Option<usize> = None;
        let mut best_ratio = f64::INFINITY;
        for (i, row) in tableau.iter().enumerate() {
            if row[entering] > TOLERANCE {
                let ratio = row[rhs_col] / row[entering];
                if ratio < best_ratio - TOLERANCE
                    || (ratio < best_ratio + TOLERANCE && leaving.is_some_and(|l| basis[i] < basis[l]))
                {
                    best_ratio = ratio;
                    leaving = Some(i);
                }
            }
        }
        let leaving = match leaving {
            Some(i) => i,
            None => return Err(SimplexError::Unbounded)
        };

        pivot(tableau, basis, leaving, entering);
    }

    Err(SimplexError::PivotLimit)
}

/// Gaussian elimination step making `column` basic in `row`
fn pivot(tableau: &mut [Vec<f64>], basis: &mut [usize], row: usize, column: usize) {
    let pivot_value = tableau[row][column];
    for value in tableau[row].iter_mut() {
        *value /= pivot_value;
    }
    for i in 0..tableau.len() {
        if i != row && tableau[i][column].abs() > 0.0 {
            let factor = tableau[i][column];
            for j in 0..tableau[i].len() {
                tableau[i][j] -= factor * tableau[row][j];
            }
        }
    }
    basis[row] = column;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;

    #[test]
    fn test_basic_maximization() {
        // max x0 + x1 (as min of the negation) s.t. x0 + x1 <= 1, x0 <= 0.6
        let solution = minimize(&[-1.0, -1.0], &[
            Constraint::new(vec![1.0, 1.0], Relation::LessEq, 1.0),
            Constraint::new(vec![1.0, 0.0], Relation::LessEq, 0.6)
        ]).unwrap();
        assert_approx_eq!(solution.objective, -1.0);
        assert_approx_eq!(solution.variables[0] + solution.variables[1], 1.0);
    }

    #[test]
    fn test_greater_equal_and_equality() {
        // min x0 s.t. x0 >= 3
        let solution = minimize(&[1.0], &[
            Constraint::new(vec![1.0], Relation::GreaterEq, 3.0)
        ]).unwrap();
        assert_approx_eq!(solution.variables[0], 3.0);

        // min x0 + x1 s.t. x0 + x1 = 2, x0 >= 0.5
        let solution = minimize(&[1.0, 1.0], &[
            Constraint::new(vec![1.0, 1.0], Relation::Equal, 2.0),
            Constraint::new(vec![1.0, 0.0], Relation::GreaterEq, 0.5)
        ]).unwrap();
        assert_approx_eq!(solution.objective, 2.0);
    }

    #[test]
    fn test_negative_rhs_normalization() {
        // x0 - x1 <= -1 is x1 - x0 >= 1
        let solution = minimize(&[0.0, 1.0], &[
            Constraint::new(vec![1.0, -1.0], Relation::LessEq, -1.0)
        ]).unwrap();
        assert_approx_eq!(solution.variables[1] - solution.variables[0], 1.0);
    }

    #[test]
    fn test_infeasible() {
        let result = minimize(&[1.0], &[
            Constraint::new(vec![1.0], Relation::LessEq, 1.0),
            Constraint::new(vec![1.0], Relation::GreaterEq, 2.0)
        ]);
        assert_eq!(result.unwrap_err(), SimplexError::Infeasible);
    }

    #[test]
    fn test_unbounded() {
        let result = minimize(&[-1.0], &[
            Constraint::new(vec![0.0], Relation::LessEq, 1.0)
        ]);
        assert_eq!(result.unwrap_err(), SimplexError::Unbounded);
    }

    #[test]
    fn test_absolute_residual_pattern() {
        // the solver's production shape: minimize |x0 - 0.8| via a slack pair
        // vars: c, t; min t s.t. c - t <= 0.8, c + t >= 0.8, c <= 0.6
        let solution = minimize(&[0.0, 1.0], &[
            Constraint::new(vec![1.0, -1.0], Relation::LessEq, 0.8),
            Constraint::new(vec![1.0, 1.0], Relation::GreaterEq, 0.8),
            Constraint::new(vec![1.0, 0.0], Relation::LessEq, 0.6)
        ]).unwrap();
        assert_approx_eq!(solution.variables[0], 0.6);
        assert_approx_eq!(solution.objective, 0.2);
    }
}
