
/// Bounded least squares strategy with the infeasibility repair loop
pub mod least_squares;
/// Exact mixture strategy via a slack-minimizing linear program
pub mod linear_program;

use derive_builder::Builder;

use crate::data_types::abundance::AbundanceEstimate;
use crate::profile::ProfileMatrix;

/// The two interchangeable estimation strategies
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, clap::ValueEnum, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum SolverStrategy {
    /// minimize the summed absolute residual with an exact simplex solve
    #[default]
    LinearProgram,
    /// non-negative least squares with best-effort repair when the mixture exceeds 1
    LeastSquares
}

/// Controls the abundance estimation step
#[derive(Builder, Clone, Copy, Debug)]
pub struct SolverConfig {
    /// which estimation strategy to run
    #[builder(default)]
    strategy: SolverStrategy,
    /// minimum coefficient of determination for accepting a repaired least squares fit
    #[builder(default = "0.8")]
    score_floor: f64
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { strategy: SolverStrategy::default(), score_floor: 0.8 }
    }
}

impl SolverConfig {
    pub fn strategy(&self) -> SolverStrategy {
        self.strategy
    }

    pub fn score_floor(&self) -> f64 {
        self.score_floor
    }
}

/// Estimates per-group mixture fractions for one sample's profile matrix.
/// # Arguments
/// * `profile` - the merged incidence matrix and observed frequencies
/// * `config` - strategy selection and repair parameters
/// # Errors
/// * if the underlying numerical solve fails; never for merely poor fits
pub fn solve_abundances(profile: &ProfileMatrix, config: SolverConfig) -> anyhow::Result<AbundanceEstimate> {
    match config.strategy() {
        SolverStrategy::LeastSquares => least_squares::solve(profile, config.score_floor()),
        SolverStrategy::LinearProgram => linear_program::solve(profile)
    }
}

/// Fractions are reported to 3 decimal places
pub(crate) fn round_fraction(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
