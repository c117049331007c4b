
use indexmap::IndexMap;

/// The solved mixture for one sample: merged-group labels mapped to fractions.
/// Fractions are pre-rounded to 3 decimal places by the solvers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AbundanceEstimate {
    /// merged lineage group label -> estimated fraction of the sample
    fractions: IndexMap<String, f64>,
    /// per-mutation residual (observed - predicted), reported by the linear program strategy
    residuals: Option<IndexMap<String, f64>>,
    /// true if the least squares strategy had to keep a fit with sum(fractions) > 1
    infeasible: bool
}

impl AbundanceEstimate {
    pub fn new(fractions: IndexMap<String, f64>, residuals: Option<IndexMap<String, f64>>, infeasible: bool) -> Self {
        Self { fractions, residuals, infeasible }
    }

    pub fn fractions(&self) -> &IndexMap<String, f64> {
        &self.fractions
    }

    pub fn residuals(&self) -> Option<&IndexMap<String, f64>> {
        self.residuals.as_ref()
    }

    pub fn is_infeasible(&self) -> bool {
        self.infeasible
    }

    /// Sum of all estimated fractions; at most 1 + numerical tolerance for feasible fits
    pub fn fraction_sum(&self) -> f64 {
        self.fractions.values().sum()
    }
}
