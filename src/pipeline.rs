/*!
# Per-Sample Pipeline
Ties the stages together for one sample: expand the catalog mutations to SNV
hypotheses, pull observed counts, build the merged profile matrix, and estimate the
mixture. The catalog, reference, and parsed mutation list are shared read-only, so
one `Pipeline` serves every sample in a batch concurrently.

A sample with no adequately covered mutation is not an error; it is reported as
`None` and the batch continues without it.
*/
use anyhow::{bail, Context};
use derive_builder::Builder;
use log::{debug, info};

use crate::catalog::LineageCatalog;
use crate::data_types::abundance::AbundanceEstimate;
use crate::data_types::mutations::Mutation;
use crate::data_types::observations::SampleObservations;
use crate::extract::{extract_observations, PositionCounter};
use crate::profile::{build_profile_matrix, ProfileError};
use crate::reference::ReferenceGenome;
use crate::solver::{solve_abundances, SolverConfig};
use crate::translate::expand_to_snvs;

/// Knobs shared by every sample in a batch
#[derive(Builder, Clone, Debug)]
pub struct PipelineConfig {
    /// minimum total depth for a mutation to count as covered
    #[builder(default = "40")]
    min_depth: u64,
    /// restrict estimation to mutations carried by exactly one candidate lineage
    #[builder(default)]
    unique_only: bool,
    /// catalog mutations to leave out entirely
    #[builder(default)]
    excluded_mutations: Vec<String>,
    /// restrict the mutation list to the markers of one lineage
    #[builder(default)]
    lineage_focus: Option<String>,
    /// abundance estimation strategy and parameters
    #[builder(default)]
    solver: SolverConfig
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_depth: 40,
            unique_only: false,
            excluded_mutations: vec![],
            lineage_focus: None,
            solver: SolverConfig::default()
        }
    }
}

/// The estimate for one successfully processed sample
#[derive(Clone, Debug)]
pub struct SampleResult {
    name: String,
    estimate: AbundanceEstimate,
    /// number of catalog mutations that met the depth filter
    covered: usize
}

impl SampleResult {
    pub(crate) fn new(name: String, estimate: AbundanceEstimate, covered: usize) -> Self {
        Self { name, estimate, covered }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn estimate(&self) -> &AbundanceEstimate {
        &self.estimate
    }

    pub fn covered(&self) -> usize {
        self.covered
    }
}

/// Raw per-mutation observations for one sample, from the mutation scan
#[derive(Clone, Debug)]
pub struct MutantScan {
    name: String,
    observations: SampleObservations
}

impl MutantScan {
    pub(crate) fn new(name: String, observations: SampleObservations) -> Self {
        Self { name, observations }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn observations(&self) -> &SampleObservations {
        &self.observations
    }
}

/// Shared, immutable state for deconvoluting a batch of samples
#[derive(Clone, Debug)]
pub struct Pipeline {
    catalog: LineageCatalog,
    reference: ReferenceGenome,
    /// catalog mutations minus the exclusions, parsed once up front
    mutations: Vec<(String, Mutation)>,
    /// lineages to solve over; empty means the full catalog set
    candidate_lineages: Vec<String>,
    config: PipelineConfig
}

impl Pipeline {
    /// Builds the shared pipeline state, validating all inputs up front so that
    /// per-sample failures can only come from the sample itself.
    /// # Arguments
    /// * `catalog` - the loaded lineage catalog
    /// * `reference` - the loaded reference genome with gene annotations
    /// * `candidate_lineages` - lineages to solve over; empty means all in the catalog
    /// * `config` - batch-wide parameters
    /// # Errors
    /// * if a candidate lineage is missing from the catalog
    /// * if a catalog mutation fails to parse or translate
    /// * if the exclusions leave no mutations to work with
    pub fn new(
        catalog: LineageCatalog,
        reference: ReferenceGenome,
        candidate_lineages: Vec<String>,
        config: PipelineConfig
    ) -> anyhow::Result<Self> {
        for lineage in candidate_lineages.iter() {
            if !catalog.contains_lineage(lineage) {
                bail!("Requested lineage {lineage:?} is not in the catalog");
            }
        }

        for excluded in config.excluded_mutations.iter() {
            if !catalog.mutation_names().any(|name| name == excluded) {
                info!("Excluded mutation {excluded:?} is not in the catalog; ignoring");
            }
        }

        let focus: Option<Vec<String>> = match config.lineage_focus.as_deref() {
            Some(lineage) => {
                if !catalog.contains_lineage(lineage) {
                    bail!("Focus lineage {lineage:?} is not in the catalog");
                }
                Some(catalog.mutations_of(lineage).into_iter().map(|name| name.to_string()).collect())
            },
            None => None
        };

        let mut mutations: Vec<(String, Mutation)> = vec![];
        for name in catalog.mutation_names() {
            if config.excluded_mutations.iter().any(|excluded| excluded == name) {
                debug!("Excluding catalog mutation {name}");
                continue;
            }
            if let Some(focus) = focus.as_ref() {
                if !focus.iter().any(|marker| marker == name) {
                    continue;
                }
            }
            let mutation = Mutation::parse(name)
                .with_context(|| format!("Error while parsing catalog mutation {name:?}:"))?;

            // surface translation problems now instead of once per sample
            expand_to_snvs(&mutation, &reference)
                .with_context(|| format!("Error while translating catalog mutation {name:?}:"))?;
            mutations.push((name.to_string(), mutation));
        }
        if mutations.is_empty() {
            bail!("No catalog mutations remain after exclusions");
        }

        Ok(Self { catalog, reference, mutations, candidate_lineages, config })
    }

    pub fn catalog(&self) -> &LineageCatalog {
        &self.catalog
    }

    pub fn min_depth(&self) -> u64 {
        self.config.min_depth
    }

    /// Runs the full deconvolution for one sample.
    /// Returns `None` when no mutation meets the depth filter; the caller logs and
    /// drops the sample without failing the batch.
    /// # Arguments
    /// * `name` - sample label for the report
    /// * `counter` - per-position counts from this sample's alignment
    /// # Errors
    /// * if the numerical solve fails; never for poor coverage or poor fits
    pub fn deconvolute_sample(
        &self, name: &str, counter: &dyn PositionCounter
    ) -> anyhow::Result<Option<SampleResult>> {
        let observations = extract_observations(counter, &self.mutations, &self.reference)?;
        let covered = observations.values()
            .filter(|counts| counts.is_covered(self.config.min_depth))
            .count();

        let profile = match build_profile_matrix(
            &self.catalog,
            &self.candidate_lineages,
            &observations,
            self.config.min_depth,
            self.config.unique_only
        ) {
            Ok(profile) => profile,
            Err(ProfileError::NoCoverage { min_depth }) => {
                info!("Sample {name}: no mutation covered at depth >= {min_depth}, skipping");
                return Ok(None);
            }
        };
        debug!(
            "Sample {name}: {} groups over {} covered mutations",
            profile.num_groups(), profile.num_mutations()
        );

        let estimate = solve_abundances(&profile, self.config.solver)
            .with_context(|| format!("Error while estimating abundances for sample {name:?}:"))?;
        Ok(Some(SampleResult::new(name.to_string(), estimate, covered)))
    }

    /// Pulls the raw observed counts for every catalog mutation in one sample,
    /// without any coverage filtering or estimation.
    /// # Arguments
    /// * `name` - sample label for the report
    /// * `counter` - per-position counts from this sample's alignment
    /// # Errors
    /// * never in practice; translation was validated at construction
    pub fn scan_sample(
        &self, name: &str, counter: &dyn PositionCounter
    ) -> anyhow::Result<MutantScan> {
        let observations = extract_observations(counter, &self.mutations, &self.reference)?;
        Ok(MutantScan::new(name.to_string(), observations))
    }
}
