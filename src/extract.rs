/*!
# Per-Sample Frequency Extractor
Combines raw per-position counts with the mutation catalog to produce the observed
mutant/wildtype count pair for every requested mutation in one sample.

When a mutation expands to multiple SNV hypotheses, the winner is the hypothesis with
the most mutant reads, not a sum; a 50/50 split between two hypotheses of the same
amino-acid change would otherwise double-count. Ties keep the first hypothesis in
codon-scan order.
*/
use crate::data_types::mutations::{Mutation, Snv};
use crate::data_types::observations::{MutationCounts, SampleObservations};
use crate::reference::ReferenceGenome;
use crate::translate::{expand_to_snvs, TranslateError};

/// Source of per-position read counts, the seam to the external alignment reader.
/// All target positions are known before extraction starts, so one pass over the
/// alignment is sufficient; implementations may stream.
pub trait PositionCounter {
    /// Returns `(matching_reads, other_reads)` for the target allele at the SNV's
    /// position; `(0, 0)` when the position has no reads at all.
    fn counts(&self, snv: &Snv) -> MutationCounts;
}

/// Extracts the observed count pair for each requested mutation.
/// # Arguments
/// * `counter` - per-position counter for this sample's alignment
/// * `mutations` - the (name, parsed mutation) pairs to look up, in catalog order
/// * `reference` - shared reference genome for hypothesis expansion
/// # Errors
/// * if a mutation fails translation (unknown gene, out-of-range codon)
pub fn extract_observations(
    counter: &dyn PositionCounter,
    mutations: &[(String, Mutation)],
    reference: &ReferenceGenome
) -> Result<SampleObservations, TranslateError> {
    let mut observations = SampleObservations::default();
    for (name, mutation) in mutations.iter() {
        let hypotheses = expand_to_snvs(mutation, reference)?;

        // best-supported hypothesis wins; ties keep the earliest in emission order
        let mut best = MutationCounts::default();
        for (i, hypothesis) in hypotheses.iter().enumerate() {
            let counts = counter.counts(hypothesis);
            if i == 0 || counts.mutant() > best.mutant() {
                best = counts;
            }
        }

        observations.insert(name.clone(), best);
    }
    Ok(observations)
}
