/*!
# Profile Matrix Builder
Builds the lineage-by-mutation incidence matrix for one sample, restricted to the
mutations with adequate coverage, and merges lineages whose restricted profiles are
indistinguishable.

Merging is sample-dependent: two lineages that differ only at a mutation this sample
failed to cover are genuinely indistinguishable *here*, so the groups must be rebuilt
for every sample rather than cached.
*/
use log::debug;

use crate::catalog::LineageCatalog;
use crate::data_types::observations::SampleObservations;

#[derive(thiserror::Error, Debug)]
pub enum ProfileError {
    #[error("no mutation in the requested set meets the minimum depth of {min_depth}")]
    NoCoverage { min_depth: u64 }
}

/// The merged incidence matrix and observed frequencies for one sample.
/// Rows are merged lineage groups; columns are the covered mutations.
#[derive(Clone, Debug)]
pub struct ProfileMatrix {
    /// binary profile per merged group, entries aligned with `mutations`
    profiles: Vec<Vec<u8>>,
    /// group labels; indistinguishable lineages joined with " or "
    labels: Vec<String>,
    /// observed mutant frequency per covered mutation
    observed: Vec<f64>,
    /// covered mutation names, in catalog order
    mutations: Vec<String>
}

impl ProfileMatrix {
    pub fn profiles(&self) -> &[Vec<u8>] {
        &self.profiles
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn observed(&self) -> &[f64] {
        &self.observed
    }

    pub fn mutations(&self) -> &[String] {
        &self.mutations
    }

    pub fn num_groups(&self) -> usize {
        self.profiles.len()
    }

    pub fn num_mutations(&self) -> usize {
        self.mutations.len()
    }
}

/// Builds the merged profile matrix for one sample.
/// # Arguments
/// * `catalog` - shared lineage catalog
/// * `candidate_lineages` - lineages to solve over; empty means the full catalog set
/// * `observations` - per-mutation count pairs from the extractor
/// * `min_depth` - minimum total depth for a mutation to count as covered
/// * `unique_only` - restrict to mutations carried by exactly one candidate lineage
/// # Errors
/// * `ProfileError::NoCoverage` if no mutation survives the depth (and uniqueness) filters
pub fn build_profile_matrix(
    catalog: &LineageCatalog,
    candidate_lineages: &[String],
    observations: &SampleObservations,
    min_depth: u64,
    unique_only: bool
) -> Result<ProfileMatrix, ProfileError> {
    let lineages: Vec<String> = if candidate_lineages.is_empty() {
        catalog.lineage_names().to_vec()
    } else {
        candidate_lineages.to_vec()
    };

    // coverage filter, preserving catalog order
    let mut covered: Vec<&str> = observations.iter()
        .filter(|(_name, counts)| counts.is_covered(min_depth))
        .map(|(name, _counts)| name.as_str())
        .collect();
    if covered.is_empty() {
        return Err(ProfileError::NoCoverage { min_depth });
    }
    debug!("{}/{} mutations covered at depth >= {min_depth}", covered.len(), observations.len());

    // optionally keep only mutations unique to one candidate lineage
    if unique_only {
        covered.retain(|name| {
            let prevalence_sum: f64 = lineages.iter()
                .map(|lineage| catalog.prevalence(name, lineage))
                .sum();
            prevalence_sum == 1.0
        });
        if covered.is_empty() {
            return Err(ProfileError::NoCoverage { min_depth });
        }
    }

    let observed: Vec<f64> = covered.iter()
        .map(|&name| observations[name].frequency())
        .collect();

    // merge lineages with identical rounded profiles, first occurrence keeps its slot
    let mut profiles: Vec<Vec<u8>> = vec![];
    let mut labels: Vec<String> = vec![];
    let mut member_count = 0usize;
    for lineage in lineages.iter() {
        let profile: Vec<u8> = covered.iter()
            .map(|&name| u8::from(catalog.prevalence(name, lineage) > 0.5))
            .collect();
        member_count += 1;
        match profiles.iter().position(|existing| *existing == profile) {
            Some(index) => {
                labels[index].push_str(" or ");
                labels[index].push_str(lineage);
            },
            None => {
                profiles.push(profile);
                labels.push(lineage.clone());
            }
        }
    }

    // every lineage lands in exactly one group
    debug_assert_eq!(member_count, lineages.len());
    debug_assert_eq!(
        labels.iter().map(|label| label.split(" or ").count()).sum::<usize>(),
        lineages.len()
    );

    Ok(ProfileMatrix {
        profiles,
        labels,
        observed,
        mutations: covered.into_iter().map(|name| name.to_string()).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::two_lineage_catalog;
    use crate::data_types::observations::MutationCounts;
    use indexmap::IndexMap;

    #[test]
    fn test_incidence_matrix() {
        let catalog = two_lineage_catalog();
        let observations = SampleObservations::from_iter([
            ("S:N501Y".to_string(), MutationCounts::new(80, 20)),
            ("S:E484K".to_string(), MutationCounts::new(90, 10))
        ]);

        let profile = build_profile_matrix(&catalog, &[], &observations, 40, false).unwrap();
        assert_eq!(profile.mutations(), &["S:N501Y".to_string(), "S:E484K".to_string()]);
        assert_eq!(profile.labels(), &["LinA".to_string(), "LinB".to_string()]);
        assert_eq!(profile.profiles(), &[vec![1, 1], vec![0, 1]]);
        assert_eq!(profile.observed(), &[0.8, 0.9]);
    }

    #[test]
    fn test_coverage_filter_drops_columns() {
        let catalog = two_lineage_catalog();
        // S:E484K sits below min_depth and must vanish from the matrix entirely
        let observations = SampleObservations::from_iter([
            ("S:N501Y".to_string(), MutationCounts::new(80, 20)),
            ("S:E484K".to_string(), MutationCounts::new(20, 19))
        ]);

        let profile = build_profile_matrix(&catalog, &[], &observations, 40, false).unwrap();
        assert_eq!(profile.mutations(), &["S:N501Y".to_string()]);
        assert_eq!(profile.profiles(), &[vec![1], vec![0]]);
    }

    #[test]
    fn test_no_coverage() {
        let catalog = two_lineage_catalog();
        let observations = SampleObservations::from_iter([
            ("S:N501Y".to_string(), MutationCounts::new(5, 5)),
            ("S:E484K".to_string(), MutationCounts::new(0, 0))
        ]);

        let result = build_profile_matrix(&catalog, &[], &observations, 40, false);
        assert!(matches!(result, Err(ProfileError::NoCoverage { min_depth: 40 })));
    }

    #[test]
    fn test_merge_indistinguishable_lineages() {
        let catalog = two_lineage_catalog();
        // only the shared mutation is covered, so LinA and LinB collapse to one group
        let observations = SampleObservations::from_iter([
            ("S:N501Y".to_string(), MutationCounts::new(10, 5)),
            ("S:E484K".to_string(), MutationCounts::new(90, 10))
        ]);

        let profile = build_profile_matrix(&catalog, &[], &observations, 40, false).unwrap();
        assert_eq!(profile.labels(), &["LinA or LinB".to_string()]);
        assert_eq!(profile.profiles(), &[vec![1]]);
        assert_eq!(profile.num_groups(), 1);
    }

    #[test]
    fn test_unique_marker_restriction() {
        let catalog = two_lineage_catalog();
        let observations = SampleObservations::from_iter([
            ("S:N501Y".to_string(), MutationCounts::new(80, 20)),
            ("S:E484K".to_string(), MutationCounts::new(90, 10))
        ]);

        // S:E484K has prevalence 1 in both lineages (sum 2), so it is not unique
        let profile = build_profile_matrix(&catalog, &[], &observations, 40, true).unwrap();
        assert_eq!(profile.mutations(), &["S:N501Y".to_string()]);
    }

    #[test]
    fn test_candidate_lineage_restriction() {
        let catalog = two_lineage_catalog();
        let observations = SampleObservations::from_iter([
            ("S:N501Y".to_string(), MutationCounts::new(80, 20)),
            ("S:E484K".to_string(), MutationCounts::new(90, 10))
        ]);

        let candidates = vec!["LinB".to_string()];
        let profile = build_profile_matrix(&catalog, &candidates, &observations, 40, false).unwrap();
        assert_eq!(profile.labels(), &["LinB".to_string()]);
        assert_eq!(profile.profiles(), &[vec![0, 1]]);
    }

    #[test]
    fn test_determinism() {
        let catalog = two_lineage_catalog();
        let observations = SampleObservations::from_iter([
            ("S:N501Y".to_string(), MutationCounts::new(80, 20)),
            ("S:E484K".to_string(), MutationCounts::new(90, 10))
        ]);

        let first = build_profile_matrix(&catalog, &[], &observations, 40, false).unwrap();
        let second = build_profile_matrix(&catalog, &[], &observations, 40, false).unwrap();
        assert_eq!(first.profiles(), second.profiles());
        assert_eq!(first.labels(), second.labels());
        assert_eq!(first.observed(), second.observed());
    }
}
