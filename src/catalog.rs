
use anyhow::{Context, ensure};
use indexmap::IndexMap;
use std::path::Path;

use crate::util::json_io::load_json;

/// Immutable table mapping each diagnostic mutation to per-lineage prevalence values.
/// Loaded once per process from JSON of the form `{"S:N501Y": {"B.1.1.7": 1.0, ...}, ...}`
/// and shared read-only by every sample pipeline.
#[derive(Clone, Debug, Default)]
pub struct LineageCatalog {
    /// mutation name -> (lineage name -> prevalence in [0, 1]), in file order
    mutations: IndexMap<String, IndexMap<String, f64>>,
    /// all lineage names, union over mutations in first-seen order
    lineage_names: Vec<String>
}

impl LineageCatalog {
    /// Builds a catalog from an in-memory prevalence table.
    /// # Arguments
    /// * `mutations` - mutation name -> per-lineage prevalence map
    /// # Errors
    /// * if any prevalence value falls outside [0, 1]
    pub fn new(mutations: IndexMap<String, IndexMap<String, f64>>) -> anyhow::Result<Self> {
        let mut lineage_names: Vec<String> = vec![];
        for (mutation, prevalences) in mutations.iter() {
            for (lineage, &prevalence) in prevalences.iter() {
                ensure!(
                    (0.0..=1.0).contains(&prevalence),
                    "prevalence for {lineage:?} at {mutation:?} is outside [0, 1]: {prevalence}"
                );
                if !lineage_names.iter().any(|name| name == lineage) {
                    lineage_names.push(lineage.clone());
                }
            }
        }
        Ok(Self { mutations, lineage_names })
    }

    /// Loads the catalog from a JSON file, optionally gzipped
    pub fn from_json(filename: &Path) -> anyhow::Result<Self> {
        let mutations: IndexMap<String, IndexMap<String, f64>> = load_json(filename)
            .with_context(|| format!("Error while loading lineage catalog {filename:?}:"))?;
        Self::new(mutations)
    }

    /// All mutation names in catalog order
    pub fn mutation_names(&self) -> impl Iterator<Item = &str> {
        self.mutations.keys().map(|name| name.as_str())
    }

    pub fn num_mutations(&self) -> usize {
        self.mutations.len()
    }

    /// All lineage names known to the catalog, in first-seen order
    pub fn lineage_names(&self) -> &[String] {
        &self.lineage_names
    }

    pub fn contains_lineage(&self, lineage: &str) -> bool {
        self.lineage_names.iter().any(|name| name == lineage)
    }

    /// Prevalence of a mutation within a lineage; absent entries read as 0
    pub fn prevalence(&self, mutation: &str, lineage: &str) -> f64 {
        self.mutations.get(mutation)
            .and_then(|prevalences| prevalences.get(lineage))
            .copied()
            .unwrap_or(0.0)
    }

    /// The mutations a given lineage carries (prevalence > 0), in catalog order
    pub fn mutations_of(&self, lineage: &str) -> Vec<&str> {
        self.mutations.iter()
            .filter(|(_name, prevalences)| prevalences.get(lineage).copied().unwrap_or(0.0) > 0.0)
            .map(|(name, _prevalences)| name.as_str())
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two-lineage catalog shared by several test modules
    pub(crate) fn two_lineage_catalog() -> LineageCatalog {
        let mut mutations = IndexMap::new();
        mutations.insert("S:N501Y".to_string(), IndexMap::from([
            ("LinA".to_string(), 1.0),
            ("LinB".to_string(), 0.0)
        ]));
        mutations.insert("S:E484K".to_string(), IndexMap::from([
            ("LinA".to_string(), 1.0),
            ("LinB".to_string(), 1.0)
        ]));
        LineageCatalog::new(mutations).unwrap()
    }

    #[test]
    fn test_catalog_lookups() {
        let catalog = two_lineage_catalog();
        assert_eq!(catalog.lineage_names(), &["LinA".to_string(), "LinB".to_string()]);
        assert_eq!(catalog.prevalence("S:N501Y", "LinA"), 1.0);
        assert_eq!(catalog.prevalence("S:N501Y", "LinB"), 0.0);

        // missing entries read as prevalence 0
        assert_eq!(catalog.prevalence("S:N501Y", "LinC"), 0.0);
        assert_eq!(catalog.prevalence("ORF1a:T1001I", "LinA"), 0.0);

        assert_eq!(catalog.mutations_of("LinB"), vec!["S:E484K"]);
    }

    #[test]
    fn test_prevalence_bounds() {
        let mut mutations = IndexMap::new();
        mutations.insert("S:N501Y".to_string(), IndexMap::from([("LinA".to_string(), 1.5)]));
        assert!(LineageCatalog::new(mutations).is_err());
    }
}
