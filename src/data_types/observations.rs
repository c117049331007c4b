
use indexmap::IndexMap;

/// The mutant/wildtype read counts observed at one mutation site in one sample
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MutationCounts {
    /// reads supporting the mutant allele
    mutant: u64,
    /// reads supporting anything else
    wildtype: u64
}

impl MutationCounts {
    pub fn new(mutant: u64, wildtype: u64) -> Self {
        Self { mutant, wildtype }
    }

    pub fn mutant(&self) -> u64 {
        self.mutant
    }

    pub fn wildtype(&self) -> u64 {
        self.wildtype
    }

    /// Total read depth at the site
    pub fn total(&self) -> u64 {
        self.mutant + self.wildtype
    }

    /// Observed mutant allele frequency; 0.0 when the site has no reads at all
    pub fn frequency(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.mutant as f64 / total as f64
        }
    }

    /// True if the site has enough depth to trust the observed frequency
    pub fn is_covered(&self, min_depth: u64) -> bool {
        self.total() >= min_depth
    }
}

/// Per-sample observation table, keyed by mutation name in catalog order
pub type SampleObservations = IndexMap<String, MutationCounts>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let counts = MutationCounts::new(80, 20);
        assert_eq!(counts.total(), 100);
        assert_eq!(counts.frequency(), 0.8);
        assert!(counts.is_covered(40));
        assert!(!counts.is_covered(101));

        // the zero-read sentinel must not divide by zero
        let empty = MutationCounts::default();
        assert_eq!(empty.total(), 0);
        assert_eq!(empty.frequency(), 0.0);
    }
}
