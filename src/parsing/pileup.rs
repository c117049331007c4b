
use anyhow::Context;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::Path;

use crate::data_types::mutations::{Allele, Snv};
use crate::data_types::observations::MutationCounts;
use crate::extract::PositionCounter;
use crate::parsing::fasta::open_maybe_gzip;

/// One row of a per-position counts file
#[derive(Debug, Deserialize)]
struct PileupRow {
    /// 1-based genomic position
    position: u64,
    #[serde(rename = "A")]
    a: u64,
    #[serde(rename = "C")]
    c: u64,
    #[serde(rename = "G")]
    g: u64,
    #[serde(rename = "T")]
    t: u64,
    #[serde(rename = "DEL")]
    deletion: u64
}

/// Read tallies at one genomic position
#[derive(Clone, Copy, Debug, Default)]
struct BaseTally {
    a: u64,
    c: u64,
    g: u64,
    t: u64,
    deletion: u64
}

impl BaseTally {
    fn total(&self) -> u64 {
        self.a + self.c + self.g + self.t + self.deletion
    }

    fn matching(&self, allele: Allele) -> u64 {
        match allele {
            Allele::Base(b'A') => self.a,
            Allele::Base(b'C') => self.c,
            Allele::Base(b'G') => self.g,
            Allele::Base(b'T') => self.t,
            Allele::Base(_) => 0,
            Allele::Deletion => self.deletion
        }
    }
}

/// Per-position base/deletion counts for one sample, loaded in a single pass from a
/// tab-separated tally file (`position  A  C  G  T  DEL` with a header row).
/// This is the counter implementation used by the CLI; the deconvolution core only
/// sees it through the `PositionCounter` trait.
pub struct PileupCounts {
    tallies: FxHashMap<u64, BaseTally>
}

impl PileupCounts {
    /// Loads a counts file, optionally gzipped.
    /// # Arguments
    /// * `filename` - the tally TSV to read
    /// # Errors
    /// * if the file fails to open or a row fails to parse
    pub fn from_tsv(filename: &Path) -> anyhow::Result<Self> {
        let reader = open_maybe_gzip(filename)?;
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_reader(reader);

        let mut tallies = FxHashMap::default();
        for row in csv_reader.deserialize() {
            let row: PileupRow = row
                .with_context(|| format!("Error while parsing counts file {filename:?}:"))?;
            tallies.insert(row.position, BaseTally {
                a: row.a, c: row.c, g: row.g, t: row.t, deletion: row.deletion
            });
        }

        log::debug!("Loaded {} positions from {filename:?}", tallies.len());
        Ok(Self { tallies })
    }

    pub fn num_positions(&self) -> usize {
        self.tallies.len()
    }
}

impl PositionCounter for PileupCounts {
    fn counts(&self, snv: &Snv) -> MutationCounts {
        match self.tallies.get(&snv.position()) {
            Some(tally) => {
                let matching = tally.matching(snv.target());
                MutationCounts::new(matching, tally.total() - matching)
            },
            // positions with no reads report the (0, 0) sentinel
            None => MutationCounts::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_counts(content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("delineate_pileup_{}.tsv", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_counter_queries() {
        let path = write_counts("position\tA\tC\tG\tT\tDEL\n12\t5\t0\t60\t35\t0\n77\t0\t0\t0\t10\t30\n");
        let counts = PileupCounts::from_tsv(&path).unwrap();
        assert_eq!(counts.num_positions(), 2);

        // substitution query: matching vs everything else at the locus
        let snv = Snv::new(b'T', 12, Allele::Base(b'G'));
        assert_eq!(counts.counts(&snv), MutationCounts::new(60, 40));

        // deletion query
        let del = Snv::new(b'T', 77, Allele::Deletion);
        assert_eq!(counts.counts(&del), MutationCounts::new(30, 10));

        // absent position
        let missing = Snv::new(b'A', 99, Allele::Base(b'C'));
        assert_eq!(counts.counts(&missing), MutationCounts::new(0, 0));

        std::fs::remove_file(&path).ok();
    }
}
