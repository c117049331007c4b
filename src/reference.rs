
use anyhow::{Context, ensure};
use indexmap::IndexMap;
use std::path::Path;

use crate::parsing::fasta::load_single_contig;
use crate::util::json_io::load_json;

/// Half-open gene span in 0-based genome coordinates
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct GeneSpan {
    /// 0-based start offset of the coding sequence
    pub start: usize,
    /// 0-based exclusive end offset
    pub end: usize
}

impl GeneSpan {
    /// True if the 0-based offset lies strictly inside the span.
    /// The strict lower bound matches the lookup used for reverse translation,
    /// which deliberately excludes the first base of each gene.
    pub fn contains_strict(&self, offset: usize) -> bool {
        self.start < offset && offset < self.end
    }
}

/// The reference nucleotide sequence plus its gene coordinate table.
/// Loaded once per process and shared read-only across all samples.
#[derive(Clone, Debug)]
pub struct ReferenceGenome {
    /// uppercase nucleotide sequence
    sequence: Vec<u8>,
    /// gene name -> coding span, in table order
    genes: IndexMap<String, GeneSpan>
}

impl ReferenceGenome {
    /// Creates a reference from an in-memory sequence and gene table.
    /// # Arguments
    /// * `sequence` - the full genome sequence; lowercase bases are folded to uppercase
    /// * `genes` - gene name -> 0-based half-open coding span
    /// # Errors
    /// * if a gene span is empty or extends past the end of the sequence
    pub fn new(sequence: Vec<u8>, genes: IndexMap<String, GeneSpan>) -> anyhow::Result<Self> {
        let sequence: Vec<u8> = sequence.into_iter().map(|b| b.to_ascii_uppercase()).collect();
        for (name, span) in genes.iter() {
            ensure!(span.start < span.end, "gene {name:?} has an empty span");
            ensure!(span.end <= sequence.len(), "gene {name:?} extends past the end of the reference sequence");
        }
        Ok(Self { sequence, genes })
    }

    /// Loads the reference from a FASTA file and a gene table JSON file.
    /// # Arguments
    /// * `fasta_fn` - single-contig FASTA, optionally gzipped
    /// * `gene_table_fn` - JSON object mapping gene name -> {"start": ..., "end": ...}, 0-based half-open
    /// # Errors
    /// * if either file fails to load or parse, or if the table fails validation
    pub fn from_files(fasta_fn: &Path, gene_table_fn: &Path) -> anyhow::Result<Self> {
        let sequence = load_single_contig(fasta_fn)
            .with_context(|| format!("Error while loading reference FASTA {fasta_fn:?}:"))?;
        let genes: IndexMap<String, GeneSpan> = load_json(gene_table_fn)?;
        Self::new(sequence, genes)
    }

    pub fn sequence_len(&self) -> usize {
        self.sequence.len()
    }

    pub fn genes(&self) -> &IndexMap<String, GeneSpan> {
        &self.genes
    }

    pub fn gene(&self, name: &str) -> Option<GeneSpan> {
        self.genes.get(name).copied()
    }

    /// The base at a 0-based offset
    pub fn base(&self, offset: usize) -> Option<u8> {
        self.sequence.get(offset).copied()
    }

    /// The codon starting at a 0-based offset
    pub fn codon(&self, offset: usize) -> Option<[u8; 3]> {
        let slice = self.sequence.get(offset..offset + 3)?;
        Some([slice[0], slice[1], slice[2]])
    }

    /// Finds the gene whose span strictly contains a 0-based offset
    pub fn gene_containing(&self, offset: usize) -> Option<(&str, GeneSpan)> {
        self.genes.iter()
            .find(|(_name, span)| span.contains_strict(offset))
            .map(|(name, span)| (name.as_str(), *span))
    }
}

/// Translates a codon to its single-letter residue, with '_' for stop codons.
/// Returns None for codons containing ambiguous or invalid bases.
pub fn translate_codon(codon: &[u8; 3]) -> Option<u8> {
    let residue = match codon {
        b"ATA" | b"ATC" | b"ATT" => b'I',
        b"ATG" => b'M',
        b"ACA" | b"ACC" | b"ACG" | b"ACT" => b'T',
        b"AAC" | b"AAT" => b'N',
        b"AAA" | b"AAG" => b'K',
        b"AGC" | b"AGT" | b"TCA" | b"TCC" | b"TCG" | b"TCT" => b'S',
        b"AGA" | b"AGG" | b"CGA" | b"CGC" | b"CGG" | b"CGT" => b'R',
        b"CTA" | b"CTC" | b"CTG" | b"CTT" | b"TTA" | b"TTG" => b'L',
        b"CCA" | b"CCC" | b"CCG" | b"CCT" => b'P',
        b"CAC" | b"CAT" => b'H',
        b"CAA" | b"CAG" => b'Q',
        b"GTA" | b"GTC" | b"GTG" | b"GTT" => b'V',
        b"GCA" | b"GCC" | b"GCG" | b"GCT" => b'A',
        b"GAC" | b"GAT" => b'D',
        b"GAA" | b"GAG" => b'E',
        b"GGA" | b"GGC" | b"GGG" | b"GGT" => b'G',
        b"TTC" | b"TTT" => b'F',
        b"TAC" | b"TAT" => b'Y',
        b"TAA" | b"TAG" | b"TGA" => b'_',
        b"TGC" | b"TGT" => b'C',
        b"TGG" => b'W',
        _ => return None
    };
    Some(residue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codon_translation() {
        assert_eq!(translate_codon(b"ATG"), Some(b'M'));
        assert_eq!(translate_codon(b"AAT"), Some(b'N'));
        assert_eq!(translate_codon(b"TAT"), Some(b'Y'));
        assert_eq!(translate_codon(b"TGA"), Some(b'_'));
        assert_eq!(translate_codon(b"NNN"), None);
    }

    #[test]
    fn test_gene_lookup() {
        let mut genes = IndexMap::new();
        genes.insert("S".to_string(), GeneSpan { start: 6, end: 15 });
        let reference = ReferenceGenome::new(b"acgtacATGAATTATcg".to_vec(), genes).unwrap();

        // lowercase input is folded on load
        assert_eq!(reference.base(6), Some(b'A'));
        assert_eq!(reference.codon(6), Some(*b"ATG"));

        // strictly-inside lookup excludes the first base of the gene
        assert!(reference.gene_containing(6).is_none());
        assert_eq!(reference.gene_containing(7).map(|(name, _span)| name), Some("S"));
        assert!(reference.gene_containing(15).is_none());
    }

    #[test]
    fn test_invalid_gene_table() {
        let mut genes = IndexMap::new();
        genes.insert("S".to_string(), GeneSpan { start: 10, end: 50 });
        assert!(ReferenceGenome::new(b"ACGT".to_vec(), genes).is_err());
    }
}
