/*!
# Codon/Coordinate Translator
Converts between amino-acid level mutation notation and nucleotide SNV hypotheses.

A substitution like `S:N501Y` expands to every single-base codon change that produces
the target residue, scanning codon position 1, then 2, then 3, and all four bases at
each position. That emission order is load-bearing: the frequency extractor breaks
ties between equally-supported hypotheses by taking the first one.

The reverse direction maps an SNV back to `gene:refResidue+codon+altResidue` form and
is the exact inverse for every emitted hypothesis.
*/
use crate::data_types::mutations::{Allele, Mutation, ResidueChange, Snv, NUCLEOTIDES};
use crate::reference::{translate_codon, ReferenceGenome};

#[derive(thiserror::Error, Debug)]
pub enum TranslateError {
    #[error("mutation {mutation:?} references unknown gene {gene:?}")]
    UnknownGene { mutation: String, gene: String },
    #[error("mutation {mutation:?} has a codon index outside the gene span")]
    CodonOutOfRange { mutation: String },
    #[error("mutation {mutation:?} lies outside the reference sequence")]
    PositionOutOfRange { mutation: String },
    #[error("mutation {mutation:?} overlaps an untranslatable reference codon")]
    InvalidReferenceCodon { mutation: String }
}

/// Expands a mutation into the nucleotide SNV hypotheses that realize it.
/// Nucleotide mutations pass through unchanged; amino-acid substitutions yield 0-3
/// candidate SNVs in fixed codon-position order; deletions yield one single-base
/// deletion record per deleted position.
/// # Arguments
/// * `mutation` - the mutation to expand
/// * `reference` - shared reference genome and gene table
/// # Errors
/// * if the gene is unknown, or the codon/position falls outside the reference
pub fn expand_to_snvs(mutation: &Mutation, reference: &ReferenceGenome) -> Result<Vec<Snv>, TranslateError> {
    match mutation {
        Mutation::Nucleotide(snv) => Ok(vec![*snv]),
        Mutation::GenomicDeletion { start, length } => {
            let mut hypotheses = Vec::with_capacity(*length);
            for i in 0..*length {
                let position = start + i as u64;
                let reference_base = reference.base(position as usize - 1)
                    .ok_or_else(|| TranslateError::PositionOutOfRange { mutation: mutation.to_string() })?;
                hypotheses.push(Snv::new(reference_base, position, Allele::Deletion));
            }
            Ok(hypotheses)
        },
        Mutation::AminoAcid { gene, codon, change } => {
            let span = reference.gene(gene)
                .ok_or_else(|| TranslateError::UnknownGene { mutation: mutation.to_string(), gene: gene.clone() })?;

            let codon_offset = span.start + 3 * (codon - 1);
            if codon_offset + 3 > span.end {
                return Err(TranslateError::CodonOutOfRange { mutation: mutation.to_string() });
            }
            let reference_codon = reference.codon(codon_offset)
                .ok_or_else(|| TranslateError::CodonOutOfRange { mutation: mutation.to_string() })?;

            match change {
                ResidueChange::Deletion => {
                    // one deletion record per codon position
                    Ok((0..3)
                        .map(|p| Snv::new(reference_codon[p], (codon_offset + p) as u64 + 1, Allele::Deletion))
                        .collect())
                },
                ResidueChange::Substitution { target, .. } => {
                    // sanity check that the reference codon is translatable at all
                    translate_codon(&reference_codon)
                        .ok_or_else(|| TranslateError::InvalidReferenceCodon { mutation: mutation.to_string() })?;

                    let mut hypotheses = vec![];
                    for p in 0..3 {
                        for base in NUCLEOTIDES {
                            let mut candidate = reference_codon;
                            candidate[p] = base;
                            if translate_codon(&candidate) == Some(*target) {
                                hypotheses.push(Snv::new(
                                    reference_codon[p], (codon_offset + p) as u64 + 1, Allele::Base(base)
                                ));
                            }
                        }
                    }
                    Ok(hypotheses)
                }
            }
        }
    }
}

/// Maps an SNV back to its amino-acid form, the inverse of `expand_to_snvs`.
/// Returns None when the position does not fall strictly inside any cataloged gene,
/// or when the enclosing codon is untranslatable; this is the "unresolved" outcome
/// rather than an error, since intergenic SNVs are legitimate catalog entries.
pub fn snv_to_amino_acid(snv: &Snv, reference: &ReferenceGenome) -> Option<Mutation> {
    let offset = snv.position() as usize - 1;
    let (gene, span) = reference.gene_containing(offset)?;
    let codon_index = (offset - span.start) / 3 + 1;

    if snv.is_deletion() {
        return Some(Mutation::AminoAcid {
            gene: gene.to_string(),
            codon: codon_index,
            change: ResidueChange::Deletion
        });
    }

    let codon_offset = span.start + 3 * (codon_index - 1);
    let reference_codon = reference.codon(codon_offset)?;
    let reference_residue = translate_codon(&reference_codon)?;

    let mut mutant_codon = reference_codon;
    mutant_codon[(offset - span.start) % 3] = match snv.target() {
        Allele::Base(b) => b,
        Allele::Deletion => unreachable!()
    };
    let target_residue = translate_codon(&mutant_codon)?;

    Some(Mutation::AminoAcid {
        gene: gene.to_string(),
        codon: codon_index,
        change: ResidueChange::Substitution { reference: reference_residue, target: target_residue }
    })
}
