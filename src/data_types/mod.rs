
/// Mutation identifiers at nucleotide and amino-acid level, plus name parsing
pub mod mutations;
/// Per-sample read count observations and coverage checks
pub mod observations;
/// Final per-sample deconvolution results
pub mod abundance;
