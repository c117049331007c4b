
/// Minimal single-contig FASTA reader for the reference sequence
pub mod fasta;
/// Per-position base/deletion tally files, the stand-in for direct alignment access
pub mod pileup;
/// Batch sample sheets and plain name list files
pub mod sample_sheet;
