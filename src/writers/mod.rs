
/// Writer for the per-sample lineage abundance table
pub mod lineage_csv;
/// Writer for the raw per-mutation frequency table
pub mod mutant_csv;
