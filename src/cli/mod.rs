
/// Shared CLI definitions and input checks
pub mod core;
/// Subcommand for estimating lineage abundances
pub mod lineages;
/// Subcommand for scanning raw mutation frequencies
pub mod mutants;
/// Subcommand for translating a single mutation between coordinate systems
pub mod translate;
