
/// The lineage catalog mapping mutations to per-lineage prevalence
pub mod catalog;
/// Command line interface functionality
pub mod cli;
/// Contains various shared data types
pub mod data_types;
/// Pulls observed mutation frequencies out of per-position counts
pub mod extract;
/// Tooling for parsing input files into meaningful structs / data
pub mod parsing;
/// Ties the per-sample stages together for batch processing
pub mod pipeline;
/// Builds the merged lineage-by-mutation incidence matrix
pub mod profile;
/// The reference genome and its gene coordinate table
pub mod reference;
/// The abundance estimation strategies
pub mod solver;
/// Converts mutations between amino-acid and nucleotide coordinates
pub mod translate;
/// Various utility functions that tend to be very generic
pub mod util;
/// All output writers
pub mod writers;
