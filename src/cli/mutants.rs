
use anyhow::bail;
use clap::Args;
use log::info;
use std::path::PathBuf;

use crate::cli::core::{check_optional_filename, check_required_filename, AFTER_HELP, FULL_VERSION};

#[derive(Args, Clone, Default)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct MutantSettings {
    /// Reference FASTA file
    #[clap(required = true)]
    #[clap(short = 'r')]
    #[clap(long = "reference")]
    #[clap(value_name = "FASTA")]
    #[clap(help_heading = Some("Input/Output"))]
    pub reference_fn: PathBuf,

    /// Gene coordinate table (JSON)
    #[clap(required = true)]
    #[clap(short = 'g')]
    #[clap(long = "genes")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub gene_table_fn: PathBuf,

    /// Lineage catalog mapping mutations to per-lineage prevalence (JSON)
    #[clap(required = true)]
    #[clap(short = 'c')]
    #[clap(long = "catalog")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub catalog_fn: PathBuf,

    /// Per-position counts file for a single sample; repeat for multiple samples
    #[clap(long = "counts")]
    #[clap(value_name = "TSV")]
    #[clap(help_heading = Some("Input/Output"))]
    pub counts_fns: Vec<PathBuf>,

    /// Sample sheet listing counts files and sample names (TSV)
    #[clap(short = 's')]
    #[clap(long = "sample-sheet")]
    #[clap(value_name = "TSV")]
    #[clap(help_heading = Some("Input/Output"))]
    pub sample_sheet_fn: Option<PathBuf>,

    /// Output frequency table (csv/tsv)
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(value_name = "CSV")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_fn: PathBuf,

    /// Only scan the catalog mutations carried by this lineage
    #[clap(long = "lineage")]
    #[clap(value_name = "LINEAGE")]
    #[clap(help_heading = Some("Scan parameters"))]
    pub lineage: Option<String>,

    /// Leave a catalog mutation out of the scan; repeatable
    #[clap(long = "exclude-mutation")]
    #[clap(value_name = "MUTATION")]
    #[clap(help_heading = Some("Scan parameters"))]
    pub excluded_mutations: Vec<String>,

    /// Depth below which a frequency is reported as NA
    #[clap(long = "min-depth")]
    #[clap(value_name = "DEPTH")]
    #[clap(help_heading = Some("Scan parameters"))]
    #[clap(default_value = "40")]
    pub min_depth: u64,

    /// Number of threads to use for processing samples
    #[clap(long = "threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    pub threads: usize,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8
}

pub fn check_mutant_settings(mut settings: MutantSettings) -> anyhow::Result<MutantSettings> {
    info!("Delineate version: {:?}", &*FULL_VERSION);
    info!("Sub-command: mutants");
    info!("Inputs:");

    check_required_filename(&settings.reference_fn, "Reference FASTA")?;
    check_required_filename(&settings.gene_table_fn, "Gene table")?;
    check_required_filename(&settings.catalog_fn, "Lineage catalog")?;
    for counts_fn in settings.counts_fns.iter() {
        check_required_filename(counts_fn, "Counts file")?;
    }
    check_optional_filename(settings.sample_sheet_fn.as_deref(), "Sample sheet")?;

    if settings.counts_fns.is_empty() && settings.sample_sheet_fn.is_none() {
        bail!("At least one of --counts or --sample-sheet is required");
    }

    info!("\tReference: {:?}", &settings.reference_fn);
    info!("\tGene table: {:?}", &settings.gene_table_fn);
    info!("\tLineage catalog: {:?}", &settings.catalog_fn);
    for counts_fn in settings.counts_fns.iter() {
        info!("\tCounts file: {counts_fn:?}");
    }
    if let Some(sheet_fn) = settings.sample_sheet_fn.as_deref() {
        info!("\tSample sheet: {sheet_fn:?}");
    }

    info!("Outputs:");
    info!("\tFrequency table: {:?}", &settings.output_fn);

    info!("Scan parameters:");
    if let Some(lineage) = settings.lineage.as_deref() {
        info!("\tFocus lineage: {lineage:?}");
    } else {
        info!("\tFocus lineage: None (full catalog)");
    }
    for mutation in settings.excluded_mutations.iter() {
        info!("\tExcluded mutation: {mutation:?}");
    }
    if settings.min_depth == 0 {
        bail!("--min-depth must be >0");
    }
    info!("\tMinimum depth: {}", settings.min_depth);

    if settings.threads == 0 {
        settings.threads = 1;
    }
    info!("Processing threads: {}", settings.threads);

    Ok(settings)
}
