
use clap::Args;
use log::info;
use std::path::PathBuf;

use crate::cli::core::{check_required_filename, AFTER_HELP, FULL_VERSION};

#[derive(Args, Clone, Default)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct TranslateSettings {
    /// The mutation to translate, e.g. "S:N501Y" or "A23403G"
    #[clap(required = true)]
    #[clap(value_name = "MUTATION")]
    pub mutation: String,

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

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8
}

pub fn check_translate_settings(settings: TranslateSettings) -> anyhow::Result<TranslateSettings> {
    info!("Delineate version: {:?}", &*FULL_VERSION);
    info!("Sub-command: translate");
    info!("Inputs:");

    check_required_filename(&settings.reference_fn, "Reference FASTA")?;
    check_required_filename(&settings.gene_table_fn, "Gene table")?;

    info!("\tMutation: {:?}", &settings.mutation);
    info!("\tReference: {:?}", &settings.reference_fn);
    info!("\tGene table: {:?}", &settings.gene_table_fn);

    Ok(settings)
}
