
use anyhow::bail;
use indicatif::ParallelProgressIterator;
use itertools::Itertools;
use log::{LevelFilter, error, info, warn};
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;

use delineate::catalog::LineageCatalog;
use delineate::cli::core::{Commands, get_cli};
use delineate::cli::lineages::{LineageSettings, check_lineage_settings};
use delineate::cli::mutants::{MutantSettings, check_mutant_settings};
use delineate::cli::translate::{TranslateSettings, check_translate_settings};
use delineate::data_types::mutations::Mutation;
use delineate::parsing::pileup::PileupCounts;
use delineate::parsing::sample_sheet::{SampleSheetEntry, load_name_list, load_sample_sheet};
use delineate::pipeline::{MutantScan, Pipeline, PipelineConfigBuilder, SampleResult};
use delineate::reference::ReferenceGenome;
use delineate::solver::SolverConfigBuilder;
use delineate::translate::{expand_to_snvs, snv_to_amino_acid};
use delineate::util::progress_bar::get_progress_style;
use delineate::writers::lineage_csv::write_abundance_table;
use delineate::writers::mutant_csv::write_mutant_table;

/// Sets up env_logger from the shared verbosity flag
fn setup_logging(verbosity: u8) {
    let filter_level: LevelFilter = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();
}

/// Derives a sample name from a counts filename, peeling the compression suffix
fn sample_name_from_path(filename: &Path) -> String {
    let stem = filename.file_stem().unwrap_or_default().to_string_lossy();
    stem.strip_suffix(".tsv").unwrap_or(&stem).to_string()
}

/// Combines the loose counts files and the optional sample sheet into one batch
fn collect_samples(
    counts_fns: &[std::path::PathBuf], sample_sheet_fn: Option<&Path>
) -> anyhow::Result<Vec<SampleSheetEntry>> {
    let mut entries: Vec<SampleSheetEntry> = counts_fns.iter()
        .map(|counts_fn| SampleSheetEntry {
            counts_fn: counts_fn.clone(),
            name: sample_name_from_path(counts_fn)
        })
        .collect();
    if let Some(sheet_fn) = sample_sheet_fn {
        entries.extend(load_sample_sheet(sheet_fn)?);
    }

    // duplicate names would collide in the output tables
    let duplicates: Vec<&String> = entries.iter()
        .map(|entry| &entry.name)
        .duplicates()
        .collect();
    if !duplicates.is_empty() {
        bail!("Duplicate sample name(s) in the batch: {duplicates:?}");
    }
    Ok(entries)
}

fn run_lineages(settings: LineageSettings) {
    // start the timer
    let start_time = Instant::now();

    // set up logging before we check the other settings
    setup_logging(settings.verbosity);

    let settings = match check_lineage_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    // set up the number of threads for rayon
    match rayon::ThreadPoolBuilder::new().num_threads(settings.threads).build_global() {
        Ok(()) => {},
        Err(e) => {
            error!("Error while building thread pool: {e}");
            std::process::exit(exitcode::OSERR);
        }
    };

    // load the shared inputs
    info!("Pre-loading reference genome into memory...");
    let reference = match ReferenceGenome::from_files(&settings.reference_fn, &settings.gene_table_fn) {
        Ok(r) => r,
        Err(e) => {
            error!("Error while loading reference genome: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };

    info!("Loading lineage catalog...");
    let catalog = match LineageCatalog::from_json(&settings.catalog_fn) {
        Ok(c) => c,
        Err(e) => {
            error!("Error while loading lineage catalog: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };
    info!(
        "Catalog spans {} mutations across {} lineages.",
        catalog.num_mutations(), catalog.lineage_names().len()
    );

    let candidate_lineages = match settings.lineage_list_fn.as_deref() {
        Some(lineage_fn) => match load_name_list(lineage_fn) {
            Ok(names) => names,
            Err(e) => {
                error!("Error while loading lineage list: {e:#}");
                std::process::exit(exitcode::IOERR);
            }
        },
        None => vec![]
    };

    // build our configuration
    let solver_config = match SolverConfigBuilder::default()
        .strategy(settings.solver)
        .score_floor(settings.score_floor)
        .build() {
        Ok(sc) => sc,
        Err(e) => {
            error!("Error while building solver config: {e:?}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };
    let pipeline_config = match PipelineConfigBuilder::default()
        .min_depth(settings.min_depth)
        .unique_only(settings.unique_only)
        .excluded_mutations(settings.excluded_mutations.clone())
        .solver(solver_config)
        .build() {
        Ok(pc) => pc,
        Err(e) => {
            error!("Error while building pipeline config: {e:?}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    let pipeline = match Pipeline::new(catalog, reference, candidate_lineages, pipeline_config) {
        Ok(p) => p,
        Err(e) => {
            error!("Error while preparing the pipeline: {e:#}");
            std::process::exit(exitcode::DATAERR);
        }
    };

    // gather the batch
    let samples = match collect_samples(&settings.counts_fns, settings.sample_sheet_fn.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while gathering samples: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };
    info!("Processing {} sample(s)...", samples.len());

    // run the parallel iterator to estimate them
    let style = get_progress_style();
    let results: Vec<Option<SampleResult>> = samples.into_par_iter()
        .map(|entry| {
            let counts = match PileupCounts::from_tsv(&entry.counts_fn) {
                Ok(c) => c,
                Err(e) => {
                    error!("Error while loading counts for sample {:?}: {e:#}", entry.name);
                    return None;
                }
            };
            match pipeline.deconvolute_sample(&entry.name, &counts) {
                Ok(result) => result,
                Err(e) => {
                    error!("Error while processing sample {:?}: {e:#}", entry.name);
                    None
                }
            }
        })
        .progress_with_style(style)
        .collect();

    let estimated: Vec<SampleResult> = results.into_iter().flatten().collect();
    for result in estimated.iter() {
        if result.estimate().is_infeasible() {
            warn!("Sample {:?} reported an infeasible mixture; interpret with care.", result.name());
        }
        info!(
            "Sample {:?}: {} covered mutations, fraction sum {:.3}",
            result.name(), result.covered(), result.estimate().fraction_sum()
        );
    }

    // now write things
    info!("Saving abundance table to {:?}...", settings.output_fn);
    if let Err(e) = write_abundance_table(&estimated, &settings.output_fn) {
        error!("Error while saving abundance table: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    info!("Estimation completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn run_mutants(settings: MutantSettings) {
    // start the timer
    let start_time = Instant::now();

    // set up logging before we check the other settings
    setup_logging(settings.verbosity);

    let settings = match check_mutant_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    // set up the number of threads for rayon
    match rayon::ThreadPoolBuilder::new().num_threads(settings.threads).build_global() {
        Ok(()) => {},
        Err(e) => {
            error!("Error while building thread pool: {e}");
            std::process::exit(exitcode::OSERR);
        }
    };

    info!("Pre-loading reference genome into memory...");
    let reference = match ReferenceGenome::from_files(&settings.reference_fn, &settings.gene_table_fn) {
        Ok(r) => r,
        Err(e) => {
            error!("Error while loading reference genome: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };

    info!("Loading lineage catalog...");
    let catalog = match LineageCatalog::from_json(&settings.catalog_fn) {
        Ok(c) => c,
        Err(e) => {
            error!("Error while loading lineage catalog: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };

    let pipeline_config = match PipelineConfigBuilder::default()
        .min_depth(settings.min_depth)
        .excluded_mutations(settings.excluded_mutations.clone())
        .lineage_focus(settings.lineage.clone())
        .build() {
        Ok(pc) => pc,
        Err(e) => {
            error!("Error while building pipeline config: {e:?}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };
    let pipeline = match Pipeline::new(catalog, reference, vec![], pipeline_config) {
        Ok(p) => p,
        Err(e) => {
            error!("Error while preparing the pipeline: {e:#}");
            std::process::exit(exitcode::DATAERR);
        }
    };

    let samples = match collect_samples(&settings.counts_fns, settings.sample_sheet_fn.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while gathering samples: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };
    info!("Scanning {} sample(s)...", samples.len());

    let style = get_progress_style();
    let scans: Vec<Option<MutantScan>> = samples.into_par_iter()
        .map(|entry| {
            let counts = match PileupCounts::from_tsv(&entry.counts_fn) {
                Ok(c) => c,
                Err(e) => {
                    error!("Error while loading counts for sample {:?}: {e:#}", entry.name);
                    return None;
                }
            };
            match pipeline.scan_sample(&entry.name, &counts) {
                Ok(scan) => Some(scan),
                Err(e) => {
                    error!("Error while scanning sample {:?}: {e:#}", entry.name);
                    None
                }
            }
        })
        .progress_with_style(style)
        .collect();
    let scans: Vec<MutantScan> = scans.into_iter().flatten().collect();

    for scan in scans.iter() {
        let covered = scan.observations().values()
            .filter(|counts| counts.is_covered(settings.min_depth))
            .count();
        let detected = scan.observations().values()
            .filter(|counts| counts.is_covered(settings.min_depth) && counts.mutant() > 0)
            .count();
        info!(
            "Sample {:?}: {covered}/{} mutations covered, {detected} detected",
            scan.name(), scan.observations().len()
        );
    }

    info!("Saving frequency table to {:?}...", settings.output_fn);
    if let Err(e) = write_mutant_table(&scans, pipeline.min_depth(), &settings.output_fn) {
        error!("Error while saving frequency table: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    info!("Scan completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn run_translate(settings: TranslateSettings) {
    // set up logging before we check the other settings
    setup_logging(settings.verbosity);

    let settings = match check_translate_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    let reference = match ReferenceGenome::from_files(&settings.reference_fn, &settings.gene_table_fn) {
        Ok(r) => r,
        Err(e) => {
            error!("Error while loading reference genome: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };

    let mutation = match Mutation::parse(&settings.mutation) {
        Ok(m) => m,
        Err(e) => {
            error!("Error while parsing mutation {:?}: {e}", settings.mutation);
            std::process::exit(exitcode::DATAERR);
        }
    };

    match &mutation {
        Mutation::Nucleotide(snv) => {
            // nucleotide to amino acid; intergenic SNVs legitimately have no answer
            match snv_to_amino_acid(snv, &reference) {
                Some(amino_acid) => println!("{snv} -> {amino_acid}"),
                None => println!("{snv} -> (no enclosing gene)")
            }
        },
        Mutation::AminoAcid { .. } | Mutation::GenomicDeletion { .. } => {
            let hypotheses = match expand_to_snvs(&mutation, &reference) {
                Ok(h) => h,
                Err(e) => {
                    error!("Error while translating {:?}: {e}", settings.mutation);
                    std::process::exit(exitcode::DATAERR);
                }
            };
            for snv in hypotheses.iter() {
                println!("{mutation} -> {snv}");
            }
            if hypotheses.is_empty() {
                println!("{mutation} -> (no single-base change produces this substitution)");
            }
        }
    }
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::Lineages(settings) => {
            run_lineages(*settings);
        },
        Commands::Mutants(settings) => {
            run_mutants(*settings);
        },
        Commands::Translate(settings) => {
            run_translate(*settings);
        }
    }

    info!("Process finished successfully.");
}
