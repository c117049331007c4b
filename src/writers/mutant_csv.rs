
use anyhow::Context;
use std::fs::File;
use std::path::Path;

use crate::pipeline::MutantScan;

/// Writes the raw scan table in long form: one row per (sample, mutation) pair with
/// the count pair and the observed frequency. Mutations below the depth cutoff keep
/// their counts but report "NA" for the frequency, marking them as uninformative
/// rather than absent.
/// # Arguments
/// * `scans` - the per-sample scans, in batch order
/// * `min_depth` - depth below which the frequency column reads "NA"
/// * `filename` - the output path; ".csv" selects comma delimiting, anything else tab
/// # Errors
/// * if the file cannot be created or written
pub fn write_mutant_table(
    scans: &[MutantScan], min_depth: u64, filename: &Path
) -> anyhow::Result<()> {
    let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
    let delimiter: u8 = if is_csv { b',' } else { b'\t' };
    let mut csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(filename)
        .with_context(|| format!("Error while creating {filename:?}:"))?;

    csv_writer.write_record(["sample", "mutation", "mutant_reads", "wildtype_reads", "frequency"])?;
    for scan in scans.iter() {
        for (mutation, counts) in scan.observations().iter() {
            let frequency = if counts.is_covered(min_depth) {
                ((counts.frequency() * 10000.0).round() / 10000.0).to_string()
            } else {
                "NA".to_string()
            };
            csv_writer.write_record([
                scan.name(),
                mutation,
                &counts.mutant().to_string(),
                &counts.wildtype().to_string(),
                &frequency
            ])?;
        }
    }

    csv_writer.flush()
        .with_context(|| format!("Error while writing {filename:?}:"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::observations::{MutationCounts, SampleObservations};

    #[test]
    fn test_long_form_rows_with_depth_masking() {
        let observations = SampleObservations::from_iter([
            ("S:N501Y".to_string(), MutationCounts::new(30, 70)),
            ("S:E484K".to_string(), MutationCounts::new(3, 1))
        ]);
        let scans = vec![MutantScan::new("wwtp_01".to_string(), observations)];

        let path = std::env::temp_dir()
            .join(format!("delineate_mutants_{}.csv", std::process::id()));
        write_mutant_table(&scans, 40, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "sample,mutation,mutant_reads,wildtype_reads,frequency");
        assert_eq!(lines[1], "wwtp_01,S:N501Y,30,70,0.3");
        // four reads total sits below the cutoff, so the frequency is masked
        assert_eq!(lines[2], "wwtp_01,S:E484K,3,1,NA");
        std::fs::remove_file(&path).ok();
    }
}
