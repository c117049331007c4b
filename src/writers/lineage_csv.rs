
use anyhow::Context;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use crate::pipeline::SampleResult;

/// Writes the abundance table: one row per surviving sample, one column per lineage
/// group. The group columns are the sorted union over all samples, since merging is
/// sample-dependent and different samples can produce different group labels. A group
/// absent from a sample's estimate is written as "0".
/// # Arguments
/// * `results` - the per-sample estimates, in batch order
/// * `filename` - the output path; ".csv" selects comma delimiting, anything else tab
/// # Errors
/// * if the file cannot be created or written
pub fn write_abundance_table(results: &[SampleResult], filename: &Path) -> anyhow::Result<()> {
    let labels: BTreeSet<&str> = results.iter()
        .flat_map(|result| result.estimate().fractions().keys().map(String::as_str))
        .collect();

    let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
    let delimiter: u8 = if is_csv { b',' } else { b'\t' };
    let mut csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(filename)
        .with_context(|| format!("Error while creating {filename:?}:"))?;

    let mut header = vec!["sample"];
    header.extend(labels.iter().copied());
    csv_writer.write_record(&header)?;

    for result in results.iter() {
        let mut row = vec![result.name().to_string()];
        for &label in labels.iter() {
            let fraction = result.estimate().fractions().get(label)
                .map(|value| value.to_string())
                .unwrap_or_else(|| "0".to_string());
            row.push(fraction);
        }
        csv_writer.write_record(&row)?;
    }

    csv_writer.flush()
        .with_context(|| format!("Error while writing {filename:?}:"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::abundance::AbundanceEstimate;
    use indexmap::IndexMap;

    fn result_with(name: &str, fractions: &[(&str, f64)]) -> SampleResult {
        let fractions: IndexMap<String, f64> = fractions.iter()
            .map(|&(label, value)| (label.to_string(), value))
            .collect();
        SampleResult::new(name.to_string(), AbundanceEstimate::new(fractions, None, false), 2)
    }

    #[test]
    fn test_union_columns_with_zero_fill() {
        let results = vec![
            result_with("wwtp_01", &[("LinA", 0.8), ("LinB", 0.1)]),
            // this sample merged the two lineages, so its group label differs
            result_with("wwtp_02", &[("LinA or LinB", 0.9)])
        ];

        let path = std::env::temp_dir()
            .join(format!("delineate_abundance_{}.csv", std::process::id()));
        write_abundance_table(&results, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "sample,LinA,LinA or LinB,LinB");
        assert_eq!(lines[1], "wwtp_01,0.8,0,0.1");
        assert_eq!(lines[2], "wwtp_02,0,0.9,0");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_tsv_delimiter_from_extension() {
        let results = vec![result_with("wwtp_01", &[("LinA", 0.5)])];
        let path = std::env::temp_dir()
            .join(format!("delineate_abundance_{}.tsv", std::process::id()));
        write_abundance_table(&results, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().next().unwrap(), "sample\tLinA");
        std::fs::remove_file(&path).ok();
    }
}
