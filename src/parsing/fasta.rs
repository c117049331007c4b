
use anyhow::{bail, Context};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Opens a file with transparent gzip decompression based on the extension
pub fn open_maybe_gzip(filename: &Path) -> anyhow::Result<Box<dyn std::io::Read>> {
    let file = File::open(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;
    if filename.extension().unwrap_or_default() == "gz" {
        Ok(Box::new(flate2::read::MultiGzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Loads a single-contig FASTA file into one contiguous uppercase sequence.
/// # Arguments
/// * `filename` - FASTA path, optionally gzipped
/// # Errors
/// * if the file is missing a header, contains more than one contig, or fails to read
pub fn load_single_contig(filename: &Path) -> anyhow::Result<Vec<u8>> {
    let reader = BufReader::new(open_maybe_gzip(filename)?);

    let mut sequence: Vec<u8> = vec![];
    let mut header_seen = false;
    for line in reader.lines() {
        let line = line.with_context(|| format!("Error while reading {filename:?}:"))?;
        if let Some(header) = line.strip_prefix('>') {
            if header_seen {
                bail!("{filename:?} contains more than one contig; a single-contig reference is required");
            }
            log::debug!("Reference contig: {header:?}");
            header_seen = true;
        } else if !line.is_empty() {
            if !header_seen {
                bail!("{filename:?} does not start with a FASTA header");
            }
            sequence.extend(line.trim().bytes().map(|b| b.to_ascii_uppercase()));
        }
    }

    if sequence.is_empty() {
        bail!("{filename:?} contains no sequence data");
    }
    Ok(sequence)
}
