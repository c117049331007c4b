
use anyhow::{bail, Context};
use std::path::{Path, PathBuf};

/// One sample in a batch: its counts file and a display name
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SampleSheetEntry {
    pub counts_fn: PathBuf,
    pub name: String
}

/// Loads a tab-separated sample sheet of the form `counts_file<TAB>sample_name`.
/// Blank lines are skipped; a missing name falls back to the file stem.
/// # Arguments
/// * `filename` - the sample sheet path
/// # Errors
/// * if the file fails to read or a referenced counts file does not exist
pub fn load_sample_sheet(filename: &Path) -> anyhow::Result<Vec<SampleSheetEntry>> {
    let content = std::fs::read_to_string(filename)
        .with_context(|| format!("Error while reading sample sheet {filename:?}:"))?;

    let mut entries = vec![];
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let counts_fn = PathBuf::from(fields.next().unwrap().trim());
        let name = match fields.next() {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => counts_fn.file_stem().unwrap_or_default().to_string_lossy().into_owned()
        };

        if !counts_fn.exists() {
            bail!("Sample sheet entry {name:?} references a missing counts file: {counts_fn:?}");
        }
        entries.push(SampleSheetEntry { counts_fn, name });
    }

    if entries.is_empty() {
        bail!("Sample sheet {filename:?} contains no samples");
    }
    Ok(entries)
}

/// Loads a plain list file with one name per line, skipping blanks.
/// Used for both mutation lists and candidate lineage lists.
pub fn load_name_list(filename: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(filename)
        .with_context(|| format!("Error while reading list file {filename:?}:"))?;
    Ok(content.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_name_list() {
        let path = std::env::temp_dir().join(format!("delineate_list_{}.txt", std::process::id()));
        std::fs::write(&path, "S:N501Y\n\nS:E484K\n").unwrap();
        let names = load_name_list(&path).unwrap();
        assert_eq!(names, vec!["S:N501Y".to_string(), "S:E484K".to_string()]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_sample_sheet_missing_file() {
        let path = std::env::temp_dir().join(format!("delineate_sheet_{}.txt", std::process::id()));
        std::fs::write(&path, "/definitely/not/a/file.tsv\tsample1\n").unwrap();
        assert!(load_sample_sheet(&path).is_err());
        std::fs::remove_file(&path).ok();
    }
}
