
use anyhow::Context;
use std::path::Path;

use crate::parsing::fasta::open_maybe_gzip;

/// Loads a JSON file into any deserializable type, with transparent gzip support.
/// # Arguments
/// * `filename` - the file path to open and parse
/// # Errors
/// * if the file does not open properly
/// * if the deserialization throws errors
pub fn load_json<T: serde::de::DeserializeOwned>(filename: &Path) -> anyhow::Result<T> {
    let reader = open_maybe_gzip(filename)?;
    let result: T = serde_json::from_reader(reader)
        .with_context(|| format!("Error while deserializing {filename:?}:"))?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn test_load_json_preserves_order() {
        let path = std::env::temp_dir().join(format!("delineate_json_{}.json", std::process::id()));
        std::fs::write(&path, r#"{"S:N501Y": 1.0, "S:E484K": 0.5}"#).unwrap();

        let table: IndexMap<String, f64> = load_json(&path).unwrap();
        assert_eq!(
            table.keys().collect::<Vec<_>>(),
            vec!["S:N501Y", "S:E484K"]
        );
        assert_eq!(table["S:E484K"], 0.5);
        std::fs::remove_file(&path).ok();
    }
}
