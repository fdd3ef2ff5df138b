//! Artifact key derivation for the blob store layout.
//!
//! Layout: `raw/` holds uploaded captures, `summaries/` holds per-capture
//! Stage 1 output, and a single shared `consolidated/consolidated.csv` holds
//! the Stage 2 destination. The consolidated key being shared means two
//! concurrent final-stage consumers race last-writer-wins on it; run one.

use crate::contract::MessageError;

pub const RAW_PREFIX: &str = "raw";
pub const SUMMARY_PREFIX: &str = "summaries";
const CONSOLIDATED_KEY: &str = "consolidated/consolidated.csv";

pub fn raw_object_key(file_name: &str) -> String {
    format!("{RAW_PREFIX}/{file_name}")
}

/// Derives the Stage 1 output key from the raw input key:
/// `raw/<name>.csv` -> `summaries/<name>-summary.csv`.
pub fn summary_object_key(raw_key: &str) -> Result<String, MessageError> {
    let file_name = raw_key.rsplit('/').next().unwrap_or("");
    if file_name.is_empty() {
        return Err(MessageError::new(format!(
            "raw key '{raw_key}' has no file name"
        )));
    }
    let stem = file_name.strip_suffix(".csv").unwrap_or(file_name);
    Ok(format!("{SUMMARY_PREFIX}/{stem}-summary.csv"))
}

/// The single shared Stage 2 destination.
pub fn consolidated_object_key() -> &'static str {
    CONSOLIDATED_KEY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_keys_live_under_the_raw_prefix() {
        assert_eq!(raw_object_key("data-20221207.csv"), "raw/data-20221207.csv");
    }

    #[test]
    fn summary_key_replaces_the_csv_suffix() {
        let key = summary_object_key("raw/data-20221207.csv").expect("key should derive");
        assert_eq!(key, "summaries/data-20221207-summary.csv");
    }

    #[test]
    fn summary_key_uses_only_the_file_name_component() {
        let key = summary_object_key("raw/2022/12/data.csv").expect("key should derive");
        assert_eq!(key, "summaries/data-summary.csv");
    }

    #[test]
    fn summary_key_without_csv_suffix_still_derives() {
        let key = summary_object_key("raw/data").expect("key should derive");
        assert_eq!(key, "summaries/data-summary.csv");
    }

    #[test]
    fn summary_key_requires_a_file_name() {
        let error = summary_object_key("raw/").expect_err("trailing slash should fail");
        assert!(error.message().contains("has no file name"));
    }

    #[test]
    fn consolidated_destination_is_fixed() {
        assert_eq!(consolidated_object_key(), "consolidated/consolidated.csv");
    }
}
