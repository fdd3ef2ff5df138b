//! Exact-match filter over a Consolidated artifact.

use std::path::Path;

use crate::stage::{artifact_reader, field, read_header, StageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    pub rows_read: u64,
    pub rows_matched: u64,
}

/// Copies the header and the rows whose (SrcIP, DstIP) columns equal the
/// filters exactly. The whole input is read before the output is created,
/// matching the all-or-nothing contract of the stage runners.
pub fn filter_consolidated(
    input: &Path,
    output: &Path,
    src_ip: &str,
    dst_ip: &str,
) -> Result<ExportReport, StageError> {
    let mut reader = artifact_reader(input)?;
    let headers = read_header(&mut reader, input)?;

    let mut rows_read = 0u64;
    let mut matched = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows_read += 1;
        if field(&record, 0) == src_ip && field(&record, 1) == dst_ip {
            matched.push(record);
        }
    }

    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record(&headers)?;
    let rows_matched = matched.len() as u64;
    for record in matched {
        writer.write_record(&record)?;
    }
    writer.flush()?;

    Ok(ExportReport {
        rows_read,
        rows_matched,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const CONSOLIDATED_FIXTURE: &str = "\
SrcIP,DstIP,Count,MeanFlowDuration,StdFlowDuration,MeanFwdPkt,StdFwdPkt
A,B,2,300,100,15,5
A,C,1,120,0,7,0
B,A,4,50,10,2,1
";

    #[test]
    fn keeps_only_the_exact_pair() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("consolidated.csv");
        fs::write(&input, CONSOLIDATED_FIXTURE).expect("fixture write");
        let output = dir.path().join("export.csv");

        let report = filter_consolidated(&input, &output, "A", "B").expect("filter should run");
        assert_eq!(
            report,
            ExportReport {
                rows_read: 3,
                rows_matched: 1,
            }
        );

        let produced = fs::read_to_string(&output).expect("output should exist");
        assert_eq!(
            produced,
            "SrcIP,DstIP,Count,MeanFlowDuration,StdFlowDuration,MeanFwdPkt,StdFwdPkt\nA,B,2,300,100,15,5\n"
        );
    }

    #[test]
    fn pair_match_is_directional() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("consolidated.csv");
        fs::write(&input, CONSOLIDATED_FIXTURE).expect("fixture write");
        let output = dir.path().join("export.csv");

        let report = filter_consolidated(&input, &output, "B", "A").expect("filter should run");
        assert_eq!(report.rows_matched, 1);
        let produced = fs::read_to_string(&output).expect("output should exist");
        assert!(produced.contains("B,A,4"));
        assert!(!produced.contains("A,B,2"));
    }

    #[test]
    fn no_match_still_writes_the_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("consolidated.csv");
        fs::write(&input, CONSOLIDATED_FIXTURE).expect("fixture write");
        let output = dir.path().join("export.csv");

        let report = filter_consolidated(&input, &output, "Z", "Z").expect("filter should run");
        assert_eq!(report.rows_matched, 0);
        assert_eq!(
            fs::read_to_string(&output).expect("output should exist"),
            "SrcIP,DstIP,Count,MeanFlowDuration,StdFlowDuration,MeanFwdPkt,StdFwdPkt\n"
        );
    }

    #[test]
    fn empty_artifact_is_structural() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("consolidated.csv");
        fs::write(&input, "").expect("fixture write");
        let output = dir.path().join("export.csv");

        let error = filter_consolidated(&input, &output, "A", "B").expect_err("empty input");
        assert!(error.is_structural());
        assert!(!output.exists());
    }
}
