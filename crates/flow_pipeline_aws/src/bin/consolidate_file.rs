use std::path::Path;

use flow_pipeline_aws::logging::{log_error, log_info};
use flow_pipeline_core::stage::run_consolidate;
use serde_json::json;

const COMPONENT: &str = "consolidate_file";

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [input, output] = args.as_slice() else {
        eprintln!("Usage: consolidate_file <summaryCsvPath> <outputConsolidatedCsvPath>");
        std::process::exit(1);
    };

    match run_consolidate(Path::new(input), Path::new(output)) {
        Ok(report) => {
            log_info(
                COMPONENT,
                "stage_completed",
                json!({
                    "input": input,
                    "output": output,
                    "rows_read": report.rows_read,
                    "groups_written": report.groups_written,
                }),
            );
        }
        Err(error) => {
            log_error(
                COMPONENT,
                "stage_failed",
                json!({ "input": input, "error": error.to_string() }),
            );
            std::process::exit(1);
        }
    }
}
