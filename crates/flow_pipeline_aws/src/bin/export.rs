use std::path::Path;

use flow_pipeline_aws::adapters::artifact_store::ArtifactStore;
use flow_pipeline_aws::adapters::s3::S3ArtifactStore;
use flow_pipeline_aws::logging::{log_error, log_info};
use flow_pipeline_aws::staging::ScratchFile;
use flow_pipeline_core::export::filter_consolidated;
use serde_json::json;

const COMPONENT: &str = "export_client";
const EXPORT_FILE: &str = "export.csv";

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [bucket, key, src_ip, dst_ip] = args.as_slice() else {
        eprintln!("Usage: export <bucket> <key> <srcIp> <dstIp>");
        std::process::exit(1);
    };

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = S3ArtifactStore::new(aws_sdk_s3::Client::new(&aws_config));

    let scratch = match ScratchFile::new("export-input") {
        Ok(scratch) => scratch,
        Err(error) => {
            log_error(COMPONENT, "staging_failed", json!({ "error": error }));
            std::process::exit(1);
        }
    };

    match store.download_object(bucket, key, scratch.path()) {
        Ok(true) => {}
        Ok(false) => {
            log_error(
                COMPONENT,
                "object_not_found",
                json!({ "bucket": bucket, "key": key }),
            );
            std::process::exit(1);
        }
        Err(error) => {
            log_error(COMPONENT, "download_failed", json!({ "error": error }));
            std::process::exit(1);
        }
    }

    match filter_consolidated(scratch.path(), Path::new(EXPORT_FILE), src_ip, dst_ip) {
        Ok(report) => {
            log_info(
                COMPONENT,
                "export_completed",
                json!({
                    "output": EXPORT_FILE,
                    "src_ip": src_ip,
                    "dst_ip": dst_ip,
                    "rows_read": report.rows_read,
                    "rows_matched": report.rows_matched,
                }),
            );
        }
        Err(error) => {
            log_error(
                COMPONENT,
                "export_failed",
                json!({ "error": error.to_string() }),
            );
            std::process::exit(1);
        }
    }
}
