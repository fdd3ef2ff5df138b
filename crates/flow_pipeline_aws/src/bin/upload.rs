use std::path::Path;

use flow_pipeline_aws::adapters::artifact_store::ArtifactStore;
use flow_pipeline_aws::adapters::s3::S3ArtifactStore;
use flow_pipeline_aws::adapters::sqs::SqsTaskQueue;
use flow_pipeline_aws::adapters::task_queue::TaskQueue;
use flow_pipeline_aws::logging::{log_error, log_info};
use flow_pipeline_core::contract::{encode_task, TaskDescriptor};
use flow_pipeline_core::storage_keys::raw_object_key;
use serde_json::json;

const COMPONENT: &str = "upload_client";

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [file_path, bucket, queue_url] = args.as_slice() else {
        eprintln!("Usage: upload <localFilePath> <bucketName> <queueUrl>");
        std::process::exit(1);
    };

    let Some(file_name) = Path::new(file_path).file_name().and_then(|name| name.to_str()) else {
        eprintln!("File path must include a file name.");
        std::process::exit(1);
    };
    let key = raw_object_key(file_name);

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = S3ArtifactStore::new(aws_sdk_s3::Client::new(&aws_config));
    let queue = SqsTaskQueue::new(aws_sdk_sqs::Client::new(&aws_config), queue_url.clone());

    // Upload before send: a received descriptor always references an object
    // that already exists.
    if let Err(error) = store.upload_object(bucket, &key, Path::new(file_path)) {
        log_error(COMPONENT, "upload_failed", json!({ "error": error }));
        std::process::exit(1);
    }
    log_info(
        COMPONENT,
        "object_uploaded",
        json!({ "bucket": bucket, "key": key }),
    );

    let descriptor = TaskDescriptor {
        bucket: bucket.clone(),
        key: key.clone(),
    };
    if let Err(error) = queue.send(&encode_task(&descriptor)) {
        log_error(COMPONENT, "enqueue_failed", json!({ "error": error }));
        std::process::exit(1);
    }
    log_info(
        COMPONENT,
        "task_enqueued",
        json!({ "queue_url": queue_url, "bucket": bucket, "key": key }),
    );
}
