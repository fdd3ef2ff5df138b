use flow_pipeline_aws::adapters::s3::S3ArtifactStore;
use flow_pipeline_aws::adapters::sns::SnsNotifier;
use flow_pipeline_aws::adapters::sqs::SqsTaskQueue;
use flow_pipeline_aws::config::{optional_env, require_env};
use flow_pipeline_aws::logging::log_info;
use flow_pipeline_aws::worker::{ConsolidateStage, PipelineWorker, WorkerConfig};
use serde_json::json;

const COMPONENT: &str = "consolidate_worker";

#[tokio::main]
async fn main() {
    let consolidate_queue_url = require_env("FLOW_CONSOLIDATE_QUEUE_URL");
    let alert_topic_arn = optional_env("FLOW_ALERT_TOPIC_ARN");

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let s3_client = aws_sdk_s3::Client::new(&aws_config);
    let sqs_client = aws_sdk_sqs::Client::new(&aws_config);

    let worker = PipelineWorker::new(
        WorkerConfig::new(COMPONENT),
        ConsolidateStage,
        S3ArtifactStore::new(s3_client),
        SqsTaskQueue::new(sqs_client, consolidate_queue_url),
    );

    let worker = match alert_topic_arn {
        Some(topic_arn) => {
            let sns_client = aws_sdk_sns::Client::new(&aws_config);
            worker.with_notifier(SnsNotifier::new(sns_client, topic_arn))
        }
        None => {
            log_info(
                COMPONENT,
                "notifications_disabled",
                json!({ "reason": "FLOW_ALERT_TOPIC_ARN is not configured" }),
            );
            worker
        }
    };

    worker.run()
}
