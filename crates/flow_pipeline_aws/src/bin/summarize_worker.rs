use flow_pipeline_aws::adapters::s3::S3ArtifactStore;
use flow_pipeline_aws::adapters::sqs::SqsTaskQueue;
use flow_pipeline_aws::config::require_env;
use flow_pipeline_aws::worker::{PipelineWorker, SummarizeStage, WorkerConfig};

const COMPONENT: &str = "summarize_worker";

#[tokio::main]
async fn main() {
    let summarize_queue_url = require_env("FLOW_SUMMARIZE_QUEUE_URL");
    let consolidate_queue_url = require_env("FLOW_CONSOLIDATE_QUEUE_URL");

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let s3_client = aws_sdk_s3::Client::new(&aws_config);
    let sqs_client = aws_sdk_sqs::Client::new(&aws_config);

    let worker = PipelineWorker::new(
        WorkerConfig::new(COMPONENT),
        SummarizeStage,
        S3ArtifactStore::new(s3_client),
        SqsTaskQueue::new(sqs_client.clone(), summarize_queue_url),
    )
    .with_downstream(SqsTaskQueue::new(sqs_client, consolidate_queue_url));

    worker.run()
}
