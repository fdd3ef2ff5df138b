use std::path::Path;

use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;

use crate::adapters::artifact_store::ArtifactStore;

/// S3-backed artifact store. The sync port is bridged onto the async SDK
/// client from inside the running tokio runtime.
#[derive(Clone)]
pub struct S3ArtifactStore {
    client: aws_sdk_s3::Client,
}

impl S3ArtifactStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

impl ArtifactStore for S3ArtifactStore {
    fn download_object(&self, bucket: &str, key: &str, target: &Path) -> Result<bool, String> {
        let bucket = bucket.to_string();
        let object_key = key.to_string();
        let target = target.to_path_buf();
        let client = self.client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let response = match client
                    .get_object()
                    .bucket(bucket)
                    .key(&object_key)
                    .send()
                    .await
                {
                    Ok(response) => response,
                    Err(error) => {
                        let absent = error
                            .as_service_error()
                            .map(GetObjectError::is_no_such_key)
                            .unwrap_or(false);
                        if absent {
                            return Ok(false);
                        }
                        return Err(format!(
                            "failed to read object '{object_key}' from s3: {error}"
                        ));
                    }
                };

                let body = response
                    .body
                    .collect()
                    .await
                    .map_err(|error| format!("failed to stream object body: {error}"))?;
                std::fs::write(&target, body.into_bytes())
                    .map_err(|error| format!("failed to write staged object: {error}"))?;
                Ok(true)
            })
        })
    }

    fn upload_object(&self, bucket: &str, key: &str, source: &Path) -> Result<(), String> {
        let bucket = bucket.to_string();
        let object_key = key.to_string();
        let source = source.to_path_buf();
        let client = self.client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let body = ByteStream::from_path(&source)
                    .await
                    .map_err(|error| format!("failed to read staged output file: {error}"))?;
                client
                    .put_object()
                    .bucket(bucket)
                    .key(object_key)
                    .body(body)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("failed to write object to s3: {error}"))
            })
        })
    }
}
