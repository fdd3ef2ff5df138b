use std::path::Path;

/// Blob-store port. The bucket is named per call because the task
/// descriptor carries it.
pub trait ArtifactStore {
    /// Downloads `key` into `target`. Returns `Ok(false)` when the object
    /// does not exist; callers decide whether absence is an error.
    fn download_object(&self, bucket: &str, key: &str, target: &Path) -> Result<bool, String>;

    fn upload_object(&self, bucket: &str, key: &str, source: &Path) -> Result<(), String>;
}
