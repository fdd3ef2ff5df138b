//! Scoped local scratch files and blob-store transfer around one stage run.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::adapters::artifact_store::ArtifactStore;
use crate::worker::TaskError;

/// A local scratch file exclusively owned by one task. The file is removed
/// on every exit path, success and failure alike, via `Drop`.
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn new(prefix: &str) -> Result<Self, String> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|error| format!("failed to read clock for scratch file: {error}"))?
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("{prefix}-{}-{timestamp}.csv", std::process::id()));
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Runs `body` between a staged download and a staged upload.
///
/// The referenced input object must exist; its absence is surfaced as
/// transient so the queue redelivers the task. When `stage_prior_output` is
/// set, the existing output artifact is fetched into the output scratch
/// file first, and its absence means "start from empty" rather than an
/// error. On success the output scratch file is uploaded to `output_key`.
pub fn stage_task<S, T, F>(
    store: &S,
    bucket: &str,
    input_key: &str,
    output_key: &str,
    stage_prior_output: bool,
    body: F,
) -> Result<T, TaskError>
where
    S: ArtifactStore,
    F: FnOnce(&Path, &Path) -> Result<T, TaskError>,
{
    let input = ScratchFile::new("stage-input").map_err(TaskError::Transient)?;
    let output = ScratchFile::new("stage-output").map_err(TaskError::Transient)?;

    let found = store
        .download_object(bucket, input_key, input.path())
        .map_err(TaskError::Transient)?;
    if !found {
        return Err(TaskError::Transient(format!(
            "input object '{input_key}' does not exist in bucket '{bucket}'"
        )));
    }

    if stage_prior_output {
        store
            .download_object(bucket, output_key, output.path())
            .map_err(TaskError::Transient)?;
    }

    let result = body(input.path(), output.path())?;

    store
        .upload_object(bucket, output_key, output.path())
        .map_err(TaskError::Transient)?;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    struct MemoryStore {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        fail_uploads: bool,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                objects: Mutex::new(HashMap::new()),
                fail_uploads: false,
            }
        }

        fn seed(&self, bucket: &str, key: &str, body: &[u8]) {
            self.objects
                .lock()
                .expect("poisoned mutex")
                .insert(format!("{bucket}/{key}"), body.to_vec());
        }

        fn body(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
            self.objects
                .lock()
                .expect("poisoned mutex")
                .get(&format!("{bucket}/{key}"))
                .cloned()
        }
    }

    impl ArtifactStore for MemoryStore {
        fn download_object(&self, bucket: &str, key: &str, target: &Path) -> Result<bool, String> {
            match self.body(bucket, key) {
                Some(body) => {
                    fs::write(target, body).map_err(|error| error.to_string())?;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        fn upload_object(&self, bucket: &str, key: &str, source: &Path) -> Result<(), String> {
            if self.fail_uploads {
                return Err("simulated upload failure".to_string());
            }
            let body = fs::read(source).map_err(|error| error.to_string())?;
            self.seed(bucket, key, &body);
            Ok(())
        }
    }

    #[test]
    fn uploads_the_output_scratch_file_on_success() {
        let store = MemoryStore::new();
        store.seed("b", "raw/data.csv", b"header\nrow\n");

        let result = stage_task(
            &store,
            "b",
            "raw/data.csv",
            "out/result.csv",
            false,
            |input, output| {
                let staged =
                    fs::read(input).map_err(|error| TaskError::Transient(error.to_string()))?;
                assert_eq!(staged, b"header\nrow\n");
                fs::write(output, b"processed")
                    .map_err(|error| TaskError::Transient(error.to_string()))?;
                Ok("done")
            },
        )
        .expect("staging should succeed");

        assert_eq!(result, "done");
        assert_eq!(store.body("b", "out/result.csv"), Some(b"processed".to_vec()));
    }

    #[test]
    fn scratch_files_are_removed_on_success() {
        let store = MemoryStore::new();
        store.seed("b", "raw/data.csv", b"data");

        let mut seen = Vec::new();
        stage_task(
            &store,
            "b",
            "raw/data.csv",
            "out/result.csv",
            false,
            |input, output| {
                seen.push(input.to_path_buf());
                seen.push(output.to_path_buf());
                fs::write(output, b"x").map_err(|error| TaskError::Transient(error.to_string()))?;
                Ok(())
            },
        )
        .expect("staging should succeed");

        for path in seen {
            assert!(!path.exists(), "scratch file {} must be removed", path.display());
        }
    }

    #[test]
    fn scratch_files_are_removed_when_the_body_fails() {
        let store = MemoryStore::new();
        store.seed("b", "raw/data.csv", b"data");

        let mut seen = Vec::new();
        let error = stage_task(
            &store,
            "b",
            "raw/data.csv",
            "out/result.csv",
            false,
            |input, output| {
                seen.push(input.to_path_buf());
                seen.push(output.to_path_buf());
                Err::<(), _>(TaskError::Discard("bad artifact".to_string()))
            },
        )
        .expect_err("body failure should surface");

        assert!(matches!(error, TaskError::Discard(_)));
        for path in seen {
            assert!(!path.exists(), "scratch file {} must be removed", path.display());
        }
    }

    #[test]
    fn missing_input_object_is_transient() {
        let store = MemoryStore::new();

        let error =
            stage_task(&store, "b", "raw/missing.csv", "out/result.csv", false, |_, _| Ok(()))
                .expect_err("missing input should fail");

        assert!(matches!(error, TaskError::Transient(_)));
    }

    #[test]
    fn missing_prior_output_is_not_an_error() {
        let store = MemoryStore::new();
        store.seed("b", "summaries/data-summary.csv", b"summary");

        stage_task(
            &store,
            "b",
            "summaries/data-summary.csv",
            "consolidated/consolidated.csv",
            true,
            |_, output| {
                assert!(!output.exists(), "absent prior output starts from empty");
                fs::write(output, b"fresh")
                    .map_err(|error| TaskError::Transient(error.to_string()))?;
                Ok(())
            },
        )
        .expect("absent prior output must not fail staging");
    }

    #[test]
    fn prior_output_is_staged_when_present() {
        let store = MemoryStore::new();
        store.seed("b", "summaries/data-summary.csv", b"summary");
        store.seed("b", "consolidated/consolidated.csv", b"previous");

        stage_task(
            &store,
            "b",
            "summaries/data-summary.csv",
            "consolidated/consolidated.csv",
            true,
            |_, output| {
                let staged =
                    fs::read(output).map_err(|error| TaskError::Transient(error.to_string()))?;
                assert_eq!(staged, b"previous");
                fs::write(output, b"fresh")
                    .map_err(|error| TaskError::Transient(error.to_string()))?;
                Ok(())
            },
        )
        .expect("staging should succeed");

        assert_eq!(
            store.body("b", "consolidated/consolidated.csv"),
            Some(b"fresh".to_vec())
        );
    }

    #[test]
    fn upload_failure_is_transient() {
        let mut store = MemoryStore::new();
        store.fail_uploads = true;
        store.seed("b", "raw/data.csv", b"data");

        let error = stage_task(
            &store,
            "b",
            "raw/data.csv",
            "out/result.csv",
            false,
            |_, output| {
                fs::write(output, b"x").map_err(|error| TaskError::Transient(error.to_string()))?;
                Ok(())
            },
        )
        .expect_err("upload failure should surface");

        assert!(matches!(error, TaskError::Transient(_)));
    }
}
