use forge_logging::forge_error;

use crate::{ApiError, FailureKind, FileEntry, ForgeApi, JobStatus};

/// Workspace access for finished jobs.
pub struct ArtifactFetcher<'a> {
    api: &'a dyn ForgeApi,
}

impl<'a> ArtifactFetcher<'a> {
    pub fn new(api: &'a dyn ForgeApi) -> Self {
        Self { api }
    }

    /// Lists the workspace of a succeeded job. Any other status is refused without a request.
    pub async fn list_files(
        &self,
        job_id: &str,
        status: JobStatus,
    ) -> Result<Vec<FileEntry>, ApiError> {
        if status != JobStatus::Succeeded {
            forge_error!(
                target: "forge::artifacts",
                "refusing to list files of job {} in status {}",
                job_id,
                status
            );
            return Err(ApiError::new(
                FailureKind::ContractViolation { status },
                format!("job {job_id} has not succeeded"),
            ));
        }
        self.api.list_files(job_id).await
    }

    pub async fn read_file(&self, job_id: &str, path: &str) -> Result<String, ApiError> {
        self.api.read_file(job_id, path).await
    }
}
