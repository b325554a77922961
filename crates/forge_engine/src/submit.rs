use forge_logging::forge_info;

use crate::{ApiError, ForgeApi, JobMode, JobStatus, SubmitJobRequest};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("a modify job needs the id of the project to modify")]
    MissingProjectId,
    #[error("a create job must not name an existing project")]
    UnexpectedProjectId,
    #[error("the specification is empty")]
    EmptySpec,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A job as the user described it, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    pub project_name: String,
    pub spec: String,
    pub mode: JobMode,
    pub project_id: Option<String>,
    pub stack: Option<String>,
    pub max_iters: Option<u32>,
}

impl NewJob {
    pub fn create(project_name: impl Into<String>, spec: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            spec: spec.into(),
            mode: JobMode::Create,
            project_id: None,
            stack: None,
            max_iters: None,
        }
    }

    fn into_request(self) -> Result<SubmitJobRequest, SubmissionError> {
        match (self.mode, self.project_id.as_deref()) {
            (JobMode::Create, Some(_)) => return Err(SubmissionError::UnexpectedProjectId),
            (JobMode::Modify, None) => return Err(SubmissionError::MissingProjectId),
            (JobMode::Modify, Some(id)) if id.trim().is_empty() => {
                return Err(SubmissionError::MissingProjectId)
            }
            _ => {}
        }
        if self.spec.trim().is_empty() {
            return Err(SubmissionError::EmptySpec);
        }
        Ok(SubmitJobRequest {
            project_name: self.project_name,
            spec: self.spec,
            project_id: self.project_id,
            mode: self.mode,
            stack: self.stack.filter(|stack| !stack.trim().is_empty()),
            max_iters: self.max_iters,
        })
    }
}

/// What the server accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub id: String,
    pub status: JobStatus,
    pub project_name: String,
}

/// Validates and posts new jobs. Has no store of its own.
pub struct JobSubmitter<'a> {
    api: &'a dyn ForgeApi,
}

impl<'a> JobSubmitter<'a> {
    pub fn new(api: &'a dyn ForgeApi) -> Self {
        Self { api }
    }

    pub async fn submit(&self, job: NewJob) -> Result<JobHandle, SubmissionError> {
        let request = job.into_request()?;
        let response = self.api.submit_job(&request).await?;
        let status = response.status.unwrap_or_default();
        forge_info!(
            target: "forge::submit",
            "{} job {} accepted as {}",
            match request.mode {
                JobMode::Create => "create",
                JobMode::Modify => "modify",
            },
            response.job_id,
            status
        );
        Ok(JobHandle {
            id: response.job_id,
            status,
            project_name: request.project_name,
        })
    }
}
