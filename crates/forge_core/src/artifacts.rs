use crate::{ArtifactEntry, ContractViolation, Job, JobId, JobStatus};

/// Prefix of the content shown in place of a file that could not be read.
pub const READ_ERROR_PREFIX: &str = "Error reading file: ";

/// Returns the job id to list files for, or why listing is not allowed.
pub fn list_files_gate(job: &Job) -> Result<&str, ContractViolation> {
    if job.status == JobStatus::Succeeded {
        Ok(job.id.as_str())
    } else {
        Err(ContractViolation {
            job_id: job.id.clone(),
            status: job.status,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) enum FileList {
    #[default]
    Idle,
    Loading,
    Loaded(Vec<ArtifactEntry>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FileContent {
    Loading,
    Loaded(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpenFile {
    pub(crate) entry: ArtifactEntry,
    pub(crate) content: FileContent,
}

/// Files of the selected job, tied to the selection they were fetched for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ArtifactState {
    key: Option<(JobId, JobStatus)>,
    pub(crate) files: FileList,
    pub(crate) open: Option<OpenFile>,
}

impl ArtifactState {
    /// The job id these artifacts belong to, if any.
    pub(crate) fn job_id(&self) -> Option<&str> {
        self.key.as_ref().map(|(id, _)| id.as_str())
    }

    pub(crate) fn is_current(&self, key: Option<(&str, JobStatus)>) -> bool {
        match (&self.key, key) {
            (None, None) => true,
            (Some((id, status)), Some((other_id, other_status))) => {
                id == other_id && *status == other_status
            }
            _ => false,
        }
    }

    /// Drops everything fetched for a previous selection and binds to `key`.
    pub(crate) fn rebind(&mut self, key: Option<(&str, JobStatus)>) {
        self.key = key.map(|(id, status)| (id.to_string(), status));
        self.files = FileList::Idle;
        self.open = None;
    }

    pub(crate) fn find(&self, path: &str) -> Option<&ArtifactEntry> {
        match &self.files {
            FileList::Loaded(files) => files.iter().find(|entry| entry.path == path),
            _ => None,
        }
    }
}
