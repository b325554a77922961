use std::fmt;

use serde_json::Value;

pub type JobId = String;
pub type ProjectId = String;

/// Identifier the core assigns to each outbound request; responses echo it back.
pub type Ticket = u64;

/// Prefix of the project name used for modify jobs.
pub const MODIFY_NAME_PREFIX: &str = "project_";
const MODIFY_NAME_ID_CHARS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobStatus {
    #[default]
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    fn rank(self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Running => 1,
            JobStatus::Succeeded | JobStatus::Failed => 2,
        }
    }

    /// Whether a cached job in `self` may be replaced by a copy in `next`.
    ///
    /// Terminal statuses are immutable and nothing moves backwards.
    pub fn may_become(self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return self == next;
        }
        next.rank() >= self.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobMode {
    Create,
    Modify,
}

impl JobMode {
    pub fn as_str(self) -> &'static str {
        match self {
            JobMode::Create => "create",
            JobMode::Modify => "modify",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Job {
    pub id: JobId,
    pub project_name: String,
    pub status: JobStatus,
    /// Opaque diagnostic payload; present once processing has started.
    pub report: Option<Value>,
    pub mode: Option<JobMode>,
    pub project_id: Option<ProjectId>,
    pub created: Option<f64>,
    pub stack: Option<String>,
    pub logs: Vec<Value>,
}

impl Job {
    /// The job as known right after submission, before the service echoes details.
    pub fn from_handle(handle: &JobHandle, draft: &JobDraft) -> Self {
        Self {
            id: handle.id.clone(),
            project_name: handle.project_name.clone(),
            status: handle.status,
            report: None,
            mode: Some(draft.mode),
            project_id: draft.project_id.clone(),
            created: None,
            stack: draft.stack.clone(),
            logs: Vec::new(),
        }
    }
}

/// What the submitter returns for a freshly created job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub id: JobId,
    pub status: JobStatus,
    pub project_name: String,
}

/// A job-creation request before it is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDraft {
    pub project_name: String,
    pub spec: String,
    pub mode: JobMode,
    pub project_id: Option<ProjectId>,
    pub stack: Option<String>,
    pub max_iters: Option<u32>,
}

impl JobDraft {
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

    /// Modify job against `project_id`, labelled with the derived project name.
    pub fn modify(project_id: impl Into<ProjectId>, spec: impl Into<String>) -> Self {
        let project_id = project_id.into();
        Self {
            project_name: modify_project_name(&project_id),
            spec: spec.into(),
            mode: JobMode::Modify,
            project_id: Some(project_id),
            stack: None,
            max_iters: None,
        }
    }
}

/// `project_` followed by the first eight characters of the project id.
pub fn modify_project_name(project_id: &str) -> String {
    let short: String = project_id.chars().take(MODIFY_NAME_ID_CHARS).collect();
    format!("{MODIFY_NAME_PREFIX}{short}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    /// Seconds since the epoch.
    pub timestamp: f64,
    pub job_id: Option<JobId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactEntry {
    pub path: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub created: Option<f64>,
    pub updated: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// The service could not be reached or the request timed out.
    Transport,
    /// The service answered with a non-success status.
    Server { status: u16 },
    /// The response body did not have the expected shape.
    Decode,
    /// Refused locally before any request was sent.
    Rejected,
    /// An artifact operation was attempted against a job that has not succeeded.
    ContractViolation,
}

/// A failed request as the core sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Transport, message)
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            RemoteErrorKind::Server { status } => write!(f, "server error {status}: {}", self.message),
            RemoteErrorKind::Transport => write!(f, "transport error: {}", self.message),
            RemoteErrorKind::Decode => write!(f, "unexpected response: {}", self.message),
            RemoteErrorKind::Rejected => write!(f, "rejected: {}", self.message),
            RemoteErrorKind::ContractViolation => {
                write!(f, "contract violation: {}", self.message)
            }
        }
    }
}

impl std::error::Error for RemoteError {}

/// Raised when an artifact operation is requested for a job that has not succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractViolation {
    pub job_id: JobId,
    pub status: JobStatus,
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "artifacts requested for job {} with status {}",
            self.job_id, self.status
        )
    }
}

impl std::error::Error for ContractViolation {}
