use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{JobHandle, SubmissionError};

/// Identifier echoed back with every event so callers can match responses to requests.
pub type Ticket = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobMode {
    Create,
    Modify,
}

/// A job as returned by `GET /jobs` and `GET /jobs/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub report: Option<Value>,
    #[serde(default)]
    pub mode: Option<JobMode>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub created: Option<f64>,
    #[serde(default)]
    pub stack: Option<String>,
    #[serde(default)]
    pub logs: Option<Vec<Value>>,
}

/// Body of `POST /jobs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitJobRequest {
    pub(crate) project_name: String,
    pub(crate) spec: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) project_id: Option<String>,
    pub(crate) mode: JobMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) max_iters: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmitJobResponse {
    pub job_id: String,
    #[serde(default)]
    pub status: Option<JobStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FileListing {
    #[serde(default)]
    pub(crate) files: Vec<FileEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FileBody {
    pub(crate) content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: f64,
    #[serde(default)]
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessageLog {
    #[serde(default)]
    pub(crate) messages: Vec<MessageRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created: Option<f64>,
    #[serde(default)]
    pub updated: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProjectList {
    #[serde(default)]
    pub(crate) projects: Vec<ProjectRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ProviderRequest<'a> {
    pub(crate) provider: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProviderAck {
    #[serde(default)]
    pub(crate) provider: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Whether retrying later might succeed.
    pub fn is_transient(&self) -> bool {
        match self.kind {
            FailureKind::Transport | FailureKind::Timeout => true,
            FailureKind::HttpStatus(code) => code >= 500,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Transport,
    Decode,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    /// Artifact access for a job that has not succeeded; a caller bug.
    ContractViolation { status: JobStatus },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Transport => write!(f, "transport error"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::ContractViolation { status } => {
                write!(f, "artifacts requested for a {status} job")
            }
        }
    }
}

/// Results reported by the engine thread, tagged with the ticket of the command.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    PollTick,
    JobsListed {
        ticket: Ticket,
        result: Result<Vec<JobRecord>, ApiError>,
    },
    JobFetched {
        ticket: Ticket,
        job_id: String,
        result: Result<JobRecord, ApiError>,
    },
    JobSubmitted {
        ticket: Ticket,
        result: Result<JobHandle, SubmissionError>,
    },
    FilesListed {
        ticket: Ticket,
        job_id: String,
        result: Result<Vec<FileEntry>, ApiError>,
    },
    FileRead {
        ticket: Ticket,
        job_id: String,
        path: String,
        result: Result<String, ApiError>,
    },
    MessagesLoaded {
        ticket: Ticket,
        project_id: String,
        result: Result<Vec<MessageRecord>, ApiError>,
    },
    ProviderSet {
        ticket: Ticket,
        result: Result<String, ApiError>,
    },
    ProjectsListed {
        ticket: Ticket,
        result: Result<Vec<ProjectRecord>, ApiError>,
    },
    HealthChecked {
        ticket: Ticket,
        result: Result<(), ApiError>,
    },
}
