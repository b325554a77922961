//! Mapping between the engine's wire types and the core's domain types.

use forge_core::{
    ArtifactEntry, Effect, Job, JobDraft, JobHandle, JobMode, JobStatus, Message, MessageRole,
    Msg, Project, RemoteError, RemoteErrorKind,
};
use forge_engine::{
    ApiError, EngineCommand, EngineEvent, FailureKind, FileEntry, JobRecord, MessageRecord,
    NewJob, ProjectRecord, SubmissionError,
};
use forge_logging::forge_debug;

pub fn status_from_wire(status: forge_engine::JobStatus) -> JobStatus {
    match status {
        forge_engine::JobStatus::Queued => JobStatus::Queued,
        forge_engine::JobStatus::Running => JobStatus::Running,
        forge_engine::JobStatus::Succeeded => JobStatus::Succeeded,
        forge_engine::JobStatus::Failed => JobStatus::Failed,
    }
}

fn status_to_wire(status: JobStatus) -> forge_engine::JobStatus {
    match status {
        JobStatus::Queued => forge_engine::JobStatus::Queued,
        JobStatus::Running => forge_engine::JobStatus::Running,
        JobStatus::Succeeded => forge_engine::JobStatus::Succeeded,
        JobStatus::Failed => forge_engine::JobStatus::Failed,
    }
}

fn mode_from_wire(mode: forge_engine::JobMode) -> JobMode {
    match mode {
        forge_engine::JobMode::Create => JobMode::Create,
        forge_engine::JobMode::Modify => JobMode::Modify,
    }
}

fn mode_to_wire(mode: JobMode) -> forge_engine::JobMode {
    match mode {
        JobMode::Create => forge_engine::JobMode::Create,
        JobMode::Modify => forge_engine::JobMode::Modify,
    }
}

pub fn job_from_record(record: JobRecord) -> Job {
    Job {
        id: record.id,
        project_name: record.project_name,
        status: status_from_wire(record.status),
        report: record.report.filter(|report| !report.is_null()),
        mode: record.mode.map(mode_from_wire),
        project_id: record.project_id,
        created: record.created,
        stack: record.stack,
        logs: record.logs.unwrap_or_default(),
    }
}

fn handle_from_engine(handle: forge_engine::JobHandle) -> JobHandle {
    JobHandle {
        id: handle.id,
        status: status_from_wire(handle.status),
        project_name: handle.project_name,
    }
}

fn new_job_from_draft(draft: JobDraft) -> NewJob {
    NewJob {
        project_name: draft.project_name,
        spec: draft.spec,
        mode: mode_to_wire(draft.mode),
        project_id: draft.project_id,
        stack: draft.stack,
        max_iters: draft.max_iters,
    }
}

fn entry_from_wire(entry: FileEntry) -> ArtifactEntry {
    ArtifactEntry {
        path: entry.path,
        size: entry.size,
    }
}

fn message_from_record(record: MessageRecord) -> Message {
    Message {
        id: record.id,
        role: match record.role {
            forge_engine::MessageRole::User => MessageRole::User,
            forge_engine::MessageRole::Assistant => MessageRole::Assistant,
        },
        content: record.content,
        timestamp: record.timestamp,
        job_id: record.job_id,
    }
}

fn project_from_record(record: ProjectRecord) -> Project {
    Project {
        id: record.id,
        name: record.name,
        description: record.description.unwrap_or_default(),
        created: record.created,
        updated: record.updated,
    }
}

pub fn remote_error(err: ApiError) -> RemoteError {
    let kind = match err.kind {
        FailureKind::Transport | FailureKind::Timeout => RemoteErrorKind::Transport,
        FailureKind::HttpStatus(status) => RemoteErrorKind::Server { status },
        FailureKind::Decode | FailureKind::TooLarge { .. } => RemoteErrorKind::Decode,
        FailureKind::InvalidUrl => RemoteErrorKind::Rejected,
        FailureKind::ContractViolation { .. } => RemoteErrorKind::ContractViolation,
    };
    let message = match &err.kind {
        FailureKind::TooLarge { .. } | FailureKind::ContractViolation { .. } => err.to_string(),
        _ => err.message,
    };
    RemoteError::new(kind, message)
}

fn submission_error(err: SubmissionError) -> RemoteError {
    match err {
        SubmissionError::Api(api) => remote_error(api),
        rejected => RemoteError::new(RemoteErrorKind::Rejected, rejected.to_string()),
    }
}

fn api_result<T, U>(result: Result<T, ApiError>, map: impl FnOnce(T) -> U) -> Result<U, RemoteError> {
    result.map(map).map_err(remote_error)
}

pub fn effect_to_command(effect: Effect) -> EngineCommand {
    match effect {
        Effect::StartPoller => EngineCommand::StartPoller,
        Effect::StopPoller => EngineCommand::StopPoller,
        Effect::ListJobs { ticket } => EngineCommand::ListJobs { ticket },
        Effect::FetchJob { ticket, job_id } => EngineCommand::FetchJob { ticket, job_id },
        Effect::SubmitJob { ticket, draft } => EngineCommand::SubmitJob {
            ticket,
            job: new_job_from_draft(draft),
        },
        Effect::ListFiles {
            ticket,
            job_id,
            status,
        } => EngineCommand::ListFiles {
            ticket,
            job_id,
            status: status_to_wire(status),
        },
        Effect::ReadFile {
            ticket,
            job_id,
            path,
        } => EngineCommand::ReadFile {
            ticket,
            job_id,
            path,
        },
        Effect::LoadMessages { ticket, project_id } => {
            EngineCommand::LoadMessages { ticket, project_id }
        }
        Effect::AwaitMessages {
            ticket,
            project_id,
            baseline,
        } => EngineCommand::AwaitMessages {
            ticket,
            project_id,
            baseline,
        },
        Effect::SetProvider { ticket, provider } => EngineCommand::SetProvider { ticket, provider },
        Effect::ListProjects { ticket } => EngineCommand::ListProjects { ticket },
    }
}

/// The core message for an engine event, if the core handles that event.
pub fn event_to_msg(event: EngineEvent) -> Option<Msg> {
    let msg = match event {
        EngineEvent::PollTick => Msg::PollTick,
        EngineEvent::JobsListed { ticket, result } => Msg::JobsListed {
            ticket,
            result: api_result(result, |jobs| jobs.into_iter().map(job_from_record).collect()),
        },
        EngineEvent::JobFetched { ticket, result, .. } => Msg::JobDetailLoaded {
            ticket,
            result: api_result(result, job_from_record),
        },
        EngineEvent::JobSubmitted { ticket, result } => Msg::JobSubmitted {
            ticket,
            result: result.map(handle_from_engine).map_err(submission_error),
        },
        EngineEvent::FilesListed { ticket, result, .. } => Msg::FilesListed {
            ticket,
            result: api_result(result, |files| {
                files.into_iter().map(entry_from_wire).collect()
            }),
        },
        EngineEvent::FileRead { ticket, result, .. } => Msg::FileRead {
            ticket,
            result: result.map_err(remote_error),
        },
        EngineEvent::MessagesLoaded { ticket, result, .. } => Msg::MessagesLoaded {
            ticket,
            result: api_result(result, |messages| {
                messages.into_iter().map(message_from_record).collect()
            }),
        },
        EngineEvent::ProviderSet { ticket, result } => Msg::ProviderSet {
            ticket,
            result: result.map_err(remote_error),
        },
        EngineEvent::ProjectsListed { ticket, result } => Msg::ProjectsLoaded {
            ticket,
            result: api_result(result, |projects| {
                projects.into_iter().map(project_from_record).collect()
            }),
        },
        EngineEvent::HealthChecked { ticket, .. } => {
            forge_debug!("health result {} has no core handler", ticket);
            return None;
        }
    };
    Some(msg)
}
