use crate::{JobDraft, JobId, JobStatus, ProjectId, Ticket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartPoller,
    StopPoller,
    ListJobs {
        ticket: Ticket,
    },
    FetchJob {
        ticket: Ticket,
        job_id: JobId,
    },
    SubmitJob {
        ticket: Ticket,
        draft: JobDraft,
    },
    /// Only issued for a selection whose `status` is succeeded.
    ListFiles {
        ticket: Ticket,
        job_id: JobId,
        status: JobStatus,
    },
    ReadFile {
        ticket: Ticket,
        job_id: JobId,
        path: String,
    },
    LoadMessages {
        ticket: Ticket,
        project_id: ProjectId,
    },
    /// Reload the log until it holds more than `baseline` messages or the reload times out.
    AwaitMessages {
        ticket: Ticket,
        project_id: ProjectId,
        baseline: usize,
    },
    SetProvider {
        ticket: Ticket,
        provider: String,
    },
    ListProjects {
        ticket: Ticket,
    },
}

impl Effect {
    pub fn ticket(&self) -> Option<Ticket> {
        match self {
            Effect::StartPoller | Effect::StopPoller => None,
            Effect::ListJobs { ticket }
            | Effect::FetchJob { ticket, .. }
            | Effect::SubmitJob { ticket, .. }
            | Effect::ListFiles { ticket, .. }
            | Effect::ReadFile { ticket, .. }
            | Effect::LoadMessages { ticket, .. }
            | Effect::AwaitMessages { ticket, .. }
            | Effect::SetProvider { ticket, .. }
            | Effect::ListProjects { ticket } => Some(*ticket),
        }
    }
}
