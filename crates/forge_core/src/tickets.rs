use std::collections::BTreeMap;

use crate::{JobDraft, JobId, ProjectId, Ticket};

/// Why a submission was made; decides what happens with the returned handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SubmitOrigin {
    Build,
    Chat { project_id: ProjectId, baseline: usize },
}

/// What an outstanding ticket was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PendingRequest {
    ListJobs { poll_epoch: u64 },
    JobDetail { job_id: JobId, poll_epoch: u64 },
    Focus { job_id: JobId },
    Submit { draft: JobDraft, origin: SubmitOrigin },
    ListFiles { job_id: JobId },
    ReadFile { job_id: JobId, path: String },
    Messages { project_id: ProjectId },
    Provider { provider: String },
    Projects,
}

impl PendingRequest {
    pub(crate) fn poll_epoch(&self) -> Option<u64> {
        match self {
            PendingRequest::ListJobs { poll_epoch }
            | PendingRequest::JobDetail { poll_epoch, .. } => Some(*poll_epoch),
            _ => None,
        }
    }
}

/// Registry of requests that are still allowed to land.
///
/// A response whose ticket is no longer registered is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Tickets {
    next: Ticket,
    pending: BTreeMap<Ticket, PendingRequest>,
}

impl Tickets {
    pub(crate) fn issue(&mut self, request: PendingRequest) -> Ticket {
        self.next += 1;
        let ticket = self.next;
        self.pending.insert(ticket, request);
        ticket
    }

    pub(crate) fn take(&mut self, ticket: Ticket) -> Option<PendingRequest> {
        self.pending.remove(&ticket)
    }

    /// Forgets every outstanding request matching `pred`.
    pub(crate) fn revoke(&mut self, mut pred: impl FnMut(&PendingRequest) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, request| !pred(request));
        before - self.pending.len()
    }

    pub(crate) fn count(&self, mut pred: impl FnMut(&PendingRequest) -> bool) -> usize {
        self.pending.values().filter(|request| pred(request)).count()
    }

    pub(crate) fn any(&self, pred: impl FnMut(&PendingRequest) -> bool) -> bool {
        self.pending.values().any(pred)
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}
