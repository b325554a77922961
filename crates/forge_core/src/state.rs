use forge_logging::{forge_debug, forge_error, forge_info, forge_trace, forge_warn};

use crate::artifacts::{
    list_files_gate, ArtifactState, FileContent, FileList, OpenFile, READ_ERROR_PREFIX,
};
use crate::chat::ChatState;
use crate::poll::{PollConfig, PollState, TickDecision};
use crate::tickets::{PendingRequest, SubmitOrigin, Tickets};
use crate::view_model::AppViewModel;
use crate::{
    ArtifactEntry, DetailOutcome, Effect, Job, JobDraft, JobHandle, JobId, JobStore, Message,
    Project, ProjectId, RemoteError, Ticket,
};

/// Fields of the "new build" form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct BuildForm {
    pub(crate) project_name: String,
    pub(crate) spec: String,
    pub(crate) stack: Option<String>,
    pub(crate) max_iters: Option<u32>,
    pub(crate) submitting: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub(crate) store: JobStore,
    pub(crate) tickets: Tickets,
    pub(crate) poll: PollState,
    pub(crate) artifacts: ArtifactState,
    pub(crate) chat: ChatState,
    pub(crate) build: BuildForm,
    pub(crate) provider: Option<String>,
    pub(crate) projects: Vec<Project>,
    pub(crate) last_error: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_config(config: PollConfig) -> Self {
        Self {
            poll: PollState::new(config),
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel::build(self, self.dirty)
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_active()
    }

    /// Number of poll ticks that actually issued requests.
    pub fn poll_ticks_run(&self) -> u64 {
        self.poll.ticks_run()
    }

    /// Requests issued and not yet answered (or revoked).
    pub fn outstanding_requests(&self) -> usize {
        self.tickets.len()
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn fail(&mut self, message: String) {
        forge_error!("{}", message);
        self.last_error = Some(message);
        self.mark_dirty();
    }

    pub(crate) fn start_polling(&mut self) -> Vec<Effect> {
        if !self.poll.start() {
            return Vec::new();
        }
        forge_info!(target: "forge::poll", "polling started (epoch {})", self.poll.epoch());
        self.mark_dirty();
        vec![Effect::StartPoller]
    }

    pub(crate) fn stop_polling(&mut self) -> Vec<Effect> {
        if !self.poll.stop() {
            return Vec::new();
        }
        let revoked = self.tickets.revoke(|request| request.poll_epoch().is_some());
        forge_info!(
            target: "forge::poll",
            "polling stopped, {} in-flight poll requests will be ignored",
            revoked
        );
        self.mark_dirty();
        vec![Effect::StopPoller]
    }

    pub(crate) fn on_poll_tick(&mut self) -> Vec<Effect> {
        let epoch = self.poll.epoch();
        let outstanding = self
            .tickets
            .count(|request| request.poll_epoch() == Some(epoch));
        match self.poll.admit(outstanding) {
            TickDecision::Run => {}
            TickDecision::Inactive => {
                forge_trace!(target: "forge::poll", "tick ignored, polling stopped");
                return Vec::new();
            }
            TickDecision::Outstanding => {
                forge_debug!(
                    target: "forge::poll",
                    "tick skipped, {} requests from the previous tick outstanding",
                    outstanding
                );
                return Vec::new();
            }
            TickDecision::BackingOff { remaining } => {
                forge_debug!(target: "forge::poll", "tick skipped, backing off ({} more)", remaining);
                return Vec::new();
            }
        }

        let mut effects = Vec::with_capacity(2);
        let ticket = self.tickets.issue(PendingRequest::ListJobs { poll_epoch: epoch });
        effects.push(Effect::ListJobs { ticket });
        if let Some(job_id) = self.store.selected_id().map(ToOwned::to_owned) {
            let ticket = self.tickets.issue(PendingRequest::JobDetail {
                job_id: job_id.clone(),
                poll_epoch: epoch,
            });
            effects.push(Effect::FetchJob { ticket, job_id });
        }
        effects
    }

    pub(crate) fn apply_jobs_listed(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<Job>, RemoteError>,
    ) -> Vec<Effect> {
        match self.tickets.take(ticket) {
            Some(PendingRequest::ListJobs { .. }) => {}
            other => {
                forge_debug!(target: "forge::poll", "dropping list response {}: {:?}", ticket, other);
                return Vec::new();
            }
        }
        match result {
            Ok(jobs) => {
                self.poll.record_success();
                if self.store.replace_list(ticket, jobs) {
                    self.mark_dirty();
                }
            }
            Err(err) => {
                let skip = self.poll.record_failure();
                forge_warn!(
                    target: "forge::poll",
                    "job list refresh failed ({} in a row), skipping {} ticks: {}",
                    self.poll.consecutive_failures(),
                    skip,
                    err
                );
                self.mark_dirty();
            }
        }
        Vec::new()
    }

    pub(crate) fn apply_job_detail(
        &mut self,
        ticket: Ticket,
        result: Result<Job, RemoteError>,
    ) -> Vec<Effect> {
        match self.tickets.take(ticket) {
            Some(PendingRequest::JobDetail { job_id, .. }) => match result {
                Ok(job) => {
                    let outcome = self.store.apply_detail(&job_id, job);
                    forge_trace!(target: "forge::store", "detail for {}: {:?}", job_id, outcome);
                    if outcome == DetailOutcome::Applied {
                        self.mark_dirty();
                        return self.sync_artifacts();
                    }
                    Vec::new()
                }
                Err(err) => {
                    forge_warn!(target: "forge::poll", "detail refresh for {} failed: {}", job_id, err);
                    Vec::new()
                }
            },
            Some(PendingRequest::Focus { job_id }) => match result {
                Ok(job) if job.id == job_id => self.select_job(job),
                Ok(job) => {
                    forge_warn!("asked for job {} but the service returned {}", job_id, job.id);
                    Vec::new()
                }
                Err(err) => {
                    self.fail(format!("Failed to load job {job_id}: {err}"));
                    Vec::new()
                }
            },
            other => {
                forge_debug!("dropping detail response {}: {:?}", ticket, other);
                Vec::new()
            }
        }
    }

    pub(crate) fn select_job(&mut self, job: Job) -> Vec<Effect> {
        forge_debug!(target: "forge::store", "selected job {} ({})", job.id, job.status);
        self.revoke_focus();
        self.store.select(job);
        self.mark_dirty();
        self.sync_artifacts()
    }

    pub(crate) fn clear_selection(&mut self) -> Vec<Effect> {
        self.revoke_focus();
        self.store.clear_selection();
        self.mark_dirty();
        self.sync_artifacts()
    }

    pub(crate) fn focus_job(&mut self, job_id: JobId) -> Vec<Effect> {
        if let Some(job) = self.store.find(&job_id).cloned() {
            return self.select_job(job);
        }
        self.revoke_focus();
        let ticket = self.tickets.issue(PendingRequest::Focus {
            job_id: job_id.clone(),
        });
        vec![Effect::FetchJob { ticket, job_id }]
    }

    /// Only the latest selection intent may land; older focus lookups are dropped.
    fn revoke_focus(&mut self) {
        self.tickets
            .revoke(|request| matches!(request, PendingRequest::Focus { .. }));
    }

    /// Rebinds the artifact pane when the selected job id or status changed.
    fn sync_artifacts(&mut self) -> Vec<Effect> {
        let key = self.store.selection_key();
        if self.artifacts.is_current(key) {
            return Vec::new();
        }
        self.tickets.revoke(|request| {
            matches!(
                request,
                PendingRequest::ListFiles { .. } | PendingRequest::ReadFile { .. }
            )
        });
        self.artifacts.rebind(key);
        self.dirty = true;

        let Some(job) = self.store.selected() else {
            return Vec::new();
        };
        match list_files_gate(job) {
            Ok(job_id) => {
                let job_id = job_id.to_string();
                let status = job.status;
                self.artifacts.files = FileList::Loading;
                let ticket = self.tickets.issue(PendingRequest::ListFiles {
                    job_id: job_id.clone(),
                });
                vec![Effect::ListFiles {
                    ticket,
                    job_id,
                    status,
                }]
            }
            Err(not_ready) => {
                forge_trace!(target: "forge::artifacts", "not listing files: {}", not_ready);
                Vec::new()
            }
        }
    }

    pub(crate) fn apply_files_listed(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<ArtifactEntry>, RemoteError>,
    ) -> Vec<Effect> {
        let job_id = match self.tickets.take(ticket) {
            Some(PendingRequest::ListFiles { job_id }) => job_id,
            other => {
                forge_debug!(target: "forge::artifacts", "dropping file list {}: {:?}", ticket, other);
                return Vec::new();
            }
        };
        if self.artifacts.job_id() != Some(job_id.as_str()) {
            return Vec::new();
        }
        let files = match result {
            Ok(files) => files,
            Err(err) => {
                forge_warn!(target: "forge::artifacts", "listing files of {} failed: {}", job_id, err);
                Vec::new()
            }
        };
        self.artifacts.files = FileList::Loaded(files);
        self.mark_dirty();
        Vec::new()
    }

    pub(crate) fn open_file(&mut self, path: String) -> Vec<Effect> {
        let Some(job) = self.store.selected() else {
            return Vec::new();
        };
        let job_id = match list_files_gate(job) {
            Ok(job_id) => job_id.to_string(),
            Err(violation) => {
                forge_warn!(target: "forge::artifacts", "ignoring file click: {}", violation);
                return Vec::new();
            }
        };
        let Some(entry) = self.artifacts.find(&path).cloned() else {
            forge_warn!(target: "forge::artifacts", "{} is not a listed file of {}", path, job_id);
            return Vec::new();
        };
        self.tickets
            .revoke(|request| matches!(request, PendingRequest::ReadFile { .. }));
        self.artifacts.open = Some(OpenFile {
            entry,
            content: FileContent::Loading,
        });
        self.mark_dirty();
        let ticket = self.tickets.issue(PendingRequest::ReadFile {
            job_id: job_id.clone(),
            path: path.clone(),
        });
        vec![Effect::ReadFile {
            ticket,
            job_id,
            path,
        }]
    }

    pub(crate) fn apply_file_read(
        &mut self,
        ticket: Ticket,
        result: Result<String, RemoteError>,
    ) -> Vec<Effect> {
        let (job_id, path) = match self.tickets.take(ticket) {
            Some(PendingRequest::ReadFile { job_id, path }) => (job_id, path),
            other => {
                forge_debug!(target: "forge::artifacts", "dropping file read {}: {:?}", ticket, other);
                return Vec::new();
            }
        };
        if self.artifacts.job_id() != Some(job_id.as_str()) {
            return Vec::new();
        }
        let Some(open) = self.artifacts.open.as_mut().filter(|open| open.entry.path == path) else {
            return Vec::new();
        };
        let content = match result {
            Ok(content) => content,
            Err(err) => {
                forge_warn!(target: "forge::artifacts", "reading {} of {} failed: {}", path, job_id, err);
                format!("{READ_ERROR_PREFIX}{}", err.message)
            }
        };
        open.content = FileContent::Loaded(content);
        self.mark_dirty();
        Vec::new()
    }

    pub(crate) fn submit_build(&mut self) -> Vec<Effect> {
        if self.build.submitting {
            return Vec::new();
        }
        let name = self.build.project_name.trim();
        let spec = self.build.spec.trim();
        if name.is_empty() || spec.is_empty() {
            self.fail("A project name and a specification are required".to_string());
            return Vec::new();
        }
        let mut draft = JobDraft::create(name, spec);
        draft.stack = self.build.stack.clone();
        draft.max_iters = self.build.max_iters;

        self.build.submitting = true;
        self.last_error = None;
        self.mark_dirty();
        let ticket = self.tickets.issue(PendingRequest::Submit {
            draft: draft.clone(),
            origin: SubmitOrigin::Build,
        });
        vec![Effect::SubmitJob { ticket, draft }]
    }

    pub(crate) fn apply_submitted(
        &mut self,
        ticket: Ticket,
        result: Result<JobHandle, RemoteError>,
    ) -> Vec<Effect> {
        let (draft, origin) = match self.tickets.take(ticket) {
            Some(PendingRequest::Submit { draft, origin }) => (draft, origin),
            other => {
                forge_debug!("dropping submission response {}: {:?}", ticket, other);
                return Vec::new();
            }
        };
        match &origin {
            SubmitOrigin::Build => self.build.submitting = false,
            SubmitOrigin::Chat { .. } => self.chat.sending = false,
        }
        self.mark_dirty();

        let handle = match result {
            Ok(handle) => handle,
            Err(err) => {
                let message = match origin {
                    SubmitOrigin::Build => format!("Failed to submit job: {err}"),
                    SubmitOrigin::Chat { .. } => format!("Failed to send message: {err}"),
                };
                self.fail(message);
                return Vec::new();
            }
        };

        forge_info!(
            "job {} submitted for {} ({})",
            handle.id,
            handle.project_name,
            handle.status
        );
        self.last_error = None;
        let mut effects = self.select_job(Job::from_handle(&handle, &draft));
        match origin {
            SubmitOrigin::Build => self.build.spec.clear(),
            SubmitOrigin::Chat {
                project_id,
                baseline,
            } => {
                self.chat.input.clear();
                if self.chat.is_project(&project_id) {
                    self.chat.awaiting_reload = true;
                    let ticket = self.tickets.issue(PendingRequest::Messages {
                        project_id: project_id.clone(),
                    });
                    effects.push(Effect::AwaitMessages {
                        ticket,
                        project_id,
                        baseline,
                    });
                }
            }
        }
        effects
    }

    pub(crate) fn select_chat_project(&mut self, project_id: Option<ProjectId>) -> Vec<Effect> {
        if self.chat.project_id == project_id && !self.history_retry_due() {
            return Vec::new();
        }
        self.tickets
            .revoke(|request| matches!(request, PendingRequest::Messages { .. }));
        self.chat.switch_project(project_id.clone());
        self.mark_dirty();
        match project_id {
            Some(project_id) => {
                let ticket = self.tickets.issue(PendingRequest::Messages {
                    project_id: project_id.clone(),
                });
                vec![Effect::LoadMessages { ticket, project_id }]
            }
            None => Vec::new(),
        }
    }

    /// Reselecting the chat project reloads a history whose first load failed.
    fn history_retry_due(&self) -> bool {
        self.chat.project_id.is_some()
            && !self.chat.history_loaded
            && !self
                .tickets
                .any(|request| matches!(request, PendingRequest::Messages { .. }))
    }

    pub(crate) fn submit_chat(&mut self) -> Vec<Effect> {
        let Some((project_id, text)) = self.chat.sendable() else {
            if self.chat.project_id.is_some() && !self.chat.history_loaded {
                forge_debug!(target: "forge::chat", "history not loaded yet, send held back");
            }
            return Vec::new();
        };
        let project_id = project_id.to_string();
        let draft = JobDraft::modify(project_id.clone(), text);
        let baseline = self.chat.messages.len();
        self.chat.sending = true;
        self.mark_dirty();
        let ticket = self.tickets.issue(PendingRequest::Submit {
            draft: draft.clone(),
            origin: SubmitOrigin::Chat {
                project_id,
                baseline,
            },
        });
        vec![Effect::SubmitJob { ticket, draft }]
    }

    pub(crate) fn apply_messages(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<Message>, RemoteError>,
    ) -> Vec<Effect> {
        let project_id = match self.tickets.take(ticket) {
            Some(PendingRequest::Messages { project_id }) => project_id,
            other => {
                forge_debug!(target: "forge::chat", "dropping messages {}: {:?}", ticket, other);
                return Vec::new();
            }
        };
        if !self.chat.is_project(&project_id) {
            return Vec::new();
        }
        match result {
            Ok(messages) => {
                self.chat.messages = messages;
                self.chat.history_loaded = true;
            }
            Err(err) => {
                forge_warn!(target: "forge::chat", "loading messages of {} failed: {}", project_id, err);
            }
        }
        self.chat.awaiting_reload = false;
        self.mark_dirty();
        Vec::new()
    }

    pub(crate) fn request_provider(&mut self, provider: String) -> Vec<Effect> {
        let provider = provider.trim().to_string();
        if provider.is_empty() {
            return Vec::new();
        }
        let ticket = self.tickets.issue(PendingRequest::Provider {
            provider: provider.clone(),
        });
        vec![Effect::SetProvider { ticket, provider }]
    }

    pub(crate) fn apply_provider(
        &mut self,
        ticket: Ticket,
        result: Result<String, RemoteError>,
    ) -> Vec<Effect> {
        let requested = match self.tickets.take(ticket) {
            Some(PendingRequest::Provider { provider }) => provider,
            _ => return Vec::new(),
        };
        match result {
            Ok(ack) => {
                forge_info!("provider set to {}", ack);
                self.provider = Some(ack);
                self.mark_dirty();
            }
            Err(err) => self.fail(format!("Failed to set provider {requested}: {err}")),
        }
        Vec::new()
    }

    pub(crate) fn request_projects(&mut self) -> Vec<Effect> {
        if self
            .tickets
            .any(|request| matches!(request, PendingRequest::Projects))
        {
            return Vec::new();
        }
        let ticket = self.tickets.issue(PendingRequest::Projects);
        vec![Effect::ListProjects { ticket }]
    }

    pub(crate) fn apply_projects(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<Project>, RemoteError>,
    ) -> Vec<Effect> {
        if !matches!(self.tickets.take(ticket), Some(PendingRequest::Projects)) {
            return Vec::new();
        }
        match result {
            Ok(projects) => {
                self.projects = projects;
                self.mark_dirty();
            }
            Err(err) => forge_warn!("listing projects failed: {}", err),
        }
        Vec::new()
    }
}
