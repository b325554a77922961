use crate::{
    ArtifactEntry, Job, JobHandle, JobId, Message, Project, ProjectId, RemoteError, Ticket,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// The jobs view became active; start background polling.
    PollingStarted,
    /// The jobs view was torn down; stop polling and ignore late responses.
    PollingStopped,
    /// Poll ticker fired.
    PollTick,
    /// Response to a job list refresh.
    JobsListed {
        ticket: Ticket,
        result: Result<Vec<Job>, RemoteError>,
    },
    /// Response to a job detail fetch.
    JobDetailLoaded {
        ticket: Ticket,
        result: Result<Job, RemoteError>,
    },
    /// User picked a job from the list; it becomes the selection as is.
    JobSelected(Job),
    /// Focus a job known only by id; it is selected once its detail arrives.
    JobFocusRequested(JobId),
    /// User cleared the selection.
    SelectionCleared,
    /// User edited the project name of a new build.
    ProjectNameChanged(String),
    /// User edited the specification text of a new build.
    SpecChanged(String),
    /// User changed the optional build parameters.
    BuildOptionsChanged {
        stack: Option<String>,
        max_iters: Option<u32>,
    },
    /// User submitted a new build.
    BuildSubmitted,
    /// Response to a create or modify submission.
    JobSubmitted {
        ticket: Ticket,
        result: Result<JobHandle, RemoteError>,
    },
    /// User clicked a listed artifact.
    FileClicked { path: String },
    /// Response to a workspace file listing.
    FilesListed {
        ticket: Ticket,
        result: Result<Vec<ArtifactEntry>, RemoteError>,
    },
    /// Response to a workspace file read.
    FileRead {
        ticket: Ticket,
        result: Result<String, RemoteError>,
    },
    /// The chat pane now follows `project_id`.
    ChatProjectSelected(Option<ProjectId>),
    /// User edited the chat input.
    ChatInputChanged(String),
    /// User sent the chat input.
    ChatSubmitted,
    /// Response to a message log load.
    MessagesLoaded {
        ticket: Ticket,
        result: Result<Vec<Message>, RemoteError>,
    },
    /// User chose a generation provider.
    ProviderRequested(String),
    /// Response to a provider change.
    ProviderSet {
        ticket: Ticket,
        result: Result<String, RemoteError>,
    },
    /// User asked for the project list.
    ProjectsRequested,
    /// Response to a project listing.
    ProjectsLoaded {
        ticket: Ticket,
        result: Result<Vec<Project>, RemoteError>,
    },
    /// User dismissed the last error.
    ErrorDismissed,
}
