//! Forge core: pure job synchronization state machine and view-model helpers.
//!
//! Nothing in here performs IO. Requests leave as [`Effect`]s tagged with a
//! [`Ticket`]; their responses come back as [`Msg`]s carrying the same ticket and
//! are only applied while the ticket is still registered.
mod artifacts;
mod chat;
mod effect;
mod msg;
mod poll;
mod state;
mod store;
mod tickets;
mod types;
mod update;
mod view_model;

pub use artifacts::{list_files_gate, READ_ERROR_PREFIX};
pub use effect::Effect;
pub use msg::Msg;
pub use poll::{backoff_ticks, PollConfig, TickDecision, DEFAULT_MAX_BACKOFF_TICKS};
pub use state::AppState;
pub use store::{DetailOutcome, JobStore};
pub use types::{
    modify_project_name, ArtifactEntry, ContractViolation, Job, JobDraft, JobHandle, JobId,
    JobMode, JobStatus, Message, MessageRole, Project, ProjectId, RemoteError, RemoteErrorKind,
    Ticket, MODIFY_NAME_PREFIX,
};
pub use update::update;
pub use view_model::{
    format_bytes, AppViewModel, ArtifactsView, BuildView, ChatView, JobRowView, OpenFileView,
    SelectedJobView,
};
