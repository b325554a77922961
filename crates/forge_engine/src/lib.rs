//! Forge engine: HTTP access to the backend and effect execution.
mod api;
mod artifacts;
mod chat;
mod engine;
mod poller;
mod submit;
mod types;

pub use api::{ApiSettings, ForgeApi, ReqwestForgeApi};
pub use artifacts::ArtifactFetcher;
pub use chat::{await_messages, ChatReloadSettings, MessageReload};
pub use engine::{EngineCommand, EngineError, EngineHandle, EngineSettings};
pub use poller::{spawn_poller, ChannelTickSink, PollerHandle, TickSink};
pub use submit::{JobHandle, JobSubmitter, NewJob, SubmissionError};
pub use types::{
    ApiError, EngineEvent, FailureKind, FileEntry, JobMode, JobRecord, JobStatus, MessageRecord,
    MessageRole, ProjectRecord, SubmitJobRequest, SubmitJobResponse, Ticket,
};
