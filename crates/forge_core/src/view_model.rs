use serde_json::Value;

use crate::artifacts::{FileContent, FileList};
use crate::{AppState, ArtifactEntry, JobId, JobMode, JobStatus, Message, Project, ProjectId};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub polling: bool,
    pub poll_failures: u32,
    pub jobs: Vec<JobRowView>,
    pub selected: Option<SelectedJobView>,
    pub artifacts: ArtifactsView,
    pub chat: ChatView,
    pub build: BuildView,
    pub provider: Option<String>,
    pub projects: Vec<Project>,
    pub last_error: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRowView {
    pub job_id: JobId,
    pub project_name: String,
    pub status: JobStatus,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedJobView {
    pub job_id: JobId,
    pub project_name: String,
    pub status: JobStatus,
    pub mode: Option<JobMode>,
    pub project_id: Option<ProjectId>,
    /// Unix seconds.
    pub created: Option<f64>,
    pub stack: Option<String>,
    pub log_entries: usize,
    /// Pretty-printed report, `{}` when the job has none yet.
    pub report: String,
}

/// What the artifacts pane shows for the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ArtifactsView {
    #[default]
    NoSelection,
    NotSucceeded {
        status: JobStatus,
    },
    Loading,
    Empty,
    Files {
        files: Vec<ArtifactEntry>,
        open: Option<OpenFileView>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenFileView {
    pub path: String,
    pub size: u64,
    /// `None` while the read is in flight.
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatView {
    pub project_id: Option<ProjectId>,
    pub messages: Vec<Message>,
    pub input: String,
    pub sending: bool,
    pub reloading: bool,
    pub history_loaded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildView {
    pub project_name: String,
    pub spec: String,
    pub stack: Option<String>,
    pub max_iters: Option<u32>,
    pub submitting: bool,
}

impl AppViewModel {
    pub(crate) fn build(state: &AppState, dirty: bool) -> Self {
        let selected_id = state.store.selected_id();
        let jobs = state
            .store
            .jobs()
            .iter()
            .map(|job| JobRowView {
                job_id: job.id.clone(),
                project_name: job.project_name.clone(),
                status: job.status,
                selected: selected_id == Some(job.id.as_str()),
            })
            .collect();

        let selected = state.store.selected().map(|job| SelectedJobView {
            job_id: job.id.clone(),
            project_name: job.project_name.clone(),
            status: job.status,
            mode: job.mode,
            project_id: job.project_id.clone(),
            created: job.created,
            stack: job.stack.clone(),
            log_entries: job.logs.len(),
            report: pretty_report(job.report.as_ref()),
        });

        Self {
            polling: state.poll.is_active(),
            poll_failures: state.poll.consecutive_failures(),
            jobs,
            selected,
            artifacts: artifacts_view(state),
            chat: ChatView {
                project_id: state.chat.project_id.clone(),
                messages: state.chat.messages.clone(),
                input: state.chat.input.clone(),
                sending: state.chat.sending,
                reloading: state.chat.awaiting_reload,
                history_loaded: state.chat.history_loaded,
            },
            build: BuildView {
                project_name: state.build.project_name.clone(),
                spec: state.build.spec.clone(),
                stack: state.build.stack.clone(),
                max_iters: state.build.max_iters,
                submitting: state.build.submitting,
            },
            provider: state.provider.clone(),
            projects: state.projects.clone(),
            last_error: state.last_error.clone(),
            dirty,
        }
    }
}

fn artifacts_view(state: &AppState) -> ArtifactsView {
    let Some(job) = state.store.selected() else {
        return ArtifactsView::NoSelection;
    };
    if job.status != JobStatus::Succeeded {
        return ArtifactsView::NotSucceeded { status: job.status };
    }
    match &state.artifacts.files {
        FileList::Idle | FileList::Loading => ArtifactsView::Loading,
        FileList::Loaded(files) if files.is_empty() => ArtifactsView::Empty,
        FileList::Loaded(files) => ArtifactsView::Files {
            files: files.clone(),
            open: state.artifacts.open.as_ref().map(|open| OpenFileView {
                path: open.entry.path.clone(),
                size: open.entry.size,
                content: match &open.content {
                    FileContent::Loading => None,
                    FileContent::Loaded(text) => Some(text.clone()),
                },
            }),
        },
    }
}

fn pretty_report(report: Option<&Value>) -> String {
    match report {
        Some(value) if !value.is_null() => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        _ => "{}".to_string(),
    }
}

/// Human readable size: `0 B`, `512 B`, `1.5 KB`, `2.25 MB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["B", "KB", "MB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
