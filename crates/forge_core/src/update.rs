use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::PollingStarted => state.start_polling(),
        Msg::PollingStopped => state.stop_polling(),
        Msg::PollTick => state.on_poll_tick(),
        Msg::JobsListed { ticket, result } => state.apply_jobs_listed(ticket, result),
        Msg::JobDetailLoaded { ticket, result } => state.apply_job_detail(ticket, result),
        Msg::JobSelected(job) => state.select_job(job),
        Msg::JobFocusRequested(job_id) => state.focus_job(job_id),
        Msg::SelectionCleared => state.clear_selection(),
        Msg::ProjectNameChanged(name) => {
            state.build.project_name = name;
            state.mark_dirty();
            Vec::new()
        }
        Msg::SpecChanged(spec) => {
            state.build.spec = spec;
            state.mark_dirty();
            Vec::new()
        }
        Msg::BuildOptionsChanged { stack, max_iters } => {
            state.build.stack = stack.filter(|stack| !stack.trim().is_empty());
            state.build.max_iters = max_iters;
            state.mark_dirty();
            Vec::new()
        }
        Msg::BuildSubmitted => state.submit_build(),
        Msg::JobSubmitted { ticket, result } => state.apply_submitted(ticket, result),
        Msg::FileClicked { path } => state.open_file(path),
        Msg::FilesListed { ticket, result } => state.apply_files_listed(ticket, result),
        Msg::FileRead { ticket, result } => state.apply_file_read(ticket, result),
        Msg::ChatProjectSelected(project_id) => state.select_chat_project(project_id),
        Msg::ChatInputChanged(text) => {
            state.chat.input = text;
            state.mark_dirty();
            Vec::new()
        }
        Msg::ChatSubmitted => state.submit_chat(),
        Msg::MessagesLoaded { ticket, result } => state.apply_messages(ticket, result),
        Msg::ProviderRequested(provider) => state.request_provider(provider),
        Msg::ProviderSet { ticket, result } => state.apply_provider(ticket, result),
        Msg::ProjectsRequested => state.request_projects(),
        Msg::ProjectsLoaded { ticket, result } => state.apply_projects(ticket, result),
        Msg::ErrorDismissed => {
            if state.last_error.take().is_some() {
                state.mark_dirty();
            }
            Vec::new()
        }
    };

    (state, effects)
}
