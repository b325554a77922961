use std::sync::Once;

use forge_core::{
    update, AppState, Effect, JobHandle, JobMode, JobStatus, Message, MessageRole, Msg,
    RemoteError, Ticket,
};
use pretty_assertions::assert_eq;

const PROJECT: &str = "0f1e2d3c4b5a69788796";

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(forge_logging::initialize_for_tests);
}

fn message(id: &str, role: MessageRole, content: &str, timestamp: f64) -> Message {
    Message {
        id: id.to_string(),
        role,
        content: content.to_string(),
        timestamp,
        job_id: None,
    }
}

fn history() -> Vec<Message> {
    vec![
        message("m1", MessageRole::User, "make a todo app", 1_700_000_000.0),
        message("m2", MessageRole::Assistant, "done", 1_700_000_050.5),
    ]
}

/// Chat attached to `PROJECT` with its history loaded.
fn open_chat() -> AppState {
    let (state, effects) = update(
        AppState::new(),
        Msg::ChatProjectSelected(Some(PROJECT.to_string())),
    );
    let ticket = match effects.as_slice() {
        [Effect::LoadMessages { ticket, project_id }] => {
            assert_eq!(project_id, PROJECT);
            *ticket
        }
        other => panic!("expected LoadMessages, got {other:?}"),
    };
    update(
        state,
        Msg::MessagesLoaded {
            ticket,
            result: Ok(history()),
        },
    )
    .0
}

fn send(state: AppState, text: &str) -> (AppState, Vec<Effect>) {
    let (state, _) = update(state, Msg::ChatInputChanged(text.to_string()));
    update(state, Msg::ChatSubmitted)
}

fn submit_ticket(effects: &[Effect]) -> Ticket {
    match effects {
        [Effect::SubmitJob { ticket, .. }] => *ticket,
        other => panic!("expected SubmitJob, got {other:?}"),
    }
}

#[test]
fn selecting_project_loads_history_in_server_order() {
    init_logging();
    let state = open_chat();
    let view = state.view();
    assert_eq!(view.chat.project_id.as_deref(), Some(PROJECT));
    assert_eq!(view.chat.messages, history());
}

#[test]
fn sending_submits_modify_job_with_derived_name() {
    init_logging();
    let (state, effects) = send(open_chat(), "  add error handling \n");
    let [Effect::SubmitJob { draft, .. }] = effects.as_slice() else {
        panic!("expected SubmitJob, got {effects:?}");
    };
    assert_eq!(draft.mode, JobMode::Modify);
    assert_eq!(draft.project_id.as_deref(), Some(PROJECT));
    assert_eq!(draft.project_name, "project_0f1e2d3c");
    assert_eq!(draft.spec, "add error handling");
    assert!(state.view().chat.sending);
}

#[test]
fn nothing_is_sent_without_project_or_text() {
    init_logging();
    let (_, effects) = send(AppState::new(), "hello");
    assert!(effects.is_empty());

    let (_, effects) = send(open_chat(), "   ");
    assert!(effects.is_empty());
}

#[test]
fn sending_twice_while_in_flight_is_ignored() {
    init_logging();
    let (state, _) = send(open_chat(), "first");
    let (_, effects) = send(state, "second");
    assert!(effects.is_empty());
}

#[test]
fn successful_send_adopts_job_clears_input_and_reloads_log() {
    init_logging();
    let (state, effects) = send(open_chat(), "add tests");
    let ticket = submit_ticket(&effects);
    let (state, effects) = update(
        state,
        Msg::JobSubmitted {
            ticket,
            result: Ok(JobHandle {
                id: "job-9".to_string(),
                status: JobStatus::Queued,
                project_name: "project_0f1e2d3c".to_string(),
            }),
        },
    );

    let selected = state.store().selected().expect("adopted");
    assert_eq!(selected.id, "job-9");
    assert_eq!(selected.project_id.as_deref(), Some(PROJECT));
    assert_eq!(selected.mode, Some(JobMode::Modify));

    let reload = match effects.as_slice() {
        [Effect::AwaitMessages {
            ticket,
            project_id,
            baseline,
        }] => {
            assert_eq!(project_id, PROJECT);
            assert_eq!(*baseline, 2);
            *ticket
        }
        other => panic!("expected AwaitMessages, got {other:?}"),
    };
    let view = state.view();
    assert_eq!(view.chat.input, "");
    assert!(!view.chat.sending);
    assert!(view.chat.reloading);

    let mut longer = history();
    longer.push(message("m3", MessageRole::User, "add tests", 1_700_000_100.0));
    let (state, _) = update(
        state,
        Msg::MessagesLoaded {
            ticket: reload,
            result: Ok(longer.clone()),
        },
    );
    let view = state.view();
    assert_eq!(view.chat.messages, longer);
    assert!(!view.chat.reloading);
}

#[test]
fn failed_send_keeps_input() {
    init_logging();
    let (state, effects) = send(open_chat(), "add tests");
    let (state, effects) = update(
        state,
        Msg::JobSubmitted {
            ticket: submit_ticket(&effects),
            result: Err(RemoteError::transport("connection refused")),
        },
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.chat.input, "add tests");
    assert!(!view.chat.sending);
    assert!(view
        .last_error
        .is_some_and(|error| error.starts_with("Failed to send message")));
    assert_eq!(view.chat.messages, history());
}

#[test]
fn switching_project_drops_pending_history() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::ChatProjectSelected(Some("first".to_string())),
    );
    let stale = effects[0].ticket().expect("ticket");
    let (state, _) = update(state, Msg::ChatProjectSelected(Some("second".to_string())));
    let (state, _) = update(
        state,
        Msg::MessagesLoaded {
            ticket: stale,
            result: Ok(history()),
        },
    );

    let view = state.view();
    assert_eq!(view.chat.project_id.as_deref(), Some("second"));
    assert!(view.chat.messages.is_empty());
}

#[test]
fn reload_is_skipped_when_user_left_the_project() {
    init_logging();
    let (state, effects) = send(open_chat(), "add tests");
    let ticket = submit_ticket(&effects);
    let (state, _) = update(state, Msg::ChatProjectSelected(None));
    let (state, effects) = update(
        state,
        Msg::JobSubmitted {
            ticket,
            result: Ok(JobHandle {
                id: "job-10".to_string(),
                status: JobStatus::Queued,
                project_name: "project_0f1e2d3c".to_string(),
            }),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.store().selected_id(), Some("job-10"));
}

#[test]
fn failed_history_load_is_not_surfaced() {
    init_logging();
    let (state, _) = update(open_chat(), Msg::ChatProjectSelected(None));
    let (state, effects) = update(state, Msg::ChatProjectSelected(Some(PROJECT.to_string())));
    let (state, _) = update(
        state,
        Msg::MessagesLoaded {
            ticket: effects[0].ticket().expect("ticket"),
            result: Err(RemoteError::transport("down")),
        },
    );
    assert!(state.view().chat.messages.is_empty());
    assert!(state.view().last_error.is_none());
}

#[test]
fn send_waits_for_history_and_counts_it_in_the_baseline() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::ChatProjectSelected(Some(PROJECT.to_string())),
    );
    let load = effects[0].ticket().expect("ticket");
    let (state, effects) = send(state, "add tests");
    assert!(effects.is_empty());
    assert!(!state.view().chat.sending);
    assert!(!state.view().chat.history_loaded);

    let (state, _) = update(
        state,
        Msg::MessagesLoaded {
            ticket: load,
            result: Ok(history()),
        },
    );
    let (state, effects) = update(state, Msg::ChatSubmitted);
    let ticket = submit_ticket(&effects);
    let (_, effects) = update(
        state,
        Msg::JobSubmitted {
            ticket,
            result: Ok(JobHandle {
                id: "job-11".to_string(),
                status: JobStatus::Queued,
                project_name: "project_0f1e2d3c".to_string(),
            }),
        },
    );
    let [Effect::AwaitMessages { baseline, .. }] = effects.as_slice() else {
        panic!("expected AwaitMessages, got {effects:?}");
    };
    assert_eq!(*baseline, history().len());
}

#[test]
fn reselecting_project_retries_failed_history() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::ChatProjectSelected(Some(PROJECT.to_string())),
    );
    let (state, _) = update(
        state,
        Msg::MessagesLoaded {
            ticket: effects[0].ticket().expect("ticket"),
            result: Err(RemoteError::transport("down")),
        },
    );
    let (state, effects) = send(state, "add tests");
    assert!(effects.is_empty());

    let (state, effects) = update(state, Msg::ChatProjectSelected(Some(PROJECT.to_string())));
    let [Effect::LoadMessages { ticket, .. }] = effects.as_slice() else {
        panic!("expected LoadMessages, got {effects:?}");
    };
    let (state, _) = update(
        state,
        Msg::MessagesLoaded {
            ticket: *ticket,
            result: Ok(history()),
        },
    );
    let (state, effects) = update(state, Msg::ChatProjectSelected(Some(PROJECT.to_string())));
    assert!(effects.is_empty());
    assert!(state.view().chat.history_loaded);
}
